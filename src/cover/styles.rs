use crate::constants::{FALLBACK_STYLE_ID, FALLBACK_STYLE_LABEL, FALLBACK_STYLE_PROMPT};

use super::StyleOption;

const DEFAULT_STYLES: [(&str, &str, &str); 5] = [
    (
        "minimal_tech",
        "极简科技 (Minimal)",
        "clean, futuristic, matte textures, soft studio lighting, apple aesthetic, minimalist composition, ample negative space",
    ),
    (
        "warm_japanese",
        "日系温馨 (Warm)",
        "warm tones, natural wood and beige textures, soft sunlight, cozy, kinfolk style, film grain, organic shadows",
    ),
    (
        "high_fashion",
        "高冷艺术 (Fashion)",
        "high contrast, bold shadows, editorial photography, vogue style, avant-garde, abstract geometry",
    ),
    (
        "nature_organic",
        "自然有机 (Nature)",
        "earthy tones, green leaves, natural light, botanical, soft focus background, fresh atmosphere, flat lay style",
    ),
    (
        "neon_cyber",
        "赛博朋克 (Cyber)",
        "dark background, neon accents, glass reflections, cyberpunk city vibes, blue and purple gradients, high tech",
    ),
];

/// The presets every new workspace starts with.
pub fn default_styles() -> Vec<StyleOption> {
    DEFAULT_STYLES
        .iter()
        .map(|(id, label, prompt)| StyleOption {
            id: (*id).to_string(),
            label: (*label).to_string(),
            prompt: (*prompt).to_string(),
            is_default: true,
        })
        .collect()
}

/// The style inserted when the last one is deleted.
pub fn fallback_style() -> StyleOption {
    StyleOption {
        id: FALLBACK_STYLE_ID.to_string(),
        label: FALLBACK_STYLE_LABEL.to_string(),
        prompt: FALLBACK_STYLE_PROMPT.to_string(),
        is_default: true,
    }
}

/// Timestamp-derived id, bumped until nothing in `styles` uses it.
pub fn next_style_id(styles: &[StyleOption], now_millis: i64) -> String {
    let mut candidate = now_millis;
    loop {
        let id = candidate.to_string();
        if !styles.iter().any(|style| style.id == id) {
            return id;
        }
        candidate = candidate.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unique_and_flagged() {
        let styles = default_styles();
        assert_eq!(styles.len(), 5);
        assert!(styles.iter().all(|style| style.is_default));
        let mut ids: Vec<&str> = styles.iter().map(|style| style.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert_eq!(styles[0].id, "minimal_tech");
    }

    #[test]
    fn next_id_skips_taken_timestamps() {
        let mut styles = default_styles();
        styles.push(StyleOption {
            id: "1000".to_string(),
            label: "a".to_string(),
            prompt: "b".to_string(),
            is_default: false,
        });
        styles.push(StyleOption {
            id: "1001".to_string(),
            label: "a".to_string(),
            prompt: "b".to_string(),
            is_default: false,
        });
        assert_eq!(next_style_id(&styles, 1000), "1002");
        assert_eq!(next_style_id(&styles, 999), "999");
    }
}
