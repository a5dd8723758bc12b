use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::styles::default_styles;

/// Output aspect ratios the provider is asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 3:4
    #[default]
    #[serde(rename = "3:4")]
    Portrait,
    /// 1:1
    #[serde(rename = "1:1")]
    Square,
    /// 2.35:1
    #[serde(rename = "2.35:1")]
    Wide235,
    /// 9:16
    #[serde(rename = "9:16")]
    Story916,
    /// 4:3
    #[serde(rename = "4:3")]
    Video43,
}

impl AspectRatio {
    /// Every supported ratio, in menu order.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Wide235,
        AspectRatio::Story916,
        AspectRatio::Video43,
    ];

    /// The ratio as sent to the provider, eg `3:4`.
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Portrait => "3:4",
            AspectRatio::Square => "1:1",
            AspectRatio::Wide235 => "2.35:1",
            AspectRatio::Story916 => "9:16",
            AspectRatio::Video43 => "4:3",
        }
    }

    /// width / height
    pub fn ratio(self) -> f32 {
        match self {
            AspectRatio::Portrait => 3.0 / 4.0,
            AspectRatio::Square => 1.0,
            AspectRatio::Wide235 => 2.35,
            AspectRatio::Story916 => 9.0 / 16.0,
            AspectRatio::Video43 => 4.0 / 3.0,
        }
    }

    /// Platform hint shown next to the ratio.
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Portrait => "小红书 3:4",
            AspectRatio::Square => "Instagram 1:1",
            AspectRatio::Wide235 => "Cinema 2.35:1",
            AspectRatio::Story916 => "Story 9:16",
            AspectRatio::Video43 => "Video 4:3",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == value.trim())
            .ok_or(())
    }
}

/// Which tool the editor is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolMode {
    /// product hero image on a plain themed background
    #[default]
    ProductGen,
    /// social media cover using one of the viral layouts
    ViralCover,
}

/// Composition templates for covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViralLayout {
    /// stacked title and subtitle on top, footer chip at the bottom
    #[default]
    Classic,
    /// imagery left, text column on the right
    Split,
    /// text running along a diagonal band
    Diagonal,
    /// oversized title filling the frame
    BigType,
}

impl ViralLayout {
    /// Every layout, in menu order.
    pub const ALL: [ViralLayout; 4] = [
        ViralLayout::Classic,
        ViralLayout::Split,
        ViralLayout::Diagonal,
        ViralLayout::BigType,
    ];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            ViralLayout::Classic => "经典层级 (Classic)",
            ViralLayout::Split => "左右分栏 (Split)",
            ViralLayout::Diagonal => "动感对角 (Diagonal)",
            ViralLayout::BigType => "大字报 (Big Type)",
        }
    }

    /// Form value, matching the serde name.
    pub fn as_str(self) -> &'static str {
        match self {
            ViralLayout::Classic => "CLASSIC",
            ViralLayout::Split => "SPLIT",
            ViralLayout::Diagonal => "DIAGONAL",
            ViralLayout::BigType => "BIG_TYPE",
        }
    }
}

/// Background brightness for product shots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeMode {
    /// white, high-key
    #[default]
    Light,
    /// black
    Dark,
}

impl ThemeMode {
    /// Canvas colour behind the generated image.
    pub fn canvas_color(self) -> &'static str {
        match self {
            ThemeMode::Light => "#ffffff",
            ThemeMode::Dark => "#000000",
        }
    }
}

/// Which panel is in front on narrow screens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewMode {
    /// the controls
    #[default]
    Editor,
    /// the preview
    Result,
}

/// A named, reusable prompt fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOption {
    /// unique within the catalog
    pub id: String,
    /// shown in the picker
    pub label: String,
    /// prompt adopted when the style is selected
    pub prompt: String,
    /// seeded at startup rather than created by the user
    pub is_default: bool,
}

/// Everything the editor knows. Only [`crate::cover::reduce`] produces new values.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverState {
    /// narrow-screen panel
    pub view_mode: ViewMode,
    /// current tool
    pub tool_mode: ToolMode,

    /// main title, may contain line breaks
    pub title: String,
    /// subtitle
    pub subtitle: String,
    /// footer chip text
    pub footer: String,

    /// requested output ratio
    pub aspect_ratio: AspectRatio,
    /// style catalog, never empty
    pub styles: Vec<StyleOption>,
    /// always one of `styles`
    pub selected_style_id: String,
    /// cover layout
    pub viral_layout: ViralLayout,
    /// product shot background
    pub theme_mode: ThemeMode,
    /// prompt actually sent, editable independently of the presets
    pub active_prompt: String,

    /// product photo, as a data URI
    pub subject_image: Option<String>,
    /// style reference photo, as a data URI
    pub reference_image: Option<String>,
    /// last generated background, as a PNG data URI
    pub generated_image: Option<String>,
    /// a generation is in flight
    pub is_generating: bool,
    /// a title polish is in flight
    pub is_polishing: bool,

    /// multiplier for every text layer
    pub text_scale: f32,
    /// hex colour of the title
    pub title_color: String,
    /// hex colour of the subtitle
    pub subtitle_color: String,
    /// hex colour of the footer text
    pub footer_color: String,
}

impl CoverState {
    /// The selected style. Falls back to the first entry, which the reducer
    /// never lets happen.
    pub fn selected_style(&self) -> Option<&StyleOption> {
        self.styles
            .iter()
            .find(|style| style.id == self.selected_style_id)
            .or_else(|| self.styles.first())
    }

    /// Looks a style up by id.
    pub fn style(&self, id: &str) -> Option<&StyleOption> {
        self.styles.iter().find(|style| style.id == id)
    }
}

impl Default for CoverState {
    fn default() -> Self {
        let styles = default_styles();
        let (selected_style_id, active_prompt) = styles
            .first()
            .map(|style| (style.id.clone(), style.prompt.clone()))
            .unwrap_or_default();
        Self {
            view_mode: ViewMode::Editor,
            tool_mode: ToolMode::ProductGen,
            title: "无线降噪\nPro Max".to_string(),
            subtitle: "沉浸式音频体验".to_string(),
            footer: "新品上市 • 限时直降".to_string(),
            aspect_ratio: AspectRatio::Portrait,
            styles,
            selected_style_id,
            viral_layout: ViralLayout::Classic,
            theme_mode: ThemeMode::Light,
            active_prompt,
            subject_image: None,
            reference_image: None,
            generated_image: None,
            is_generating: false,
            is_polishing: false,
            text_scale: 1.0,
            title_color: "#000000".to_string(),
            subtitle_color: "#666666".to_string(),
            footer_color: "#ffffff".to_string(),
        }
    }
}
