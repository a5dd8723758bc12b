use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use heroshot::config::{ProviderConfig, setup_logging};
use heroshot::constants::{DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use heroshot::cover::{
    AspectRatio, CoverAction, CoverState, ThemeMode, ToolMode, ViralLayout, reduce,
};
use heroshot::datauri::normalize_upload;
use heroshot::export::{Exporter, parse_hex_color};
use heroshot::gemini::{ApiKey, GeminiClient, GenerationRequest};
use tracing::info;

/// Generate a background and export the finished composite, without the web UI.
///
///   heroshot_render --subject ./earbuds.png --style neon_cyber --out ./covers/
#[derive(Parser, Debug)]
#[command(name = "heroshot_render")]
struct Args {
    /// Provider API key
    #[arg(required = true, long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, default_value = DEFAULT_API_BASE, env = "HEROSHOT_API_BASE")]
    api_base: String,

    #[arg(long, default_value = DEFAULT_IMAGE_MODEL, env = "HEROSHOT_IMAGE_MODEL")]
    image_model: String,

    #[arg(long, default_value = DEFAULT_TEXT_MODEL, env = "HEROSHOT_TEXT_MODEL")]
    text_model: String,

    /// Product photo
    #[arg(long)]
    subject: Option<PathBuf>,

    /// Style reference photo
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Preset style id, eg `warm_japanese`
    #[arg(long)]
    style: Option<String>,

    /// Prompt to use instead of the style's
    #[arg(long)]
    prompt: Option<String>,

    /// Aspect ratio, eg `3:4`, `1:1`, `9:16`
    #[arg(long, default_value = "3:4")]
    ratio: String,

    /// Render a cover with this layout instead of a product shot
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
    theme: ThemeArg,

    /// Title; `\n` starts a new line
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    subtitle: Option<String>,

    #[arg(long)]
    footer: Option<String>,

    #[arg(long)]
    title_color: Option<String>,

    #[arg(long)]
    text_scale: Option<f32>,

    /// Ask the text model for a punchier title first
    #[arg(long)]
    polish: bool,

    /// Extra font directory for the export
    #[arg(long, env = "HEROSHOT_FONT_DIR")]
    font_dir: Option<PathBuf>,

    /// Output file, or a directory to receive `HeroShot-<ms>.png`
    #[arg(long, default_value = ".")]
    out: PathBuf,

    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    Classic,
    Split,
    Diagonal,
    BigType,
}

impl From<LayoutArg> for ViralLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Classic => ViralLayout::Classic,
            LayoutArg::Split => ViralLayout::Split,
            LayoutArg::Diagonal => ViralLayout::Diagonal,
            LayoutArg::BigType => ViralLayout::BigType,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for ThemeMode {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => ThemeMode::Light,
            ThemeArg::Dark => ThemeMode::Dark,
        }
    }
}

/// Everything except the images, as reducer actions.
fn settings_actions(args: &Args) -> Result<Vec<CoverAction>> {
    let ratio = AspectRatio::from_str(&args.ratio)
        .map_err(|()| anyhow!("Unsupported aspect ratio {:?}", args.ratio))?;
    let mut actions = vec![
        CoverAction::SetAspectRatio(ratio),
        CoverAction::SetThemeMode(args.theme.into()),
    ];
    if let Some(layout) = args.layout {
        actions.push(CoverAction::SetToolMode(ToolMode::ViralCover));
        actions.push(CoverAction::SetViralLayout(layout.into()));
    }
    if let Some(style) = &args.style {
        actions.push(CoverAction::SelectStyle(style.clone()));
    }
    if let Some(prompt) = &args.prompt {
        actions.push(CoverAction::SetActivePrompt(prompt.clone()));
    }
    if let Some(title) = &args.title {
        actions.push(CoverAction::SetTitle(title.replace("\\n", "\n")));
    }
    if let Some(subtitle) = &args.subtitle {
        actions.push(CoverAction::SetSubtitle(subtitle.clone()));
    }
    if let Some(footer) = &args.footer {
        actions.push(CoverAction::SetFooter(footer.clone()));
    }
    if let Some(color) = &args.title_color {
        parse_hex_color(color).with_context(|| format!("Invalid title colour {color:?}"))?;
        actions.push(CoverAction::SetTitleColor(color.to_ascii_lowercase()));
    }
    if let Some(scale) = args.text_scale {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(anyhow!("Text scale must be positive, got {scale}"));
        }
        actions.push(CoverAction::SetTextScale(scale));
    }
    Ok(actions)
}

async fn load_image(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    normalize_upload(&bytes).with_context(|| format!("{} is not a usable image", path.display()))
}

fn output_path(out: &Path, file_name: &str) -> PathBuf {
    if out.is_dir() {
        out.join(file_name)
    } else {
        out.to_path_buf()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    let api_key = ApiKey::new(&args.api_key).context("The API key is empty")?;
    let config = ProviderConfig::new(&args.api_base, &args.image_model, &args.text_model)
        .with_context(|| format!("Invalid API base {:?}", args.api_base))?;
    let client = GeminiClient::new(config);

    let mut state = settings_actions(&args)?
        .into_iter()
        .fold(CoverState::default(), reduce);
    if let Some(path) = &args.subject {
        state = reduce(state, CoverAction::SetSubjectImage(Some(load_image(path).await?)));
    }
    if let Some(path) = &args.reference {
        state = reduce(state, CoverAction::SetReferenceImage(Some(load_image(path).await?)));
    }

    if args.polish {
        let polished = client
            .polish_title(&api_key, &state.title)
            .await
            .context("Title polish failed")?;
        info!("Polished title: {}", polished);
        state = reduce(state, CoverAction::SetTitle(polished));
    }

    let image = client
        .generate_cover_image(&api_key, &GenerationRequest::from_state(&state))
        .await
        .context("Background generation failed")?;
    state = reduce(state, CoverAction::SetGeneratedImage(Some(image)));

    let font_dir = args.font_dir.clone();
    let exported = tokio::task::spawn_blocking(move || {
        Exporter::new(font_dir.as_deref()).export(&state)
    })
    .await
    .context("Export task panicked")?
    .context("Export failed")?;

    let path = output_path(&args.out, &exported.file_name);
    tokio::fs::write(&path, &exported.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["heroshot_render", "--api-key", "k"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn settings_become_reducer_actions() {
        let args = parse(&[
            "--ratio",
            "9:16",
            "--layout",
            "big-type",
            "--style",
            "neon_cyber",
            "--title",
            "Line one\\nLine two",
            "--title-color",
            "#FF00AA",
        ]);
        let state = settings_actions(&args)
            .expect("actions")
            .into_iter()
            .fold(CoverState::default(), reduce);
        assert_eq!(state.aspect_ratio, AspectRatio::Story916);
        assert_eq!(state.tool_mode, ToolMode::ViralCover);
        assert_eq!(state.viral_layout, ViralLayout::BigType);
        assert_eq!(state.selected_style_id, "neon_cyber");
        assert_eq!(state.title, "Line one\nLine two");
        assert_eq!(state.title_color, "#ff00aa");
    }

    #[test]
    fn rejects_unknown_ratio_and_bad_colour() {
        assert!(settings_actions(&parse(&["--ratio", "5:4"])).is_err());
        assert!(settings_actions(&parse(&["--title-color", "teal"])).is_err());
    }

    #[test]
    fn output_path_fills_in_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            output_path(dir.path(), "HeroShot-1.png"),
            dir.path().join("HeroShot-1.png")
        );
        let file = dir.path().join("cover.png");
        assert_eq!(output_path(&file, "HeroShot-1.png"), file);
    }
}
