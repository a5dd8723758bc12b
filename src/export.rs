//! Composite export: the cover is laid out as an SVG document (background
//! image plus positioned text layers), rasterised with resvg at a fixed
//! supersampling factor and encoded as PNG.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use tracing::{debug, info};

use crate::constants::{CANVAS_WIDTH, EXPORT_FILE_PREFIX, EXPORT_SCALE, SPLIT_TEXT_COLUMN};
use crate::cover::{CoverState, ToolMode, ViralLayout};
use crate::datauri::{DataUri, DataUriError};

const REM: f32 = 16.0;
const CORNER_RADIUS: f32 = 20.0;
const FONT_FAMILY: &str = "'PingFang SC', 'Noto Sans CJK SC', 'Noto Sans', sans-serif";

#[allow(clippy::unwrap_used)]
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").unwrap());

/// Errors produced while exporting.
#[derive(Debug)]
pub enum ExportError {
    /// Nothing has been generated yet
    NoImage,
    /// The generated image is not a usable data URI
    Background(DataUriError),
    /// The generated image is in a format the rasteriser cannot draw
    UnsupportedBackground,
    /// The composed SVG was rejected
    Svg(String),
    /// The output surface could not be allocated
    Allocation {
        /// requested width
        width: u32,
        /// requested height
        height: u32,
    },
    /// PNG encoding failed
    Encode(String),
    /// The blocking export task died
    Task(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoImage => write!(f, "no generated image to export"),
            Self::Background(err) => write!(f, "background image unusable: {err}"),
            Self::UnsupportedBackground => write!(f, "background image format not supported"),
            Self::Svg(err) => write!(f, "failed to build composite: {err}"),
            Self::Allocation { width, height } => {
                write!(f, "failed to allocate {width}x{height} surface")
            }
            Self::Encode(err) => write!(f, "failed to encode PNG: {err}"),
            Self::Task(err) => write!(f, "export task failed: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// A finished export, ready to hand to the browser.
#[derive(Clone, Debug)]
pub struct ExportedPng {
    /// `HeroShot-<epoch-ms>.png`
    pub file_name: String,
    /// encoded PNG
    pub bytes: Vec<u8>,
}

/// Download name for an export made at `epoch_ms`.
pub fn export_file_name(epoch_ms: i64) -> String {
    format!("{EXPORT_FILE_PREFIX}-{epoch_ms}.png")
}

/// Parses `#rgb` / `#rrggbb`.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let value = value.trim();
    if !HEX_COLOR.is_match(value) {
        return None;
    }
    let digits = &value[1..];
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    let rgb = u32::from_str_radix(&expanded, 16).ok()?;
    Some([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
}

/// Relative luma above the midpoint. Unparseable colours count as dark.
pub fn is_light_color(value: &str) -> bool {
    parse_hex_color(value).is_some_and(|[r, g, b]| {
        0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b) > 128.0
    })
}

/// Logical canvas size in CSS pixels for the current ratio.
pub fn canvas_size(state: &CoverState) -> (u32, u32) {
    let height = (CANVAS_WIDTH / state.aspect_ratio.ratio()).round().max(1.0);
    (CANVAS_WIDTH as u32, height as u32)
}

/// Rough advance width: CJK and other wide glyphs take a full em.
fn estimate_text_width(text: &str, font_size: f32, letter_spacing: f32) -> f32 {
    text.chars()
        .map(|c| {
            let advance = if c.is_ascii() { 0.6 } else { 1.0 };
            advance * font_size + letter_spacing
        })
        .sum()
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
        }
    }
}

struct TextLayer<'a> {
    text: &'a str,
    x: f32,
    top: f32,
    font_size: f32,
    line_height: f32,
    weight: u16,
    color: &'a str,
    anchor: Anchor,
    opacity: f32,
}

impl TextLayer<'_> {
    /// bottom edge of the last line
    fn bottom(&self) -> f32 {
        let lines = self.text.lines().count().max(1) as f32;
        self.top + lines * self.font_size * self.line_height
    }

    fn write_svg(&self, svg: &mut String) {
        if self.text.trim().is_empty() {
            return;
        }
        svg.push_str(&format!(
            r#"<text font-family="{family}" font-size="{size:.2}" font-weight="{weight}" fill="{color}" fill-opacity="{opacity:.2}" text-anchor="{anchor}">"#,
            family = FONT_FAMILY,
            size = self.font_size,
            weight = self.weight,
            color = encode_double_quoted_attribute(self.color),
            opacity = self.opacity,
            anchor = self.anchor.as_str(),
        ));
        let mut baseline = self.top + self.font_size * 0.9;
        for line in self.text.lines() {
            svg.push_str(&format!(
                r#"<tspan x="{x:.2}" y="{y:.2}">{line}</tspan>"#,
                x = self.x,
                y = baseline,
                line = encode_text(line),
            ));
            baseline += self.font_size * self.line_height;
        }
        svg.push_str("</text>");
    }
}

fn write_footer_chip(svg: &mut String, state: &CoverState, center_x: f32, bottom: f32) {
    let footer = state.footer.trim();
    if footer.is_empty() {
        return;
    }
    let text = footer.to_uppercase();
    let font_size = 0.7 * REM * state.text_scale;
    let spacing = font_size * 0.2;
    let chip_width = estimate_text_width(&text, font_size, spacing) + 2.0 * font_size;
    let chip_height = font_size * 2.2;
    let chip_x = center_x - chip_width / 2.0;
    let chip_y = bottom - chip_height;
    let chip_fill = if is_light_color(&state.footer_color) {
        "#000000"
    } else {
        "#ffffff"
    };
    svg.push_str(&format!(
        r#"<rect x="{chip_x:.2}" y="{chip_y:.2}" width="{chip_width:.2}" height="{chip_height:.2}" rx="6" ry="6" fill="{chip_fill}"/>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" font-family="{family}" font-size="{size:.2}" font-weight="700" letter-spacing="{spacing:.2}" fill="{color}" text-anchor="middle">{text}</text>"#,
        x = center_x,
        y = chip_y + chip_height / 2.0 + font_size * 0.35,
        family = FONT_FAMILY,
        size = font_size,
        color = encode_double_quoted_attribute(&state.footer_color),
        text = encode_text(&text),
    ));
}

fn layout(state: &CoverState) -> ViralLayout {
    match state.tool_mode {
        ToolMode::ProductGen => ViralLayout::Classic,
        ToolMode::ViralCover => state.viral_layout,
    }
}

fn write_text_layers(svg: &mut String, state: &CoverState, width: f32, height: f32) {
    let padding = width * 0.08;
    let scale = state.text_scale;
    let layout = layout(state);

    let (anchor, text_x, header_top, title_size) = match layout {
        ViralLayout::Classic => (Anchor::Middle, width / 2.0, padding + REM, 2.0 * REM * scale),
        ViralLayout::Diagonal => (Anchor::Start, padding, padding + REM, 2.2 * REM * scale),
        ViralLayout::Split => (
            Anchor::Start,
            width * (1.0 - SPLIT_TEXT_COLUMN) + padding / 2.0,
            padding + REM,
            1.8 * REM * scale,
        ),
        ViralLayout::BigType => {
            let title_size = 4.0 * REM * scale;
            let lines = state.title.lines().count().max(1) as f32;
            let block = lines * title_size * 1.1;
            (Anchor::Middle, width / 2.0, (height - block) / 2.0 - REM, title_size)
        }
    };

    if matches!(layout, ViralLayout::Diagonal) {
        svg.push_str(&format!(
            r#"<g transform="rotate(-8 {cx:.2} {cy:.2})">"#,
            cx = width / 2.0,
            cy = height / 2.0
        ));
    }

    let title = TextLayer {
        text: &state.title,
        x: text_x,
        top: header_top,
        font_size: title_size,
        line_height: 1.1,
        weight: 700,
        color: &state.title_color,
        anchor,
        opacity: 1.0,
    };
    title.write_svg(svg);

    let subtitle = TextLayer {
        text: &state.subtitle,
        x: text_x,
        top: title.bottom() + 1.5 * REM * 0.6,
        font_size: 0.9 * REM * scale,
        line_height: 1.4,
        weight: 500,
        color: &state.subtitle_color,
        anchor,
        opacity: 0.9,
    };
    subtitle.write_svg(svg);

    if matches!(layout, ViralLayout::Diagonal) {
        svg.push_str("</g>");
    }

    let footer_center = match layout {
        ViralLayout::Split => width * (1.0 - SPLIT_TEXT_COLUMN / 2.0),
        _ => width / 2.0,
    };
    write_footer_chip(svg, state, footer_center, height - padding - REM * 0.5);
}

/// SVG description of the composite, in logical pixels.
pub fn compose_svg(state: &CoverState, background: &str) -> String {
    let (width, height) = canvas_size(state);
    let (w, h) = (width as f32, height as f32);
    let mut svg = String::with_capacity(background.len() + 4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    ));
    svg.push_str(&format!(
        r#"<defs><clipPath id="frame"><rect width="{width}" height="{height}" rx="{CORNER_RADIUS}" ry="{CORNER_RADIUS}"/></clipPath></defs><g clip-path="url(#frame)">"#
    ));
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        state.theme_mode.canvas_color()
    ));
    svg.push_str(&format!(
        r#"<image x="0" y="0" width="{width}" height="{height}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/>"#,
        encode_double_quoted_attribute(background)
    ));
    write_text_layers(&mut svg, state, w, h);
    svg.push_str("</g></svg>");
    svg
}

/// Owns the font database; build once and share.
#[derive(Clone)]
pub struct Exporter {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Exporter {
    /// Loads system fonts plus any font files in `font_dir`.
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = font_dir {
            db.load_fonts_dir(dir);
        }
        debug!("Exporter loaded {} font faces", db.len());
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Renders the composite to PNG bytes at [`EXPORT_SCALE`].
    pub fn render_png(&self, state: &CoverState) -> Result<Vec<u8>, ExportError> {
        let background = state.generated_image.as_deref().ok_or(ExportError::NoImage)?;
        let bytes = DataUri::parse(background)
            .and_then(|uri| uri.bytes())
            .map_err(ExportError::Background)?;
        match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::WebP) => {}
            _ => return Err(ExportError::UnsupportedBackground),
        }

        let svg = compose_svg(state, background);
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree =
            usvg::Tree::from_str(&svg, &options).map_err(|err| ExportError::Svg(err.to_string()))?;

        let (width, height) = canvas_size(state);
        let out_width = (width as f32 * EXPORT_SCALE).round() as u32;
        let out_height = (height as f32 * EXPORT_SCALE).round() as u32;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(out_width, out_height).ok_or(
            ExportError::Allocation {
                width: out_width,
                height: out_height,
            },
        )?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(EXPORT_SCALE, EXPORT_SCALE),
            &mut pixmap.as_mut(),
        );

        let rgba: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect();
        let buffer = image::RgbaImage::from_raw(out_width, out_height, rgba).ok_or(
            ExportError::Allocation {
                width: out_width,
                height: out_height,
            },
        )?;
        let mut output = Vec::new();
        image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
            .map_err(|err| ExportError::Encode(err.to_string()))?;
        Ok(output)
    }

    /// Renders and names the file.
    pub fn export(&self, state: &CoverState) -> Result<ExportedPng, ExportError> {
        let bytes = self.render_png(state)?;
        let file_name = export_file_name(chrono::Utc::now().timestamp_millis());
        info!("Exported {} ({} bytes)", file_name, bytes.len());
        Ok(ExportedPng { file_name, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::{AspectRatio, CoverAction, reduce};
    use crate::datauri::{encode, tiny_png};

    static EXPORTER: LazyLock<Exporter> = LazyLock::new(|| Exporter::new(None));

    fn with_background(state: CoverState) -> CoverState {
        let png = tiny_png(4, 4, [10, 200, 30, 255]);
        reduce(
            state,
            CoverAction::SetGeneratedImage(Some(encode("image/png", &png))),
        )
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert!(is_light_color("#ffffff"));
        assert!(!is_light_color("#000000"));
        assert!(!is_light_color("nonsense"));
    }

    #[test]
    fn file_name_pattern() {
        assert_eq!(export_file_name(1_700_000_000_000), "HeroShot-1700000000000.png");
    }

    #[test]
    fn svg_escapes_user_text_and_splits_title_lines() {
        let state = reduce(
            CoverState::default(),
            CoverAction::SetTitle("Fish & <Chips>\nline two".to_string()),
        );
        let svg = compose_svg(&state, "data:image/png;base64,AAAA");
        assert!(svg.contains("Fish &amp; &lt;Chips&gt;"));
        assert!(svg.contains(">line two</tspan>"));
        // white footer text gets a black chip
        assert!(svg.contains(r##"fill="#000000"/>"##));
    }

    #[test]
    fn missing_background_is_an_error() {
        let exporter = &*EXPORTER;
        assert!(matches!(
            exporter.render_png(&CoverState::default()),
            Err(ExportError::NoImage)
        ));
        let state = reduce(
            CoverState::default(),
            CoverAction::SetGeneratedImage(Some(encode("image/png", b"not really a png"))),
        );
        assert!(matches!(
            exporter.render_png(&state),
            Err(ExportError::UnsupportedBackground)
        ));
    }

    #[test]
    fn renders_at_twice_the_canvas_size() {
        let exporter = &*EXPORTER;
        for ratio in [AspectRatio::Portrait, AspectRatio::Wide235] {
            let state = with_background(reduce(
                CoverState::default(),
                CoverAction::SetAspectRatio(ratio),
            ));
            let png = exporter.render_png(&state).expect("render");
            let decoded = image::load_from_memory(&png).expect("decode export");
            let (w, h) = canvas_size(&state);
            assert_eq!(decoded.width(), w * 2);
            assert_eq!(decoded.height(), h * 2);
        }
    }

    #[test]
    fn corners_stay_transparent() {
        let exporter = &*EXPORTER;
        let state = with_background(CoverState::default());
        let png = exporter.render_png(&state).expect("render");
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        let center = decoded.get_pixel(decoded.width() / 2, decoded.height() / 2).0;
        assert_eq!(center[3], 255);
    }

    #[test]
    fn every_layout_produces_valid_svg() {
        let options = usvg::Options::default();
        for layout in ViralLayout::ALL {
            let state = [
                CoverAction::SetToolMode(ToolMode::ViralCover),
                CoverAction::SetViralLayout(layout),
            ]
            .into_iter()
            .fold(CoverState::default(), reduce);
            let svg = compose_svg(&state, "data:image/png;base64,AAAA");
            assert!(usvg::Tree::from_str(&svg, &options).is_ok(), "{layout:?}");
        }
    }
}
