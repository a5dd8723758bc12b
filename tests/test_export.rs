use std::io::Cursor;
use std::sync::LazyLock;

use heroshot::cover::{AspectRatio, CoverAction, CoverState, ToolMode, ViralLayout, reduce};
use heroshot::datauri::encode;
use heroshot::export::{ExportError, Exporter, compose_svg, export_file_name};

/// Font discovery is slow, so every test shares one exporter.
static EXPORTER: LazyLock<Exporter> = LazyLock::new(|| Exporter::new(None));

fn background_png() -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(16, 9, image::Rgba([30, 60, 200, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn cover_with(actions: Vec<CoverAction>) -> CoverState {
    let mut actions = actions;
    actions.push(CoverAction::SetGeneratedImage(Some(encode(
        "image/png",
        &background_png(),
    ))));
    actions.into_iter().fold(CoverState::default(), reduce)
}

#[test]
fn exports_every_ratio_at_double_size() {
    let exporter = &*EXPORTER;
    for ratio in AspectRatio::ALL {
        let state = cover_with(vec![CoverAction::SetAspectRatio(ratio)]);
        let exported = exporter.export(&state).expect("export");
        assert!(exported.file_name.starts_with("HeroShot-"));
        assert!(exported.file_name.ends_with(".png"));

        let decoded = image::load_from_memory(&exported.bytes).expect("png");
        let expected_height = (600.0 / ratio.ratio()).round() as u32 * 2;
        assert_eq!(decoded.width(), 1200, "{ratio}");
        assert_eq!(decoded.height(), expected_height, "{ratio}");
    }
}

#[test]
fn cover_layouts_place_text_differently() {
    let svgs: Vec<String> = ViralLayout::ALL
        .into_iter()
        .map(|layout| {
            let state = [
                CoverAction::SetToolMode(ToolMode::ViralCover),
                CoverAction::SetViralLayout(layout),
            ]
            .into_iter()
            .fold(CoverState::default(), reduce);
            compose_svg(&state, "data:image/png;base64,AA==")
        })
        .collect();
    for (index, svg) in svgs.iter().enumerate() {
        for other in &svgs[index + 1..] {
            assert_ne!(svg, other);
        }
    }
    assert!(svgs[2].contains("rotate(-8"));
}

#[test]
fn export_without_background_fails_cleanly() {
    let exporter = &*EXPORTER;
    let err = exporter
        .export(&CoverState::default())
        .expect_err("no background yet");
    assert!(matches!(err, ExportError::NoImage));
    assert_eq!(export_file_name(42), "HeroShot-42.png");
}
