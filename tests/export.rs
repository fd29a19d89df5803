use image::{Rgba, RgbaImage};
use ninepatchfe::codec::{self, ChunkType, MetadataBlock};
use ninepatchfe::drag::{DragController, PointerEvent};
use ninepatchfe::geometry::{GeometryModel, Guide};
use ninepatchfe::io::SaveFormat;
use ninepatchfe::ops::compositor::{self, Interpolation};
use ninepatchfe::ops::export::{self, ExportError, ExportMode};
use ninepatchfe::session::Session;
use ninepatchfe::transform::DisplayTransform;

fn button() -> RgbaImage {
    RgbaImage::from_fn(100, 100, |x, y| Rgba([(x * 2) as u8, (y * 2) as u8, 128, 255]))
}

fn button_guides() -> GeometryModel {
    GeometryModel::with_guides(100, 100, (40, 60), (40, 60), (10, 90), (10, 90))
}

fn guide_columns(img: &RgbaImage, row: u32) -> Vec<u32> {
    (0..img.width()).filter(|&x| *img.get_pixel(x, row) == Rgba([0, 0, 0, 255])).collect()
}

#[test]
fn guide_border_export_decodes_with_guides_on_the_border() {
    let bytes = export::export(
        Some(&button()),
        Some(&button_guides()),
        ExportMode::GuideBorder,
        SaveFormat::Png,
    )
    .unwrap();
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (102, 102));
    assert_eq!(guide_columns(&img, 0), (41..61).collect::<Vec<_>>());
    assert_eq!(guide_columns(&img, 101), (11..91).collect::<Vec<_>>());
    assert_eq!(img.get_pixel(1, 1), button().get_pixel(0, 0));
}

#[test]
fn compiled_export_round_trips_through_the_codec() {
    let bytes = export::export_compiled(&button(), &button_guides()).unwrap();
    let block = codec::read_metadata(&bytes).unwrap().unwrap();
    assert_eq!(
        block,
        MetadataBlock {
            stretch_left: 40,
            stretch_right: 40,
            stretch_top: 40,
            stretch_bottom: 40,
            pad_left: 10,
            pad_right: 10,
            pad_top: 10,
            pad_bottom: 10,
        }
    );
    let restored = GeometryModel::from_metadata(100, 100, &block);
    assert_eq!(restored, button_guides());

    // every other chunk is carried over in order
    let plain = ninepatchfe::io::encode_png(&button()).unwrap();
    let before: Vec<ChunkType> = codec::extract_chunks(&plain).unwrap().iter().map(|c| c.name).collect();
    let after: Vec<ChunkType> = codec::extract_chunks(&bytes)
        .unwrap()
        .iter()
        .map(|c| c.name)
        .filter(|n| *n != ChunkType::NPTC)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn exports_need_an_image() {
    let err = export::export(None, None, ExportMode::Compiled, SaveFormat::Png).unwrap_err();
    assert!(matches!(err, ExportError::MissingInput(_)));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn dragging_end_past_start_clamps_to_one_pixel() {
    let mut geometry = button_guides();
    let transform = DisplayTransform::new(100, 100, 1.0, 620.0);
    let mut drag = DragController::new();

    // stretch-x end handle sits at 260 + 60
    drag.handle_event(PointerEvent::Down { x: 320.0, y: 262.0 }, &mut geometry, &transform);
    assert!(drag.is_dragging());
    drag.handle_event(PointerEvent::Move { x: 270.0, y: 262.0 }, &mut geometry, &transform);
    drag.handle_event(PointerEvent::Up, &mut geometry, &transform);

    assert_eq!(geometry.h_stretch(), Guide { start: 40, end: 41 });
}

#[test]
fn session_preview_matches_direct_composition() {
    let mut session = Session::new();
    session.load(button(), None, 620.0);
    let geometry = session.geometry().unwrap().clone();
    let a = compositor::compose(session.source().unwrap(), &geometry, 2.0, 3.0, Interpolation::Bicubic);
    let b = compositor::compose(&button(), &geometry, 2.0, 3.0, Interpolation::Bicubic);
    assert_eq!(a, b);
    assert_eq!(a.dimensions(), compositor::composed_size(&geometry, 2.0, 3.0));
}

#[test]
fn cli_writes_nine_patch_files() {
    use clap::Parser;
    use ninepatchfe::cli::{self, CliArgs};

    let dir = std::env::temp_dir().join(format!("ninepatchfe_cli_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("button.png");
    std::fs::write(&input, ninepatchfe::io::encode_png(&button()).unwrap()).unwrap();
    let out_dir = dir.join("out");

    let args = CliArgs::try_parse_from([
        "ninepatchfe",
        "-i",
        input.to_str().unwrap(),
        "--mode",
        "compiled",
        "--stretch-x",
        "40,60",
        "--stretch-y",
        "40,60",
        "--output-dir",
        out_dir.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(cli::run(args), std::process::ExitCode::SUCCESS);

    let written = std::fs::read(out_dir.join("button.9.png")).unwrap();
    let block = codec::read_metadata(&written).unwrap().unwrap();
    assert_eq!((block.stretch_left, block.stretch_right), (40, 40));
    assert_eq!((block.pad_left, block.pad_right), (10, 10));

    let missing = CliArgs::try_parse_from(["ninepatchfe", "-i", dir.join("nope-*.png").to_str().unwrap()]).unwrap();
    assert_eq!(cli::run(missing), std::process::ExitCode::FAILURE);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cli_batch_composites_and_tints_in_one_pass() {
    use clap::Parser;
    use ninepatchfe::cli::{self, CliArgs};

    let dir = std::env::temp_dir().join(format!("ninepatchfe_batch_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let icon = dir.join("icon.png");
    let bg = dir.join("bg.png");
    std::fs::write(&icon, ninepatchfe::io::encode_png(&RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 255]))).unwrap())
        .unwrap();
    std::fs::write(&bg, ninepatchfe::io::encode_png(&RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]))).unwrap())
        .unwrap();
    let out_dir = dir.join("out");

    let args = CliArgs::try_parse_from([
        "ninepatchfe",
        "-i",
        icon.to_str().unwrap(),
        "--mode",
        "batch",
        "--background",
        bg.to_str().unwrap(),
        "--icon-scale",
        "0.5",
        "--color",
        "#ffffff",
        "--opacity",
        "0.5",
        "--filter",
        "nearest",
        "--output-dir",
        out_dir.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(cli::run(args), std::process::ExitCode::SUCCESS);

    let out = image::open(out_dir.join("icon.png")).unwrap().to_rgba8();
    assert_eq!(out.dimensions(), (192, 192));
    assert_eq!(*out.get_pixel(96, 96), Rgba([128, 128, 255, 255]));
    assert_eq!(*out.get_pixel(5, 5), Rgba([128, 128, 128, 255]));

    let _ = std::fs::remove_dir_all(&dir);
}
