mod common;

use common::*;
use panelscan::PanelError;
use std::io::Write;

#[test]
fn blank_panel_yields_empty_report() -> anyhow::Result<()> {
    let img = blank_panel(1000, 700);
    let report = default_detector().detect(&load_via_file(&img))?;

    assert!(report.knobs.is_empty());
    assert!(report.labels.iter().all(|l| l.bbox.is_none()));
    assert!(report.meters.is_empty());
    assert!(report.features().is_empty());

    let text = report.render_text();
    assert!(text.contains("IMAGE_RES: 1000 x 700"));
    assert!(!text.contains("Center=("));
    assert!(!text.contains("center_x="));
    assert!(!text.contains("Meter #"));
    Ok(())
}

#[test]
fn missing_image_is_a_load_failure() {
    let err = panelscan::load_image(std::path::Path::new("/nonexistent/panel.png")).unwrap_err();
    assert!(matches!(err, PanelError::ImageLoad { .. }), "{err}");
}

#[test]
fn corrupt_image_is_a_load_failure() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile()?;
    file.write_all(b"definitely not a png")?;
    let err = panelscan::load_image(file.path()).unwrap_err();
    assert!(matches!(err, PanelError::ImageLoad { .. }), "{err}");
    Ok(())
}

#[test]
fn grayscale_input_is_accepted() -> anyhow::Result<()> {
    let mut img = blank_panel(1000, 700);
    draw_knob(&mut img, 206, 436, 83);
    let gray = image::DynamicImage::ImageRgb8(img).grayscale();

    let report = default_detector().detect(&gray)?;
    assert!(report.knobs.iter().any(|k| k.name == Some(KnobName::Threshold)));
    Ok(())
}

#[test]
fn debug_run_writes_every_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("stages");
    let mut img = blank_panel(400, 300);
    draw_knob(&mut img, 100, 200, 40);

    default_detector()
        .with_debug(out.clone())?
        .detect(&image::DynamicImage::ImageRgb8(img))?;

    for name in [
        "00_input.png",
        "01_grayscale.png",
        "02_median_blur.png",
        "03_edges.png",
        "04_label_threshold.png",
        "05_meter_threshold.png",
        "06_overlay.png",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }
    Ok(())
}

#[test]
fn debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    let err = default_detector()
        .with_debug(dir.path().to_path_buf())
        .err()
        .expect("non-empty dir rejected");
    assert!(matches!(err, PanelError::DebugDirNotEmpty(_)));
    Ok(())
}

#[test]
fn layout_file_overrides_defaults() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    write!(
        file,
        r#"{{ "labels": {{ "strategy": "fixed", "cutoff": 90 }}, "hough": {{ "min_dist": 120.0 }} }}"#
    )?;
    let layout = PanelLayout::from_json_file(file.path())?;
    assert_eq!(layout.labels.strategy, LabelStrategy::Fixed);
    assert_eq!(layout.labels.cutoff, 90);
    assert_eq!(layout.hough.min_dist, 120.0);
    assert_eq!(layout.hough.param2, 30);
    Ok(())
}

#[test]
fn malformed_layout_is_rejected() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    write!(file, "{{ not json")?;
    let err = PanelLayout::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, PanelError::LayoutParse { .. }));

    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    write!(file, r#"{{ "preprocess": {{ "median_aperture": 2 }} }}"#)?;
    let err = PanelLayout::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, PanelError::InvalidLayout(_)));
    Ok(())
}
