//! End-to-end tests over real PDF manuals.

mod common;

use lopdf::dictionary;
use common::{build_manual, three_page_manual, widths, FixtureImage, FixturePage, PAGE_HEIGHT};
use teardown::render::{step_images_prompt_json, to_json};
use teardown::{
    extract_directory, process_manual, DocumentBackend, Error, ExtractOptions, InputKind,
    JsonFormat, LopdfBackend, ManualParser, Teardown,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn test_page_view_from_pdf() {
    let backend = LopdfBackend::load_bytes(&build_manual(three_page_manual())).unwrap();
    assert_eq!(backend.page_count(), 3);
    assert_eq!(backend.page_height(2).unwrap(), PAGE_HEIGHT);

    let page = backend.load_page(0).unwrap();
    assert!(page.text().contains("Step 1: Remove the top cover"));

    let hits = page.search_for("Step 1: Remove the top cover");
    assert_eq!(hits.len(), 1);
    assert!(approx(hits[0].y0, 200.0));
    assert!(approx(hits[0].y1, 212.0));

    assert_eq!(page.images().len(), 1);
    let bbox = page.images()[0].bbox;
    assert!(approx(bbox.x0, 50.0) && approx(bbox.x1, 150.0));
    assert!(approx(bbox.y0, 300.0) && approx(bbox.y1, 400.0));
}

#[test]
fn test_images_keep_stream_order() {
    let backend = LopdfBackend::load_bytes(&build_manual(three_page_manual())).unwrap();
    let page = backend.load_page(1).unwrap();
    let names: Vec<_> = page.images().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["ImB", "ImC", "ImD"]);
}

#[test]
fn test_images_drawn_inside_forms() {
    let pages = vec![FixturePage::new()
        .line("Step 1: Unscrew the lid", 200.0)
        .image(FixtureImage::at("ImA", 3, 300.0, 400.0).in_form())
        .image(FixtureImage::at("ImB", 4, 420.0, 500.0))];
    let backend = LopdfBackend::load_bytes(&build_manual(pages)).unwrap();

    let page = backend.load_page(0).unwrap();
    let names: Vec<_> = page.images().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["ImA", "ImB"]);
    let bbox = page.images()[0].bbox;
    assert!(approx(bbox.x0, 50.0) && approx(bbox.x1, 150.0));
    assert!(approx(bbox.y0, 300.0) && approx(bbox.y1, 400.0));

    let dir = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new().with_output_dir(dir.path());
    let parser = ManualParser::from_bytes_with_options(&build_manual(vec![FixturePage::new()
        .line("Step 1: Unscrew the lid", 200.0)
        .image(FixtureImage::at("ImA", 3, 300.0, 400.0).in_form())]), options)
    .unwrap();
    let steps = parser.step_images().unwrap();
    assert_eq!(widths(steps.get("Step 1").unwrap()), [3]);
}

#[test]
fn test_caption_beside_marker_keeps_marker() {
    let pages = vec![FixturePage::new()
        .line("Step 1: Open the case", 200.0)
        .line_at("Fig. 3", 40.0, 400.0)
        .line_at("Step 2: Lift the pack", 320.0, 400.0)];
    let parser = ManualParser::from_bytes(&build_manual(pages)).unwrap();

    let page = parser.backend().load_page(0).unwrap();
    let texts: Vec<_> = page.lines().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["Step 1: Open the case", "Fig. 3", "Step 2: Lift the pack"]);

    let boundaries = parser.step_boundaries().unwrap();
    let labels: Vec<_> = boundaries.labels().map(|l| l.as_str()).collect();
    assert_eq!(labels, ["Step 1", "Step 2"]);
    assert!(approx(boundaries.get("Step 1").unwrap().end_y(), 400.0));
}

#[test]
fn test_crop_box_defines_visible_page() {
    let pages = vec![FixturePage::new()
        .crop_box([0, 100, 600, 700])
        .line("Step 1: Remove the shroud", 160.0)
        .image(FixtureImage::at("ImA", 2, 150.0, 250.0))];
    let backend = LopdfBackend::load_bytes(&build_manual(pages)).unwrap();

    assert_eq!(backend.page_height(0).unwrap(), 600.0);
    let page = backend.load_page(0).unwrap();
    assert_eq!(page.height(), 600.0);
    let bbox = page.images()[0].bbox;
    assert!(approx(bbox.y0, 50.0) && approx(bbox.y1, 150.0));
    assert!(approx(page.search_for("Step 1:")[0].y0, 60.0));
}

#[test]
fn test_full_manual_attribution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.pdf");
    std::fs::write(&path, build_manual(three_page_manual())).unwrap();

    let options = ExtractOptions::new().with_output_dir(dir.path().join("images"));
    let manual = process_manual(&path, &options).unwrap();

    assert!(matches!(manual.kind, InputKind::Pdf(ref f) if f.version == "1.5"));
    let labels: Vec<_> = manual.step_images.labels().map(|l| l.as_str()).collect();
    assert_eq!(labels, ["Step 1", "Step 2"]);

    assert_eq!(widths(manual.step_images.get("Step 1").unwrap()), [1, 3]);
    // image 5 is a JPEG, re-encoded as PNG
    assert_eq!(widths(manual.step_images.pictures_for_step(2).unwrap()), [4, 5]);

    let main = manual.main_image.as_ref().unwrap();
    assert_eq!(widths(std::slice::from_ref(main)), [3]);

    for image in manual.step_images.all_images() {
        assert!(image.starts_with(dir.path().join("images")));
        assert_eq!(image.extension().unwrap(), "png");
    }
}

#[test]
fn test_boundaries_from_pdf() {
    let parser = ManualParser::from_bytes(&build_manual(three_page_manual())).unwrap();
    let boundaries = parser.step_boundaries().unwrap();

    let step1 = boundaries.get("Step 1").unwrap();
    assert_eq!((step1.start_page(), step1.end_page()), (0, 1));
    assert!(approx(step1.start_y(), 200.0) && approx(step1.end_y(), 500.0));

    let step2 = boundaries.get("Step 2").unwrap();
    assert_eq!((step2.start_page(), step2.end_page()), (1, 2));
    assert!(approx(step2.end_y(), 400.0));
}

#[test]
fn test_manual_without_terminal_marker() {
    let pages = vec![
        FixturePage::new().line("Step 1: Open the case", 200.0),
        FixturePage::new()
            .image(FixtureImage::at("ImA", 7, 300.0, 400.0))
            .image(FixtureImage::at("ImB", 8, 700.0, 780.0)),
    ];
    let parser = ManualParser::from_bytes(&build_manual(pages)).unwrap();

    let boundaries = parser.step_boundaries().unwrap();
    let step1 = boundaries.get("Step 1").unwrap();
    assert_eq!((step1.end_page(), step1.end_y()), (1, PAGE_HEIGHT));
}

#[test]
fn test_teardown_builder_on_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let manual = Teardown::new()
        .with_output_dir(dir.path())
        .with_header_margin_ratio(0.0)
        .strict()
        .parse_bytes(&build_manual(three_page_manual()))
        .unwrap();

    // Without bands the header image of page 1 joins Step 1 and becomes the main image
    assert_eq!(widths(manual.step_images.get("Step 1").unwrap()), [1, 2, 3]);
    assert_eq!(widths(std::slice::from_ref(manual.main_image.as_ref().unwrap())), [2]);
}

#[test]
fn test_single_page_manual_has_no_main_image() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![FixturePage::new()
        .line("Step 1: Open the case", 200.0)
        .image(FixtureImage::at("ImA", 3, 300.0, 400.0))];

    let manual = Teardown::new()
        .with_output_dir(dir.path())
        .parse_bytes(&build_manual(pages))
        .unwrap();
    assert!(manual.main_image.is_none());
    assert_eq!(manual.main_image_link(), "");
    assert_eq!(manual.step_images.image_count(), 1);
}

#[test]
fn test_empty_document() {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.add_object(lopdf::dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<lopdf::Object>::new(),
        "Count" => 0i64,
    });
    let catalog_id = doc.add_object(lopdf::dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();

    assert!(matches!(
        ManualParser::from_bytes(&buf),
        Err(Error::EmptyDocument)
    ));
}

#[test]
fn test_directory_batch() {
    let dir = tempfile::tempdir().unwrap();
    let manuals_dir = dir.path().join("docs");
    std::fs::create_dir_all(manuals_dir.join("model-b")).unwrap();
    std::fs::write(manuals_dir.join("a.pdf"), build_manual(three_page_manual())).unwrap();
    std::fs::write(
        manuals_dir.join("model-b/b.pdf"),
        build_manual(vec![FixturePage::new().line("Step 1: Only step", 200.0)]),
    )
    .unwrap();
    std::fs::write(manuals_dir.join("model-b/b.csv"), "Step,Text\n1,Only step\n").unwrap();

    let options = ExtractOptions::new().with_output_dir(dir.path().join("images"));
    let manuals = extract_directory(&manuals_dir, &options).unwrap();
    assert_eq!(manuals.len(), 2);

    let a = &manuals[&manuals_dir.join("a.pdf")];
    assert_eq!(a.step_images.len(), 2);
    let b = &manuals[&manuals_dir.join("model-b/b.pdf")];
    assert_eq!(b.step_images.image_count(), 0);
    assert_eq!(b.main_image_link(), "");
}

#[test]
fn test_json_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let manual = Teardown::new()
        .with_output_dir(dir.path())
        .parse_bytes(&build_manual(three_page_manual()))
        .unwrap();

    let prompt: serde_json::Value = serde_json::from_str(
        &step_images_prompt_json(&manual.step_images, JsonFormat::Compact).unwrap(),
    )
    .unwrap();
    let keys: Vec<_> = prompt.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["Step 1", "Step 2"]);
    assert_eq!(prompt["Step 2"].as_array().unwrap().len(), 2);
    assert!(prompt["Step 1"][0]["link"].as_str().unwrap().ends_with(".png"));

    let full: serde_json::Value =
        serde_json::from_str(&to_json(&manual, JsonFormat::Pretty).unwrap()).unwrap();
    assert_eq!(full["kind"]["type"], "pdf");
    assert!(full["main_image"].as_str().unwrap().ends_with(".png"));
}
