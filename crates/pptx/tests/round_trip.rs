//! Build → parse → render → read back.

use deck_core::{DiagramSpec, Presentation, Slide, SlideKind, BRAND, WHITE};
use deck_html::{MarkupBuilder, MarkupParser};
use deck_pptx::{DeckRenderer, DiagramRenderer, PptxReader};
use std::path::Path;

fn render_and_read(presentation: &Presentation, dir: &Path) -> deck_core::ExtractedDeck {
    let path = dir.join("presentation_test.pptx");
    let written = DeckRenderer::new().render_to_path(presentation, &path).unwrap();
    assert_eq!(written, path);
    PptxReader::new().read_path(&path).unwrap()
}

/// Text blocks of a slide without the chrome (wordmark and position).
fn body_lines(slide: &deck_core::ExtractedSlide) -> Vec<String> {
    let total_suffix = " / ";
    slide
        .non_empty_lines()
        .into_iter()
        .filter(|l| *l != BRAND.wordmark && !l.contains(total_suffix))
        .map(str::to_string)
        .collect()
}

#[test]
fn test_cloud_deck_renders_two_slides() {
    let dir = tempfile::tempdir().unwrap();
    let mut deck = Presentation::new("Cloud");
    deck.add_slide(Slide::title("Cloud", ""));
    deck.add_slide(Slide::content("Benefits", ["Fast", "Secure", "Scalable"]));

    let read = render_and_read(&deck, dir.path());
    assert_eq!(read.slides.len(), 2);

    assert_eq!(read.slides[0].background.as_deref(), Some(BRAND.primary.hex().as_str()));
    assert!(read.slides[0].contains_text("Cloud"));

    assert_eq!(read.slides[1].background.as_deref(), Some(WHITE.hex().as_str()));
    assert_eq!(body_lines(&read.slides[1]), vec!["Benefits", "Fast\nSecure\nScalable"]);
    assert!(read.slides[1].contains_text("2 / 2"));
}

#[test]
fn test_comparison_bisection_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut deck = Presentation::new("Compare");
    deck.add_slide(Slide::comparison("Options", ["A", "B", "C", "D", "E"]));

    let read = render_and_read(&deck, dir.path());
    // Left column sits left of the right column at the same height
    assert_eq!(body_lines(&read.slides[0]), vec!["Options", "A\nB", "C\nD\nE"]);
}

#[test]
fn test_slide_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let mut deck = Presentation::new("Order");
    for i in 0..12 {
        deck.add_slide(Slide::section(format!("Part {}", i)));
    }

    let read = render_and_read(&deck, dir.path());
    assert_eq!(read.slides.len(), 12);
    for (i, slide) in read.slides.iter().enumerate() {
        assert_eq!(slide.number, i + 1);
        assert_eq!(body_lines(slide), vec![format!("Part {}", i)]);
        assert!(slide.contains_text(&format!("{} / 12", i + 1)));
    }
}

#[test]
fn test_markup_round_trip_preserves_structure() {
    let dir = tempfile::tempdir().unwrap();
    let mut original = Presentation::new("Migration").with_subtitle("Plan");
    original.add_slide(Slide::title("Migration", "Plan"));
    original.add_slide(Slide::section("Context"));
    original.add_slide(Slide::content("Benefits", ["Fast", "↳ Cached", "Secure"]).with_notes("icon"));
    original.add_slide(Slide::comparison("Before / After", ["Manual", "Slow", "Automated", "Quick"]));
    original.add_slide(Slide::conclusion("Next steps", ["Pilot", "Measure"]));
    original.add_slide(Slide::content("", Vec::<String>::new()));

    let markup = MarkupBuilder::new().build(&original).unwrap();
    let parsed = MarkupParser::new().parse(&markup);

    assert_eq!(parsed.slide_count(), original.slide_count());
    assert_eq!(parsed.kinds(), original.kinds());
    for (a, b) in parsed.slides.iter().zip(&original.slides) {
        assert_eq!(a.title, b.title);
        assert_eq!(a.bullets().is_empty(), b.bullets().is_empty());
    }

    let read = render_and_read(&parsed, dir.path());
    assert_eq!(read.slides.len(), original.slide_count());
    for (slide, source) in read.slides.iter().zip(&original.slides) {
        if !source.title.is_empty() {
            assert!(slide.contains_text(&source.title), "missing title {:?}", source.title);
        }
        let expected_background = match source.kind() {
            SlideKind::Title => BRAND.primary,
            SlideKind::Section => BRAND.secondary,
            SlideKind::Conclusion => BRAND.dark,
            SlideKind::Content | SlideKind::Comparison => WHITE,
        };
        assert_eq!(slide.background.as_deref(), Some(expected_background.hex().as_str()));
    }
}

#[test]
fn test_empty_presentation_writes_valid_package() {
    let dir = tempfile::tempdir().unwrap();
    let read = render_and_read(&Presentation::default(), dir.path());
    assert!(read.slides.is_empty());
}

#[test]
fn test_render_into_missing_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.pptx");
    let mut deck = Presentation::new("x");
    deck.add_slide(Slide::section("Only"));
    DeckRenderer::new().render_to_path(&deck, &path).unwrap();
    assert!(path.is_file());
    // No stray temporary files next to the output
    let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_diagram_renders_one_editable_slide() {
    let dir = tempfile::tempdir().unwrap();
    let spec: DiagramSpec = serde_json::from_str(
        r#"{
            "title": "Order flow",
            "type": "process",
            "nodes": [
                {"id": "a", "label": "Checkout", "description": "Web & mobile", "position": {"x": 100, "y": 250}},
                {"id": "b", "label": "Payment", "type": "decision", "position": {"x": 400, "y": 250}},
                {"id": "c", "label": "Shipping", "type": "process", "position": {"x": 700, "y": 250}}
            ],
            "connections": [{"from": "a", "to": "b"}, {"from": "b", "to": "c", "label": "approved"}],
            "annotations": [{"text": "Average 3 minutes", "position": {"x": 700, "y": 450}}]
        }"#,
    )
    .unwrap();

    let path = dir.path().join("diagram_test.pptx");
    DiagramRenderer::new().render_to_path(&spec, &path).unwrap();
    let read = PptxReader::new().read_path(&path).unwrap();

    assert_eq!(read.slides.len(), 1);
    let slide = &read.slides[0];
    assert_eq!(slide.background.as_deref(), Some(WHITE.hex().as_str()));
    for text in ["Order flow", "Checkout\nWeb & mobile", "Payment", "Shipping", "approved", "Average 3 minutes"] {
        assert!(slide.contains_text(text), "missing {:?}", text);
    }
    assert!(slide.contains_text("1 / 1"));

    let bytes = std::fs::read(&path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("ppt/slides/slide1.xml").unwrap(), &mut xml).unwrap();
    assert_eq!(xml.matches("<p:cxnSp>").count(), 2);
    assert!(xml.contains(r#"prst="flowChartDecision""#));
}
