mod common;

use paperpress::{Error, LayoutOptions, PageGeometry, render, render_with};

fn assert_invalid(geometry: PageGeometry) {
    let paper = common::paper("Geometry", "abstract");
    match render(&paper, &[], &geometry) {
        Err(Error::InvalidGeometry(_)) => {}
        other => panic!("expected InvalidGeometry for {geometry:?}, got {other:?}"),
    }
}

#[test]
fn a4_defaults() {
    let g = PageGeometry::default();
    assert_eq!(g, PageGeometry::a4());
    assert_eq!((g.page_width, g.page_height, g.margin), (210.0, 297.0, 25.0));
    assert_eq!(
        (g.title_font_size, g.section_heading_font_size, g.body_font_size),
        (24.0, 14.0, 11.0)
    );
    assert_eq!(g.content_width(), 160.0);
    assert_eq!(g.usable_height(), 247.0);
    assert_eq!(g.max_y(), 272.0);
    assert!(g.validate().is_ok());
}

#[test]
fn non_positive_fields_are_rejected() {
    let base = PageGeometry::a4();
    for value in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert_invalid(PageGeometry { page_width: value, ..base });
        assert_invalid(PageGeometry { page_height: value, ..base });
        assert_invalid(PageGeometry { margin: value, ..base });
        assert_invalid(PageGeometry { title_font_size: value, ..base });
        assert_invalid(PageGeometry { section_heading_font_size: value, ..base });
        assert_invalid(PageGeometry { body_font_size: value, ..base });
    }
}

#[test]
fn margins_must_leave_content_area() {
    let base = PageGeometry::a4();
    assert_invalid(PageGeometry { margin: 105.0, ..base });
    assert_invalid(PageGeometry { margin: 150.0, ..base });
    assert_invalid(PageGeometry {
        page_width: 400.0,
        page_height: 40.0,
        margin: 20.0,
        ..base
    });
}

#[test]
fn line_taller_than_page_is_rejected() {
    assert_invalid(PageGeometry {
        body_font_size: 1000.0,
        ..PageGeometry::a4()
    });
}

#[test]
fn character_wider_than_content_is_rejected() {
    assert_invalid(PageGeometry {
        page_width: 55.0,
        margin: 25.0,
        ..PageGeometry::a4()
    });
}

#[test]
fn negative_spacing_options_are_rejected() {
    let paper = common::paper("Options", "");
    let fonts = paperpress::FontSet::helvetica();
    for options in [
        LayoutOptions { line_height_factor: 0.0, ..LayoutOptions::default() },
        LayoutOptions { title_gap: -1.0, ..LayoutOptions::default() },
        LayoutOptions { block_gap: f32::NAN, ..LayoutOptions::default() },
    ] {
        let result = render_with(&paper, &[], &PageGeometry::a4(), &options, &fonts);
        assert!(matches!(result, Err(Error::InvalidGeometry(_))), "{options:?}");
    }
}

#[test]
fn custom_page_size_is_respected() {
    let letter = PageGeometry {
        page_width: 215.9,
        page_height: 279.4,
        margin: 20.0,
        ..PageGeometry::a4()
    };
    let paper = common::paper("Letter", &common::lorem(2000));
    let sections = vec![common::section("Body", &common::lorem(12000), 1)];
    let doc = render(&paper, &sections, &letter).expect("render");
    assert_eq!(doc.geometry, letter);
    common::assert_within_margins(&doc);
}
