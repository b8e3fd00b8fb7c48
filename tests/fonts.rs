mod common;

use std::path::Path;

use paperpress::fonts::{FontEntry, Weight};
use paperpress::{Error, FontSet, LayoutOptions, PageGeometry, render_with};

static SYSTEM_FONTS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

fn system_font() -> Option<&'static Path> {
    SYSTEM_FONTS.iter().copied().map(Path::new).find(|p| p.exists())
}

#[test]
fn helvetica_widths_scale_with_size() {
    let font = FontEntry::helvetica();
    let at_10 = font.text_width("Hello", 10.0).expect("measure");
    let at_20 = font.text_width("Hello", 20.0).expect("measure");
    assert!(at_10 > 0.0);
    assert!((at_20 - 2.0 * at_10).abs() < 1e-3);
    assert_eq!(font.text_width("", 12.0).expect("measure"), 0.0);
    assert_eq!(font.space_width(10.0).expect("measure"), 2.78);
}

#[test]
fn base14_widths_match_the_core_metrics() {
    let regular = FontEntry::helvetica();
    let bold = FontEntry::helvetica_bold();
    let regular_cases = [
        ("%", 889.0),
        ("W", 944.0),
        ("@", 1015.0),
        ("_", 556.0),
        ("m", 833.0),
        ("i", 222.0),
        ("\u{2014}", 1000.0),
    ];
    for (text, expected) in regular_cases {
        assert_eq!(regular.text_width(text, 1000.0).expect("measure"), expected, "{text:?}");
    }
    for (text, expected) in [("@", 975.0), ("W", 944.0), ("m", 889.0), ("!", 333.0)] {
        assert_eq!(bold.text_width(text, 1000.0).expect("measure"), expected, "{text:?}");
    }
    assert_eq!(regular.text_width("95% WWWW", 1000.0).expect("measure"), 6055.0);
}

#[test]
fn bold_is_at_least_as_wide_as_regular() {
    let fonts = FontSet::helvetica();
    let text = "Methodology and Results";
    let regular = fonts.for_weight(Weight::Regular).text_width(text, 12.0).expect("measure");
    let bold = fonts.for_weight(Weight::Bold).text_width(text, 12.0).expect("measure");
    assert!(bold >= regular);
    assert_eq!(fonts.bold.family(), "Helvetica-Bold");
}

#[test]
fn garbage_font_data_is_rejected() {
    let result = FontEntry::from_data(b"definitely not a font".to_vec(), "junk", "F9");
    assert!(matches!(result, Err(Error::Font(_))));
}

#[test]
fn missing_font_file_is_an_io_error() {
    let result = FontSet::load(Some(Path::new("/nonexistent/font.ttf")), None);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn truetype_font_embeds_and_measures() {
    common::init_logging();
    let Some(path) = system_font() else {
        eprintln!("no system TrueType font found, skipping");
        return;
    };
    let fonts = FontSet::load(Some(path), Some(path)).expect("load");
    assert!(fonts.regular.text_width("Ωμέγα", 11.0).expect("measure") > 0.0);
    assert!(fonts.regular.ascender_ratio() > 0.5 && fonts.regular.ascender_ratio() < 1.2);

    let paper = common::paper("Ünïcödé Title", "Greek: Ωμέγα, math: ∑ ≤ ∞");
    let doc = render_with(
        &paper,
        &[common::section("Body", &common::lorem(3000), 1)],
        &PageGeometry::a4(),
        &LayoutOptions::default(),
        &fonts,
    )
    .expect("render");
    let bytes = paperpress::pdf::write(&doc, &fonts).expect("write");
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.windows(b"/FontFile2".len()).any(|w| w == b"/FontFile2"));
    assert!(bytes.windows(b"/ToUnicode".len()).any(|w| w == b"/ToUnicode"));
}
