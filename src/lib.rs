pub mod auth;
pub mod editor;
mod error;
pub mod export;
pub mod fonts;
pub mod generation;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod status;
pub mod store;

pub use error::{Error, Result};
pub use export::{DirectorySaver, FileSaver, download_filename, generate};
pub use fonts::FontSet;
pub use layout::{Document, render, render_with};
pub use model::{LayoutOptions, PageGeometry, Paper, Section, TitleLines, sort_sections};

use std::path::Path;
use std::time::Instant;

/// Read a paper from a JSON file, render it with its sections in order, and save the PDF
/// into `out_dir` under its download name. Returns the written path.
pub fn convert_paper_json_to_pdf(
    input: &Path,
    out_dir: &Path,
    geometry: &PageGeometry,
    options: &LayoutOptions,
    fonts: &FontSet,
) -> Result<std::path::PathBuf> {
    let t0 = Instant::now();

    let paper: Paper = serde_json::from_slice(&std::fs::read(input)?)?;
    let sections = paper.ordered_sections();
    let t_parse = t0.elapsed();

    let mut saver = DirectorySaver::new(out_dir);
    generate(&paper, &sections, geometry, options, fonts, true, &mut saver)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render+write={:.1}ms, total={:.1}ms",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
    );

    Ok(out_dir.join(download_filename(&paper.title)))
}
