use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fonts::FontSet;
use crate::layout;
use crate::model::{LayoutOptions, PageGeometry, Paper, Section};
use crate::pdf;

/// Destination for a downloaded PDF.
pub trait FileSaver {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<()>;
}

/// Saves downloads as files inside a directory.
pub struct DirectorySaver {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in order.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        self.saved.push(path);
        Ok(())
    }
}

/// Download file name for a paper title: lowercased, whitespace runs and path separators
/// replaced by `-`, with a `.pdf` extension. The title is trimmed first, so leading and
/// trailing whitespace never becomes a `-`, and a blank title gives `untitled.pdf`
/// rather than `.pdf`.
pub fn download_filename(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    if lowered.is_empty() {
        return "untitled.pdf".to_string();
    }
    let mut slug = String::with_capacity(lowered.len() + 4);
    let mut in_ws = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                slug.push('-');
            }
            in_ws = true;
            continue;
        }
        in_ws = false;
        slug.push(if matches!(ch, '/' | '\\') { '-' } else { ch });
    }
    slug.push_str(".pdf");
    slug
}

/// Render a paper to PDF.
///
/// With `for_download` false the bytes are returned for preview and `saver` is never
/// touched. With `for_download` true the bytes go to `saver` exactly once under
/// [`download_filename`] and nothing is returned.
pub fn generate(
    paper: &Paper,
    sections: &[Section],
    geometry: &PageGeometry,
    options: &LayoutOptions,
    fonts: &FontSet,
    for_download: bool,
    saver: &mut dyn FileSaver,
) -> Result<Option<Vec<u8>>> {
    let doc = layout::render_with(paper, sections, geometry, options, fonts)?;
    let bytes = pdf::write(&doc, fonts)?;
    if for_download {
        saver.save(&download_filename(&paper.title), &bytes)?;
        return Ok(None);
    }
    Ok(Some(bytes))
}
