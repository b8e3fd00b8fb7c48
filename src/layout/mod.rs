//! Pagination of a paper into fixed-size pages of positioned text blocks.
//!
//! Coordinates are millimetres measured from the top-left corner of the page; `top` and
//! `baseline` grow downwards. Font sizes stay in points.

mod wrap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::fonts::{FontEntry, FontSet, Weight};
use crate::model::{LayoutOptions, PageGeometry, Paper, Section, TitleLines};

use wrap::{WrappedLine, wrap_text};

pub const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Title,
    Heading,
    Body,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Alignment {
    Left,
    Center,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedBlock {
    pub kind: BlockKind,
    pub lines: Vec<PlacedLine>,
    pub top: f32,
    pub height: f32,
    pub font_size: f32,
    pub weight: Weight,
    pub alignment: Alignment,
    /// Set on every fragment after the first when a block taller than a page is split.
    pub continued: bool,
}

impl PlacedBlock {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub blocks: Vec<PlacedBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }
}

struct LayoutCursor {
    current_page: usize,
    offset: f32,
}

struct PendingBlock<'f> {
    kind: BlockKind,
    font: &'f FontEntry,
    weight: Weight,
    font_size: f32,
    alignment: Alignment,
    lines: Vec<WrappedLine>,
    gap: f32,
}

struct Paginator<'a> {
    geometry: &'a PageGeometry,
    options: &'a LayoutOptions,
    pages: Vec<Page>,
    cursor: LayoutCursor,
}

impl<'a> Paginator<'a> {
    fn new(geometry: &'a PageGeometry, options: &'a LayoutOptions) -> Self {
        Self {
            geometry,
            options,
            pages: vec![Page {
                number: 1,
                blocks: Vec::new(),
            }],
            cursor: LayoutCursor {
                current_page: 1,
                offset: geometry.margin,
            },
        }
    }

    fn current_page(&mut self) -> &mut Page {
        let idx = self.cursor.current_page - 1;
        &mut self.pages[idx]
    }

    fn new_page(&mut self) {
        self.cursor.current_page += 1;
        self.cursor.offset = self.geometry.margin;
        self.pages.push(Page {
            number: self.cursor.current_page,
            blocks: Vec::new(),
        });
    }

    fn place(&mut self, pending: PendingBlock) -> Result<()> {
        let max_y = self.geometry.max_y();
        let line_h = pending.font_size * self.options.line_height_factor;
        if line_h > self.geometry.usable_height() {
            return Err(Error::InvalidGeometry(format!(
                "a {}pt line ({line_h:.1}mm) does not fit the {:.1}mm usable page height",
                pending.font_size,
                self.geometry.usable_height()
            )));
        }

        let height = pending.lines.len() as f32 * line_h;
        if self.cursor.offset + height > max_y && !self.current_page().blocks.is_empty() {
            log::debug!(
                "page break before {:?} block at {:.1}mm (needs {:.1}mm) → page {}",
                pending.kind,
                self.cursor.offset,
                height,
                self.cursor.current_page + 1,
            );
            self.new_page();
        }

        let mut remaining = pending.lines.as_slice();
        let mut continued = false;
        loop {
            let take = self.lines_that_fit(remaining.len(), line_h);
            let take = if take == 0 {
                if !self.current_page().blocks.is_empty() {
                    self.new_page();
                    continue;
                }
                1
            } else {
                take
            };
            let (chunk, rest) = remaining.split_at(take);
            let block = self.position(&pending, chunk, line_h, continued);
            self.cursor.offset += block.height;
            self.current_page().blocks.push(block);
            remaining = rest;
            if remaining.is_empty() {
                break;
            }
            log::debug!(
                "splitting {:?} block: {} lines continue on page {}",
                pending.kind,
                remaining.len(),
                self.cursor.current_page + 1,
            );
            continued = true;
            self.new_page();
        }

        self.cursor.offset += pending.gap;
        Ok(())
    }

    /// How many of `n` lines of height `line_h` fit between the cursor and the bottom margin.
    fn lines_that_fit(&self, n: usize, line_h: f32) -> usize {
        let max_y = self.geometry.max_y();
        let fits = |k: usize| self.cursor.offset + k as f32 * line_h <= max_y;
        if fits(n) {
            return n;
        }
        let mut k = ((max_y - self.cursor.offset) / line_h).floor().max(0.0) as usize;
        k = k.min(n);
        while k > 0 && !fits(k) {
            k -= 1;
        }
        while k + 1 < n && fits(k + 1) {
            k += 1;
        }
        k
    }

    fn position(
        &self,
        pending: &PendingBlock,
        lines: &[WrappedLine],
        line_h: f32,
        continued: bool,
    ) -> PlacedBlock {
        let top = self.cursor.offset;
        let ascent = pending.font_size * PT_TO_MM * pending.font.ascender_ratio();
        let lines = lines
            .iter()
            .enumerate()
            .map(|(i, line)| PlacedLine {
                text: line.text.clone(),
                x: match pending.alignment {
                    Alignment::Left => self.geometry.margin,
                    Alignment::Center => (self.geometry.page_width - line.width) / 2.0,
                },
                baseline: top + i as f32 * line_h + ascent,
                width: line.width,
            })
            .collect::<Vec<_>>();
        PlacedBlock {
            kind: pending.kind,
            height: lines.len() as f32 * line_h,
            lines,
            top,
            font_size: pending.font_size,
            weight: pending.weight,
            alignment: pending.alignment,
            continued,
        }
    }
}

fn heading_block<'f>(
    title: &str,
    geometry: &PageGeometry,
    options: &LayoutOptions,
    fonts: &'f FontSet,
) -> Result<PendingBlock<'f>> {
    Ok(PendingBlock {
        kind: BlockKind::Heading,
        font: &fonts.bold,
        weight: Weight::Bold,
        font_size: geometry.section_heading_font_size,
        alignment: Alignment::Left,
        lines: wrap_text(
            title,
            &fonts.bold,
            geometry.section_heading_font_size,
            geometry.content_width(),
        )?,
        gap: options.block_gap,
    })
}

fn body_block<'f>(
    content: &str,
    geometry: &PageGeometry,
    options: &LayoutOptions,
    fonts: &'f FontSet,
) -> Result<PendingBlock<'f>> {
    Ok(PendingBlock {
        kind: BlockKind::Body,
        font: &fonts.regular,
        weight: Weight::Regular,
        font_size: geometry.body_font_size,
        alignment: Alignment::Left,
        lines: wrap_text(
            content,
            &fonts.regular,
            geometry.body_font_size,
            geometry.content_width(),
        )?,
        gap: options.block_gap,
    })
}

/// Lay out a paper with the default options and the base-14 Helvetica faces.
///
/// `sections` must already be in render order (see [`crate::model::sort_sections`]);
/// they are laid out exactly as given.
pub fn render(paper: &Paper, sections: &[Section], geometry: &PageGeometry) -> Result<Document> {
    render_with(
        paper,
        sections,
        geometry,
        &LayoutOptions::default(),
        &FontSet::helvetica(),
    )
}

pub fn render_with(
    paper: &Paper,
    sections: &[Section],
    geometry: &PageGeometry,
    options: &LayoutOptions,
    fonts: &FontSet,
) -> Result<Document> {
    let t0 = std::time::Instant::now();
    geometry.validate()?;
    options.validate()?;

    let content_width = geometry.content_width();
    let mut paginator = Paginator::new(geometry, options);

    let mut title_lines = wrap_text(
        &paper.title,
        &fonts.bold,
        geometry.title_font_size,
        content_width,
    )?;
    if options.title_lines == TitleLines::FirstLineOnly {
        title_lines.truncate(1);
    }
    paginator.place(PendingBlock {
        kind: BlockKind::Title,
        font: &fonts.bold,
        weight: Weight::Bold,
        font_size: geometry.title_font_size,
        alignment: Alignment::Center,
        lines: title_lines,
        gap: options.title_gap,
    })?;

    paginator.place(heading_block(&options.abstract_heading, geometry, options, fonts)?)?;
    paginator.place(body_block(&paper.r#abstract, geometry, options, fonts)?)?;

    for section in sections {
        paginator.place(heading_block(&section.title, geometry, options, fonts)?)?;
        if !section.content.is_empty() {
            paginator.place(body_block(&section.content, geometry, options, fonts)?)?;
        }
    }

    let doc = Document {
        title: paper.title.clone(),
        geometry: *geometry,
        pages: paginator.pages,
    };
    log::info!(
        "Layout: {} sections → {} pages, {} blocks in {:.1}ms",
        sections.len(),
        doc.page_count(),
        doc.blocks().count(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(doc)
}
