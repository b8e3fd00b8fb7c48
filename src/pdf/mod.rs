//! Serialization of a laid-out [`Document`] into PDF bytes.

use std::collections::{BTreeSet, HashMap};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Result;
use crate::fonts::{FontEntry, FontSet, Weight, encode_as_gids, to_winansi_bytes};
use crate::layout::{Document, PT_TO_MM, PlacedBlock};

struct RegisteredFont<'a> {
    entry: &'a FontEntry,
    font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl RegisteredFont<'_> {
    fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

fn mm_to_pt(mm: f32) -> f32 {
    mm / PT_TO_MM
}

fn used_chars(doc: &Document, weight: Weight) -> BTreeSet<char> {
    doc.blocks()
        .filter(|b| b.weight == weight)
        .flat_map(|b| b.lines.iter())
        .flat_map(|l| l.text.chars())
        .collect()
}

fn render_block(
    content: &mut Content,
    block: &PlacedBlock,
    font: &RegisteredFont,
    page_height: f32,
    td: &mut (f32, f32),
) {
    content.set_font(Name(font.entry.pdf_name.as_bytes()), block.font_size);
    for line in &block.lines {
        if line.text.is_empty() {
            continue;
        }
        let x = mm_to_pt(line.x);
        let y = mm_to_pt(page_height - line.baseline);
        content.next_line(x - td.0, y - td.1);
        *td = (x, y);
        content.show(Str(&font.encode(&line.text)));
    }
}

/// Write `doc` as a PDF. Identical documents and fonts produce identical bytes.
pub fn write(doc: &Document, fonts: &FontSet) -> Result<Vec<u8>> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let mut registered = Vec::new();
    for weight in [Weight::Regular, Weight::Bold] {
        let entry = fonts.for_weight(weight);
        let font_ref = alloc();
        let char_to_gid = entry.register(&mut pdf, font_ref, &used_chars(doc, weight), &mut alloc)?;
        registered.push(RegisteredFont {
            entry,
            font_ref,
            char_to_gid,
        });
    }
    let font_for = |weight: Weight| match weight {
        Weight::Regular => &registered[0],
        Weight::Bold => &registered[1],
    };
    let t_fonts = t0.elapsed();

    let page_height = doc.geometry.page_height;
    let n = doc.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in doc.pages.iter().enumerate() {
        let mut content = Content::new();
        if page.blocks.iter().any(|b| !b.is_empty()) {
            content.begin_text();
            let mut td = (0.0, 0.0);
            for block in page.blocks.iter().filter(|b| !b.is_empty()) {
                render_block(&mut content, block, font_for(block.weight), page_height, &mut td);
            }
            content.end_text();
        }
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);
    if !doc.title.is_empty() {
        pdf.document_info(info_id).title(TextStr(&doc.title));
    }

    let media_box = Rect::new(
        0.0,
        0.0,
        mm_to_pt(doc.geometry.page_width),
        mm_to_pt(page_height),
    );
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(media_box)
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for font in &registered {
            font_dict.pair(Name(font.entry.pdf_name.as_bytes()), font.font_ref);
        }
    }

    let bytes = pdf.finish();
    log::info!(
        "PDF: {} pages, {} bytes (fonts={:.1}ms, total={:.1}ms)",
        n,
        bytes.len(),
        t_fonts.as_secs_f64() * 1000.0,
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(bytes)
}
