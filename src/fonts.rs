use std::collections::{BTreeSet, HashMap};
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::{Error, Result};

/// Stroke weight of a placed block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Weight {
    Regular,
    Bold,
}

pub(crate) enum FontBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FontBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FontBytes::Mapped(m) => m,
            FontBytes::Owned(v) => v,
        }
    }
}

enum FaceSource {
    /// One of the PDF base-14 fonts, measured with a built-in WinAnsi width table.
    Base14 {
        base_font: &'static str,
        widths_1000: &'static [u16; 224],
    },
    TrueType {
        data: FontBytes,
        face_index: u32,
        units_per_em: f32,
    },
}

/// A measurable font face plus the resource name it is registered under in the PDF.
pub struct FontEntry {
    pub(crate) pdf_name: String,
    family: String,
    face: FaceSource,
    ascender_ratio: f32,
}

impl FontEntry {
    pub fn helvetica() -> Self {
        Self {
            pdf_name: "F1".to_string(),
            family: "Helvetica".to_string(),
            face: FaceSource::Base14 {
                base_font: "Helvetica",
                widths_1000: &HELVETICA_WIDTHS,
            },
            ascender_ratio: 0.718,
        }
    }

    pub fn helvetica_bold() -> Self {
        Self {
            pdf_name: "F2".to_string(),
            family: "Helvetica-Bold".to_string(),
            face: FaceSource::Base14 {
                base_font: "Helvetica-Bold",
                widths_1000: &HELVETICA_BOLD_WIDTHS,
            },
            ascender_ratio: 0.718,
        }
    }

    /// Memory-map a TrueType/OpenType file and check that it parses.
    pub fn load(path: &Path, pdf_name: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let data = unsafe { Mmap::map(&file) }?;
        Self::from_bytes(FontBytes::Mapped(data), path.display().to_string(), pdf_name)
    }

    pub fn from_data(data: Vec<u8>, family: &str, pdf_name: &str) -> Result<Self> {
        Self::from_bytes(FontBytes::Owned(data), family.to_string(), pdf_name)
    }

    fn from_bytes(data: FontBytes, origin: String, pdf_name: &str) -> Result<Self> {
        let face = Face::parse(&data, 0).map_err(|e| Error::Font(format!("{origin}: {e}")))?;
        let units_per_em = face.units_per_em() as f32;
        let ascender_ratio = face.ascender() as f32 / units_per_em;
        let family = face_family_name(&face).unwrap_or(origin);
        log::debug!("Loaded font {family} as /{pdf_name}");
        Ok(Self {
            pdf_name: pdf_name.to_string(),
            family,
            face: FaceSource::TrueType {
                data,
                face_index: 0,
                units_per_em,
            },
            ascender_ratio,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Distance from the top of the em box to the baseline, as a fraction of the font size.
    pub fn ascender_ratio(&self) -> f32 {
        self.ascender_ratio
    }

    fn failure(&self, ch: char) -> Error {
        Error::MeasurementFailure {
            ch,
            font: self.family.clone(),
        }
    }

    /// Width of `text` in points at `font_size` points.
    pub fn text_width(&self, text: &str, font_size: f32) -> Result<f32> {
        let units = match &self.face {
            FaceSource::Base14 { widths_1000, .. } => {
                let mut sum = 0.0;
                for ch in text.chars() {
                    let byte = char_to_winansi(ch).ok_or_else(|| self.failure(ch))?;
                    sum += f32::from(widths_1000[usize::from(byte - 32)]);
                }
                sum
            }
            FaceSource::TrueType {
                data,
                face_index,
                units_per_em,
            } => {
                let face = Face::parse(data, *face_index)
                    .map_err(|e| Error::Font(format!("{}: {e}", self.family)))?;
                let mut sum = 0.0;
                for ch in text.chars() {
                    let adv = face
                        .glyph_index(ch)
                        .and_then(|gid| face.glyph_hor_advance(gid))
                        .ok_or_else(|| self.failure(ch))?;
                    sum += adv as f32 / units_per_em * 1000.0;
                }
                sum
            }
        };
        Ok(units * font_size / 1000.0)
    }

    pub fn space_width(&self, font_size: f32) -> Result<f32> {
        self.text_width(" ", font_size)
    }

    /// Write the font objects into `pdf` under `font_ref`. Returns the glyph map used to
    /// encode text for embedded faces; base-14 faces use WinAnsi and return `None`.
    pub(crate) fn register(
        &self,
        pdf: &mut Pdf,
        font_ref: Ref,
        used_chars: &BTreeSet<char>,
        alloc: &mut impl FnMut() -> Ref,
    ) -> Result<Option<HashMap<char, u16>>> {
        let t0 = std::time::Instant::now();
        let result = match &self.face {
            FaceSource::Base14 { base_font, .. } => {
                pdf.type1_font(font_ref)
                    .base_font(Name(base_font.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                None
            }
            FaceSource::TrueType {
                data, face_index, ..
            } => Some(embed_truetype(
                pdf,
                font_ref,
                &self.family,
                data,
                *face_index,
                used_chars,
                alloc,
            )?),
        };
        log::debug!(
            "register_font: {} → {:.1}ms",
            self.family,
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(result)
    }
}

/// Regular and bold faces used by one render.
pub struct FontSet {
    pub regular: FontEntry,
    pub bold: FontEntry,
}

impl FontSet {
    pub fn helvetica() -> Self {
        Self {
            regular: FontEntry::helvetica(),
            bold: FontEntry::helvetica_bold(),
        }
    }

    /// Load TrueType faces where paths are given, base-14 Helvetica otherwise.
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> Result<Self> {
        let regular = match regular {
            Some(path) => FontEntry::load(path, "F1")?,
            None => FontEntry::helvetica(),
        };
        let bold = match bold {
            Some(path) => FontEntry::load(path, "F2")?,
            None => FontEntry::helvetica_bold(),
        };
        Ok(Self { regular, bold })
    }

    pub fn for_weight(&self, weight: Weight) -> &FontEntry {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::helvetica()
    }
}

fn face_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// Map a Unicode char to its WinAnsi (Windows-1252) byte. Control characters and chars
/// outside the code page have no mapping.
pub(crate) fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Convert text to WinAnsi bytes for a PDF string. Text reaching this point has already
/// been measured, so every char has a mapping.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Encode text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

/// Helvetica advance widths (Adobe Core14 AFM, 1000 units/em) for WinAnsi codes 0x20..=0xFF.
/// Codes with no WinAnsi glyph are 0.
static HELVETICA_WIDTHS: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0, // 0x70
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xa0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xb0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xc0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xd0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xe0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xf0
];

/// Helvetica-Bold advance widths, laid out like [`HELVETICA_WIDTHS`].
static HELVETICA_BOLD_WIDTHS: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0, // 0x70
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xa0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xb0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xc0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xd0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, // 0xe0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556, // 0xf0
];

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

/// Embed a TrueType/OpenType face as a Type0 font with Identity-H encoding, subsetted to
/// the characters the document uses.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>> {
    let face = Face::parse(font_data, face_index)
        .map_err(|e| Error::Font(format!("{font_name}: {e}")))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| to_1000(h as f32))
        .unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
        font_data.to_vec()
    });
    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Font(format!("{font_name}: font program too large")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name: String = font_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    let mut mappings: Vec<(u16, char)> = char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
    mappings.sort_unstable();
    for (new_gid, ch) in mappings {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}
