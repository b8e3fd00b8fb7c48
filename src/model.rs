use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub r#abstract: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_modified: DateTime<Utc>,
    #[serde(default, alias = "userId")]
    pub owner_id: String,
}

impl Paper {
    pub fn new(owner_id: &str, title: &str, r#abstract: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            r#abstract: r#abstract.to_string(),
            sections: Vec::new(),
            citations: Vec::new(),
            created_at: now,
            last_modified: now,
            owner_id: owner_id.to_string(),
        }
    }

    /// Sections in render order: ascending `order`, ties kept in list order.
    pub fn ordered_sections(&self) -> Vec<Section> {
        let mut sections = self.sections.clone();
        sort_sections(&mut sections);
        sections
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: i64,
}

impl Section {
    pub fn new(title: &str, content: &str, order: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            order,
        }
    }
}

/// Stable sort by `order`. The renderer expects its input already sorted this way.
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by_key(|s| s.order);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationKind {
    Article,
    Book,
    Conference,
    Website,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: CitationKind,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_text: Option<String>,
}

/// Physical page layout. Page lengths are millimetres, font sizes are points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub title_font_size: f32,
    pub section_heading_font_size: f32,
    pub body_font_size: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 25.0,
            title_font_size: 24.0,
            section_heading_font_size: 14.0,
            body_font_size: 11.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("page width", self.page_width),
            ("page height", self.page_height),
            ("margin", self.margin),
            ("title font size", self.title_font_size),
            ("section heading font size", self.section_heading_font_size),
            ("body font size", self.body_font_size),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidGeometry(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.content_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "margin {} leaves no content area on a {}x{} page",
                self.margin, self.page_width, self.page_height
            )));
        }
        Ok(())
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    /// Lowest offset from the page top a block may reach.
    pub fn max_y(&self) -> f32 {
        self.page_height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleLines {
    /// Wrap the title and center every line.
    AllCentered,
    /// Emit only the first wrapped line, centered. Matches PDFs produced by earlier releases.
    FirstLineOnly,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Line height in millimetres per point of font size.
    pub line_height_factor: f32,
    /// Space after the title block, in millimetres.
    pub title_gap: f32,
    /// Space after heading and body blocks, in millimetres.
    pub block_gap: f32,
    pub title_lines: TitleLines,
    pub abstract_heading: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            line_height_factor: 0.35,
            title_gap: 15.0,
            block_gap: 10.0,
            title_lines: TitleLines::AllCentered,
            abstract_heading: "Abstract".to_string(),
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.line_height_factor.is_finite() || self.line_height_factor <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "line height factor must be positive, got {}",
                self.line_height_factor
            )));
        }
        for (name, value) in [("title gap", self.title_gap), ("block gap", self.block_gap)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidGeometry(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
