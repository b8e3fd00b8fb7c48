//! Boundary to the text-generation service.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpGenerationClient;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Citation, Section};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Section titles of a generated paper, in paper order. The position is the section's `order`.
pub const PAPER_SECTIONS: [&str; 8] = [
    "Abstract",
    "Introduction",
    "Literature Review",
    "Methodology",
    "Results",
    "Discussion",
    "Conclusion",
    "References",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingAspect {
    Clarity,
    Conciseness,
    Academic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperFormat {
    #[serde(rename = "APA")]
    Apa,
    #[serde(rename = "MLA")]
    Mla,
    Chicago,
    #[serde(rename = "IEEE")]
    Ieee,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#abstract: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WritingImprovement {
    pub improved: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Clarity,
    Structure,
    Style,
    Grammar,
    Citation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub content: String,
    pub severity: Severity,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub position: i64,
}

/// A full paper as returned by the service, one field per entry of [`PAPER_SECTIONS`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPaper {
    #[serde(rename = "Abstract", default)]
    pub r#abstract: String,
    #[serde(rename = "Introduction", default)]
    pub introduction: String,
    #[serde(rename = "Literature Review", default)]
    pub literature_review: String,
    #[serde(rename = "Methodology", default)]
    pub methodology: String,
    #[serde(rename = "Results", default)]
    pub results: String,
    #[serde(rename = "Discussion", default)]
    pub discussion: String,
    #[serde(rename = "Conclusion", default)]
    pub conclusion: String,
    #[serde(rename = "References", default)]
    pub references: String,
}

impl GeneratedPaper {
    pub fn section(&self, title: &str) -> Option<&str> {
        let text = match title {
            "Abstract" => &self.r#abstract,
            "Introduction" => &self.introduction,
            "Literature Review" => &self.literature_review,
            "Methodology" => &self.methodology,
            "Results" => &self.results,
            "Discussion" => &self.discussion,
            "Conclusion" => &self.conclusion,
            "References" => &self.references,
            _ => return None,
        };
        Some(text.as_str())
    }

    /// Split into the abstract and the body sections, ordered by their position in
    /// [`PAPER_SECTIONS`]. The abstract and every body section must have content.
    pub fn into_sections(self) -> Result<(String, Vec<Section>)> {
        if self.r#abstract.trim().is_empty() {
            return Err(Error::Generation("Failed to generate paper abstract".to_string()));
        }
        let mut sections = Vec::with_capacity(PAPER_SECTIONS.len() - 1);
        for (order, title) in PAPER_SECTIONS.iter().enumerate().skip(1) {
            let content = self.section(title).unwrap_or_default();
            if content.trim().is_empty() {
                return Err(Error::Generation(format!(
                    "Failed to generate content for section: {title}"
                )));
            }
            sections.push(Section::new(title, content, order as i64));
        }
        Ok((self.r#abstract, sections))
    }
}

/// JSON request body shared by every endpoint; unset fields are omitted.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_points: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<WritingAspect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper: Option<&'a GeneratedPaper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<PaperFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a WritingContext>,
}

pub trait GenerationService {
    fn generate_title(&self, topic: &str, keywords: &[String]) -> Result<String>;
    fn generate_abstract(&self, title: &str, main_points: &[String]) -> Result<String>;
    fn generate_outline(&self, title: &str, keywords: &[String]) -> Result<Vec<OutlineSection>>;
    fn generate_paper(&self, topic: &str) -> Result<GeneratedPaper>;
    fn improve_writing(
        &self,
        text: &str,
        aspect: WritingAspect,
        context: Option<&WritingContext>,
    ) -> Result<WritingImprovement>;
    fn fetch_citations(&self, topic: &str) -> Result<Vec<Citation>>;
    fn analyze(&self, content: &str) -> Result<Vec<Suggestion>>;
    fn format_paper(&self, paper: &GeneratedPaper, style: PaperFormat) -> Result<String>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Decode a service response. Non-2xx responses fail with the body's `error` message
/// unchanged, or "API request failed" when there is none.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| "API request failed".to_string());
        log::warn!("Generation service returned {status}: {message}");
        return Err(Error::Generation(message));
    }
    Ok(serde_json::from_str(body)?)
}

pub fn paper_prompt(topic: &str) -> String {
    format!(
        "Generate a comprehensive research paper on \"{topic}\" with the following structure and requirements:\n\
         \n\
         - Abstract (approximately 250 words): A concise summary of the research\n\
         - Introduction (approximately 350 words): Background and research objectives\n\
         - Literature Review (approximately 450 words): Comprehensive review of existing research\n\
         - Methodology (approximately 500 words): Include detailed methodology with tables and figures where appropriate\n\
         - Results: Present findings with supporting data\n\
         - Discussion: Analyze results in context of existing literature\n\
         - Conclusion: Summarize key findings and implications\n\
         - References: Include relevant academic citations\n\
         \n\
         Please ensure proper academic formatting, spacing, and professional presentation."
    )
}
