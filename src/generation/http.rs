use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{
    DEFAULT_API_URL, GeneratedPaper, GenerationService, OutlineSection, PaperFormat, RequestBody,
    Suggestion, WritingAspect, WritingContext, WritingImprovement, decode_response, paper_prompt,
};
use crate::error::{Error, Result};
use crate::model::Citation;

/// Blocking JSON client for the generation service.
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
}

impl HttpGenerationClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("paperpress/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for `PAPERPRESS_API_URL`, or the local default service.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("PAPERPRESS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &RequestBody) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);
        let t0 = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| Error::Http(e.to_string()))?;
        log::debug!(
            "POST {endpoint} → {status} ({} bytes, {:.1}ms)",
            text.len(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        decode_response(status, &text)
    }
}

#[derive(Deserialize)]
struct TitleResponse {
    title: String,
}

#[derive(Deserialize)]
struct AbstractResponse {
    r#abstract: String,
}

#[derive(Deserialize)]
struct OutlineResponse {
    sections: Vec<OutlineSection>,
}

#[derive(Deserialize)]
struct PaperResponse {
    paper: GeneratedPaper,
}

#[derive(Deserialize)]
struct CitationsResponse {
    citations: Vec<Citation>,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    suggestions: Vec<Suggestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormatResponse {
    formatted_paper: String,
}

impl GenerationService for HttpGenerationClient {
    fn generate_title(&self, topic: &str, keywords: &[String]) -> Result<String> {
        let body = RequestBody {
            topic: Some(topic),
            keywords: Some(keywords),
            ..Default::default()
        };
        self.post::<TitleResponse>("/ai/generate-title", &body)
            .map(|r| r.title)
    }

    fn generate_abstract(&self, title: &str, main_points: &[String]) -> Result<String> {
        let body = RequestBody {
            title: Some(title),
            main_points: Some(main_points),
            ..Default::default()
        };
        self.post::<AbstractResponse>("/ai/generate-abstract", &body)
            .map(|r| r.r#abstract)
    }

    fn generate_outline(&self, title: &str, keywords: &[String]) -> Result<Vec<OutlineSection>> {
        let body = RequestBody {
            title: Some(title),
            keywords: Some(keywords),
            ..Default::default()
        };
        self.post::<OutlineResponse>("/ai/generate-outline", &body)
            .map(|r| r.sections)
    }

    fn generate_paper(&self, topic: &str) -> Result<GeneratedPaper> {
        let prompt = paper_prompt(topic);
        let body = RequestBody {
            topic: Some(topic),
            prompt: Some(&prompt),
            ..Default::default()
        };
        self.post::<PaperResponse>("/generate-paper", &body)
            .map(|r| r.paper)
    }

    fn improve_writing(
        &self,
        text: &str,
        aspect: WritingAspect,
        context: Option<&WritingContext>,
    ) -> Result<WritingImprovement> {
        let body = RequestBody {
            prompt: Some(text),
            aspect: Some(aspect),
            context,
            ..Default::default()
        };
        self.post("/api/ai/improve-writing", &body)
    }

    fn fetch_citations(&self, topic: &str) -> Result<Vec<Citation>> {
        let body = RequestBody {
            topic: Some(topic),
            ..Default::default()
        };
        self.post::<CitationsResponse>("/fetch-citations", &body)
            .map(|r| r.citations)
    }

    fn analyze(&self, content: &str) -> Result<Vec<Suggestion>> {
        let body = RequestBody {
            content: Some(content),
            ..Default::default()
        };
        self.post::<AnalyzeResponse>("/ai/analyze", &body)
            .map(|r| r.suggestions)
    }

    fn format_paper(&self, paper: &GeneratedPaper, style: PaperFormat) -> Result<String> {
        let body = RequestBody {
            paper: Some(paper),
            style: Some(style),
            ..Default::default()
        };
        self.post::<FormatResponse>("/format-paper", &body)
            .map(|r| r.formatted_paper)
    }
}
