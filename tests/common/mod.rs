#![allow(dead_code)]

use std::cell::RefCell;

use paperpress::generation::{
    GeneratedPaper, GenerationService, OutlineSection, PaperFormat, Suggestion, WritingAspect,
    WritingContext, WritingImprovement,
};
use paperpress::layout::Document;
use paperpress::model::{Citation, CitationKind, User};
use paperpress::{FileSaver, PageGeometry, Paper, Section};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. ";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Prose of exactly `chars` characters, made of ordinary words.
pub fn lorem(chars: usize) -> String {
    LOREM.chars().cycle().take(chars).collect()
}

pub fn paper(title: &str, r#abstract: &str) -> Paper {
    Paper::new("owner-1", title, r#abstract)
}

pub fn section(title: &str, content: &str, order: i64) -> Section {
    Section::new(title, content, order)
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.org"),
        display_name: None,
    }
}

pub fn citation(title: &str) -> Citation {
    Citation {
        id: String::new(),
        text: format!("Doe, J. (2020). {title}."),
        kind: CitationKind::Article,
        authors: vec!["J. Doe".to_string()],
        year: "2020".to_string(),
        title: title.to_string(),
        journal: Some("Journal of Tests".to_string()),
        doi: None,
        url: None,
        citation_text: None,
    }
}

/// Every block lies inside the page's margins.
pub fn assert_within_margins(doc: &Document) {
    let g: &PageGeometry = &doc.geometry;
    let eps = 1e-3;
    for page in &doc.pages {
        for block in &page.blocks {
            assert!(
                block.top >= g.margin - eps,
                "page {}: block {:?} starts at {} above the top margin",
                page.number,
                block.kind,
                block.top
            );
            assert!(
                block.bottom() <= g.max_y() + eps,
                "page {}: block {:?} ends at {} below {}",
                page.number,
                block.kind,
                block.bottom(),
                g.max_y()
            );
            for line in &block.lines {
                assert!(line.x >= g.margin - eps, "line {:?} starts left of the margin", line.text);
                assert!(
                    line.x + line.width <= g.page_width - g.margin + eps,
                    "line {:?} overflows the right margin",
                    line.text
                );
            }
        }
    }
}

/// Saver that keeps every file in memory.
#[derive(Default)]
pub struct RecordingSaver {
    pub files: Vec<(String, Vec<u8>)>,
}

impl FileSaver for RecordingSaver {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> paperpress::Result<()> {
        self.files.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Canned generation service that records the prompts it receives.
#[derive(Default)]
pub struct FakeGenerator {
    pub paper: GeneratedPaper,
    pub improved: String,
    pub failure: Option<String>,
    pub prompts: RefCell<Vec<(String, Option<WritingContext>)>>,
    pub topics: RefCell<Vec<String>>,
}

impl FakeGenerator {
    pub fn complete() -> Self {
        Self {
            paper: GeneratedPaper {
                r#abstract: "We study things.".to_string(),
                introduction: "Things matter.".to_string(),
                literature_review: "Others studied things.".to_string(),
                methodology: "We counted things.".to_string(),
                results: "There were many things.".to_string(),
                discussion: "Many things is a lot.".to_string(),
                conclusion: "Things were studied.".to_string(),
                references: "Doe, J. (2020). Things.".to_string(),
            },
            improved: "Additional text.".to_string(),
            ..Default::default()
        }
    }

    fn check(&self) -> paperpress::Result<()> {
        match &self.failure {
            Some(message) => Err(paperpress::Error::Generation(message.clone())),
            None => Ok(()),
        }
    }
}

impl GenerationService for FakeGenerator {
    fn generate_title(&self, topic: &str, _keywords: &[String]) -> paperpress::Result<String> {
        self.check()?;
        Ok(format!("On {topic}"))
    }

    fn generate_abstract(&self, _title: &str, _main_points: &[String]) -> paperpress::Result<String> {
        self.check()?;
        Ok(self.paper.r#abstract.clone())
    }

    fn generate_outline(
        &self,
        _title: &str,
        _keywords: &[String],
    ) -> paperpress::Result<Vec<OutlineSection>> {
        self.check()?;
        Ok(Vec::new())
    }

    fn generate_paper(&self, topic: &str) -> paperpress::Result<GeneratedPaper> {
        self.check()?;
        self.topics.borrow_mut().push(topic.to_string());
        Ok(self.paper.clone())
    }

    fn improve_writing(
        &self,
        text: &str,
        _aspect: WritingAspect,
        context: Option<&WritingContext>,
    ) -> paperpress::Result<WritingImprovement> {
        self.check()?;
        self.prompts
            .borrow_mut()
            .push((text.to_string(), context.cloned()));
        Ok(WritingImprovement {
            improved: self.improved.clone(),
            changes: Vec::new(),
        })
    }

    fn fetch_citations(&self, topic: &str) -> paperpress::Result<Vec<Citation>> {
        self.check()?;
        Ok(vec![citation(topic)])
    }

    fn analyze(&self, _content: &str) -> paperpress::Result<Vec<Suggestion>> {
        self.check()?;
        Ok(Vec::new())
    }

    fn format_paper(&self, _paper: &GeneratedPaper, _style: PaperFormat) -> paperpress::Result<String> {
        self.check()?;
        Ok(String::new())
    }
}
