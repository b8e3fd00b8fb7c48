//! Editing operations over injected store, identity and generation services.

use crate::auth::AuthProvider;
use crate::error::{Error, Result};
use crate::export::{self, FileSaver};
use crate::fonts::FontSet;
use crate::generation::{GenerationService, WritingAspect, WritingContext};
use crate::layout::{self, Document};
use crate::model::{Citation, LayoutOptions, PageGeometry, Paper, Section};
use crate::store::{DocumentStore, PaperUpdate, SectionUpdate};

/// Every operation acts on behalf of the signed-in user and fails with
/// [`Error::Unauthenticated`] when there is none.
pub struct Editor<S, A, G> {
    store: S,
    auth: A,
    generator: G,
    fonts: FontSet,
    options: LayoutOptions,
}

impl<S: DocumentStore, A: AuthProvider, G: GenerationService> Editor<S, A, G> {
    pub fn new(store: S, auth: A, generator: G) -> Self {
        Self {
            store,
            auth,
            generator,
            fonts: FontSet::helvetica(),
            options: LayoutOptions::default(),
        }
    }

    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn owner(&self) -> Result<String> {
        Ok(self.auth.require_user()?.id)
    }

    pub fn create_paper(&self, title: &str, r#abstract: &str) -> Result<Paper> {
        let owner = self.owner()?;
        self.store.put(&owner, Paper::new(&owner, title, r#abstract))
    }

    /// Store a paper as the signed-in user's, giving it an id if it has none.
    pub fn import_paper(&self, mut paper: Paper) -> Result<Paper> {
        let owner = self.owner()?;
        if paper.id.is_empty() {
            paper.id = uuid::Uuid::new_v4().to_string();
        }
        self.store.put(&owner, paper)
    }

    pub fn load(&self, paper_id: &str) -> Result<Paper> {
        let owner = self.owner()?;
        self.store
            .get(&owner, paper_id)?
            .ok_or_else(|| Error::NotFound(format!("paper {paper_id}")))
    }

    pub fn list_papers(&self) -> Result<Vec<Paper>> {
        let owner = self.owner()?;
        self.store.list_all(&owner)
    }

    pub fn update(&self, paper_id: &str, update: PaperUpdate) -> Result<Paper> {
        let owner = self.owner()?;
        self.store.update(&owner, paper_id, update)
    }

    pub fn delete_paper(&self, paper_id: &str) -> Result<()> {
        let owner = self.owner()?;
        self.store.delete(&owner, paper_id)
    }

    fn replace_sections(&self, paper_id: &str, sections: Vec<Section>) -> Result<Paper> {
        self.update(
            paper_id,
            PaperUpdate {
                sections: Some(sections),
                ..Default::default()
            },
        )
    }

    fn replace_citations(&self, paper_id: &str, citations: Vec<Citation>) -> Result<Paper> {
        self.update(
            paper_id,
            PaperUpdate {
                citations: Some(citations),
                ..Default::default()
            },
        )
    }

    /// Append a section with a fresh id.
    pub fn add_section(&self, paper_id: &str, title: &str, content: &str, order: i64) -> Result<Section> {
        let paper = self.load(paper_id)?;
        let section = Section::new(title, content, order);
        let mut sections = paper.sections;
        sections.push(section.clone());
        self.replace_sections(paper_id, sections)?;
        Ok(section)
    }

    /// Merge `update` into a section. Changing `order` moves the section in previews.
    pub fn update_section(
        &self,
        paper_id: &str,
        section_id: &str,
        update: SectionUpdate,
    ) -> Result<Paper> {
        let mut paper = self.load(paper_id)?;
        let section = paper
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| Error::NotFound(format!("section {section_id}")))?;
        update.apply(section);
        self.replace_sections(paper_id, paper.sections)
    }

    pub fn delete_section(&self, paper_id: &str, section_id: &str) -> Result<Paper> {
        let mut paper = self.load(paper_id)?;
        paper.sections.retain(|s| s.id != section_id);
        self.replace_sections(paper_id, paper.sections)
    }

    pub fn add_citation(&self, paper_id: &str, mut citation: Citation) -> Result<Citation> {
        let paper = self.load(paper_id)?;
        citation.id = uuid::Uuid::new_v4().to_string();
        let mut citations = paper.citations;
        citations.push(citation.clone());
        self.replace_citations(paper_id, citations)?;
        Ok(citation)
    }

    /// Replace a citation's fields, keeping its id.
    pub fn update_citation(
        &self,
        paper_id: &str,
        citation_id: &str,
        mut citation: Citation,
    ) -> Result<Paper> {
        let mut paper = self.load(paper_id)?;
        let slot = paper
            .citations
            .iter_mut()
            .find(|c| c.id == citation_id)
            .ok_or_else(|| Error::NotFound(format!("citation {citation_id}")))?;
        citation.id = citation_id.to_string();
        *slot = citation;
        self.replace_citations(paper_id, paper.citations)
    }

    pub fn delete_citation(&self, paper_id: &str, citation_id: &str) -> Result<Paper> {
        let mut paper = self.load(paper_id)?;
        paper.citations.retain(|c| c.id != citation_id);
        self.replace_citations(paper_id, paper.citations)
    }

    /// Lay out the stored paper with its sections in order.
    pub fn preview(&self, paper_id: &str, geometry: &PageGeometry) -> Result<Document> {
        let paper = self.load(paper_id)?;
        let sections = paper.ordered_sections();
        layout::render_with(&paper, &sections, geometry, &self.options, &self.fonts)
    }

    /// Render the stored paper to PDF and hand it to `saver`.
    pub fn download(
        &self,
        paper_id: &str,
        geometry: &PageGeometry,
        saver: &mut dyn FileSaver,
    ) -> Result<()> {
        let paper = self.load(paper_id)?;
        let sections = paper.ordered_sections();
        export::generate(
            &paper,
            &sections,
            geometry,
            &self.options,
            &self.fonts,
            true,
            saver,
        )?;
        Ok(())
    }

    /// Generate a complete paper for `topic` and store it with its sections. The paper
    /// is titled `title` when one is given and not blank, else `topic`.
    pub fn generate_paper(&self, topic: &str, title: Option<&str>) -> Result<Paper> {
        let owner = self.owner()?;
        let generated = self.generator.generate_paper(topic)?;
        let (r#abstract, sections) = generated.into_sections()?;
        let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(topic);
        let mut paper = Paper::new(&owner, title, &r#abstract);
        paper.sections = sections;
        log::info!("Generated paper {} with {} sections", paper.id, paper.sections.len());
        self.store.put(&owner, paper)
    }

    /// Ask the service to write more for a section following `prompt`, and append the
    /// result to the section's content.
    pub fn regenerate_section(&self, paper_id: &str, section_id: &str, prompt: &str) -> Result<Paper> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.load(paper_id);
        }
        let paper = self.load(paper_id)?;
        let section = paper
            .sections
            .iter()
            .find(|s| s.id == section_id)
            .ok_or_else(|| Error::NotFound(format!("section {section_id}")))?;
        let improvement = self.generator.improve_writing(
            prompt,
            WritingAspect::Academic,
            Some(&writing_context(&paper, section)),
        )?;
        let content = if section.content.is_empty() {
            improvement.improved
        } else {
            format!("{}\n\n{}", section.content, improvement.improved)
        };
        self.update_section(paper_id, section_id, SectionUpdate::content(content))
    }

    /// Replace a section's content with the service's rewrite of it for `aspect`.
    pub fn improve_section(
        &self,
        paper_id: &str,
        section_id: &str,
        aspect: WritingAspect,
    ) -> Result<Paper> {
        let paper = self.load(paper_id)?;
        let section = paper
            .sections
            .iter()
            .find(|s| s.id == section_id)
            .ok_or_else(|| Error::NotFound(format!("section {section_id}")))?;
        if section.content.trim().is_empty() {
            return Ok(paper);
        }
        let improvement =
            self.generator
                .improve_writing(&section.content, aspect, Some(&writing_context(&paper, section)))?;
        log::debug!(
            "Improved section {section_id} ({:?}): {} changes",
            aspect,
            improvement.changes.len()
        );
        self.update_section(paper_id, section_id, SectionUpdate::content(improvement.improved))
    }

    pub fn fetch_citations(&self, paper_id: &str, topic: &str) -> Result<Paper> {
        let paper = self.load(paper_id)?;
        let mut citations = paper.citations;
        citations.extend(self.generator.fetch_citations(topic)?);
        self.replace_citations(paper_id, citations)
    }
}

fn writing_context(paper: &Paper, section: &Section) -> WritingContext {
    WritingContext {
        section_title: Some(section.title.clone()),
        paper_title: Some(paper.title.clone()),
        r#abstract: Some(paper.r#abstract.clone()),
    }
}
