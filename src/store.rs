//! Paper persistence keyed by owner and paper id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Citation, Paper, Section};

/// Fields to overwrite on an existing paper. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperUpdate {
    pub title: Option<String>,
    pub r#abstract: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub citations: Option<Vec<Citation>>,
}

impl PaperUpdate {
    fn apply(self, paper: &mut Paper) {
        if let Some(title) = self.title {
            paper.title = title;
        }
        if let Some(r#abstract) = self.r#abstract {
            paper.r#abstract = r#abstract;
        }
        if let Some(sections) = self.sections {
            paper.sections = sections;
        }
        if let Some(citations) = self.citations {
            paper.citations = citations;
        }
    }
}

/// Fields to overwrite on one section of a paper. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<i64>,
}

impl SectionUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub(crate) fn apply(self, section: &mut Section) {
        if let Some(title) = self.title {
            section.title = title;
        }
        if let Some(content) = self.content {
            section.content = content;
        }
        if let Some(order) = self.order {
            section.order = order;
        }
    }
}

/// Last write wins; timestamps are assigned by the store.
pub trait DocumentStore {
    fn get(&self, owner: &str, paper_id: &str) -> Result<Option<Paper>>;
    /// Insert or replace. Returns the paper as stored, with timestamps and owner set.
    fn put(&self, owner: &str, paper: Paper) -> Result<Paper>;
    fn update(&self, owner: &str, paper_id: &str, update: PaperUpdate) -> Result<Paper>;
    fn delete(&self, owner: &str, paper_id: &str) -> Result<()>;
    /// All papers of `owner`, most recently modified first.
    fn list_all(&self, owner: &str) -> Result<Vec<Paper>>;
}

fn not_found(owner: &str, paper_id: &str) -> Error {
    Error::NotFound(format!("paper {paper_id} of {owner}"))
}

/// Stamp a paper for storage. `created_at` is kept from the previous version if there is one.
fn stamp(owner: &str, mut paper: Paper, previous: Option<&Paper>) -> Paper {
    let now = Utc::now();
    paper.owner_id = owner.to_string();
    paper.created_at = previous.map_or(now, |p| p.created_at);
    paper.last_modified = now;
    paper
}

fn sort_recent_first(papers: &mut [Paper]) {
    papers.sort_by(|a, b| b.last_modified.cmp(&a.last_modified).then_with(|| a.id.cmp(&b.id)));
}

#[derive(Default)]
pub struct MemoryStore {
    papers: Mutex<BTreeMap<(String, String), Paper>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), Paper>> {
        self.papers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, owner: &str, paper_id: &str) -> Result<Option<Paper>> {
        Ok(self
            .lock()
            .get(&(owner.to_string(), paper_id.to_string()))
            .cloned())
    }

    fn put(&self, owner: &str, paper: Paper) -> Result<Paper> {
        let mut papers = self.lock();
        let key = (owner.to_string(), paper.id.clone());
        let stored = stamp(owner, paper, papers.get(&key));
        papers.insert(key, stored.clone());
        Ok(stored)
    }

    fn update(&self, owner: &str, paper_id: &str, update: PaperUpdate) -> Result<Paper> {
        let mut papers = self.lock();
        let paper = papers
            .get_mut(&(owner.to_string(), paper_id.to_string()))
            .ok_or_else(|| not_found(owner, paper_id))?;
        update.apply(paper);
        paper.last_modified = Utc::now();
        Ok(paper.clone())
    }

    fn delete(&self, owner: &str, paper_id: &str) -> Result<()> {
        self.lock()
            .remove(&(owner.to_string(), paper_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(owner, paper_id))
    }

    fn list_all(&self, owner: &str) -> Result<Vec<Paper>> {
        let mut papers: Vec<Paper> = self
            .lock()
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|(_, p)| p.clone())
            .collect();
        sort_recent_first(&mut papers);
        Ok(papers)
    }
}

/// One JSON file per paper at `<root>/<owner>/<paper_id>.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner: &str) -> Result<PathBuf> {
        Ok(self.root.join(path_component(owner)?))
    }

    fn paper_path(&self, owner: &str, paper_id: &str) -> Result<PathBuf> {
        Ok(self
            .owner_dir(owner)?
            .join(format!("{}.json", path_component(paper_id)?)))
    }

    fn read(path: &Path) -> Result<Option<Paper>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&self, path: &Path, paper: &Paper) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(paper)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Ids become file names, so they must not be able to leave their directory.
fn path_component(id: &str) -> Result<&str> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(Error::InvalidId(id.to_string()));
    }
    Ok(id)
}

impl DocumentStore for FileStore {
    fn get(&self, owner: &str, paper_id: &str) -> Result<Option<Paper>> {
        Self::read(&self.paper_path(owner, paper_id)?)
    }

    fn put(&self, owner: &str, paper: Paper) -> Result<Paper> {
        let path = self.paper_path(owner, &paper.id)?;
        let previous = Self::read(&path)?;
        let stored = stamp(owner, paper, previous.as_ref());
        self.write(&path, &stored)?;
        log::debug!("Stored paper {} for {owner}", stored.id);
        Ok(stored)
    }

    fn update(&self, owner: &str, paper_id: &str, update: PaperUpdate) -> Result<Paper> {
        let path = self.paper_path(owner, paper_id)?;
        let mut paper = Self::read(&path)?.ok_or_else(|| not_found(owner, paper_id))?;
        update.apply(&mut paper);
        paper.last_modified = Utc::now();
        self.write(&path, &paper)?;
        Ok(paper)
    }

    fn delete(&self, owner: &str, paper_id: &str) -> Result<()> {
        let path = self.paper_path(owner, paper_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(owner, paper_id)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn list_all(&self, owner: &str) -> Result<Vec<Paper>> {
        let dir = self.owner_dir(owner)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        let mut papers = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(Some(paper)) => papers.push(paper),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping unreadable paper {}: {e}", path.display()),
            }
        }
        sort_recent_first(&mut papers);
        Ok(papers)
    }
}
