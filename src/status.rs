//! Call-site state for long-running work: processing status and the live preview.

use crate::error::Error;
use crate::generation::Suggestion;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Processing {
        task: String,
    },
    Error {
        message: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    Start(String),
    Finish,
    Fail(String),
    AddSuggestion(Suggestion),
    ClearSuggestions,
    ClearError,
}

/// Processing status plus the suggestions collected so far. Owned by one controller and
/// changed only through [`AgentState::apply`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentState {
    status: ProcessingStatus,
    suggestions: Vec<Suggestion>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ProcessingStatus {
        &self.status
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.status, ProcessingStatus::Processing { .. })
    }

    pub fn current_task(&self) -> Option<&str> {
        match &self.status {
            ProcessingStatus::Processing { task } => Some(task),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ProcessingStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Apply one event. Transitions outside `Idle → Processing → {Idle, Error}` (and
    /// `Error → Idle` on `ClearError`, `Error → Processing` on `Start`) are ignored.
    pub fn apply(&mut self, event: AgentEvent) {
        let next = match (&self.status, event) {
            (ProcessingStatus::Idle | ProcessingStatus::Error { .. }, AgentEvent::Start(task)) => {
                Some(ProcessingStatus::Processing { task })
            }
            (ProcessingStatus::Processing { .. }, AgentEvent::Finish) => Some(ProcessingStatus::Idle),
            (ProcessingStatus::Processing { .. }, AgentEvent::Fail(message)) => {
                Some(ProcessingStatus::Error { message })
            }
            (ProcessingStatus::Error { .. }, AgentEvent::ClearError) => Some(ProcessingStatus::Idle),
            (_, AgentEvent::AddSuggestion(s)) => {
                self.suggestions.push(s);
                None
            }
            (_, AgentEvent::ClearSuggestions) => {
                self.suggestions.clear();
                None
            }
            (status, event) => {
                log::debug!("Ignoring {event:?} while {status:?}");
                None
            }
        };
        if let Some(status) = next {
            self.status = status;
        }
    }
}

/// Identifies one preview render request. Later tickets supersede earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Keeps the newest successful preview on screen while renders come and go.
///
/// Results that arrive for a superseded ticket are dropped. A failed render keeps the
/// previous artifact and records a notice instead of blanking the preview.
#[derive(Debug)]
pub struct PreviewController<A> {
    issued: u64,
    artifact: Option<A>,
    notice: Option<String>,
    current_page: usize,
    page_count: usize,
}

impl<A> Default for PreviewController<A> {
    fn default() -> Self {
        Self {
            issued: 0,
            artifact: None,
            notice: None,
            current_page: 1,
            page_count: 0,
        }
    }
}

impl<A> PreviewController<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Record the outcome of a render. Returns false when the ticket was superseded and
    /// the outcome discarded.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<(A, usize), Error>) -> bool {
        if !self.is_current(ticket) {
            log::debug!("Discarding stale preview {} (latest {})", ticket.0, self.issued);
            return false;
        }
        match outcome {
            Ok((artifact, page_count)) => {
                self.artifact = Some(artifact);
                self.notice = None;
                self.page_count = page_count;
                self.current_page = self.current_page.clamp(1, page_count.max(1));
            }
            Err(e) => {
                log::warn!("Preview render failed: {e}");
                self.notice = Some(e.to_string());
            }
        }
        true
    }

    pub fn artifact(&self) -> Option<&A> {
        self.artifact.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn next_page(&mut self) -> usize {
        self.current_page = (self.current_page + 1).min(self.page_count.max(1));
        self.current_page
    }

    pub fn prev_page(&mut self) -> usize {
        self.current_page = self.current_page.saturating_sub(1).max(1);
        self.current_page
    }
}
