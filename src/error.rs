use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A page dimension, font size or spacing value that cannot produce a layout.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The active face has no width for this character.
    #[error("cannot measure {ch:?} with font {font}")]
    MeasurementFailure { ch: char, font: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("font error: {0}")]
    Font(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// An owner or paper id that cannot name a stored document.
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    #[error("user must be authenticated")]
    Unauthenticated,

    /// Error message returned by the generation service, passed through unchanged.
    #[error("{0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(String),
}
