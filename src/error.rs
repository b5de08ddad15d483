//! Error type for the fallible edges of the engine.
//!
//! Parsing, layout, routing and label placement are total and never produce
//! an [`Error`]; only configuration loading and dialect name lookups do.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON5 config: {0}")]
    Json5(#[from] json5::Error),

    #[error("unknown diagram type \"{0}\" (expected usecase, sequence, class or state)")]
    UnknownKind(String),
}

pub type Result<T> = std::result::Result<T, Error>;
