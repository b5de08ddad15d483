//! Parse a small UML-ish text dialect and lay it out into routed geometry.
//!
//! The pipeline is [`parse`] → [`resolve_active_kind`] → [`compute_layout`].
//! Parsing and layout are total: malformed lines become entries in
//! [`ParseResult::errors`] and edges with missing endpoints are skipped.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod samples;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{load_config, LayoutConfig};
pub use error::{Error, Result};
pub use ir::{DetectedType, DiagramKind, DiagramModel, ParseResult};
pub use layout::{compute_layout, Layout};
pub use layout_dump::LayoutDump;
pub use parser::{parse, resolve_active_kind};
