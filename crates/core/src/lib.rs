//! Non-destructive string editing with Source Map v3 generation.
//!
//! This crate lets callers rewrite an immutable source text through a sequence of positional
//! edits — left/right insertions anchored at an original byte offset, and range overwrites — and
//! then materialize both the edited output and a Source Map v3 that points every generated
//! position back at the original source.
//!
//! Entry points:
//!
//! - [`editor::Editor`] is the single-layer editor: `append_left`, `append_right`, `overwrite`,
//!   `to_string`, `generate_map`.
//! - [`stack::StackedEditor`] layers editors on top of one another (`commit`/`rollback`) and
//!   composes their maps transitively.
//!
//! Internals:
//!
//! - [`vlq`] implements the Base64 VLQ codec used by Source Map v3's `mappings` field.
//! - [`segment`] holds the segment list that tracks provenance through inserts/splits/overwrites.
//! - [`map`] defines the decoded map model, the generator that walks a segment list into one, and
//!   the VLQ-encoded wire format.
//! - [`merge`] composes a chain of decoded maps into a single one (used by the stacked editor).

pub mod editor;
pub mod map;
pub mod merge;
pub mod segment;
pub mod stack;
pub mod vlq;

pub use editor::Editor;
pub use map::{DecodedMap, SourceMapOptions, SourceMapV3};
pub use stack::StackedEditor;
pub use vlq::VlqError;

/// Errors that can occur while editing or generating a map.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("invalid range: start={start} end={end}")]
    InvalidRange { start: usize, end: usize },

    #[error("offset {offset} does not address an editable segment")]
    OffsetNotFound { offset: usize },

    #[error("offset {offset} is out of bounds (source length is {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("cannot rollback: only the base layer remains")]
    CannotRollbackBase,

    #[error("no decoded maps were provided to merge")]
    NoSourceMaps,

    #[error("invalid transform map: {0}")]
    InvalidTransformMap(String),

    #[error(transparent)]
    Vlq(#[from] VlqError),
}
