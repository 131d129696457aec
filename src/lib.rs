//! Furigana annotation engine: convert Japanese text fragments between
//! `base[reading]` bracket notation and rendered ruby markup, generate new
//! readings through an external morphological annotator, and strip readings
//! back to plain text.
//!
//! The core is a placeholder protection engine ([`protect`]) that shields
//! syntactically significant regions (cloze deletions, fill-in-blank fields,
//! sound references, markup tags, line breaks, existing annotations) from
//! pattern rewriting and from the annotator, plus the bidirectional bracket
//! grammar ([`grammar`]) and markup converter ([`ruby`]) built on top of it.
//! Every public operation is a pure, re-entrant function over its input text
//! and the lifetime of its protection sessions.

pub mod config;
pub mod detector;
pub mod error;
pub mod generator;
pub mod grammar;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod protect;
pub mod ruby;
pub mod selection;

pub use config::{Config, ReadingsPattern};
pub use error::{Error, Result};
pub use generator::{CommandGenerator, ReadingGenerator};
pub use grammar::FuriganaUnit;
pub use normalizer::{normalize_boundaries, Normalized};
pub use pipeline::{delete_ruby, generate_ruby, DeleteOutcome, GenerateOutcome};
pub use selection::{splice_strategy, EditorPort, SelectionContext, SpliceStrategy};
