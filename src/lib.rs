//! Placeholder-substitution engine for generating source files.
//!
//! A [`Template`] returns a body containing placeholder keys (`__key__` by
//! default). Callers provide a value per key on a [`TemplateInstance`],
//! compile it, and read the result or hand it to the [`FileGenerator`]. The
//! output file name is derived from the template's identifier by
//! [`naming::derive`].

pub mod config;
pub mod engine;
pub mod error;
pub mod formatting;
pub mod generator;
pub mod naming;
pub mod replacer;
pub mod transforms;

pub use config::{ConfigError, ConfiguredTemplate, PlacardConfig, TemplateEntry};
pub use engine::{Template, TemplateInstance};
pub use error::{Result, TemplateError};
pub use generator::FileGenerator;
pub use naming::FileName;
pub use replacer::{ReplacerDecl, Replacers, Transform, ValueKind, DEFAULT_MARKER};
