use std::path::PathBuf;
use thiserror::Error;

use crate::replacer::ValueKind;

/// Errors raised while provisioning, compiling, naming or writing a template.
///
/// Every variant is fatal to the call that raised it. Nothing is retried and
/// no partial output is kept.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A placeholder was requested for a key that was never provided.
    #[error("You must provide replacer for {key}")]
    MissingReplacer { key: String },

    #[error("Value for {key} is already provided")]
    DuplicateProvision { key: String },

    /// Compile reached a value that is null, `false`, `0` or `""`.
    #[error("{key} has no value")]
    EmptyValue { key: String },

    /// Compile reached a non-string value with no transform attached.
    #[error("{key} holds a {found} value and needs a transform to become text")]
    TransformTypeMismatch { key: String, found: ValueKind },

    #[error("{key} expects a {expected} value, got {found}")]
    ValueKindMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("{key} is not a replacer declared by this template")]
    UndeclaredReplacer { key: String },

    /// A placeholder marker was empty, which would turn bare keys into placeholders.
    #[error("Placeholder marker must not be empty")]
    EmptyMarker,

    #[error("Invalid replacer key {key:?}: expected an identifier")]
    InvalidKey { key: String },

    /// The identifier left nothing to build a file name from.
    #[error("Identifier {identifier:?} yields an empty file name")]
    EmptyName { identifier: String },

    #[error("Unknown transform: {name}")]
    UnknownTransform { name: String },

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TemplateError>;
