use std::fmt;

use crate::error::{Result, TemplateError};

/// The suffix stripped from identifiers before they are segmented.
pub const DEFAULT_SUFFIX: &str = "Template";

/// The output file name of a template: a base name and an optional extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    name: String,
    extension: Option<String>,
}

impl FileName {
    /// Creates an explicit file name. An empty name is rejected.
    pub fn new(name: impl Into<String>, extension: Option<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TemplateError::EmptyName { identifier: name });
        }
        Ok(Self {
            name,
            extension: extension.filter(|ext| !ext.is_empty()),
        })
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension.filter(|ext| !ext.is_empty());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// `name.extension`, or just `name` when there is no extension.
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extension {
            Some(ext) => write!(f, "{}.{}", self.name, ext),
            None => f.write_str(&self.name),
        }
    }
}

/// Splits an identifier before every ASCII uppercase letter.
///
/// `UserControllerPhp` gives `["User", "Controller", "Php"]`, `HTTPServer`
/// gives `["H", "T", "T", "P", "Server"]`.
pub fn segments(identifier: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (at, c) in identifier.char_indices() {
        if c.is_ascii_uppercase() && at > start {
            segments.push(&identifier[start..at]);
            start = at;
        }
    }
    if start < identifier.len() {
        segments.push(&identifier[start..]);
    }
    segments
}

/// Derives a file name from a declared identifier.
///
/// # Arguments
///
/// * `identifier` - The template's declared identifier, e.g. `UserControllerPhp`.
/// * `suffix` - Stripped from the end of `identifier` when present.
/// * `filter` - Applied to each lower-cased base-name segment before joining.
///
/// # Returns
///
/// The derived `FileName`. With more than one segment the last one becomes
/// the extension. An identifier left with no segments is an `EmptyName` error.
pub fn derive<F>(identifier: &str, suffix: &str, filter: F) -> Result<FileName>
where
    F: Fn(&str) -> String,
{
    let stem = identifier.strip_suffix(suffix).unwrap_or(identifier);
    let mut parts: Vec<String> = segments(stem).into_iter().map(str::to_lowercase).collect();

    let extension = if parts.len() > 1 { parts.pop() } else { None };
    let name = parts
        .iter()
        .map(|part| filter(part))
        .collect::<Vec<_>>()
        .join("-");

    if name.is_empty() {
        return Err(TemplateError::EmptyName {
            identifier: identifier.to_string(),
        });
    }
    Ok(FileName { name, extension })
}
