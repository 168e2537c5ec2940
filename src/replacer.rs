use log::debug;
use regex::Regex;
use serde_json::Value;
use std::{fmt, sync::OnceLock};

use crate::error::{Result, TemplateError};

/// The marker wrapped around a key to build its placeholder.
pub const DEFAULT_MARKER: &str = "__";

/// The regex pattern a replacer key must match.
const KEY_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Renders a replacer value to its final text.
pub type Transform = Box<dyn Fn(&Value) -> String>;

/// The shape of a replacer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A replacer key declared by a template, with the kind of value it takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacerDecl {
    pub key: String,
    pub kind: ValueKind,
}

impl ReplacerDecl {
    pub fn new(key: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

/// A provided value and the transform that turns it into text.
pub struct Replacer {
    value: Value,
    transform: Option<Transform>,
}

impl Replacer {
    fn new(value: Value) -> Self {
        Self {
            value,
            transform: None,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Produces the text substituted for this replacer's placeholder.
    ///
    /// Presence is checked before the transform runs. Without a transform the
    /// value must already be a string.
    pub fn render(&self, key: &str) -> Result<String> {
        if !is_present(&self.value) {
            return Err(TemplateError::EmptyValue {
                key: key.to_string(),
            });
        }
        match (&self.transform, &self.value) {
            (Some(transform), value) => Ok(transform(value)),
            (None, Value::String(text)) => Ok(text.clone()),
            (None, value) => Err(TemplateError::TransformTypeMismatch {
                key: key.to_string(),
                found: ValueKind::of(value),
            }),
        }
    }
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacer")
            .field("value", &self.value)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Whether a value counts as provided: not null, `false`, zero or `""`.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(KEY_PATTERN).expect("key pattern is a valid regex"))
}

/// The per-instance replacer registry.
///
/// Entries keep their registration order, which is the order substitution
/// runs in at compile time.
#[derive(Debug)]
pub struct Replacers {
    marker: String,
    declared: Vec<ReplacerDecl>,
    entries: Vec<(String, Replacer)>,
}

impl Replacers {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `marker` - The text wrapped around keys to form placeholders.
    /// * `declared` - The keys the template accepts. Empty accepts any identifier.
    pub(crate) fn new(marker: impl Into<String>, declared: Vec<ReplacerDecl>) -> Self {
        Self {
            marker: marker.into(),
            declared,
            entries: Vec::new(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub(crate) fn set_marker(&mut self, marker: String) -> Result<()> {
        if marker.is_empty() {
            return Err(TemplateError::EmptyMarker);
        }
        self.marker = marker;
        Ok(())
    }

    pub fn declared(&self) -> &[ReplacerDecl] {
        &self.declared
    }

    /// The placeholder text for `key` under this registry's marker.
    pub fn placeholder(&self, key: &str) -> String {
        format!("{0}{1}{0}", self.marker, key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn replacer(&self, key: &str) -> Option<&Replacer> {
        self.entry(key)
    }

    fn entry(&self, key: &str) -> Option<&Replacer> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, replacer)| replacer)
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut Replacer> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, replacer)| replacer)
    }

    /// Registers the value for `key`. Each key can be provided once.
    pub fn provide(&mut self, key: &str, value: Value) -> Result<()> {
        if !key_pattern().is_match(key) {
            return Err(TemplateError::InvalidKey {
                key: key.to_string(),
            });
        }
        if !self.declared.is_empty() {
            let decl = self
                .declared
                .iter()
                .find(|decl| decl.key == key)
                .ok_or_else(|| TemplateError::UndeclaredReplacer {
                    key: key.to_string(),
                })?;
            let found = ValueKind::of(&value);
            if decl.kind != found {
                return Err(TemplateError::ValueKindMismatch {
                    key: key.to_string(),
                    expected: decl.kind,
                    found,
                });
            }
        }
        if self.contains(key) {
            return Err(TemplateError::DuplicateProvision {
                key: key.to_string(),
            });
        }
        debug!("Provided replacer {}", key);
        self.entries.push((key.to_string(), Replacer::new(value)));
        Ok(())
    }

    /// Attaches `transform` to an already provided key and returns its placeholder.
    ///
    /// Passing `None` clears a previously attached transform.
    pub fn get_replacer(&mut self, key: &str, transform: Option<Transform>) -> Result<String> {
        let replacer = self
            .entry_mut(key)
            .ok_or_else(|| TemplateError::MissingReplacer {
                key: key.to_string(),
            })?;
        replacer.transform = transform;
        Ok(self.placeholder(key))
    }

    /// Placeholder for `key`, substituted with the value as-is.
    pub fn get(&mut self, key: &str) -> Result<String> {
        self.get_replacer(key, None)
    }

    /// Placeholder for `key`, substituted with `transform(value)`.
    pub fn get_with<F>(&mut self, key: &str, transform: F) -> Result<String>
    where
        F: Fn(&Value) -> String + 'static,
    {
        self.get_replacer(key, Some(Box::new(transform)))
    }

    pub(crate) fn ensure_declared_provided(&self) -> Result<()> {
        match self.declared.iter().find(|decl| !self.contains(&decl.key)) {
            Some(decl) => Err(TemplateError::MissingReplacer {
                key: decl.key.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Replaces every placeholder in `text` in a single left-to-right scan.
    ///
    /// Every entry is rendered before the text is touched, so one bad value
    /// fails the whole call. Rendered values are never scanned again.
    pub fn substitute(&self, text: String) -> Result<String> {
        let mut rendered = Vec::with_capacity(self.entries.len());
        for (key, replacer) in &self.entries {
            rendered.push((self.placeholder(key), replacer.render(key)?));
        }
        if rendered.is_empty() {
            return Ok(text);
        }
        // Longest first: `__a_b__` must win over `__a__` at the same offset.
        rendered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut output = String::with_capacity(text.len());
        let mut rest = text.as_str();
        while let Some(start) = rest.find(self.marker.as_str()) {
            let candidate = &rest[start..];
            match rendered
                .iter()
                .find(|(placeholder, _)| candidate.starts_with(placeholder.as_str()))
            {
                Some((placeholder, value)) => {
                    output.push_str(&rest[..start]);
                    output.push_str(value);
                    rest = &candidate[placeholder.len()..];
                }
                None => {
                    let Some(first) = candidate.chars().next() else {
                        break;
                    };
                    let step = start + first.len_utf8();
                    output.push_str(&rest[..step]);
                    rest = &rest[step..];
                }
            }
        }
        output.push_str(rest);
        Ok(output)
    }
}
