use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::engine::{Template, TemplateInstance};
use crate::error::{Result as TemplateResult, TemplateError};
use crate::naming::{self, FileName};
use crate::replacer::{ReplacerDecl, Replacers, Transform, ValueKind, DEFAULT_MARKER};
use crate::transforms;

#[derive(Debug, Deserialize)]
pub struct PlacardConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Output directory, relative to the config file.
    pub output: Option<String>,
    pub templates: Vec<TemplateEntry>,
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateEntry {
    pub identifier: String,
    pub name: Option<String>,
    pub extension: Option<String>,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    pub body: Option<String>,
    pub file: Option<String>,
    /// Replacers in the order the file lists them.
    #[serde(default, deserialize_with = "ordered_replacers")]
    pub replacers: Vec<(String, ReplacerEntry)>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn ordered_replacers<'de, D>(deserializer: D) -> Result<Vec<(String, ReplacerEntry)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{MapAccess, Visitor};

    struct ReplacersVisitor;

    impl<'de> Visitor<'de> for ReplacersVisitor {
        type Value = Vec<(String, ReplacerEntry)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of replacer keys to values")
        }

        fn visit_map<V>(self, mut map: V) -> Result<Self::Value, V::Error>
        where
            V: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(ReplacersVisitor)
}

fn default_suffix() -> String {
    naming::DEFAULT_SUFFIX.to_string()
}

fn default_enabled() -> bool {
    true
}

/// A configured replacer: either a bare value or a value with a transform name.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ReplacerEntry {
    Detailed(DetailedReplacer),
    Plain(Value),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DetailedReplacer {
    pub value: Value,
    pub transform: Option<String>,
}

impl ReplacerEntry {
    pub fn value(&self) -> &Value {
        match self {
            ReplacerEntry::Detailed(detailed) => &detailed.value,
            ReplacerEntry::Plain(value) => value,
        }
    }

    pub fn transform(&self) -> Option<&str> {
        match self {
            ReplacerEntry::Detailed(detailed) => detailed.transform.as_deref(),
            ReplacerEntry::Plain(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Template {0} needs exactly one of `body` or `file`")]
    MissingBody(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl PlacardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: PlacardConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

impl TemplateEntry {
    /// The configured replacer for `key`.
    pub fn replacer(&self, key: &str) -> Option<&ReplacerEntry> {
        self.replacers
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, replacer)| replacer)
    }

    /// Reads the body, resolving `file` against `base_dir`.
    pub fn load_body(&self, base_dir: &Path) -> Result<String, ConfigError> {
        match (&self.body, &self.file) {
            (Some(body), None) => Ok(body.clone()),
            (None, Some(file)) => Ok(std::fs::read_to_string(base_dir.join(file))?),
            _ => Err(ConfigError::MissingBody(self.identifier.clone())),
        }
    }

    /// Builds the template and an instance with every configured value provided.
    ///
    /// # Arguments
    ///
    /// * `base_dir` - The directory `file` bodies are relative to.
    /// * `marker` - The placeholder marker for the instance.
    ///
    /// # Returns
    ///
    /// An instance ready to compile, or the first configuration error.
    pub fn instantiate(
        &self,
        base_dir: &Path,
        marker: &str,
    ) -> Result<TemplateInstance<ConfiguredTemplate>, ConfigError> {
        let template = ConfiguredTemplate::from_entry(self, self.load_body(base_dir)?)?;
        let mut instance = TemplateInstance::new(template).with_marker(marker)?;
        for (key, replacer) in &self.replacers {
            instance.provide_replacer(key, replacer.value().clone())?;
        }
        Ok(instance)
    }
}

/// A template defined at runtime from a [`TemplateEntry`].
///
/// Its body is used as written: a leading newline is prepended so the
/// formatter's first-line drop never eats content.
#[derive(Debug, Clone)]
pub struct ConfiguredTemplate {
    identifier: String,
    suffix: String,
    name: Option<String>,
    extension: Option<String>,
    body: String,
    declared: Vec<ReplacerDecl>,
    transforms: Vec<(String, Option<String>)>,
}

impl ConfiguredTemplate {
    pub fn from_entry(entry: &TemplateEntry, body: String) -> TemplateResult<Self> {
        let mut declared = Vec::new();
        let mut resolved = Vec::new();
        for (key, replacer) in &entry.replacers {
            declared.push(ReplacerDecl::new(key.clone(), ValueKind::of(replacer.value())));
            if let Some(name) = replacer.transform() {
                transforms::lookup(name)?;
            }
            resolved.push((key.clone(), replacer.transform().map(str::to_string)));
        }
        Ok(Self {
            identifier: entry.identifier.clone(),
            suffix: entry.suffix.clone(),
            name: entry.name.clone(),
            extension: entry.extension.clone(),
            body,
            declared,
            transforms: resolved,
        })
    }
}

impl Template for ConfiguredTemplate {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn content(&self, replacers: &mut Replacers) -> TemplateResult<String> {
        for (key, transform) in &self.transforms {
            let transform = transform
                .as_deref()
                .map(transforms::lookup)
                .transpose()?
                .map(|f| Box::new(f) as Transform);
            replacers.get_replacer(key, transform)?;
        }
        Ok(format!("\n{}", self.body))
    }

    fn replacers(&self) -> Vec<ReplacerDecl> {
        self.declared.clone()
    }

    fn name_suffix(&self) -> &str {
        &self.suffix
    }

    fn file_name(&self) -> TemplateResult<FileName> {
        match &self.name {
            Some(name) => FileName::new(name.clone(), self.extension.clone()),
            None => {
                let derived = naming::derive(&self.identifier, &self.suffix, str::to_string)?;
                match &self.extension {
                    Some(_) => Ok(derived.with_extension(self.extension.clone())),
                    None => Ok(derived),
                }
            }
        }
    }
}
