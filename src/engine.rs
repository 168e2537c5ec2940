use log::debug;
use serde_json::Value;
use std::{
    cell::OnceCell,
    fmt,
    path::{Path, PathBuf},
    thread::JoinHandle,
};

use crate::error::Result;
use crate::formatting;
use crate::generator::FileGenerator;
use crate::naming::{self, FileName};
use crate::replacer::{ReplacerDecl, Replacers, Transform, DEFAULT_MARKER};

/// A template definition.
///
/// Implementors provide a body through [`Template::content`], which embeds
/// placeholders obtained from the registry it is handed. Requesting a
/// placeholder is also where a key's transform is declared:
///
/// ```
/// use placard::{Replacers, Template, TemplateInstance};
///
/// struct GreetingTxt;
///
/// impl Template for GreetingTxt {
///     fn identifier(&self) -> &str {
///         "GreetingTxt"
///     }
///
///     fn content(&self, replacers: &mut Replacers) -> placard::Result<String> {
///         Ok(format!(
///             "
///             Hello {}!
///             ",
///             replacers.get_with("name", |v| v.as_str().unwrap_or_default().to_uppercase())?
///         ))
///     }
/// }
///
/// let mut greeting = TemplateInstance::new(GreetingTxt);
/// greeting.provide_replacer("name", "world")?.compile()?;
/// assert_eq!(greeting.to_string(), "Hello WORLD!\n");
/// assert_eq!(greeting.full_name()?, "greeting.txt");
/// # Ok::<(), placard::TemplateError>(())
/// ```
pub trait Template {
    /// The declared identifier file names are derived from.
    fn identifier(&self) -> &str;

    /// The raw, placeholder-bearing body. It goes through
    /// [`formatting::format`] before substitution.
    fn content(&self, replacers: &mut Replacers) -> Result<String>;

    /// The keys this template accepts. Empty means any identifier is accepted
    /// and nothing is required.
    fn replacers(&self) -> Vec<ReplacerDecl> {
        Vec::new()
    }

    fn name_suffix(&self) -> &str {
        naming::DEFAULT_SUFFIX
    }

    /// Applied to each base-name segment during derivation.
    fn name_filter(&self, segment: &str) -> String {
        segment.to_string()
    }

    /// The output file name. Derived from [`Template::identifier`] unless
    /// overridden with an explicit one.
    fn file_name(&self) -> Result<FileName> {
        naming::derive(self.identifier(), self.name_suffix(), |segment| {
            self.name_filter(segment)
        })
    }
}

/// A template together with its replacer registry and compiled text.
pub struct TemplateInstance<T: Template> {
    template: T,
    replacers: Replacers,
    compiled: String,
    file_name: OnceCell<FileName>,
}

impl<T: Template> TemplateInstance<T> {
    pub fn new(template: T) -> Self {
        let replacers = Replacers::new(DEFAULT_MARKER, template.replacers());
        Self {
            template,
            replacers,
            compiled: String::new(),
            file_name: OnceCell::new(),
        }
    }

    /// Uses `marker` instead of `__` around placeholder keys.
    ///
    /// Fails with [`crate::TemplateError::EmptyMarker`] when `marker` is empty.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Result<Self> {
        self.replacers.set_marker(marker.into())?;
        Ok(self)
    }

    pub fn template(&self) -> &T {
        &self.template
    }

    pub fn replacers(&self) -> &Replacers {
        &self.replacers
    }

    /// Supplies the value for `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - A key the template declares (or any identifier for open templates).
    /// * `value` - The raw value. Strings are substituted as-is, anything else
    ///   needs a transform attached by the template body.
    ///
    /// # Returns
    ///
    /// The instance, for chaining, or the provisioning error.
    pub fn provide_replacer(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.replacers.provide(key, value.into())?;
        Ok(self)
    }

    /// Attaches `transform` to `key` and returns its placeholder.
    pub fn get_replacer(&mut self, key: &str, transform: Option<Transform>) -> Result<String> {
        self.replacers.get_replacer(key, transform)
    }

    /// Formats the body and substitutes every provided replacer.
    ///
    /// On error the previously compiled text is left as it was.
    pub fn compile(&mut self) -> Result<&mut Self> {
        self.replacers.ensure_declared_provided()?;
        let raw = self.template.content(&mut self.replacers)?;
        let compiled = self.replacers.substitute(formatting::format(&raw))?;
        debug!(
            "Compiled {} with {} replacers",
            self.template.identifier(),
            self.replacers.len()
        );
        self.compiled = compiled;
        Ok(self)
    }

    pub fn compiled(&self) -> &str {
        &self.compiled
    }

    /// The output file name, computed on first use.
    pub fn file_name(&self) -> Result<&FileName> {
        if let Some(file_name) = self.file_name.get() {
            return Ok(file_name);
        }
        let file_name = self.template.file_name()?;
        Ok(self.file_name.get_or_init(|| file_name))
    }

    pub fn name(&self) -> Result<&str> {
        Ok(self.file_name()?.name())
    }

    pub fn extension(&self) -> Result<Option<&str>> {
        Ok(self.file_name()?.extension())
    }

    pub fn full_name(&self) -> Result<String> {
        Ok(self.file_name()?.full_name())
    }

    /// Writes the compiled text to `dir/<full name>` and waits for it.
    pub fn write_sync(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        FileGenerator::default().write_sync(dir.as_ref(), &self.full_name()?, &self.compiled)
    }

    /// Writes the compiled text to `dir/<full name>` on a background thread.
    ///
    /// `on_done` receives the written path or the I/O error.
    pub fn write<F>(&self, dir: impl AsRef<Path>, on_done: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<PathBuf>) + Send + 'static,
    {
        Ok(FileGenerator::default().write(
            dir.as_ref(),
            &self.full_name()?,
            self.compiled.clone(),
            on_done,
        ))
    }

    /// Writes the compiled text to `dir/<full name>` on a background thread.
    ///
    /// Join the handle for the written path or the I/O error.
    pub fn spawn_write(&self, dir: impl AsRef<Path>) -> Result<JoinHandle<Result<PathBuf>>> {
        Ok(FileGenerator::default().spawn_write(
            dir.as_ref(),
            &self.full_name()?,
            self.compiled.clone(),
        ))
    }
}

impl<T: Template> fmt::Display for TemplateInstance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compiled)
    }
}

impl<T: Template> fmt::Debug for TemplateInstance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateInstance")
            .field("identifier", &self.template.identifier())
            .field("replacers", &self.replacers)
            .field("compiled", &self.compiled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::replacer::ValueKind;
    use serde_json::json;

    struct HelloTxt;

    impl Template for HelloTxt {
        fn identifier(&self) -> &str {
            "HelloTxt"
        }

        fn content(&self, replacers: &mut Replacers) -> Result<String> {
            Ok(format!("\n  Hello {}!\n", replacers.get("name")?))
        }
    }

    struct StructRs;

    impl Template for StructRs {
        fn identifier(&self) -> &str {
            "UserModelRs"
        }

        fn replacers(&self) -> Vec<ReplacerDecl> {
            vec![
                ReplacerDecl::new("name", ValueKind::String),
                ReplacerDecl::new("fields", ValueKind::Array),
            ]
        }

        fn content(&self, replacers: &mut Replacers) -> Result<String> {
            let name = replacers.get_with("name", crate::transforms::pascalcase)?;
            let fields = replacers.get_with("fields", |value| {
                value
                    .as_array()
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|f| format!("    pub {}: String,", crate::transforms::text(f)))
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .unwrap_or_default()
            })?;
            Ok(format!(
                "
                pub struct {name} {{
                {fields}
                }}
                "
            ))
        }
    }

    #[test]
    fn test_compile_end_to_end() {
        let mut hello = TemplateInstance::new(HelloTxt);
        hello.provide_replacer("name", "World").unwrap();
        hello.compile().unwrap();
        assert_eq!(hello.compiled(), "Hello World!\n");
        assert_eq!(hello.to_string(), "Hello World!\n");
    }

    #[test]
    fn test_compile_requires_provision_before_placeholder() {
        let mut hello = TemplateInstance::new(HelloTxt);
        let err = hello.compile().unwrap_err();
        assert!(matches!(err, TemplateError::MissingReplacer { ref key } if key == "name"));
        assert_eq!(hello.compiled(), "");
    }

    #[test]
    fn test_compile_rejects_empty_values() {
        for value in [json!(""), json!(0), json!(null)] {
            let mut hello = TemplateInstance::new(HelloTxt);
            hello.provide_replacer("name", value).unwrap();
            assert!(matches!(
                hello.compile(),
                Err(TemplateError::EmptyValue { ref key }) if key == "name"
            ));
        }
    }

    #[test]
    fn test_compile_rejects_untransformed_non_strings() {
        let mut hello = TemplateInstance::new(HelloTxt);
        hello.provide_replacer("name", 42).unwrap();
        assert!(matches!(
            hello.compile(),
            Err(TemplateError::TransformTypeMismatch {
                found: ValueKind::Number,
                ..
            })
        ));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut hello = TemplateInstance::new(HelloTxt);
        hello.provide_replacer("name", "again").unwrap();
        let first = hello.compile().unwrap().compiled().to_string();
        let second = hello.compile().unwrap().compiled().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_compile_keeps_previous_output() {
        struct Two;
        impl Template for Two {
            fn identifier(&self) -> &str {
                "Two"
            }
            fn content(&self, replacers: &mut Replacers) -> Result<String> {
                Ok(format!("\n{}{}", replacers.get("a")?, replacers.get("b")?))
            }
        }

        let mut two = TemplateInstance::new(Two);
        two.provide_replacer("a", "1").unwrap();
        assert!(two.compile().is_err());
        assert_eq!(two.compiled(), "");
    }

    #[test]
    fn test_declared_template() {
        let mut model = TemplateInstance::new(StructRs);
        model
            .provide_replacer("fields", json!(["id", "email"]))
            .unwrap()
            .provide_replacer("name", "user_model")
            .unwrap();
        model.compile().unwrap();
        assert_eq!(
            model.compiled(),
            "pub struct UserModel {\n    pub id: String,\n    pub email: String,\n}\n"
        );
        assert_eq!(model.full_name().unwrap(), "user-model.rs");
        assert_eq!(model.extension().unwrap(), Some("rs"));
    }

    #[test]
    fn test_declared_template_requires_every_key() {
        let mut model = TemplateInstance::new(StructRs);
        model.provide_replacer("name", "user").unwrap();
        assert!(matches!(
            model.compile(),
            Err(TemplateError::MissingReplacer { ref key }) if key == "fields"
        ));
    }

    #[test]
    fn test_custom_marker() {
        struct Marked;
        impl Template for Marked {
            fn identifier(&self) -> &str {
                "Marked"
            }
            fn content(&self, replacers: &mut Replacers) -> Result<String> {
                Ok(format!("\nlet __keep__ = \"{}\";", replacers.get("value")?))
            }
        }

        let mut marked = TemplateInstance::new(Marked).with_marker("@@").unwrap();
        marked.provide_replacer("value", "v").unwrap();
        let placeholder = marked.get_replacer("value", None).unwrap();
        assert_eq!(placeholder, "@@value@@");
        marked.compile().unwrap();
        assert_eq!(marked.compiled(), "let __keep__ = \"v\";\n");
    }

    #[test]
    fn test_empty_marker_rejected() {
        assert!(matches!(
            TemplateInstance::new(HelloTxt).with_marker(""),
            Err(TemplateError::EmptyMarker)
        ));
    }

    #[test]
    fn test_compile_does_not_expand_placeholders_inside_values() {
        struct Pair;
        impl Template for Pair {
            fn identifier(&self) -> &str {
                "PairTxt"
            }
            fn content(&self, replacers: &mut Replacers) -> Result<String> {
                Ok(format!("\n{} {}\n", replacers.get("a")?, replacers.get("b")?))
            }
        }

        let mut a_first = TemplateInstance::new(Pair);
        a_first.provide_replacer("a", "see __b__").unwrap();
        a_first.provide_replacer("b", "X").unwrap();
        a_first.compile().unwrap();

        let mut b_first = TemplateInstance::new(Pair);
        b_first.provide_replacer("b", "X").unwrap();
        b_first.provide_replacer("a", "see __b__").unwrap();
        b_first.compile().unwrap();

        assert_eq!(a_first.compiled(), "see __b__ X\n");
        assert_eq!(b_first.compiled(), a_first.compiled());
    }

    #[test]
    fn test_spawn_write_returns_path_through_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mut hello = TemplateInstance::new(HelloTxt);
        hello.provide_replacer("name", "thread").unwrap();
        hello.compile().unwrap();
        let path = hello.spawn_write(dir.path()).unwrap().join().unwrap().unwrap();
        assert_eq!(path, dir.path().join("hello.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Hello thread!\n");
    }

    #[test]
    fn test_name_filter_and_memoized_file_name() {
        struct PrefixedHelperTemplate;
        impl Template for PrefixedHelperTemplate {
            fn identifier(&self) -> &str {
                "PrefixedHelperTemplate"
            }
            fn name_filter(&self, segment: &str) -> String {
                format!("x{}", segment)
            }
            fn content(&self, _replacers: &mut Replacers) -> Result<String> {
                Ok(String::new())
            }
        }

        let instance = TemplateInstance::new(PrefixedHelperTemplate);
        assert_eq!(instance.name().unwrap(), "xprefixed");
        assert_eq!(instance.full_name().unwrap(), "xprefixed.helper");
        assert!(std::ptr::eq(
            instance.file_name().unwrap(),
            instance.file_name().unwrap()
        ));
    }
}
