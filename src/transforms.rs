use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use serde_json::Value;
use ::uuid::Uuid;

use crate::error::{Result, TemplateError};

/// A named, pure value-to-text transform.
pub type TransformFn = fn(&Value) -> String;

/// Names accepted by [`lookup`].
pub const NAMES: &[&str] = &[
    "camelcase",
    "pascalcase",
    "snakecase",
    "kebabcase",
    "screamingsnakecase",
    "uppercase",
    "lowercase",
    "json",
    "uuid",
];

/// Namespace the `uuid` transform derives its v5 UUIDs under.
const PLACARD_NS_NAME: &str = "placard.transforms.uuid";

/// Resolves a transform by name.
pub fn lookup(name: &str) -> Result<TransformFn> {
    let transform: TransformFn = match name {
        "camelcase" => camelcase,
        "pascalcase" => pascalcase,
        "snakecase" => snakecase,
        "kebabcase" => kebabcase,
        "screamingsnakecase" => screamingsnakecase,
        "uppercase" => uppercase,
        "lowercase" => lowercase,
        "json" => json,
        "uuid" => uuid,
        _ => {
            return Err(TemplateError::UnknownTransform {
                name: name.to_string(),
            })
        }
    };
    Ok(transform)
}

/// The value as text: strings as-is, anything else as JSON.
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn camelcase(value: &Value) -> String {
    text(value).to_lower_camel_case()
}

pub fn pascalcase(value: &Value) -> String {
    text(value).to_pascal_case()
}

pub fn snakecase(value: &Value) -> String {
    text(value).to_snake_case()
}

pub fn kebabcase(value: &Value) -> String {
    text(value).to_kebab_case()
}

pub fn screamingsnakecase(value: &Value) -> String {
    text(value).to_shouty_snake_case()
}

pub fn uppercase(value: &Value) -> String {
    text(value).to_uppercase()
}

pub fn lowercase(value: &Value) -> String {
    text(value).to_lowercase()
}

/// Compact JSON, strings included (quoted).
pub fn json(value: &Value) -> String {
    value.to_string()
}

/// A deterministic v5 UUID of the value's text.
pub fn uuid(value: &Value) -> String {
    let namespace = Uuid::new_v5(&Uuid::NAMESPACE_DNS, PLACARD_NS_NAME.as_bytes());
    Uuid::new_v5(&namespace, text(value).as_bytes()).to_string()
}
