//! Configuration document validation.
//!
//! A config document is validated once, member by member, into the typed
//! [`Config`]. Errors name the offending member path (`items.0.dir.depth`)
//! so users can find the problem in nested files.

use serde_json::{Map, Value};

use crate::error::{CtxKitError, Result};
use crate::types::{Config, DirItem, Item, VarItem};

/// Human-readable description of the configuration document format.
pub const CONFIG_SCHEMA_DOC: &str = r#"# The ctxkit configuration file format
struct Config

    # The prompt items, in output order
    Item[len > 0] items


# A prompt item (exactly one member)
union Item

    # Nested config file path or URL, relative to this config
    string config

    # A prompt message
    string message

    # A long prompt message, one string per line
    string[len > 0] long

    # File path or URL text, included verbatim
    string include

    # File path or URL text, wrapped in <path> tags
    string file

    # A directory's text files, each wrapped in <path> tags
    DirItem dir

    # A variable definition (reference with "{{name}}")
    VarItem var


# A directory item
struct DirItem

    # The directory path
    string path

    # The file extensions to include (e.g. ".rs"); none matches nothing
    optional string[] exts

    # The directory traversal depth (default is 0, unbounded)
    optional int(>= 0) depth


# A variable definition item
struct VarItem

    # The variable's name
    string name

    # The variable's value
    string value"#;

const ITEM_KEYS: [&str; 7] = ["config", "message", "long", "include", "file", "dir", "var"];
const DIR_KEYS: [&str; 3] = ["path", "exts", "depth"];
const VAR_KEYS: [&str; 2] = ["name", "value"];

/// Parse and validate config text loaded from `origin`.
pub fn parse_config(text: &str, origin: &str) -> Result<Config> {
    let doc: Value = serde_json::from_str(text).map_err(|e| CtxKitError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;
    validate_config(&doc)
}

/// Validate a raw JSON document against the config schema.
pub fn validate_config(doc: &Value) -> Result<Config> {
    let obj = expect_object(doc, "", "Config")?;
    reject_unknown(obj, "", &["items"])?;

    let items = obj
        .get("items")
        .ok_or_else(|| required("items"))?;
    let Value::Array(raw_items) = items else {
        return Err(invalid(items, "items", "array", None));
    };
    if raw_items.is_empty() {
        return Err(invalid(items, "items", "array", Some("len > 0")));
    }

    let items = raw_items
        .iter()
        .enumerate()
        .map(|(ix, raw)| validate_item(raw, &format!("items.{ix}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(Config { items })
}

fn validate_item(raw: &Value, path: &str) -> Result<Item> {
    let obj = expect_object(raw, path, "Item")?;
    reject_unknown(obj, path, &ITEM_KEYS)?;

    let mut members = obj.iter();
    let (Some((key, value)), None) = (members.next(), members.next()) else {
        return Err(invalid(raw, path, "Item", None));
    };
    let member = format!("{path}.{key}");

    let item = match key.as_str() {
        "config" => Item::Config(expect_string(value, &member)?),
        "message" => Item::Message(expect_string(value, &member)?),
        "include" => Item::Include(expect_string(value, &member)?),
        "file" => Item::File(expect_string(value, &member)?),
        "long" => {
            let lines = expect_string_array(value, &member)?;
            if lines.is_empty() {
                return Err(invalid(value, &member, "array", Some("len > 0")));
            }
            Item::Long(lines)
        }
        "dir" => Item::Dir(validate_dir(value, &member)?),
        "var" => Item::Var(validate_var(value, &member)?),
        _ => unreachable!("unknown members rejected above"),
    };
    Ok(item)
}

fn validate_dir(raw: &Value, path: &str) -> Result<DirItem> {
    let obj = expect_object(raw, path, "DirItem")?;
    reject_unknown(obj, path, &DIR_KEYS)?;

    let dir_path = obj
        .get("path")
        .ok_or_else(|| required(&format!("{path}.path")))?;
    let dir_path = expect_string(dir_path, &format!("{path}.path"))?;

    let exts = match obj.get("exts") {
        Some(value) => expect_string_array(value, &format!("{path}.exts"))?,
        None => Vec::new(),
    };

    let depth = match obj.get("depth") {
        Some(value) => expect_depth(value, &format!("{path}.depth"))?,
        None => 0,
    };

    Ok(DirItem {
        path: dir_path,
        exts,
        depth,
    })
}

fn validate_var(raw: &Value, path: &str) -> Result<VarItem> {
    let obj = expect_object(raw, path, "VarItem")?;
    reject_unknown(obj, path, &VAR_KEYS)?;

    let field = |key: &str| -> Result<String> {
        let member = format!("{path}.{key}");
        let value = obj.get(key).ok_or_else(|| required(&member))?;
        expect_string(value, &member)
    };

    Ok(VarItem {
        name: field("name")?,
        value: field("value")?,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn expect_object<'a>(value: &'a Value, path: &str, type_name: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| invalid(value, path, type_name, None))
}

fn expect_string(value: &Value, path: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(value, path, "string", None))
}

/// An `int(>= 0)` that fits a `u32`. Integral floats such as `2.0` count as ints.
fn expect_depth(value: &Value, path: &str) -> Result<u32> {
    let n = if let Some(n) = value.as_i64() {
        i128::from(n)
    } else if let Some(n) = value.as_u64() {
        i128::from(n)
    } else {
        match value.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 => f as i128,
            _ => return Err(invalid(value, path, "int", None)),
        }
    };

    if n < 0 {
        return Err(invalid(value, path, "int", Some(">= 0")));
    }
    u32::try_from(n).map_err(|_| invalid(value, path, "int", Some(&format!("<= {}", u32::MAX))))
}

fn expect_string_array(value: &Value, path: &str) -> Result<Vec<String>> {
    let Value::Array(values) = value else {
        return Err(invalid(value, path, "array", None));
    };
    values
        .iter()
        .enumerate()
        .map(|(ix, v)| expect_string(v, &format!("{path}.{ix}")))
        .collect()
}

fn reject_unknown(obj: &Map<String, Value>, path: &str, known: &[&str]) -> Result<()> {
    match obj.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(CtxKitError::validation(format!(
            "Unknown member '{}'",
            join_member(path, key)
        ))),
        None => Ok(()),
    }
}

fn required(path: &str) -> CtxKitError {
    CtxKitError::validation(format!("Required member '{path}'"))
}

fn invalid(value: &Value, path: &str, expected: &str, constraint: Option<&str>) -> CtxKitError {
    let mut message = format!("Invalid value {value} (type '{}')", json_type(value));
    if !path.is_empty() {
        message.push_str(&format!(" for member '{path}'"));
    }
    message.push_str(&format!(", expected type '{expected}'"));
    if let Some(constraint) = constraint {
        message.push_str(&format!(" [{constraint}]"));
    }
    CtxKitError::validation(message)
}

fn join_member(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
