//! The variable table and `{{name}}` substitution.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Variable name → value, shared across one whole resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or overwrite a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every `{{ name }}` reference in `text`.
    ///
    /// Undefined variables become the empty string. Replacement is a single
    /// pass: substituted values are never scanned again.
    pub fn substitute(&self, text: &str) -> String {
        static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
        });

        VAR_RE
            .replace_all(text, |caps: &Captures<'_>| {
                self.get(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.set(name, value);
        }
        vars
    }
}
