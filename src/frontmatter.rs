use std::fmt::Write as _;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Number;

/// A frontmatter value. Scalars are coerced at scan time; consumers
/// pattern-match instead of guessing at runtime types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(Number),
    Bool(bool),
    List(Vec<String>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Mapping of frontmatter keys to values, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(Vec<(String, Value)>);

impl Frontmatter {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(Value::as_list)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let i = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(i).1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field normalization applied on ingestion: the `gitHub` key becomes
    /// `github`, and scalar values under multi-select keys are promoted to
    /// one-element lists.
    pub fn normalize(&mut self) {
        if self.get("github").is_none() {
            if let Some(value) = self.remove("gitHub") {
                self.insert("github", value);
            }
        } else {
            self.remove("gitHub");
        }

        for key in ["frameworks", "services"] {
            if let Some(Value::String(s)) = self.get(key) {
                let item = s.clone();
                self.insert(key, Value::List(vec![item]));
            }
        }
    }

    /// Writes the mapping back out as a delimited block. Strings are quoted
    /// so they survive a rescan without scalar coercion.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.0 {
            match value {
                Value::String(s) => {
                    let _ = writeln!(out, "{key}: \"{s}\"");
                }
                Value::Number(n) => {
                    let _ = writeln!(out, "{key}: {n}");
                }
                Value::Bool(b) => {
                    let _ = writeln!(out, "{key}: {b}");
                }
                Value::List(items) => {
                    let _ = writeln!(out, "{key}:");
                    for item in items {
                        let _ = writeln!(out, "  - \"{item}\"");
                    }
                }
            }
        }
        out.push_str("---\n");
        out
    }
}

impl Serialize for Frontmatter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub frontmatter: Frontmatter,
    pub body: String,
    pub error: Option<String>,
}

impl Parsed {
    fn bare(text: &str, error: &str) -> Self {
        Parsed {
            frontmatter: Frontmatter::default(),
            body: text.to_owned(),
            error: Some(error.to_owned()),
        }
    }
}

/// Splits a raw blob into frontmatter and body. Missing or unterminated
/// delimiters degrade to an empty mapping plus the whole blob as body; the
/// attached message is informational only and the content still renders.
#[must_use]
pub fn parse(text: &str) -> Parsed {
    let Some(rest) = text.strip_prefix("---\n") else {
        return Parsed::bare(text, "no frontmatter found");
    };

    let (block, body) = if let Some(after) = rest.strip_prefix("---\n") {
        ("", after)
    } else if rest == "---" {
        ("", "")
    } else if let Some(i) = rest.find("\n---\n") {
        (&rest[..i], &rest[i + 5..])
    } else if let Some(block) = rest.strip_suffix("\n---") {
        (block, "")
    } else {
        return Parsed::bare(text, "unterminated frontmatter");
    };

    Parsed {
        frontmatter: scan_block(block),
        body: body.to_owned(),
        error: None,
    }
}

fn scan_block(block: &str) -> Frontmatter {
    let mut frontmatter = Frontmatter::default();
    // key awaiting `- ` items after an empty value
    let mut open_list: Option<String> = None;

    for line in block.lines() {
        let trimmed = line.trim();

        if let Some(item) = trimmed.strip_prefix("- ") {
            if let Some(key) = &open_list {
                let (item, _) = unquote(item.trim());
                if let Some(Value::List(items)) = frontmatter
                    .0
                    .iter_mut()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v)
                {
                    items.push(item.to_owned());
                }
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // anything else ends a multi-line list
        open_list = None;

        let Some(colon) = line.find(':') else {
            continue;
        };
        let key = line[..colon].trim();
        if key.is_empty() {
            continue;
        }
        let raw = line[colon + 1..].trim();

        if raw.is_empty() || raw == "[]" {
            frontmatter.insert(key, Value::List(Vec::new()));
            open_list = Some(key.to_owned());
        } else if raw.starts_with('[') && raw.ends_with(']') {
            let items = raw[1..raw.len() - 1]
                .split(',')
                .map(|item| unquote(item.trim()).0.to_owned())
                .filter(|item| !item.is_empty())
                .collect();
            frontmatter.insert(key, Value::List(items));
        } else {
            frontmatter.insert(key, scalar(raw));
        }
    }

    frontmatter
}

/// Unambiguous booleans and numbers become typed values; quoting opts out.
fn scalar(raw: &str) -> Value {
    let (inner, quoted) = unquote(raw);
    if quoted {
        return Value::String(inner.to_owned());
    }
    match inner {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = inner.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = inner.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(inner.to_owned())
}

fn unquote(s: &str) -> (&str, bool) {
    let stripped = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
    match stripped {
        Some(inner) => (inner, true),
        None => (s, false),
    }
}
