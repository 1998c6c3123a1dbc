//! Named SQL definitions and their loaders.
//!
//! Query files use the properties format: one `name=sql` entry per logical line,
//! `#`/`!` comments, `=` or `:` as separator, and a trailing backslash to continue a long
//! statement on the next line. Files ending in `.json` are read as a JSON object of
//! name → SQL strings instead.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, StorageError};

/// Ordered mapping from query name to SQL text; later definitions replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySet {
    queries: BTreeMap<String, String>,
}

impl QuerySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a query.
    pub fn insert(&mut self, name: impl Into<String>, sql: impl Into<String>) {
        self.queries.insert(name.into(), sql.into());
    }

    /// Merge `other` into this set; entries from `other` win.
    pub fn extend(&mut self, other: QuerySet) {
        self.queries.extend(other.queries);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.queries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse properties-format text.
    #[must_use]
    pub fn from_properties_str(text: &str) -> Self {
        let mut set = QuerySet::new();
        for line in logical_lines(text) {
            let (key, value) = split_entry(&line);
            if !key.is_empty() {
                set.insert(key, value);
            }
        }
        set
    }

    /// Parse a JSON object whose values are SQL strings.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the text is not such an object.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let queries: BTreeMap<String, String> = serde_json::from_str(text).map_err(|e| {
            StorageError::invalid_parameter(format!("Invalid query definitions: {e}"), "queries")
        })?;
        Ok(Self { queries })
    }

    /// Read properties-format definitions from a stream.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the stream cannot be read as UTF-8.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(|_| {
            StorageError::invalid_parameter("Failed to load properties from stream", "inputStream")
        })?;
        Ok(Self::from_properties_str(&text))
    }

    /// Load definitions from a file, choosing the format from its extension.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the file is missing, unreadable or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StorageError::invalid_parameter(
                format!("Properties file not found: {}", path.display()),
                "resourcePath",
            ));
        }
        let text = std::fs::read_to_string(path).map_err(|_| {
            StorageError::invalid_parameter(
                format!("Failed to load properties from: {}", path.display()),
                "resourcePath",
            )
        })?;
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Self::from_json_str(&text)
        } else {
            Ok(Self::from_properties_str(&text))
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QuerySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = QuerySet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

// Join continuation lines and drop blanks and comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut continuing = false;
    for raw in text.lines() {
        let line = raw.trim_start();
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }
        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            out.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn split_entry(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    key.push(unescape(next));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=' | ':')) {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                value.push(unescape(next));
            }
        } else {
            value.push(c);
        }
    }
    (key, value)
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}
