//! Permissive `Cache-Control` parsing.

use std::collections::HashMap;

use http::HeaderMap;
use http::header::CACHE_CONTROL;

/// Parsed `Cache-Control` directives.
///
/// Directive names are lowercased; a valueless directive maps to an empty
/// string so presence and value lookups stay distinct. Parsing never fails:
/// malformed parts are kept as written, empty parts are skipped, and a
/// duplicated directive keeps its last occurrence. No quoting rules apply.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheControl {
    directives: HashMap<String, String>,
}

impl CacheControl {
    /// Parses the `Cache-Control` header of `headers`.
    pub fn parse(headers: &HeaderMap) -> Self {
        let value = headers
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        Self::from_value(value)
    }

    fn from_value(value: &str) -> Self {
        let mut directives = HashMap::new();
        for part in value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('=') {
                Some((name, value)) => {
                    directives.insert(name.trim().to_ascii_lowercase(), value.trim().to_owned());
                }
                None => {
                    directives.insert(part.to_ascii_lowercase(), String::new());
                }
            }
        }
        CacheControl { directives }
    }

    /// Whether the directive is present, with or without a value.
    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Raw directive value; `Some("")` for a valueless directive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.directives.get(name).map(String::as_str)
    }

    /// Directive value parsed as whole seconds.
    ///
    /// `None` when the directive is absent or its value does not parse, so
    /// callers pick their own fallback.
    pub fn seconds(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|value| value.parse().ok())
    }
}
