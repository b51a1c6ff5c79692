//! Precondition checking with batched failure reporting.
//!
//! A [`Check`] accumulates violations instead of failing on the first one;
//! [`Check::checkpoint`] converts the batch into a single aggregate
//! validation error, so callers can report every violation in one pass.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use regex::Regex;

use crate::error::{CheckKind, Result, ValidationError};
use crate::value::Value;

/// Compiled-pattern cache so repeated checks don't recompile their regexes.
struct RegexCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, pattern: &str) -> std::result::Result<Regex, regex::Error> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        let regex = Regex::new(pattern)?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(RegexCache::new)
}

/// Check if a string matches a regex pattern.
///
/// Returns `false` for an invalid pattern (logged), so checks stay resilient.
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    match regex_cache().get_or_compile(pattern) {
        Ok(regex) => regex.is_match(value),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "invalid pattern in check, treating as non-match"
            );
            false
        }
    }
}

/// An accumulating precondition checker.
#[derive(Debug, Default)]
pub struct Check {
    errors: ValidationError,
}

impl Check {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-null value.
    pub fn not_null(&mut self, subject: &str, value: &Value) -> &mut Self {
        if value.is_null() {
            self.errors
                .add(subject, CheckKind::Null, "must not be null");
        }
        self
    }

    /// Require a non-empty string.
    pub fn not_empty(&mut self, subject: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.errors
                .add(subject, CheckKind::Empty, "must not be empty");
        }
        self
    }

    /// Require a strictly positive number.
    pub fn positive(&mut self, subject: &str, value: i64) -> &mut Self {
        if value <= 0 {
            self.errors.add(
                subject,
                CheckKind::Range,
                format!("must be positive, got {value}"),
            );
        }
        self
    }

    /// Require a value inside an inclusive range.
    pub fn in_range(&mut self, subject: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.errors.add(
                subject,
                CheckKind::Range,
                format!("must be between {min} and {max}, got {value}"),
            );
        }
        self
    }

    /// Require two values to be equal.
    pub fn equal(&mut self, subject: &str, actual: &Value, expected: &Value) -> &mut Self {
        if actual != expected {
            self.errors.add(
                subject,
                CheckKind::Equality,
                format!("expected {expected:?}, got {actual:?}"),
            );
        }
        self
    }

    /// Require a string to match a regex pattern.
    pub fn matches(&mut self, subject: &str, value: &str, pattern: &str) -> &mut Self {
        if !matches_pattern(value, pattern) {
            self.errors.add(
                subject,
                CheckKind::Pattern,
                format!("must match pattern '{pattern}'"),
            );
        }
        self
    }

    /// Were any violations recorded so far?
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Resolve the batch: `Ok(())` when clean, otherwise one aggregate error
    /// listing every violation.
    pub fn checkpoint(self) -> Result<()> {
        self.errors.into_result().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn clean_check_passes() {
        let mut check = Check::new();
        check
            .not_null("id", &Value::Int(1))
            .not_empty("name", "Dumas")
            .positive("bundleSize", 20)
            .in_range("page", 3, 1, 10);
        assert!(!check.has_failures());
        assert!(check.checkpoint().is_ok());
    }

    #[test]
    fn checkpoint_reports_all_violations_at_once() {
        let mut check = Check::new();
        check
            .not_null("id", &Value::Null)
            .not_empty("name", "")
            .positive("bundleSize", 0)
            .equal("engine", &Value::Text("ce".into()), &Value::Text("sqlite".into()));

        let err = check.checkpoint().unwrap_err();
        match err {
            Error::Validation(v) => assert_eq!(v.failures.len(), 4),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn pattern_check_uses_cached_regexes() {
        assert!(matches_pattern("ORM_PK_Book", r"^ORM_PK_\w+$"));
        assert!(!matches_pattern("nope", r"^ORM_PK_\w+$"));
        // invalid pattern: resilient non-match, not a panic
        assert!(!matches_pattern("x", "("));

        let mut check = Check::new();
        check.matches("constraint", "ORM_FK_Book_Author", r"^ORM_FK_\w+$");
        assert!(check.checkpoint().is_ok());
    }
}
