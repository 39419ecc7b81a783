//! Field-level request validation.
//!
//! Validators are pure: they look at a request and return every rule it breaks as a
//! [`Violation`]. The dispatcher concatenates the output of all validators registered for a
//! request type into a single [`Violations`] set before deciding whether the handler runs.

use std::fmt;

use indexmap::IndexMap;

/// One broken rule: the field it applies to and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered collection of violations produced for a single request.
///
/// Field names are not unique; every violation is kept in the order it was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Group messages by field.
    ///
    /// Fields appear in order of their first violation; messages keep production order.
    pub fn by_field(&self) -> IndexMap<String, Vec<String>> {
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for v in &self.0 {
            grouped
                .entry(v.field.clone())
                .or_default()
                .push(v.message.clone());
        }
        grouped
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
            first = false;
        }
        Ok(())
    }
}

impl Extend<Violation> for Violations {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Violation> for Violations {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Pre-handler check for requests of type `R`.
pub trait Validator<R>: Send + Sync + 'static {
    /// Return every violation found in `request`; an empty vector means valid.
    fn validate(&self, request: &R) -> Vec<Violation>;
}

/// Small accumulator for writing validators rule by rule.
///
/// Every `check` is evaluated; a failing rule never hides the ones after it.
#[derive(Debug, Default)]
pub struct RuleSet {
    violations: Vec<Violation>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `passed` holds.
    pub fn check(&mut self, field: &str, passed: bool, message: &str) -> &mut Self {
        if !passed {
            self.violations.push(Violation::new(field, message));
        }
        self
    }

    pub fn finish(self) -> Vec<Violation> {
        self.violations
    }
}

/// Reusable string rules.
pub mod rules {
    /// Not empty and not whitespace-only.
    pub fn not_empty(value: &str) -> bool {
        !value.trim().is_empty()
    }

    /// At most `max` characters (Unicode scalar values, not bytes).
    pub fn max_length(value: &str, max: usize) -> bool {
        value.chars().count() <= max
    }

    /// Loose address check: exactly one `@`, neither first nor last.
    pub fn email(value: &str) -> bool {
        match value.find('@') {
            Some(at) => at > 0 && at + 1 < value.len() && value.rfind('@') == Some(at),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_field_groups_and_keeps_order() {
        let violations: Violations = vec![
            Violation::new("Email", "Email is required"),
            Violation::new("Name", "Name is required"),
            Violation::new("Email", "Email must be a valid email address"),
        ]
        .into_iter()
        .collect();

        let grouped = violations.by_field();
        let fields: Vec<&str> = grouped.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["Email", "Name"]);
        assert_eq!(
            grouped["Email"],
            vec!["Email is required", "Email must be a valid email address"]
        );
        assert_eq!(grouped["Name"], vec!["Name is required"]);
    }

    #[test]
    fn display_joins_violations() {
        let mut violations = Violations::new();
        violations.push(Violation::new("Name", "Name is required"));
        violations.push(Violation::new("Email", "Email is required"));
        assert_eq!(
            violations.to_string(),
            "Name: Name is required; Email: Email is required"
        );
    }

    #[test]
    fn rule_set_evaluates_every_check() {
        let mut rules = RuleSet::new();
        rules
            .check("Name", false, "first")
            .check("Name", true, "skipped")
            .check("Name", false, "second");
        let out = rules.finish();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].message, "first");
        assert_eq!(out[1].message, "second");
    }

    #[test]
    fn not_empty_rejects_whitespace() {
        assert!(!rules::not_empty(""));
        assert!(!rules::not_empty("   \t"));
        assert!(rules::not_empty(" a "));
    }

    #[test]
    fn max_length_counts_chars() {
        assert!(rules::max_length(&"é".repeat(100), 100));
        assert!(!rules::max_length(&"é".repeat(101), 100));
    }

    #[test]
    fn email_rule_accepts_single_inner_at() {
        assert!(rules::email("john@example.com"));
        assert!(rules::email("a@b"));
        assert!(rules::email("john doe@example.com"));
        assert!(rules::email(&format!("{}@example.com", "x".repeat(300))));
    }

    #[test]
    fn email_rule_rejects_misplaced_or_repeated_at() {
        for value in ["", "not-an-email", "@example.com", "john@", "@", "a@b@c"] {
            assert!(!rules::email(value), "{value}");
        }
    }
}
