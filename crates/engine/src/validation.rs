//! Per-column data validation.
//!
//! Constrains what users can enter into a column: numbers, email
//! addresses, ISO dates, or a fixed dropdown list. A rejected edit is
//! reverted by the session (cell reset to empty) and the reason reported.
//!
//! Blank input always passes: validation constrains values, it does not
//! make a column required.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

/// A validation rule for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationRule {
    /// Value must parse as a finite number.
    Number,
    /// Value must look like local@domain.tld.
    Email,
    /// Value must be an ISO date, YYYY-MM-DD.
    Date,
    /// Value must be one of the listed options (exact match, trimmed).
    Dropdown(Vec<String>),
}

impl ValidationRule {
    /// Build a dropdown rule from a comma-separated option list.
    pub fn dropdown_from_list(options: &str) -> Self {
        ValidationRule::Dropdown(
            options
                .split(',')
                .map(|opt| opt.trim().to_string())
                .filter(|opt| !opt.is_empty())
                .collect(),
        )
    }

    /// Check a value. Blank input always passes. The error string is the
    /// rejection reason shown to the user.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }

        match self {
            ValidationRule::Number => {
                match value.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(()),
                    _ => Err("please enter a valid number".to_string()),
                }
            }
            ValidationRule::Email => {
                if email_re().is_match(value) {
                    Ok(())
                } else {
                    Err("please enter a valid email address".to_string())
                }
            }
            ValidationRule::Date => {
                if date_re().is_match(value) {
                    Ok(())
                } else {
                    Err("please enter a valid date (YYYY-MM-DD)".to_string())
                }
            }
            ValidationRule::Dropdown(options) => {
                if options.iter().any(|opt| opt == value) {
                    Ok(())
                } else {
                    Err(format!("please select from: {}", options.join(", ")))
                }
            }
        }
    }
}

/// Validation rules keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, ValidationRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, rule: ValidationRule) {
        self.rules.insert(column.to_string(), rule);
    }

    pub fn remove(&mut self, column: &str) -> bool {
        self.rules.remove(column).is_some()
    }

    pub fn get(&self, column: &str) -> Option<&ValidationRule> {
        self.rules.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Re-key after a column rename.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        if let Some(rule) = self.rules.remove(old) {
            self.rules.insert(new.to_string(), rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_rule() {
        let rule = ValidationRule::Number;
        assert!(rule.check("42").is_ok());
        assert!(rule.check("-3.5").is_ok());
        assert!(rule.check("abc").is_err());
        assert!(rule.check("inf").is_err());
    }

    #[test]
    fn test_email_rule() {
        let rule = ValidationRule::Email;
        assert!(rule.check("a@b.co").is_ok());
        assert!(rule.check("user.name@example.org").is_ok());
        assert!(rule.check("not-an-email").is_err());
        assert!(rule.check("a@b").is_err());
        assert!(rule.check("a b@c.d").is_err());
    }

    #[test]
    fn test_date_rule() {
        let rule = ValidationRule::Date;
        assert!(rule.check("2024-01-31").is_ok());
        assert!(rule.check("31/01/2024").is_err());
        assert!(rule.check("2024-1-31").is_err());
    }

    #[test]
    fn test_dropdown_rule() {
        let rule = ValidationRule::dropdown_from_list("red, green , blue");
        assert!(rule.check("green").is_ok());
        assert!(rule.check(" blue ").is_ok());
        assert!(rule.check("yellow").is_err());
        let reason = rule.check("yellow").unwrap_err();
        assert!(reason.contains("red, green, blue"));
    }

    #[test]
    fn test_blank_always_passes() {
        for rule in [
            ValidationRule::Number,
            ValidationRule::Email,
            ValidationRule::Date,
            ValidationRule::dropdown_from_list("a,b"),
        ] {
            assert!(rule.check("").is_ok());
            assert!(rule.check("   ").is_ok());
        }
    }

    #[test]
    fn test_rule_set_rename() {
        let mut rules = RuleSet::new();
        rules.set("Age", ValidationRule::Number);
        rules.rename_column("Age", "Years");
        assert!(rules.get("Years").is_some());
        assert!(rules.get("Age").is_none());
    }
}
