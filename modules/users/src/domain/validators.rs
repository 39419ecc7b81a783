use modkit::validation::{rules, RuleSet};
use modkit::{Validator, Violation};

use crate::domain::requests::CreateUser;

pub const MAX_NAME_LENGTH: usize = 100;

pub const NAME_FIELD: &str = "Name";
pub const EMAIL_FIELD: &str = "Email";

pub const NAME_REQUIRED: &str = "Name is required";
pub const NAME_TOO_LONG: &str = "Name must not exceed 100 characters";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Email must be a valid email address";

/// Field rules for [`CreateUser`]. All rules are evaluated; a blank email therefore reports
/// both the missing value and the invalid format.
///
/// An absent field only fails its required rule; the length and format rules skip it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateUserValidator;

impl Validator<CreateUser> for CreateUserValidator {
    fn validate(&self, request: &CreateUser) -> Vec<Violation> {
        let name = request.name.as_deref();
        let email = request.email.as_deref();

        let mut set = RuleSet::new();
        set.check(NAME_FIELD, name.is_some_and(rules::not_empty), NAME_REQUIRED)
            .check(
                NAME_FIELD,
                name.is_none_or(|n| rules::max_length(n, MAX_NAME_LENGTH)),
                NAME_TOO_LONG,
            )
            .check(EMAIL_FIELD, email.is_some_and(rules::not_empty), EMAIL_REQUIRED)
            .check(EMAIL_FIELD, email.is_none_or(rules::email), EMAIL_INVALID);
        set.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(name: &str, email: &str) -> Vec<Violation> {
        CreateUserValidator.validate(&CreateUser {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        })
    }

    fn messages_for(violations: &[Violation], field: &str) -> Vec<String> {
        violations
            .iter()
            .filter(|v| v.field == field)
            .map(|v| v.message.clone())
            .collect()
    }

    #[test]
    fn valid_request_has_no_violations() {
        assert!(validate("John", "john@example.com").is_empty());
    }

    #[test]
    fn blank_name_is_required() {
        for name in ["", "   ", "\t\n"] {
            let v = validate(name, "john@example.com");
            assert_eq!(messages_for(&v, NAME_FIELD), vec![NAME_REQUIRED]);
        }
    }

    #[test]
    fn name_length_boundary() {
        assert!(validate(&"a".repeat(100), "john@example.com").is_empty());

        let v = validate(&"a".repeat(101), "john@example.com");
        assert_eq!(messages_for(&v, NAME_FIELD), vec![NAME_TOO_LONG]);
    }

    #[test]
    fn invalid_email_is_rejected() {
        for email in ["not-an-email", "john@", "@example.com", "a@b@c"] {
            let v = validate("John", email);
            assert_eq!(messages_for(&v, EMAIL_FIELD), vec![EMAIL_INVALID], "{email}");
        }
    }

    #[test]
    fn loose_email_forms_are_accepted() {
        let long_local = format!("{}@example.com", "x".repeat(300));
        for email in ["a@b", "john doe@example.com", long_local.as_str()] {
            let v = validate("John", email);
            assert!(messages_for(&v, EMAIL_FIELD).is_empty(), "{email}");
        }
    }

    #[test]
    fn absent_fields_report_required_only() {
        let v = CreateUserValidator.validate(&CreateUser::default());
        assert_eq!(messages_for(&v, NAME_FIELD), vec![NAME_REQUIRED]);
        assert_eq!(messages_for(&v, EMAIL_FIELD), vec![EMAIL_REQUIRED]);
    }

    #[test]
    fn blank_email_reports_required_and_format() {
        let v = validate("John", "");
        assert_eq!(
            messages_for(&v, EMAIL_FIELD),
            vec![EMAIL_REQUIRED, EMAIL_INVALID]
        );
    }

    #[test]
    fn independent_failures_are_all_reported() {
        let v = validate("", "not-an-email");
        assert_eq!(messages_for(&v, NAME_FIELD), vec![NAME_REQUIRED]);
        assert_eq!(messages_for(&v, EMAIL_FIELD), vec![EMAIL_INVALID]);
    }
}
