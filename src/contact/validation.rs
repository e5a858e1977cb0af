/// Contact field validation rules
use crate::contact::{ContactFields, ErrorKey, ValidationErrors};
use lazy_static::lazy_static;
use regex::Regex;

pub const NAME_MIN_CHARS: usize = 2;
pub const MESSAGE_MIN_CHARS: usize = 15;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

/// Check every field; a missing key means the field is valid
///
/// Lengths count characters of the trimmed value. The email pattern is
/// matched against the value as entered.
pub fn validate(fields: &ContactFields) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    let name = fields.full_name.trim();
    if name.is_empty() {
        errors.insert(ErrorKey::FullName, "Your name is required");
    } else if name.chars().count() < NAME_MIN_CHARS {
        errors.insert(ErrorKey::FullName, "Name must be at least 2 characters");
    }

    if fields.email_address.trim().is_empty() {
        errors.insert(ErrorKey::EmailAddress, "Email address is required");
    } else if !EMAIL_PATTERN.is_match(&fields.email_address) {
        errors.insert(ErrorKey::EmailAddress, "Please provide a valid email address");
    }

    let message = fields.message_content.trim();
    if message.is_empty() {
        errors.insert(ErrorKey::MessageContent, "Message content is required");
    } else if message.chars().count() < MESSAGE_MIN_CHARS {
        errors.insert(
            ErrorKey::MessageContent,
            "Message should be at least 15 characters long",
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, email: &str, message: &str) -> ContactFields {
        ContactFields {
            full_name: name.to_string(),
            email_address: email.to_string(),
            message_content: message.to_string(),
        }
    }

    #[test]
    fn test_all_fields_invalid() {
        let errors = validate(&fields("", "bad", "short"));
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get(ErrorKey::FullName), Some("Your name is required"));
        assert_eq!(
            errors.get(ErrorKey::EmailAddress),
            Some("Please provide a valid email address")
        );
        assert_eq!(
            errors.get(ErrorKey::MessageContent),
            Some("Message should be at least 15 characters long")
        );
    }

    #[test]
    fn test_boundaries_are_valid() {
        let errors = validate(&fields("Jo", "a@b.co", "This is fifteen+"));
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_lengths_count_trimmed_characters() {
        let errors = validate(&fields(" J ", "a@b.co", "   fourteen chars   "));
        assert_eq!(
            errors.get(ErrorKey::FullName),
            Some("Name must be at least 2 characters")
        );
        assert!(errors.contains(ErrorKey::MessageContent));

        let errors = validate(&fields("Zoë", "a@b.co", &"é".repeat(MESSAGE_MIN_CHARS)));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let errors = validate(&fields("   ", "  ", "\n\t"));
        assert_eq!(errors.get(ErrorKey::FullName), Some("Your name is required"));
        assert_eq!(errors.get(ErrorKey::EmailAddress), Some("Email address is required"));
        assert_eq!(errors.get(ErrorKey::MessageContent), Some("Message content is required"));
    }

    #[test]
    fn test_email_pattern() {
        let valid = ["a@b.co", "first.last+tag@mail.example.org", "x_y%z@sub-domain.io"];
        let invalid = [
            "a@b.c",
            "a@b",
            "@b.co",
            "a b@c.co",
            "a@b.c0",
            " a@b.co",
            "user@ünïcode.com",
        ];

        for email in valid {
            assert!(EMAIL_PATTERN.is_match(email), "{} should be valid", email);
        }
        for email in invalid {
            assert!(!EMAIL_PATTERN.is_match(email), "{} should be invalid", email);
        }
    }
}
