//! Field validation shared by the signup and content-generation forms.
//!
//! Every function here is pure: it takes the raw field text and returns
//! either the cleaned value or a user-facing message. Form-level helpers
//! collect every field error at once so a caller can show them together.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ContentType, DifficultyLevel, GenerateContentRequest, RegisterRequest};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_TOPIC_LEN: usize = 200;

/// Selecting this topic means "use the custom topic field instead".
pub const CUSTOM_TOPIC: &str = "custom";

pub const PREDEFINED_TOPICS: [&str; 12] = [
    "Linear Algebra",
    "Calculus",
    "Statistics",
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Science",
    "Economics",
    "Psychology",
    "History",
    "Literature",
    "Philosophy",
];

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors of one form submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.0.push(FieldError { field, message });
        }
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Loose address check: something, `@`, something, `.`, something.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if !is_valid_email(email) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

/// `label` is the human name of the field, e.g. "First name".
pub fn validate_name(label: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is required"));
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(format!("{label} must be at least {MIN_NAME_LEN} characters"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    Length,
    Uppercase,
    Lowercase,
    Number,
}

impl PasswordRule {
    pub fn description(&self) -> &'static str {
        match self {
            PasswordRule::Length => "At least 8 characters",
            PasswordRule::Uppercase => "One uppercase letter",
            PasswordRule::Lowercase => "One lowercase letter",
            PasswordRule::Number => "One number",
        }
    }
}

/// Result of the four password strength checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordStrength {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
}

impl PasswordStrength {
    pub fn check(password: &str) -> Self {
        Self {
            length: password.chars().count() >= MIN_PASSWORD_LEN,
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            number: password.chars().any(|c| c.is_ascii_digit()),
        }
    }

    pub fn is_strong(&self) -> bool {
        self.failures().is_empty()
    }

    /// Rules the password does not satisfy.
    pub fn failures(&self) -> Vec<PasswordRule> {
        [
            (self.length, PasswordRule::Length),
            (self.uppercase, PasswordRule::Uppercase),
            (self.lowercase, PasswordRule::Lowercase),
            (self.number, PasswordRule::Number),
        ]
        .into_iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, rule)| rule)
        .collect()
    }
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if !PasswordStrength::check(password).is_strong() {
        return Err("Password does not meet all requirements".to_string());
    }
    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), String> {
    if confirmation.is_empty() {
        return Err("Please confirm your password".to_string());
    }
    if password != confirmation {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

/// Raw contents of the signup form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check("first_name", validate_name("First name", &self.first_name));
        errors.check("last_name", validate_name("Last name", &self.last_name));
        errors.check("email", validate_email(&self.email));
        errors.check("password", validate_password(&self.password));
        errors.check(
            "confirm_password",
            validate_password_confirmation(&self.password, &self.confirm_password),
        );
        errors.into_result(|| RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Checks a register payload that did not come through `RegistrationForm`.
pub fn validate_register_request(request: &RegisterRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check("first_name", validate_name("First name", &request.first_name));
    errors.check("last_name", validate_name("Last name", &request.last_name));
    errors.check("email", validate_email(&request.email));
    errors.check("password", validate_password(&request.password));
    errors.into_result(|| ())
}

fn validate_topic(topic: &str) -> Result<(), String> {
    if topic.trim().is_empty() {
        return Err("Please select or enter a topic".to_string());
    }
    if topic.chars().count() > MAX_TOPIC_LEN {
        return Err(format!("Topic must be at most {MAX_TOPIC_LEN} characters"));
    }
    Ok(())
}

pub fn validate_generate_request(request: &GenerateContentRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check("topic", validate_topic(&request.topic));
    errors.into_result(|| ())
}

/// Raw contents of the content-generation form. Selections are the wire
/// strings of the enums, empty when nothing is selected.
#[derive(Debug, Clone, Default)]
pub struct ContentForm {
    pub topic: String,
    pub custom_topic: String,
    pub difficulty_level: String,
    pub content_type: String,
}

impl ContentForm {
    /// The topic that will be submitted: the custom text when "custom" is
    /// selected, otherwise the selected topic.
    pub fn effective_topic(&self) -> &str {
        if self.topic == CUSTOM_TOPIC || self.topic.is_empty() {
            self.custom_topic.trim()
        } else {
            self.topic.trim()
        }
    }

    pub fn validate(&self) -> Result<GenerateContentRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.topic.is_empty() && self.custom_topic.trim().is_empty() {
            errors.check("topic", Err("Please select or enter a topic".to_string()));
        } else if self.topic == CUSTOM_TOPIC && self.custom_topic.trim().is_empty() {
            errors.check("custom_topic", Err("Please enter a custom topic".to_string()));
        } else {
            errors.check("topic", validate_topic(self.effective_topic()));
        }

        let difficulty = if self.difficulty_level.is_empty() {
            errors.check("difficulty_level", Err("Please select a difficulty level".to_string()));
            None
        } else {
            match self.difficulty_level.parse::<DifficultyLevel>() {
                Ok(level) => Some(level),
                Err(e) => {
                    errors.check("difficulty_level", Err(format!("Invalid difficulty level: {}", e.0)));
                    None
                }
            }
        };

        let content_type = if self.content_type.is_empty() {
            errors.check("content_type", Err("Please select a content type".to_string()));
            None
        } else {
            match self.content_type.parse::<ContentType>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    errors.check("content_type", Err(format!("Invalid content type: {}", e.0)));
                    None
                }
            }
        };

        match (difficulty, content_type) {
            (Some(difficulty_level), Some(content_type)) if errors.is_empty() => {
                Ok(GenerateContentRequest {
                    topic: self.effective_topic().to_string(),
                    difficulty_level,
                    content_type,
                })
            }
            _ => Err(errors),
        }
    }
}
