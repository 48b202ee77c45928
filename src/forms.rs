//! Form schemas for the account pages.
//!
//! Each form declares its per-field constraints with `validator` attributes and
//! its cross-field rules in [`AccountForm::cross_field`]. Cross-field rules only
//! run once the fields they compare passed their own checks.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use auth::accounts::{NewAccount, ProfileUpdate};
use auth::{Credentials, Identity};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

/// Key under which errors that belong to no single field are collected.
pub const NON_FIELD_ERRORS: &str = "non_field";

pub const REQUIRED: &str = "This field is required.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_MISMATCH: &str = "Passwords don't match.";
pub const NEW_PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const OLD_PASSWORD_INCORRECT: &str =
    "Your old password was entered incorrectly. Please enter it again.";
pub const INVALID_LOGIN: &str = "Invalid login";
pub const DISABLED_ACCOUNT: &str = "Disabled account";
pub const UNREADABLE_FORM: &str = "The submitted form could not be read. Please try again.";

const USERNAME_MAX_LENGTH: usize = 150;

/// Validation messages keyed by field name, ready to hand to a template.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error not tied to any field.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(&field, message);
            }
        }
        form_errors
    }
}

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Required, at most 150 characters, letters, digits and `@.+-_` only.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(error_with_message("required", REQUIRED));
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(error_with_message(
            "max_length",
            "Ensure this value has at most 150 characters.",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(error_with_message(
            "invalid",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Blank is allowed; anything else must look like an address.
fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(error_with_message("invalid", "Enter a valid email address."))
    }
}

/// The cross-field rule shared by every "type it twice" password pair.
pub fn passwords_match(
    password: &str,
    confirmation: &str,
    message: &'static str,
) -> Result<(), ValidationError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(error_with_message("password_mismatch", message))
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Full validation pipeline of a bound form: normalise, check fields, then
/// check rules spanning several fields.
pub trait AccountForm: Validate {
    /// Normalise raw input before validation. Passwords are never touched.
    fn clean(&mut self) {}

    /// Rules spanning several fields, run after the per-field checks.
    fn cross_field(&self, _errors: &mut FormErrors) {}

    fn full_clean(&mut self) -> Result<(), FormErrors> {
        self.clean();
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };
        self.cross_field(&mut errors);
        errors.into_result()
    }
}

#[derive(Default, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    /// Where to go after logging in; carried as a hidden field.
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl AccountForm for LoginForm {
    fn clean(&mut self) {
        trim_in_place(&mut self.username);
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, Deserialize, Serialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(
        length(max = 254, message = "Ensure this value has at most 254 characters."),
        custom(function = "validate_optional_email")
    )]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    /// Confirmation of `password`; never stored.
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,
}

impl RegistrationForm {
    pub fn into_new_account(self) -> NewAccount {
        NewAccount {
            username: self.username,
            password: Some(self.password),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            is_staff: false,
            is_superuser: false,
        }
    }
}

impl AccountForm for RegistrationForm {
    fn clean(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        trim_in_place(&mut self.email);
    }

    fn cross_field(&self, errors: &mut FormErrors) {
        if errors.has("password") || errors.has("password2") {
            return;
        }
        if let Err(e) = passwords_match(&self.password, &self.password2, PASSWORD_MISMATCH) {
            errors.add("password2", e.message.unwrap_or_default());
        }
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Profile fields editable by their owner. There is deliberately no password here.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct EditForm {
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(
        length(max = 254, message = "Ensure this value has at most 254 characters."),
        custom(function = "validate_optional_email")
    )]
    pub email: String,
}

impl EditForm {
    pub fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

impl From<&Identity> for EditForm {
    fn from(user: &Identity) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

impl AccountForm for EditForm {
    fn clean(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        trim_in_place(&mut self.email);
    }
}

#[derive(Default, Deserialize, Serialize, Validate)]
pub struct PasswordChangeForm {
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub old_password: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub new_password1: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub new_password2: String,
}

impl AccountForm for PasswordChangeForm {
    fn cross_field(&self, errors: &mut FormErrors) {
        if errors.has("new_password1") || errors.has("new_password2") {
            return;
        }
        if let Err(e) =
            passwords_match(&self.new_password1, &self.new_password2, NEW_PASSWORD_MISMATCH)
        {
            errors.add("new_password2", e.message.unwrap_or_default());
        }
    }
}

impl fmt::Debug for PasswordChangeForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChangeForm").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            username: "testuser".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@example.com".to_string(),
            password: "testpassword".to_string(),
            password2: "testpassword".to_string(),
        }
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let mut form = LoginForm {
            username: "   ".to_string(),
            ..Default::default()
        };
        let errors = form.full_clean().unwrap_err();

        assert_eq!(errors.get("username"), [REQUIRED]);
        assert_eq!(errors.get("password"), [REQUIRED]);
        assert!(form.username.is_empty());
    }

    #[test]
    fn test_login_form_valid() {
        let mut form = LoginForm {
            username: " testuser ".to_string(),
            password: " spaced password ".to_string(),
            next: None,
        };
        assert!(form.full_clean().is_ok());

        let credentials = form.credentials();
        assert_eq!(credentials.username, "testuser");
        assert_eq!(credentials.password, " spaced password ");
    }

    #[test]
    fn test_registration_valid() {
        let mut form = registration();
        assert!(form.full_clean().is_ok());

        let account = form.into_new_account();
        assert_eq!(account.username, "testuser");
        assert_eq!(account.password.as_deref(), Some("testpassword"));
        assert!(!account.is_staff);
        assert!(!account.is_superuser);
    }

    #[test]
    fn test_registration_password_mismatch() {
        let mut form = RegistrationForm {
            password2: "wrongpassword".to_string(),
            ..registration()
        };
        let errors = form.full_clean().unwrap_err();

        assert_eq!(errors.get("password2"), [PASSWORD_MISMATCH]);
        assert!(!errors.has("password"));
    }

    #[test]
    fn test_mismatch_waits_for_field_checks() {
        let mut form = RegistrationForm {
            password2: String::new(),
            ..registration()
        };
        let errors = form.full_clean().unwrap_err();

        assert_eq!(errors.get("password2"), [REQUIRED]);
    }

    #[test]
    fn test_registration_optional_fields() {
        let mut form = RegistrationForm {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            ..registration()
        };
        assert!(form.full_clean().is_ok());
    }

    #[test]
    fn test_registration_field_errors() {
        let mut form = RegistrationForm {
            username: "bad name!".to_string(),
            email: "not-an-email".to_string(),
            first_name: "x".repeat(151),
            ..registration()
        };
        let errors = form.full_clean().unwrap_err();

        assert!(errors.get("username")[0].starts_with("Enter a valid username."));
        assert_eq!(errors.get("email"), ["Enter a valid email address."]);
        assert_eq!(
            errors.get("first_name"),
            ["Ensure this value has at most 150 characters."]
        );
        assert!(!errors.has("last_name"));
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("jane.doe+tag@example_1-x").is_ok());
        assert!(validate_username("żółw").is_ok());
        assert_eq!(validate_username("").unwrap_err().code, "required");
        assert_eq!(validate_username(&"a".repeat(151)).unwrap_err().code, "max_length");
        assert!(validate_username(&"a".repeat(150)).is_ok());
        assert_eq!(validate_username("with space").unwrap_err().code, "invalid");
    }

    #[test]
    fn test_edit_form_from_identity_and_update() {
        let user = Identity {
            id: 7,
            username: "testuser".to_string(),
            password: "!".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@example.com".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: chrono::Utc::now(),
            last_login: None,
        };

        let mut form = EditForm::from(&user);
        assert_eq!(form.username, "testuser");
        form.first_name = "  New Test ".to_string();
        assert!(form.full_clean().is_ok());

        let update = form.into_update();
        assert_eq!(update.first_name, "New Test");
        assert_eq!(update.email, "test@example.com");
    }

    #[test]
    fn test_password_change_mismatch() {
        let mut form = PasswordChangeForm {
            old_password: "old".to_string(),
            new_password1: "new-one".to_string(),
            new_password2: "new-two".to_string(),
        };
        let errors = form.full_clean().unwrap_err();
        assert_eq!(errors.get("new_password2"), [NEW_PASSWORD_MISMATCH]);
    }

    #[test]
    fn test_debug_hides_passwords() {
        let rendered = format!("{:?}", registration());
        assert!(rendered.contains("testuser"));
        assert!(!rendered.contains("testpassword"));

        let login = LoginForm {
            username: "testuser".to_string(),
            password: "hunter2".to_string(),
            next: None,
        };
        assert!(!format!("{:?}", login).contains("hunter2"));
    }

    #[test]
    fn test_serialized_form_omits_passwords() {
        let value = serde_json::to_value(registration()).unwrap();
        assert_eq!(value["username"], "testuser");
        assert!(value.get("password").is_none());
        assert!(value.get("password2").is_none());
    }

    #[test]
    fn test_form_errors_serialize_as_map() {
        let mut errors = FormErrors::non_field(INVALID_LOGIN);
        errors.add("username", REQUIRED);

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["non_field"][0], INVALID_LOGIN);
        assert_eq!(value["username"][0], REQUIRED);
    }
}
