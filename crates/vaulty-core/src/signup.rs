//! Launch mailing list signup form.

use email_address::EmailAddress;
use serde::Deserialize;

/// Maximum accepted length of the submitted address, in characters.
pub const EMAIL_MAX_LENGTH: usize = 100;

/// Validation error for the signup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// No address was submitted.
    Required,
    /// Address is longer than [`EMAIL_MAX_LENGTH`].
    TooLong {
        /// Submitted length in characters.
        length: usize,
    },
    /// Address does not parse as `local@domain.tld`.
    InvalidFormat,
}

impl FormError {
    /// Get human-readable error message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Required => "This field is required.".to_string(),
            Self::TooLong { length } => format!(
                "Ensure this value has at most {EMAIL_MAX_LENGTH} characters (it has {length})."
            ),
            Self::InvalidFormat => "Enter a valid email address.".to_string(),
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        "email"
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for FormError {}

/// Submitted signup form.
///
/// Accepts the address under either `email` or `email_address`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    /// Raw submitted value.
    #[serde(default, alias = "email_address")]
    pub email: Option<String>,
}

impl SignupForm {
    /// Create a form with a submitted value.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    /// Raw submitted value, for re-rendering the form.
    #[must_use]
    pub fn raw(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// Validate the form and return the cleaned address.
    ///
    /// # Errors
    ///
    /// Returns every [`FormError`] found.
    pub fn validate(&self) -> Result<String, Vec<FormError>> {
        let email = self.raw().trim();

        if email.is_empty() {
            return Err(vec![FormError::Required]);
        }

        let mut errors = Vec::new();
        let length = email.chars().count();
        if length > EMAIL_MAX_LENGTH {
            errors.push(FormError::TooLong { length });
        }
        if !is_valid_email(email) {
            errors.push(FormError::InvalidFormat);
        }

        if errors.is_empty() {
            Ok(email.to_string())
        } else {
            Err(errors)
        }
    }
}

/// Bare `local@domain.tld` with no display name or domain literal.
fn is_valid_email(email: &str) -> bool {
    let Ok(parsed) = EmailAddress::parse_with_options(email, Default::default()) else {
        return false;
    };

    // Rejects "Name <user@example.com>"
    if parsed.email() != email {
        return false;
    }

    let domain = parsed.domain();
    !domain.starts_with('[') && domain.contains('.') && domain.split('.').all(|p| !p.is_empty())
}
