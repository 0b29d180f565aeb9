//! Login against the account API.
//!
//! Credentials are checked locally before any request is made; validation
//! failures are plain messages meant to be shown to the user as-is.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Shown when the email field is empty.
pub const EMAIL_REQUIRED: &str = "Please enter email address.";

/// Shown when the email field is not an address.
pub const EMAIL_INVALID: &str = "Please enter valid email address.";

/// Shown when the password field is empty.
pub const PASSWORD_REQUIRED: &str = "Please enter password.";

/// Shown once the API accepts the credentials.
pub const LOGIN_SUCCESS: &str = "Login Successfully";

/// A user-facing validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The email field is empty.
    #[error("{}", EMAIL_REQUIRED)]
    EmailRequired,
    /// The email field is not an address.
    #[error("{}", EMAIL_INVALID)]
    EmailInvalid,
    /// The password field is empty.
    #[error("{}", PASSWORD_REQUIRED)]
    PasswordRequired,
}

/// Errors that can occur during login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credentials were rejected locally.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The API answered with an error status.
    #[error("login failed ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The API's error message.
        message: String,
    },

    /// The request could not be completed.
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z0-9a-z._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$")
            .expect("Invalid email pattern")
    })
}

/// Whether `email` looks like an email address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// An email and password pair.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Pair `email` with `password`.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check the fields in order: email present, email well-formed, password
    /// present. Whitespace-only fields count as empty.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        if !is_valid_email(email) {
            return Err(ValidationError::EmailInvalid);
        }
        if self.password.trim().is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(())
    }
}

/// A session token issued by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The opaque token value.
    pub token: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// Client for the login endpoint.
#[derive(Debug, Clone)]
pub struct LoginClient {
    client: reqwest::Client,
    base_url: String,
}

impl LoginClient {
    /// A client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// A client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        Self::new(config.api.base_url.clone(), config.api_timeout())
    }

    /// Validate `credentials` and exchange them for a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] without contacting the API if the
    /// credentials are malformed, [`AuthError::Api`] for an error status, or
    /// [`AuthError::Http`] if the request fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<Token, AuthError> {
        credentials.validate()?;

        let url = format!("{}/login", self.base_url);
        debug!("Logging in as {} via {}", credentials.email.trim(), url);

        let body = Credentials::new(credentials.email.trim(), credentials.password.clone());
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            warn!("Login rejected with status {}: {}", status, message);
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token = response.json::<Token>().await?;
        info!("Logged in as {}", credentials.email.trim());
        Ok(token)
    }
}
