//! Identity provider client.
//!
//! Email/password accounts live with Firebase Authentication; this module only calls its
//! Identity Toolkit REST API and never stores credentials.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts";

/// The authenticated user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailExists,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Email address is invalid")]
    InvalidEmail,

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Message safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Provider(_) | AuthError::Http(_) => {
                "Sign-in is temporarily unavailable. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Maps an Identity Toolkit error code, e.g. `WEAK_PASSWORD : Password should be...`.
    fn from_provider_code(message: &str) -> Self {
        let code = message
            .split(|c: char| c == ' ' || c == ':')
            .next()
            .unwrap_or_default();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "USER_DISABLED" => AuthError::InvalidCredentials,
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "INVALID_EMAIL" => AuthError::InvalidEmail,
            "MISSING_EMAIL" => AuthError::MissingField("email"),
            "MISSING_PASSWORD" => AuthError::MissingField("password"),
            _ => AuthError::Provider(message.to_string()),
        }
    }
}

/// Checks the credential fields before any provider call.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    Ok(())
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ToolkitError {
    error: ToolkitErrorBody,
}

#[derive(Debug, Deserialize)]
struct ToolkitErrorBody {
    message: String,
}

/// Firebase Authentication over REST.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: Client,
    api_key: String,
}

impl FirebaseAuth {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    async fn call<B: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<R, AuthError> {
        let response = self
            .client
            .post(format!("{IDENTITY_TOOLKIT_URL}:{action}"))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ToolkitError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Identity provider rejected {action} ({status}): {message}");
            return Err(AuthError::from_provider_code(&message));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        validate_credentials(email, password)?;

        let account: AccountResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email: email.trim(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(name) = display_name {
            let _: serde_json::Value = self
                .call(
                    "update",
                    &UpdateProfileRequest {
                        id_token: &account.id_token,
                        display_name: name,
                        return_secure_token: false,
                    },
                )
                .await?;
        }

        info!("Registered account {}", account.local_id);
        Ok(Identity {
            uid: account.local_id,
            email: account.email,
            display_name: display_name.map(String::from),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        validate_credentials(email, password)?;

        let account: AccountResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email: email.trim(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        Ok(Identity {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name.filter(|n| !n.is_empty()),
        })
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Accounts kept in memory; uids are `uid-<n>`.
    #[derive(Default)]
    pub struct FakeIdentityProvider {
        accounts: Mutex<HashMap<String, (String, Identity)>>,
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentityProvider {
        async fn sign_up(
            &self,
            email: &str,
            password: &str,
            display_name: Option<&str>,
        ) -> Result<Identity, AuthError> {
            validate_credentials(email, password)?;
            if password.len() < 6 {
                return Err(AuthError::WeakPassword);
            }
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AuthError::EmailExists);
            }
            let identity = Identity {
                uid: format!("uid-{}", accounts.len() + 1),
                email: email.to_string(),
                display_name: display_name.map(String::from),
            };
            accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
            Ok(identity)
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
            validate_credentials(email, password)?;
            match self.accounts.lock().unwrap().get(email) {
                Some((stored, identity)) if stored == password => Ok(identity.clone()),
                _ => Err(AuthError::InvalidCredentials),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from_provider_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from_provider_code("EMAIL_EXISTS"),
            AuthError::EmailExists
        ));
        assert!(matches!(
            AuthError::from_provider_code(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            ),
            AuthError::WeakPassword
        ));
        assert!(matches!(
            AuthError::from_provider_code("TOO_MANY_ATTEMPTS_TRY_LATER"),
            AuthError::Provider(_)
        ));
    }

    #[test]
    fn test_missing_fields_rejected_locally() {
        assert!(matches!(
            validate_credentials(" ", "secret"),
            Err(AuthError::MissingField("email"))
        ));
        assert!(matches!(
            validate_credentials("a@b.c", ""),
            Err(AuthError::MissingField("password"))
        ));
        assert!(validate_credentials("a@b.c", "secret").is_ok());
    }

    #[test]
    fn test_provider_failures_hide_details_from_users() {
        let err = AuthError::Provider("QUOTA_EXCEEDED".into());
        assert!(!err.user_message().contains("QUOTA"));
        assert_eq!(
            AuthError::InvalidCredentials.user_message(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_account_response_deserializes() {
        let json = r#"{
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "abc123",
            "email": "ada@example.com",
            "displayName": "Ada",
            "idToken": "token",
            "registered": true,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        }"#;
        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.local_id, "abc123");
        assert_eq!(account.display_name.as_deref(), Some("Ada"));
    }
}
