//! Password methods and administrative password reset.

use rand::seq::SliceRandom;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::graph::{segment, GraphClient, ODataQuery};
use crate::types::PasswordMethod;

pub const DEFAULT_PASSWORD_LENGTH: usize = 12;
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Entra ID rejects passwords longer than this.
pub const MAX_PASSWORD_LENGTH: usize = 256;

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{}?";

/// Generate a password containing at least one character from each class.
pub fn generate_password(length: usize) -> Result<SecretString> {
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(Error::validation(format!(
            "password_length must be between {} and {}",
            MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
        )));
    }

    let classes = [UPPER, LOWER, DIGITS, SYMBOLS];
    let all: Vec<u8> = classes.concat();
    let mut rng = rand::rng();

    let mut chars: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.random_range(0..class.len())])
        .collect();
    while chars.len() < length {
        chars.push(all[rng.random_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    Ok(SecretString::from(String::from_utf8_lossy(&chars).into_owned()))
}

/// Parameters of a direct password reset.
#[derive(Debug)]
pub struct PasswordReset {
    pub password: Option<SecretString>,
    pub require_change_on_next_sign_in: bool,
    pub generate_password: bool,
    pub password_length: usize,
}

impl Default for PasswordReset {
    fn default() -> Self {
        Self {
            password: None,
            require_change_on_next_sign_in: true,
            generate_password: false,
            password_length: DEFAULT_PASSWORD_LENGTH,
        }
    }
}

impl PasswordReset {
    /// Resolve the password to set, and whether it was generated here.
    fn resolve(self) -> Result<(SecretString, bool)> {
        if self.generate_password {
            return Ok((generate_password(self.password_length)?, true));
        }
        match self.password {
            Some(password) if !password.expose_secret().is_empty() => Ok((password, false)),
            _ => Err(Error::validation(
                "password is required unless generate_password is true",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetResult {
    pub status: &'static str,
    pub user_id: String,
    pub password_reset_required: bool,
    pub message: String,
    /// Present only when the password was generated by this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

pub struct PasswordService {
    client: Arc<GraphClient>,
}

impl PasswordService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    fn methods_path(user_id: &str) -> String {
        format!("users/{}/authentication/passwordMethods", segment(user_id))
    }

    #[instrument(skip(self))]
    pub async fn list_user_password_methods(&self, user_id: &str) -> Result<Vec<PasswordMethod>> {
        self.client
            .list(&Self::methods_path(user_id), &ODataQuery::new(), None)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_user_password_method(&self, user_id: &str, method_id: &str) -> Result<PasswordMethod> {
        self.client
            .get(
                &format!("{}/{}", Self::methods_path(user_id), segment(method_id)),
                &ODataQuery::new(),
            )
            .await
    }

    /// Set a new password on the user object. The password never appears in logs.
    #[instrument(skip(self, reset))]
    pub async fn reset_user_password_direct(
        &self,
        user_id: &str,
        reset: PasswordReset,
    ) -> Result<PasswordResetResult> {
        let require_change = reset.require_change_on_next_sign_in;
        let (password, generated) = reset.resolve()?;

        let body = json!({
            "passwordProfile": {
                "forceChangePasswordNextSignIn": require_change,
                "password": password.expose_secret(),
            }
        });
        self.client
            .patch(&format!("users/{}", segment(user_id)), &body)
            .await?;
        info!(
            "Password reset for {} (generated: {}, change required: {})",
            user_id, generated, require_change
        );

        Ok(PasswordResetResult {
            status: "success",
            user_id: user_id.to_string(),
            password_reset_required: require_change,
            message: "Password has been reset using the direct method.".to_string(),
            generated_password: generated.then(|| password.expose_secret().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_has_every_class() {
        for length in [MIN_PASSWORD_LENGTH, 12, 40] {
            let password = generate_password(length).unwrap();
            let value = password.expose_secret();
            assert_eq!(value.len(), length);
            assert!(value.bytes().any(|b| UPPER.contains(&b)));
            assert!(value.bytes().any(|b| LOWER.contains(&b)));
            assert!(value.bytes().any(|b| DIGITS.contains(&b)));
            assert!(value.bytes().any(|b| SYMBOLS.contains(&b)));
        }
    }

    #[test]
    fn test_generated_password_length_bounds() {
        assert!(generate_password(7).is_err());
        assert!(generate_password(MAX_PASSWORD_LENGTH + 1).is_err());
    }

    #[test]
    fn test_reset_requires_password_or_generation() {
        let err = PasswordReset::default().resolve().unwrap_err();
        assert!(err.to_string().contains("password is required"));

        let err = PasswordReset {
            password: Some(SecretString::from(String::new())),
            ..PasswordReset::default()
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let (password, generated) = PasswordReset {
            password: Some(SecretString::from("Correct-Horse-9".to_string())),
            ..PasswordReset::default()
        }
        .resolve()
        .unwrap();
        assert!(!generated);
        assert_eq!(password.expose_secret(), "Correct-Horse-9");
    }

    #[test]
    fn test_generation_overrides_supplied_password() {
        let (password, generated) = PasswordReset {
            password: Some(SecretString::from("ignored".to_string())),
            generate_password: true,
            password_length: 16,
            ..PasswordReset::default()
        }
        .resolve()
        .unwrap();
        assert!(generated);
        assert_eq!(password.expose_secret().len(), 16);
    }
}
