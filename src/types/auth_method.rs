//! Authentication methods and MFA status.

use serde::{Deserialize, Serialize};

/// A password authentication method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordMethod {
    pub id: String,
    pub created_date_time: Option<String>,
}

/// Any registered authentication method; only the type matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthenticationMethod {
    pub id: Option<String>,
    #[serde(rename = "@odata.type")]
    pub odata_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaMethods {
    pub email: bool,
    pub fido2: bool,
    pub authenticator_app: bool,
    pub password: bool,
    pub phone: bool,
    pub software_oath: bool,
    pub temporary_access_pass: bool,
    pub windows_hello_for_business: bool,
}

impl MfaMethods {
    pub fn from_methods(methods: &[AuthenticationMethod]) -> Self {
        let mut flags = Self::default();
        for method in methods {
            match method.odata_type.as_deref().unwrap_or_default() {
                "#microsoft.graph.emailAuthenticationMethod" => flags.email = true,
                "#microsoft.graph.fido2AuthenticationMethod" => flags.fido2 = true,
                "#microsoft.graph.microsoftAuthenticatorAuthenticationMethod" => {
                    flags.authenticator_app = true
                }
                "#microsoft.graph.passwordAuthenticationMethod" => flags.password = true,
                "#microsoft.graph.phoneAuthenticationMethod" => flags.phone = true,
                "#microsoft.graph.softwareOathAuthenticationMethod" => flags.software_oath = true,
                "#microsoft.graph.temporaryAccessPassAuthenticationMethod" => {
                    flags.temporary_access_pass = true
                }
                "#microsoft.graph.windowsHelloForBusinessAuthenticationMethod" => {
                    flags.windows_hello_for_business = true
                }
                _ => {}
            }
        }
        flags
    }

    /// A password alone is not a second factor.
    pub fn has_second_factor(&self) -> bool {
        self.email
            || self.fido2
            || self.authenticator_app
            || self.phone
            || self.software_oath
            || self.temporary_access_pass
            || self.windows_hello_for_business
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MfaState {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaStatus {
    pub user_id: String,
    pub user_principal_name: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub company_name: Option<String>,
    pub mfa_status: MfaState,
    pub methods: MfaMethods,
}

/// User fields fetched alongside authentication methods.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaSubject {
    pub id: String,
    pub user_principal_name: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub company_name: Option<String>,
}

impl MfaStatus {
    pub fn new(subject: MfaSubject, methods: &[AuthenticationMethod]) -> Self {
        let methods = MfaMethods::from_methods(methods);
        Self {
            user_id: subject.id,
            user_principal_name: subject.user_principal_name,
            display_name: subject.display_name,
            mail: subject.mail,
            company_name: subject.company_name,
            mfa_status: if methods.has_second_factor() {
                MfaState::Enabled
            } else {
                MfaState::Disabled
            },
            methods,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mfa_status, MfaState::Enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(odata_type: &str) -> AuthenticationMethod {
        AuthenticationMethod {
            id: None,
            odata_type: Some(odata_type.to_string()),
        }
    }

    fn subject() -> MfaSubject {
        MfaSubject {
            id: "u1".into(),
            user_principal_name: Some("alice@contoso.com".into()),
            ..MfaSubject::default()
        }
    }

    #[test]
    fn test_password_only_is_disabled() {
        let status = MfaStatus::new(
            subject(),
            &[method("#microsoft.graph.passwordAuthenticationMethod")],
        );
        assert_eq!(status.mfa_status, MfaState::Disabled);
        assert!(status.methods.password);
    }

    #[test]
    fn test_second_factor_enables() {
        let status = MfaStatus::new(
            subject(),
            &[
                method("#microsoft.graph.passwordAuthenticationMethod"),
                method("#microsoft.graph.microsoftAuthenticatorAuthenticationMethod"),
                method("#microsoft.graph.someFutureAuthenticationMethod"),
            ],
        );
        assert_eq!(status.mfa_status, MfaState::Enabled);
        assert!(status.methods.authenticator_app);

        let out = serde_json::to_value(&status).unwrap();
        assert_eq!(out["mfaStatus"], "Enabled");
        assert_eq!(out["methods"]["authenticatorApp"], true);
        assert_eq!(out["userPrincipalName"], "alice@contoso.com");
    }

    #[test]
    fn test_no_methods() {
        let status = MfaStatus::new(subject(), &[]);
        assert_eq!(status.mfa_status, MfaState::Disabled);
        assert_eq!(status.methods, MfaMethods::default());
    }
}
