//! User registration check: can an attacker self-register an account with
//! nothing but the public API key?

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{excerpt, Check};
use crate::config::{ConfigField, ProbeConfig};
use crate::core::ApiErrorResponse;
use crate::probe::{HttpProbe, ProbeError};
use crate::report::{CheckName, Verdict};

const SIGN_UP_API: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";

/// Identity Toolkit error codes proving sign-up is disabled for this key.
/// The API puts the code at the start of `error.message`, sometimes with a
/// prose suffix.
const SIGN_UP_DISABLED_CODES: &[&str] = &["OPERATION_NOT_ALLOWED", "ADMIN_ONLY_OPERATION"];

/// Marker in the 400 payload returned for a key that is not valid at all.
const INVALID_API_KEY_MARKER: &str = "API key not valid";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    id_token: Option<String>,
}

pub struct RegistrationCheck {
    base_url: String,
}

impl RegistrationCheck {
    pub fn new() -> Self {
        Self { base_url: SIGN_UP_API.to_string() }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: String) -> Self {
        Self { base_url }
    }
}

impl Default for RegistrationCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for RegistrationCheck {
    fn name(&self) -> CheckName {
        CheckName::Registration
    }

    fn required_fields(&self) -> &'static [ConfigField] {
        &[ConfigField::ApiKey]
    }

    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        _auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError> {
        let api_key = config.get(ConfigField::ApiKey).unwrap_or_default();

        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut().append_pair("key", api_key);

        let body = json!({
            "email": config.test_email,
            "password": config.test_password,
            "returnSecureToken": true,
        });

        let response = probe.post_json(url.as_str(), &[], &body).await?;

        match response.status.as_u16() {
            200 => {
                let parsed = response
                    .json()
                    .and_then(|v| serde_json::from_value::<SignUpResponse>(v).ok());
                match parsed.and_then(|p| p.id_token) {
                    Some(token) => Ok(Verdict::vulnerable(format!(
                        "open sign-up: {} was registered and an auth token returned",
                        config.test_email
                    ))
                    .with_auth_token(token)),
                    None => Ok(Verdict::error(format!(
                        "sign-up answered 200 without an idToken: {}",
                        excerpt(&response.text())
                    ))),
                }
            }
            400 => match ApiErrorResponse::parse(&response.body) {
                Some(err)
                    if SIGN_UP_DISABLED_CODES
                        .iter()
                        .any(|code| err.error.message.starts_with(code)) =>
                {
                    Ok(Verdict::secure(format!("sign-up rejected: {}", err.display_message())))
                }
                Some(err) if err.error.message.contains(INVALID_API_KEY_MARKER) => {
                    Ok(Verdict::secure(format!("API key rejected: {}", err.display_message())))
                }
                Some(err) => Ok(Verdict::error(format!(
                    "sign-up rejected for an unexpected reason: {}",
                    err.display_message()
                ))),
                None => Ok(Verdict::error(format!(
                    "unrecognized 400 response: {}",
                    excerpt(&response.text())
                ))),
            },
            status => Ok(Verdict::error(format!(
                "unexpected status {status}: {}",
                excerpt(&response.text())
            ))),
        }
    }
}
