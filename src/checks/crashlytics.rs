//! Crashlytics check: is the crash-report issue feed readable?

use async_trait::async_trait;

use super::{excerpt, Check};
use crate::config::{ConfigField, ProbeConfig};
use crate::core::ApiErrorResponse;
use crate::probe::{HttpProbe, ProbeError};
use crate::report::{CheckName, Verdict};

const CRASHLYTICS_API: &str = "https://firebasecrashlytics.googleapis.com/v1";

pub struct CrashlyticsCheck {
    base_url: String,
}

impl CrashlyticsCheck {
    pub fn new() -> Self {
        Self { base_url: CRASHLYTICS_API.to_string() }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: String) -> Self {
        Self { base_url }
    }
}

impl Default for CrashlyticsCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for CrashlyticsCheck {
    fn name(&self) -> CheckName {
        CheckName::Crashlytics
    }

    fn required_fields(&self) -> &'static [ConfigField] {
        &[ConfigField::ProjectId, ConfigField::AppId]
    }

    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        _auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError> {
        let project_id = config.get(ConfigField::ProjectId).unwrap_or_default();
        let app_id = config.get(ConfigField::AppId).unwrap_or_default();

        let url = format!(
            "{}/projects/{}/apps/{}/issues",
            self.base_url, project_id, app_id
        );

        // The feed sometimes answers to the raw API key; send it when the
        // config has one.
        let mut headers = Vec::new();
        if let Some(api_key) = config.get(ConfigField::ApiKey) {
            headers.push(("X-Goog-Api-Key", api_key.to_string()));
        }

        let response = probe.get(&url, &headers).await?;

        match response.status.as_u16() {
            200 => Ok(Verdict::vulnerable(format!(
                "crash issue feed is readable: {}",
                excerpt(&response.text())
            ))),
            401 | 403 | 404 => match ApiErrorResponse::parse(&response.body) {
                Some(err) => Ok(Verdict::secure(format!("denied: {}", err.display_message()))),
                None => Ok(Verdict::error(format!(
                    "status {} without a recognizable denial payload: {}",
                    response.status.as_u16(),
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
