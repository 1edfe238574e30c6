//! Remote Config check: can the template be fetched with the public key?

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use super::{excerpt, Check};
use crate::config::{ConfigField, ProbeConfig};
use crate::core::ApiErrorResponse;
use crate::probe::{HttpProbe, ProbeError};
use crate::report::{CheckName, Verdict};

const REMOTE_CONFIG_API: &str = "https://firebaseremoteconfig.googleapis.com/v1";

/// Fetch states that answer without disclosing a template.
const EMPTY_STATES: &[&str] = &["NO_TEMPLATE", "EMPTY_CONFIG"];

#[derive(Debug, Deserialize)]
struct FetchResponse {
    entries: Option<Map<String, Value>>,
    state: Option<String>,
}

pub struct RemoteConfigCheck {
    base_url: String,
}

impl RemoteConfigCheck {
    pub fn new() -> Self {
        Self { base_url: REMOTE_CONFIG_API.to_string() }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: String) -> Self {
        Self { base_url }
    }
}

impl Default for RemoteConfigCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for RemoteConfigCheck {
    fn name(&self) -> CheckName {
        CheckName::RemoteConfig
    }

    fn required_fields(&self) -> &'static [ConfigField] {
        &[ConfigField::ProjectId, ConfigField::ApiKey]
    }

    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        _auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError> {
        let project_id = config.get(ConfigField::ProjectId).unwrap_or_default();
        let api_key = config.get(ConfigField::ApiKey).unwrap_or_default();

        let mut url = Url::parse(&format!(
            "{}/projects/{}/namespaces/firebase:fetch",
            self.base_url, project_id
        ))?;
        url.query_pairs_mut().append_pair("key", api_key);

        let mut body = json!({"appInstanceId": "PROD"});
        if let Some(app_id) = config.get(ConfigField::AppId) {
            body["appId"] = Value::String(app_id.to_string());
        }

        let response = probe.post_json(url.as_str(), &[], &body).await?;

        match response.status.as_u16() {
            200 => {
                let parsed = response
                    .json()
                    .and_then(|v| serde_json::from_value::<FetchResponse>(v).ok());
                match parsed {
                    Some(fetch) => {
                        if let Some(entries) = fetch.entries.filter(|e| !e.is_empty()) {
                            return Ok(Verdict::vulnerable(format!(
                                "template fetched: {} parameter(s) disclosed: {}",
                                entries.len(),
                                excerpt(&response.text())
                            )));
                        }
                        match fetch.state.as_deref() {
                            Some(state) if EMPTY_STATES.contains(&state) => Ok(Verdict::secure(
                                format!("no template disclosed (state {state})"),
                            )),
                            _ => Ok(Verdict::error(format!(
                                "200 response with neither entries nor an empty state: {}",
                                excerpt(&response.text())
                            ))),
                        }
                    }
                    None => Ok(Verdict::error(format!(
                        "unparseable 200 response: {}",
                        excerpt(&response.text())
                    ))),
                }
            }
            401 | 403 => match ApiErrorResponse::parse(&response.body) {
                Some(err) => Ok(Verdict::secure(format!("fetch denied: {}", err.display_message()))),
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
