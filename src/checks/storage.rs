//! Storage bucket checks: listing exposure and anonymous/token uploads.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::{excerpt, probe_marker, Check};
use crate::config::{ConfigField, ProbeConfig};
use crate::core::ApiErrorResponse;
use crate::probe::{HttpProbe, ProbeError, ProbeResponse};
use crate::report::{CheckName, Verdict};

const FIREBASE_STORAGE_API: &str = "https://firebasestorage.googleapis.com/v0";
const GCS_JSON_API: &str = "https://storage.googleapis.com/storage/v1";

/// Probes the bucket's object listing through both REST surfaces Firebase
/// buckets answer on: the Firebase Storage API and the Cloud Storage JSON
/// API. Either one returning a listing is an exposure.
pub struct StorageAccessCheck {
    firebase_base: String,
    gcs_base: String,
}

impl StorageAccessCheck {
    pub fn new() -> Self {
        Self {
            firebase_base: FIREBASE_STORAGE_API.to_string(),
            gcs_base: GCS_JSON_API.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_urls(firebase_base: String, gcs_base: String) -> Self {
        Self { firebase_base, gcs_base }
    }
}

impl Default for StorageAccessCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for StorageAccessCheck {
    fn name(&self) -> CheckName {
        CheckName::StorageAccess
    }

    fn required_fields(&self) -> &'static [ConfigField] {
        &[ConfigField::StorageBucket]
    }

    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        _auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError> {
        let bucket = config.get(ConfigField::StorageBucket).unwrap_or_default();

        let endpoints = [
            ("firebasestorage", format!("{}/b/{}/o", self.firebase_base, bucket)),
            ("gcs-json", format!("{}/b/{}/o", self.gcs_base, bucket)),
        ];

        let mut parts = Vec::new();
        for (label, url) in &endpoints {
            match probe.get(url, &[]).await {
                Ok(response) => parts.push(classify_listing(label, &response)),
                Err(e) => parts.push(Verdict::error(format!("{label}: {e}"))),
            }
        }
        Ok(Verdict::aggregate(parts))
    }
}

fn classify_listing(label: &str, response: &ProbeResponse) -> Verdict {
    match response.status.as_u16() {
        200 => match response.json() {
            Some(body) if body.get("items").is_some() || body.get("prefixes").is_some() => {
                Verdict::vulnerable(format!(
                    "{label}: bucket listing is readable without credentials: {}",
                    excerpt(&response.text())
                ))
            }
            _ => Verdict::error(format!(
                "{label}: 200 response is not a listing: {}",
                excerpt(&response.text())
            )),
        },
        401 | 403 | 404 => match ApiErrorResponse::parse(&response.body) {
            Some(err) => Verdict::secure(format!("{label}: denied, {}", err.display_message())),
            None => Verdict::error(format!(
                "{label}: status {} without a recognizable denial payload: {}",
                response.status.as_u16(),
                excerpt(&response.text())
            )),
        },
        status => Verdict::error(format!(
            "{label}: unexpected status {status}: {}",
            excerpt(&response.text())
        )),
    }
}

/// Tries to write a small marker object into the bucket, anonymously and,
/// when registration produced a token, with each Authorization scheme the
/// Firebase Storage API accepts for user tokens.
pub struct StorageUploadCheck {
    firebase_base: String,
}

impl StorageUploadCheck {
    pub fn new() -> Self {
        Self { firebase_base: FIREBASE_STORAGE_API.to_string() }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(firebase_base: String) -> Self {
        Self { firebase_base }
    }
}

impl Default for StorageUploadCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for StorageUploadCheck {
    fn name(&self) -> CheckName {
        CheckName::StorageUpload
    }

    fn required_fields(&self) -> &'static [ConfigField] {
        &[ConfigField::StorageBucket]
    }

    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError> {
        let bucket = config.get(ConfigField::StorageBucket).unwrap_or_default();
        let marker = format!("{}.json", probe_marker());

        let mut url = Url::parse(&format!("{}/b/{}/o", self.firebase_base, bucket))?;
        url.query_pairs_mut().append_pair("name", &marker);
        let body = json!({"probe": marker});

        let mut attempts: Vec<(&str, Vec<(&str, String)>)> = vec![("anonymous", Vec::new())];
        if let Some(token) = auth_token {
            attempts.push(("bearer-token", vec![("Authorization", format!("Bearer {token}"))]));
            attempts.push((
                "firebase-token",
                vec![("Authorization", format!("Firebase {token}"))],
            ));
        }

        let mut parts = Vec::new();
        for (label, headers) in &attempts {
            match probe.post_json(url.as_str(), headers, &body).await {
                Ok(response) => parts.push(classify_upload(label, &marker, &response)),
                Err(e) => parts.push(Verdict::error(format!("{label}: {e}"))),
            }
        }
        Ok(Verdict::aggregate(parts))
    }
}

fn classify_upload(label: &str, marker: &str, response: &ProbeResponse) -> Verdict {
    match response.status.as_u16() {
        200 | 201 => Verdict::vulnerable(format!(
            "{label}: upload accepted, marker object {marker} was written"
        )),
        401 | 403 => match ApiErrorResponse::parse(&response.body) {
            Some(err) => Verdict::secure(format!("{label}: denied, {}", err.display_message())),
            None => Verdict::error(format!(
                "{label}: status {} without a recognizable denial payload: {}",
                response.status.as_u16(),
                excerpt(&response.text())
            )),
        },
        status => Verdict::error(format!(
            "{label}: unexpected status {status}: {}",
            excerpt(&response.text())
        )),
    }
}
