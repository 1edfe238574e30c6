//! Realtime Database check: anonymous read of the root and a marker write.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::{excerpt, probe_marker, Check};
use crate::config::{ConfigField, ProbeConfig};
use crate::core::RtdbErrorResponse;
use crate::probe::{HttpProbe, ProbeError, ProbeResponse};
use crate::report::{CheckName, Verdict};

pub struct DatabaseAccessCheck;

impl DatabaseAccessCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DatabaseAccessCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for DatabaseAccessCheck {
    fn name(&self) -> CheckName {
        CheckName::DatabaseAccess
    }

    fn required_fields(&self) -> &'static [ConfigField] {
        &[ConfigField::DatabaseUrl]
    }

    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        _auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError> {
        let base = Url::parse(config.get(ConfigField::DatabaseUrl).unwrap_or_default())?;

        let mut read_url = base.clone();
        read_url.set_path("/.json");

        let marker = probe_marker();
        let mut write_url = base;
        write_url.set_path(&format!("/{marker}.json"));

        let mut parts = Vec::new();

        match probe.get(read_url.as_str(), &[]).await {
            Ok(response) => parts.push(classify_read(&response)),
            Err(e) => parts.push(Verdict::error(format!("read: {e}"))),
        }

        let body = json!({"probe": marker});
        match probe.put_json(write_url.as_str(), &[], &body).await {
            Ok(response) => parts.push(classify_write(&marker, &response)),
            Err(e) => parts.push(Verdict::error(format!("write: {e}"))),
        }

        Ok(Verdict::aggregate(parts))
    }
}

fn classify_read(response: &ProbeResponse) -> Verdict {
    let text = response.text();
    match response.status.as_u16() {
        // A readable root holding only `null` proves nothing was exposed;
        // it matches neither known pattern and stays ambiguous.
        200 if text.trim() == "null" => {
            Verdict::error("read: root answered 200 with a null body".to_string())
        }
        200 => Verdict::vulnerable(format!("database readable at /.json: {}", excerpt(&text))),
        401 | 403 => match RtdbErrorResponse::parse(&response.body) {
            Some(err) => Verdict::secure(format!("read denied: {}", err.error)),
            None => Verdict::error(format!(
                "read: status {} without a recognizable denial payload: {}",
                response.status.as_u16(),
                excerpt(&text)
            )),
        },
        status => Verdict::error(format!("read: unexpected status {status}: {}", excerpt(&text))),
    }
}

fn classify_write(marker: &str, response: &ProbeResponse) -> Verdict {
    match response.status.as_u16() {
        200 => Verdict::vulnerable(format!(
            "database writable: marker accepted at /{marker}.json"
        )),
        401 | 403 => match RtdbErrorResponse::parse(&response.body) {
            Some(err) => Verdict::secure(format!("write denied: {}", err.error)),
            None => Verdict::error(format!(
                "write: status {} without a recognizable denial payload: {}",
                response.status.as_u16(),
                excerpt(&response.text())
            )),
        },
        status => Verdict::error(format!(
            "write: unexpected status {status}: {}",
            excerpt(&response.text())
        )),
    }
}
