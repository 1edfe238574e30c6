//! The fixed catalog of misconfiguration checks.
//!
//! Each check declares the configuration fields it needs, issues its probes
//! and maps the raw responses to one [`Verdict`]. Checks are stateless: the
//! engine constructs the catalog once and invokes each entry at most once
//! per run.

mod crashlytics;
mod database;
mod registration;
mod remote_config;
mod storage;

#[cfg(test)]
mod tests;

pub use crashlytics::CrashlyticsCheck;
pub use database::DatabaseAccessCheck;
pub use registration::RegistrationCheck;
pub use remote_config::RemoteConfigCheck;
pub use storage::{StorageAccessCheck, StorageUploadCheck};

use async_trait::async_trait;

use crate::config::{ConfigField, ProbeConfig};
use crate::probe::{HttpProbe, ProbeError};
use crate::report::{CheckName, Verdict};

/// Upper bound on response-body excerpts quoted in verdict evidence.
const MAX_EVIDENCE_LEN: usize = 200;

/// A single misconfiguration check.
#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> CheckName;

    /// Fields the engine's eligibility gate requires before dispatching.
    /// A check may assume these are present inside `execute`.
    fn required_fields(&self) -> &'static [ConfigField];

    /// Runs the check's probes and produces its verdict. `auth_token` is
    /// the token a successful registration check yielded earlier in the
    /// run, if any; checks that can use it must still work without it.
    ///
    /// A returned `ProbeError` is converted to an error verdict at the
    /// engine boundary; checks that issue several probes handle per-probe
    /// failures themselves so one dead endpoint cannot mask another's
    /// answer.
    async fn execute(
        &self,
        probe: &HttpProbe,
        config: &ProbeConfig,
        auth_token: Option<&str>,
    ) -> Result<Verdict, ProbeError>;
}

/// All checks, in report order.
pub fn catalog() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(RegistrationCheck::new()),
        Box::new(StorageAccessCheck::new()),
        Box::new(StorageUploadCheck::new()),
        Box::new(DatabaseAccessCheck::new()),
        Box::new(RemoteConfigCheck::new()),
        Box::new(CrashlyticsCheck::new()),
    ]
}

/// Trims and bounds a body for inclusion in evidence.
fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_EVIDENCE_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Name for marker objects written by the write probes, unique enough that
/// two runs against the same project do not collide.
fn probe_marker() -> String {
    format!("probe_{}", chrono::Utc::now().timestamp_millis())
}
