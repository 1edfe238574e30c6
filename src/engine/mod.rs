//! Orchestrates the check catalog against one configuration.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::checks::{catalog, Check};
use crate::config::ProbeConfig;
use crate::probe::{HttpProbe, ProbeRequest};
use crate::report::{Report, Verdict};


/// Runs every catalog check against a configuration and collects the
/// ordered report. The engine owns the probe; checks stay stateless.
pub struct ProbeEngine {
    probe: HttpProbe,
    catalog: Vec<Box<dyn Check>>,
}

impl ProbeEngine {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe, catalog: catalog() }
    }

    #[cfg(test)]
    pub(crate) fn with_catalog(probe: HttpProbe, catalog: Vec<Box<dyn Check>>) -> Self {
        Self { probe, catalog }
    }

    /// Runs the full catalog to completion.
    pub async fn run(&self, config: &ProbeConfig) -> Report {
        self.run_with_cancel(config, &AtomicBool::new(false)).await
    }

    /// Runs the catalog, checking `cancel` before each dispatch. Once set,
    /// no further request is issued; checks already completed keep their
    /// verdicts and the remainder is recorded as skipped, so the report
    /// still carries one entry per catalog check.
    pub async fn run_with_cancel(&self, config: &ProbeConfig, cancel: &AtomicBool) -> Report {
        let mut report = Report::new();
        let mut auth_token: Option<String> = None;

        for check in &self.catalog {
            let name = check.name();

            if cancel.load(Ordering::Relaxed) {
                debug!(check = %name, "run cancelled, not dispatching");
                report.push(name, Verdict::skipped("run cancelled before this check"));
                continue;
            }

            let missing = config.missing_fields(check.required_fields());
            if !missing.is_empty() {
                debug!(check = %name, ?missing, "ineligible, skipping");
                report.push(name, Verdict::skipped_missing(&missing));
                continue;
            }

            // A probe error escaping a check becomes that check's verdict;
            // the loop always reaches the next catalog entry.
            let verdict = match check.execute(&self.probe, config, auth_token.as_deref()).await {
                Ok(verdict) => verdict,
                Err(e) => Verdict::error(format!("network failure: {e}")),
            };

            if let Some(token) = verdict.auth_token.clone() {
                auth_token = Some(token);
            }

            info!(check = %name, outcome = %verdict.outcome, "check completed");
            report.push(name, verdict);
        }

        report
    }

    /// Requests recorded by the probe layer, for the debug surface. Empty
    /// unless the probe was built with debug capture.
    pub fn debug_requests(&self) -> Vec<ProbeRequest> {
        self.probe.debug_log()
    }
}
