//! Verdicts and the per-run report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::config::ConfigField;

/// Classification of a single check's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The probed capability is exposed to an unauthenticated attacker.
    Vulnerable,
    /// The endpoint answered with an explicit denial.
    Secure,
    /// The check was not run (missing configuration fields, or the run was
    /// cancelled before it started).
    Skipped,
    /// A network failure or a response neither the vulnerable nor the
    /// secure pattern matches. Surfaced for manual classification, never
    /// silently treated as secure.
    Error,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Vulnerable => "vulnerable",
            Outcome::Secure => "secure",
            Outcome::Skipped => "skipped",
            Outcome::Error => "error",
        };
        f.write_str(s)
    }
}

/// Stable identity of a catalog check. The report lists checks in catalog
/// declaration order, which matches this enum's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Registration,
    StorageAccess,
    StorageUpload,
    DatabaseAccess,
    RemoteConfig,
    Crashlytics,
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckName::Registration => "User Registration",
            CheckName::StorageAccess => "Storage Bucket Access",
            CheckName::StorageUpload => "Storage Upload",
            CheckName::DatabaseAccess => "Database Access",
            CheckName::RemoteConfig => "Remote Config",
            CheckName::Crashlytics => "Crashlytics",
        };
        f.write_str(s)
    }
}

/// One check's outcome together with the observable fact justifying it.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub outcome: Outcome,
    /// Minimal observation behind the outcome: a status code, a denial
    /// message, a body excerpt, or the list of missing fields. Reporting
    /// material only; nothing branches on it.
    pub evidence: String,
    pub checked_at: DateTime<Utc>,
    /// Auth token obtained by the registration check, handed to later
    /// checks by the engine. Absent everywhere else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Verdict {
    fn new(outcome: Outcome, evidence: impl Into<String>) -> Self {
        Self {
            outcome,
            evidence: evidence.into(),
            checked_at: Utc::now(),
            auth_token: None,
        }
    }

    pub fn vulnerable(evidence: impl Into<String>) -> Self {
        Self::new(Outcome::Vulnerable, evidence)
    }

    pub fn secure(evidence: impl Into<String>) -> Self {
        Self::new(Outcome::Secure, evidence)
    }

    pub fn error(evidence: impl Into<String>) -> Self {
        Self::new(Outcome::Error, evidence)
    }

    pub fn skipped(evidence: impl Into<String>) -> Self {
        Self::new(Outcome::Skipped, evidence)
    }

    /// Skip verdict for a check whose required fields are not all present.
    pub fn skipped_missing(missing: &[ConfigField]) -> Self {
        let fields = missing
            .iter()
            .map(|f| f.wire_name())
            .collect::<Vec<_>>()
            .join(", ");
        Self::skipped(format!("missing required fields: {fields}"))
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Folds the verdicts of a check's individual requests into the check's
    /// single verdict: any exposure wins, a clean denial on every request
    /// means secure, anything else stays ambiguous.
    pub fn aggregate(parts: Vec<Verdict>) -> Verdict {
        if let Some(hit) = parts.iter().find(|v| v.outcome == Outcome::Vulnerable) {
            return hit.clone();
        }
        let evidence = parts
            .iter()
            .map(|v| v.evidence.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        if !parts.is_empty() && parts.iter().all(|v| v.outcome == Outcome::Secure) {
            Verdict::secure(evidence)
        } else {
            Verdict::error(evidence)
        }
    }
}

/// A check identity paired with its verdict.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check: CheckName,
    pub verdict: Verdict,
}

/// Ordered results of one engine run, one entry per catalog check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    results: Vec<CheckResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, check: CheckName, verdict: Verdict) {
        self.results.push(CheckResult { check, verdict });
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Outcome counts, derived from the detail list on demand so the two
    /// can never diverge.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for result in &self.results {
            match result.verdict.outcome {
                Outcome::Vulnerable => summary.vulnerable += 1,
                Outcome::Secure => summary.secure += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Error => summary.errors += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub vulnerable: usize,
    pub secure: usize,
    pub skipped: usize,
    pub errors: usize,
}
