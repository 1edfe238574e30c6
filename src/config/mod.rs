//! Normalized Firebase project configuration.
//!
//! A `ProbeConfig` is the single input the engine consumes. Both CLI
//! construction paths (individual flags and a pasted web-app config blob)
//! converge to this shape before any check runs, and the model is read-only
//! from then on: checks receive `&ProbeConfig` and nothing else.

use serde::Deserialize;
use std::fmt;

/// Email used by the registration probe unless the caller overrides it.
pub const DEFAULT_TEST_EMAIL: &str = "test@bugbounty.com";
/// Password used by the registration probe unless the caller overrides it.
pub const DEFAULT_TEST_PASSWORD: &str = "TestPassword123!";

/// The public client-side identifiers of a Firebase project, as found in a
/// web app's `firebaseConfig` object. Every field is optional; which checks
/// can run is decided from what is present.
///
/// Deserializes directly from the JSON blob applications embed, using the
/// exact wire names (`apiKey`, `databaseURL`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    #[serde(rename = "databaseURL")]
    pub database_url: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,

    /// Credentials for the sign-up probe. Never read from the config blob.
    #[serde(skip, default = "default_test_email")]
    pub test_email: String,
    #[serde(skip, default = "default_test_password")]
    pub test_password: String,

    /// When set, the probe layer records every materialized request for
    /// inspection. Has no effect on verdicts.
    #[serde(skip)]
    pub debug: bool,
}

fn default_test_email() -> String {
    DEFAULT_TEST_EMAIL.to_string()
}

fn default_test_password() -> String {
    DEFAULT_TEST_PASSWORD.to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            auth_domain: None,
            database_url: None,
            project_id: None,
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
            measurement_id: None,
            test_email: default_test_email(),
            test_password: default_test_password(),
            debug: false,
        }
    }
}

impl ProbeConfig {
    /// Returns the value of `field`, if the configuration carries it.
    pub fn get(&self, field: ConfigField) -> Option<&str> {
        match field {
            ConfigField::ApiKey => self.api_key.as_deref(),
            ConfigField::AuthDomain => self.auth_domain.as_deref(),
            ConfigField::DatabaseUrl => self.database_url.as_deref(),
            ConfigField::ProjectId => self.project_id.as_deref(),
            ConfigField::StorageBucket => self.storage_bucket.as_deref(),
            ConfigField::MessagingSenderId => self.messaging_sender_id.as_deref(),
            ConfigField::AppId => self.app_id.as_deref(),
            ConfigField::MeasurementId => self.measurement_id.as_deref(),
        }
    }

    /// The subset of `required` that this configuration does not provide.
    /// An empty result means the check guarded by `required` is eligible.
    pub fn missing_fields(&self, required: &[ConfigField]) -> Vec<ConfigField> {
        required
            .iter()
            .copied()
            .filter(|field| self.get(*field).is_none_or(str::is_empty))
            .collect()
    }

    /// True if at least one of the eight identifier fields is set.
    pub fn has_any_field(&self) -> bool {
        ConfigField::ALL.iter().any(|f| self.get(*f).is_some())
    }
}

/// Names of the eight configuration fields, used by checks to declare their
/// prerequisites and by the engine to report what a skipped check lacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    ApiKey,
    AuthDomain,
    DatabaseUrl,
    ProjectId,
    StorageBucket,
    MessagingSenderId,
    AppId,
    MeasurementId,
}

impl ConfigField {
    pub const ALL: [ConfigField; 8] = [
        ConfigField::ApiKey,
        ConfigField::AuthDomain,
        ConfigField::DatabaseUrl,
        ConfigField::ProjectId,
        ConfigField::StorageBucket,
        ConfigField::MessagingSenderId,
        ConfigField::AppId,
        ConfigField::MeasurementId,
    ];

    /// The field name as it appears in a `firebaseConfig` object.
    pub fn wire_name(self) -> &'static str {
        match self {
            ConfigField::ApiKey => "apiKey",
            ConfigField::AuthDomain => "authDomain",
            ConfigField::DatabaseUrl => "databaseURL",
            ConfigField::ProjectId => "projectId",
            ConfigField::StorageBucket => "storageBucket",
            ConfigField::MessagingSenderId => "messagingSenderId",
            ConfigField::AppId => "appId",
            ConfigField::MeasurementId => "measurementId",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
