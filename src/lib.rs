//! Probes a Firebase project configuration for misconfigurations reachable
//! with nothing but the public client-side credentials an application ships
//! to every user: open account sign-up, listable or writable Storage
//! buckets, an exposed Realtime Database, fetchable Remote Config templates
//! and readable Crashlytics issue feeds.
//!
//! The crate is the probing core; the bundled binary is a thin front-end
//! around it. A normalized [`ProbeConfig`] goes in, an ordered [`Report`]
//! with one verdict per catalog check comes out.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use firebase_probe::{HttpProbe, ProbeConfig, ProbeEngine};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProbeConfig {
//!     api_key: Some("AIza...".to_string()),
//!     ..Default::default()
//! };
//!
//! let probe = HttpProbe::new(firebase_probe::probe::DEFAULT_TIMEOUT, config.debug)?;
//! let report = ProbeEngine::new(probe).run(&config).await;
//!
//! for result in report.results() {
//!     println!("{}: {}", result.check, result.verdict.outcome);
//! }
//! # Ok(())
//! # }
//! ```

pub mod checks;
pub mod config;
pub mod core;
pub mod engine;
pub mod probe;
pub mod report;

pub use config::{ConfigField, ProbeConfig};
pub use engine::ProbeEngine;
pub use probe::{HttpProbe, ProbeError};
pub use report::{CheckName, Outcome, Report, Summary, Verdict};
