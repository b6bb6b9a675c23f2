//! BotGuard Library
//!
//! Core of a social-post URL risk classifier front end. This library provides
//! functionality to:
//!
//! - Model classification outcomes (categorical and probabilistic shapes)
//! - Score URLs deterministically offline or via the remote classifier API
//! - Drive the per-submission analysis lifecycle with last-submission-wins
//!   ordering
//! - Map results into renderable metric rows with severity tiers
//!
//! # Example
//!
//! ```rust
//! use botguard::scoring::local::LocalScorer;
//! use botguard::presentation::MetricPresenter;
//! use botguard::schema::AnalysisResult;
//!
//! let result = AnalysisResult::Categorical(
//!     LocalScorer::new().score("https://twitter.com/user/status/123456789"),
//! );
//! let rows = MetricPresenter::default().rows(&result, false);
//! assert_eq!(rows.len(), 3);
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod presentation;
pub mod retry;
pub mod schema;
pub mod scoring;
pub mod session;

// Re-export commonly used types for convenience
pub use client::AnalysisClient;
pub use config::Config;
pub use errors::{AnalysisError, SchemaError, SessionError, ValidationError};
pub use presentation::{MetricPresenter, MetricRow, SeverityTier};
pub use schema::{
    AnalysisResult, DatasetMetrics, FeatureMetric, HealthStatus, ModelPerformance, RiskStatus,
};
pub use scoring::{local::LocalScorer, Classify};
pub use session::{Notification, SessionController, SessionState};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
