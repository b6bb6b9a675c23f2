//! Per-submission analysis lifecycle.
//!
//! One controller owns the state machine for a user's submissions:
//! `Idle -> Validating -> InFlight -> {Resolved, Failed} -> Idle`. Exactly one
//! request is logically outstanding at a time. Submitting while in flight
//! cancels interest in the older request (cancel-and-replace): every
//! submission gets a monotonically increasing sequence number and a completion
//! is applied only if it still carries the current one, so the displayed state
//! follows "last submission wins", never "last response wins".
//!
//! Outcomes are reported over an unbounded channel as [`Notification`]s,
//! decoupled from any rendering concern.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;

use crate::client::AnalysisClient;
use crate::errors::{AnalysisError, SessionError, ValidationError};
use crate::retry::{retry_read, RetryConfig};
use crate::schema::{AnalysisResult, ModelPerformance, RiskStatus};
use crate::scoring::Classify;

/// User-facing event emitted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    AnalysisComplete {
        verdict: RiskStatus,
        confidence_percent: u8,
        message: String,
    },
    AnalysisFailed {
        message: String,
    },
    InvalidInput {
        message: String,
    },
    PerformanceDegraded {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Validating,
    InFlight { seq: u64 },
    Resolved(AnalysisResult),
    Failed(AnalysisError),
}

/// Token for one accepted submission. Completions must present it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub seq: u64,
    pub url: String,
}

/// Sub-state of the independently fetched model-performance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceState {
    Loading,
    Ready,
    Stale,
    Error,
}

/// Cached model-performance value: single writer (fetch completion), many
/// readers. Readers always observe the last complete value or the documented
/// default, never a partial write.
#[derive(Debug)]
struct PerformanceCache {
    value: Option<ModelPerformance>,
    fetched_at: Option<Instant>,
    ttl: Duration,
    failed: bool,
}

impl PerformanceCache {
    fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
            failed: false,
        }
    }

    fn state(&self) -> PerformanceState {
        match (&self.value, self.fetched_at) {
            (Some(_), Some(at)) if at.elapsed() <= self.ttl => PerformanceState::Ready,
            (Some(_), _) => PerformanceState::Stale,
            (None, _) if self.failed => PerformanceState::Error,
            _ => PerformanceState::Loading,
        }
    }

    fn current(&self) -> ModelPerformance {
        self.value
            .clone()
            .unwrap_or_else(ModelPerformance::default_record)
    }

    fn store(&mut self, value: ModelPerformance) {
        self.value = Some(value);
        self.fetched_at = Some(Instant::now());
        self.failed = false;
    }
}

pub struct SessionController<C: Classify> {
    scorer: C,
    state: SessionState,
    seq: u64,
    last_result: Option<AnalysisResult>,
    last_timestamp: Option<DateTime<Utc>>,
    notifier: mpsc::UnboundedSender<Notification>,
    performance: PerformanceCache,
    degraded_warned: bool,
}

impl<C: Classify> SessionController<C> {
    pub fn new(scorer: C, performance_ttl: Duration) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, receiver) = mpsc::unbounded_channel();
        (
            Self {
                scorer,
                state: SessionState::Idle,
                seq: 0,
                last_result: None,
                last_timestamp: None,
                notifier,
                performance: PerformanceCache::new(performance_ttl),
                degraded_warned: false,
            },
            receiver,
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Most recently applied result, surviving across later submissions until
    /// a newer one resolves.
    pub fn current_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    /// Validate input and open a new submission. Validation failures emit an
    /// `InvalidInput` notification, send nothing over the wire, and return the
    /// controller to idle. Beginning while a request is in flight replaces it:
    /// the older request's eventual completion will be discarded.
    pub fn begin_submission(&mut self, input: &str) -> Result<Submission, ValidationError> {
        self.state = SessionState::Validating;
        match validate_url(input) {
            Ok(url) => {
                self.seq += 1;
                self.state = SessionState::InFlight { seq: self.seq };
                log::debug!("submission #{} in flight: {url}", self.seq);
                Ok(Submission {
                    seq: self.seq,
                    url,
                })
            }
            Err(e) => {
                self.state = SessionState::Idle;
                self.notify(Notification::InvalidInput {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Apply a completion for `submission`. Returns `false` (and leaves all
    /// displayed state untouched) when a newer submission has superseded it.
    pub fn apply_outcome(
        &mut self,
        submission: &Submission,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        match self.state {
            SessionState::InFlight { seq } if seq == submission.seq => {}
            _ => {
                log::debug!(
                    "discarding stale completion for submission #{} (current #{})",
                    submission.seq,
                    self.seq
                );
                return false;
            }
        }

        match outcome {
            Ok(mut result) => {
                if let Some(floor) = self.last_timestamp {
                    result.clamp_timestamp(floor);
                }
                self.last_timestamp = Some(result.timestamp());

                let verdict = result.verdict();
                let confidence = result.confidence_percent();
                self.last_result = Some(result.clone());
                self.state = SessionState::Resolved(result);
                self.notify(Notification::AnalysisComplete {
                    verdict,
                    confidence_percent: confidence,
                    message: verdict_message(verdict).to_string(),
                });
            }
            Err(error) => {
                if let AnalysisError::Schema(ref schema_err) = error {
                    // Contract mismatch, not a transient outage.
                    log::error!("submission #{} schema violation: {schema_err}", submission.seq);
                } else {
                    log::warn!("submission #{} failed: {error}", submission.seq);
                }
                self.state = SessionState::Failed(error);
                self.notify(Notification::AnalysisFailed {
                    message: "We couldn't analyze this URL. Please try again.".to_string(),
                });
            }
        }
        true
    }

    /// Drive one full submission: validate, classify, apply. Overlapping
    /// callers should use `begin_submission`/`apply_outcome` directly.
    pub async fn submit(&mut self, input: &str) -> Result<AnalysisResult, SessionError> {
        let submission = self.begin_submission(input)?;
        let outcome = self.scorer.classify(&submission.url).await;
        let applied = self.apply_outcome(&submission, outcome);
        match &self.state {
            SessionState::Resolved(result) if applied => Ok(result.clone()),
            SessionState::Failed(error) if applied => Err(error.clone().into()),
            // Superseded mid-flight; report as the newer submission's problem.
            _ => Err(SessionError::Analysis(AnalysisError::Transport {
                message: "submission superseded".to_string(),
            })),
        }
    }

    /// Cached model-performance record, or the documented default before the
    /// first successful fetch (and after a failed one).
    pub fn model_performance(&self) -> ModelPerformance {
        self.performance.current()
    }

    pub fn performance_state(&self) -> PerformanceState {
        self.performance.state()
    }

    /// Fetch the performance record, independent of any submission. Retries a
    /// bounded number of times (idempotent read); on failure the cached or
    /// default record keeps serving and a one-time degraded warning is
    /// emitted, so submissions are never blocked.
    pub async fn refresh_model_performance(
        &mut self,
        client: &AnalysisClient,
        retry: &RetryConfig,
    ) -> ModelPerformance {
        match retry_read(retry, "model performance fetch", || client.model_performance()).await {
            Ok(value) => {
                self.performance.store(value);
            }
            Err(e) => {
                log::warn!("model performance unavailable, serving default: {e}");
                self.performance.failed = true;
                if !self.degraded_warned {
                    self.degraded_warned = true;
                    self.notify(Notification::PerformanceDegraded {
                        message: "Live model metrics are unavailable; showing last known values."
                            .to_string(),
                    });
                }
            }
        }
        self.performance.current()
    }

    fn notify(&self, notification: Notification) {
        if self.notifier.send(notification).is_err() {
            log::warn!("notification receiver dropped");
        }
    }
}

fn verdict_message(verdict: RiskStatus) -> &'static str {
    match verdict {
        RiskStatus::Safe => "This URL appears to be safe.",
        RiskStatus::Suspicious => {
            "This URL has suspicious characteristics. Proceed with caution."
        }
        RiskStatus::Malicious => {
            "Warning! This URL is likely malicious. We recommend avoiding it."
        }
        RiskStatus::Analyzing => "Analysis is still in progress.",
    }
}

fn host_pattern() -> &'static Regex {
    static HOST_RE: OnceLock<Regex> = OnceLock::new();
    HOST_RE.get_or_init(|| Regex::new(r"^([a-z0-9-]+\.)+[a-z]{2,}$").expect("valid host regex"))
}

/// Accepted-URL shape: http/https scheme and a dotted public-looking host.
/// Returns the normalized URL string that will be sent to the classifier.
pub fn validate_url(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let parsed = Url::parse(trimmed)?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ValidationError::UnsupportedScheme {
                scheme: scheme.to_string(),
            })
        }
    }

    let host = parsed
        .host_str()
        .ok_or(ValidationError::MissingHost)?
        .to_lowercase();
    if !host_pattern().is_match(&host) {
        return Err(ValidationError::UnrecognizedHost { host });
    }

    Ok(parsed.to_string())
}
