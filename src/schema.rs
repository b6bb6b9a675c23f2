//! Shared data model for classification outcomes.
//!
//! Two result shapes coexist on the wire: the categorical shape produced by the
//! deterministic local scorer and the probabilistic shape returned by the
//! remote classifier. They are modelled as one tagged enum so a consumer can
//! never cross-read fields from the shape that is not populated.
//!
//! `decode_analysis` is the single validation boundary: malformed upstream
//! payloads are rejected here, before anything reaches rendering logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::SchemaError;

/// Tolerance for the safe + malicious probability sum.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Safe,
    Suspicious,
    Malicious,
    Analyzing,
}

impl RiskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RiskStatus::Safe => "Safe",
            RiskStatus::Suspicious => "Suspicious",
            RiskStatus::Malicious => "Malicious",
            RiskStatus::Analyzing => "Analyzing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainReputation {
    Good,
    Unknown,
    Poor,
}

impl DomainReputation {
    pub fn label(&self) -> &'static str {
        match self {
            DomainReputation::Good => "Good",
            DomainReputation::Unknown => "Unknown",
            DomainReputation::Poor => "Poor",
        }
    }
}

/// Raw observation attached to a feature row. Kept loose on purpose: the
/// upstream mixes booleans, counts, and descriptive strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// Human-readable rendering ("Yes"/"No" for booleans, trimmed numbers).
    pub fn display(&self) -> String {
        match self {
            MetricValue::Bool(true) => "Yes".to_string(),
            MetricValue::Bool(false) => "No".to_string(),
            MetricValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            MetricValue::Number(n) => format!("{n:.2}"),
            MetricValue::Text(s) => s.clone(),
        }
    }
}

/// One named diagnostic signal. `score` (0-100, higher = riskier) and
/// `importance` (0-10, weight in the overall verdict) are independent axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetric {
    pub name: String,
    pub value: MetricValue,
    pub score: u8,
    pub importance: u8,
}

impl FeatureMetric {
    fn validate(&self) -> Result<(), SchemaError> {
        if self.score > 100 {
            return Err(SchemaError::OutOfRange {
                field: "featureMetrics.score",
                value: self.score as f64,
                expected: "0..=100",
            });
        }
        if self.importance > 10 {
            return Err(SchemaError::OutOfRange {
                field: "featureMetrics.importance",
                value: self.importance as f64,
                expected: "0..=10",
            });
        }
        Ok(())
    }
}

/// Categorical verdict shape (local scorer and early mock contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalResult {
    pub status: RiskStatus,
    pub score: u8,
    pub url: String,
    pub redirections_count: u32,
    pub is_shortened: bool,
    pub domain_reputation: DomainReputation,
    pub ssl_status: bool,
    pub bot_behavior_score: u8,
    #[serde(with = "flexible_ts")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_metrics: Option<Vec<FeatureMetric>>,
}

impl CategoricalResult {
    fn validate(&self) -> Result<(), SchemaError> {
        if self.score > 100 {
            return Err(SchemaError::OutOfRange {
                field: "score",
                value: self.score as f64,
                expected: "0..=100",
            });
        }
        if self.bot_behavior_score > 100 {
            return Err(SchemaError::OutOfRange {
                field: "botBehaviorScore",
                value: self.bot_behavior_score as f64,
                expected: "0..=100",
            });
        }
        if let Some(metrics) = &self.feature_metrics {
            for metric in metrics {
                metric.validate()?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub safe: f64,
    pub malicious: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Probabilistic shape returned by the remote classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilisticResult {
    pub url: String,
    pub is_safe: bool,
    pub confidence_score: f64,
    pub prediction_stability: f64,
    pub probabilities: ClassProbabilities,
    #[serde(default)]
    pub feature_importances: Vec<FeatureImportance>,
    /// Wall-clock seconds the remote spent on this analysis.
    #[serde(default)]
    pub analysis_time: f64,
    #[serde(with = "flexible_ts")]
    pub timestamp: DateTime<Utc>,
}

impl ProbabilisticResult {
    fn validate(&self) -> Result<(), SchemaError> {
        check_unit("confidence_score", self.confidence_score)?;
        check_unit("prediction_stability", self.prediction_stability)?;
        check_unit("probabilities.safe", self.probabilities.safe)?;
        check_unit("probabilities.malicious", self.probabilities.malicious)?;
        let sum = self.probabilities.safe + self.probabilities.malicious;
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(SchemaError::ProbabilitySum { sum });
        }
        for fi in &self.feature_importances {
            check_unit("feature_importances.importance", fi.importance)?;
        }
        if self.analysis_time < 0.0 {
            return Err(SchemaError::OutOfRange {
                field: "analysis_time",
                value: self.analysis_time,
                expected: ">= 0",
            });
        }
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), SchemaError> {
    if !(0.0..=1.0).contains(&value) || !value.is_finite() {
        return Err(SchemaError::OutOfRange {
            field,
            value,
            expected: "0..=1",
        });
    }
    Ok(())
}

/// One classification outcome. Exactly one shape is populated per instance;
/// the enum makes the other shape unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Categorical(CategoricalResult),
    Probabilistic(ProbabilisticResult),
}

impl AnalysisResult {
    pub fn url(&self) -> &str {
        match self {
            AnalysisResult::Categorical(r) => &r.url,
            AnalysisResult::Probabilistic(r) => &r.url,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AnalysisResult::Categorical(r) => r.timestamp,
            AnalysisResult::Probabilistic(r) => r.timestamp,
        }
    }

    /// Timestamps must be monotonically non-decreasing within a session; the
    /// session controller lifts a late-arriving clock to the floor it tracks.
    pub fn clamp_timestamp(&mut self, floor: DateTime<Utc>) {
        let ts = match self {
            AnalysisResult::Categorical(r) => &mut r.timestamp,
            AnalysisResult::Probabilistic(r) => &mut r.timestamp,
        };
        if *ts < floor {
            *ts = floor;
        }
    }

    /// Categorical verdict for either shape. A probabilistic result carries no
    /// suspicious band; it collapses to safe/malicious on `is_safe`.
    pub fn verdict(&self) -> RiskStatus {
        match self {
            AnalysisResult::Categorical(r) => r.status,
            AnalysisResult::Probabilistic(r) => {
                if r.is_safe {
                    RiskStatus::Safe
                } else {
                    RiskStatus::Malicious
                }
            }
        }
    }

    /// Confidence for user messaging, as a whole percentage.
    pub fn confidence_percent(&self) -> u8 {
        match self {
            AnalysisResult::Categorical(r) => r.score,
            AnalysisResult::Probabilistic(r) => (r.confidence_score * 100.0).round() as u8,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            AnalysisResult::Categorical(r) => r.validate(),
            AnalysisResult::Probabilistic(r) => r.validate(),
        }
    }
}

/// Decode and validate a raw classifier response. This is the only place
/// malformed upstream data is rejected.
pub fn decode_analysis(raw: &[u8]) -> Result<AnalysisResult, SchemaError> {
    let result: AnalysisResult =
        serde_json::from_slice(raw).map_err(|e| SchemaError::Shape(e.to_string()))?;
    result.validate()?;
    Ok(result)
}

/// Aggregate quality metrics for the remote model. Slowly changing; fetched
/// once per session and cached for a bounded freshness window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    #[serde(default)]
    pub training_data_size: u64,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub base_models: Vec<String>,
    #[serde(default)]
    pub top_features: HashMap<String, f64>,
    #[serde(default)]
    pub model_version: Option<String>,
}

impl ModelPerformance {
    /// Documented fallback used when the performance endpoint is unreachable.
    /// Mirrors the classifier's own published defaults.
    pub fn default_record() -> Self {
        Self {
            accuracy: 0.90,
            precision: 0.92,
            recall: 0.89,
            f1_score: 0.90,
            training_data_size: 10_000,
            last_updated: None,
            framework: Some("scikit-learn Ensemble".to_string()),
            model_type: Some("Stack Ensemble".to_string()),
            base_models: vec![
                "RandomForestClassifier".to_string(),
                "GradientBoostingClassifier".to_string(),
                "LogisticRegression".to_string(),
            ],
            top_features: HashMap::new(),
            model_version: Some("2.0.0".to_string()),
        }
    }
}

/// Descriptive statistics of the training corpus. Read-only, fetched on
/// demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetrics {
    pub total_samples: u64,
    pub malicious_samples: u64,
    pub safe_samples: u64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub feature_count: u64,
    #[serde(default)]
    pub dataset_version: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Timestamp codec tolerant of upstream variance: the classifier emits naive
/// ISO-8601 (no offset), while our own results are RFC 3339.
mod flexible_ts {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        // Naive isoformat, assume UTC.
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, fmt) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }
        Err(serde::de::Error::custom(format!(
            "unrecognized timestamp format: {raw}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probabilistic_json(safe: f64, malicious: f64) -> String {
        format!(
            r#"{{
                "url": "https://x.com/user/status/1",
                "is_safe": true,
                "confidence_score": 0.93,
                "prediction_stability": 0.88,
                "probabilities": {{"safe": {safe}, "malicious": {malicious}}},
                "feature_importances": [
                    {{"feature": "url_length", "importance": 0.15}},
                    {{"feature": "domain_age", "importance": 0.12}}
                ],
                "analysis_time": 0.42,
                "timestamp": "2025-06-01T12:00:00Z"
            }}"#
        )
    }

    #[test]
    fn decodes_probabilistic_shape() {
        let result = decode_analysis(probabilistic_json(0.8, 0.2).as_bytes()).unwrap();
        match &result {
            AnalysisResult::Probabilistic(r) => {
                assert!(r.is_safe);
                assert_eq!(r.feature_importances.len(), 2);
            }
            other => panic!("expected probabilistic shape, got {other:?}"),
        }
        assert_eq!(result.verdict(), RiskStatus::Safe);
        assert_eq!(result.confidence_percent(), 93);
    }

    #[test]
    fn decodes_categorical_shape() {
        let raw = r#"{
            "status": "suspicious",
            "score": 55,
            "url": "https://t.co/abc",
            "redirectionsCount": 2,
            "isShortened": true,
            "domainReputation": "Unknown",
            "sslStatus": false,
            "botBehaviorScore": 61,
            "timestamp": "2025-06-01T12:00:00Z",
            "details": "Watch out"
        }"#;
        let result = decode_analysis(raw.as_bytes()).unwrap();
        match &result {
            AnalysisResult::Categorical(r) => {
                assert_eq!(r.status, RiskStatus::Suspicious);
                assert_eq!(r.redirections_count, 2);
                assert!(r.feature_metrics.is_none());
            }
            other => panic!("expected categorical shape, got {other:?}"),
        }
        assert_eq!(result.verdict(), RiskStatus::Suspicious);
    }

    #[test]
    fn rejects_probability_sum_violation() {
        let err = decode_analysis(probabilistic_json(0.8, 0.3).as_bytes()).unwrap_err();
        assert!(matches!(err, SchemaError::ProbabilitySum { .. }));
    }

    #[test]
    fn accepts_probability_sum_within_tolerance() {
        assert!(decode_analysis(probabilistic_json(0.8005, 0.2).as_bytes()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let raw = probabilistic_json(0.8, 0.2).replace("0.93", "1.7");
        let err = decode_analysis(raw.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::OutOfRange {
                field: "confidence_score",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_shape() {
        let err = decode_analysis(br#"{"hello": "world"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Shape(_)));
    }

    #[test]
    fn accepts_naive_isoformat_timestamp() {
        let raw = probabilistic_json(0.8, 0.2)
            .replace("2025-06-01T12:00:00Z", "2025-06-01T12:00:00.123456");
        assert!(decode_analysis(raw.as_bytes()).is_ok());
    }

    #[test]
    fn clamps_timestamp_forward_only() {
        let mut result = decode_analysis(probabilistic_json(0.5, 0.5).as_bytes()).unwrap();
        let original = result.timestamp();
        let earlier = original - chrono::Duration::seconds(60);
        result.clamp_timestamp(earlier);
        assert_eq!(result.timestamp(), original);

        let later = original + chrono::Duration::seconds(60);
        result.clamp_timestamp(later);
        assert_eq!(result.timestamp(), later);
    }

    #[test]
    fn feature_metric_importance_range_enforced() {
        let raw = r#"{
            "status": "safe",
            "score": 10,
            "url": "https://x.com/a/status/1",
            "redirectionsCount": 0,
            "isShortened": false,
            "domainReputation": "Good",
            "sslStatus": true,
            "botBehaviorScore": 12,
            "timestamp": "2025-06-01T12:00:00Z",
            "featureMetrics": [
                {"name": "Domain Reputation", "value": "Good", "score": 10, "importance": 11}
            ]
        }"#;
        let err = decode_analysis(raw.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::OutOfRange {
                field: "featureMetrics.importance",
                ..
            }
        ));
    }
}
