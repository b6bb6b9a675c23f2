//! Pure mapping from an analysis result to renderable metric rows.
//!
//! No state and no side effects: the same result always yields the same rows
//! in the same order, so the truncated list can back an incremental
//! "show more" disclosure.

use crate::schema::{AnalysisResult, CategoricalResult, MetricValue, ProbabilisticResult};

/// Display-only emphasis bucket; never stored on the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTier {
    Low,
    Medium,
    High,
}

impl SeverityTier {
    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
        }
    }
}

/// Tier thresholds: above 66 is high, 33 and up is medium, below is low.
pub fn tier_for(score: u8) -> SeverityTier {
    if score > 66 {
        SeverityTier::High
    } else if score >= 33 {
        SeverityTier::Medium
    } else {
        SeverityTier::Low
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub label: String,
    pub display_value: String,
    pub tier: SeverityTier,
}

/// Stateless row builder with a configurable visible count (default 3).
#[derive(Debug, Clone, Copy)]
pub struct MetricPresenter {
    visible_count: usize,
}

impl Default for MetricPresenter {
    fn default() -> Self {
        Self { visible_count: 3 }
    }
}

impl MetricPresenter {
    pub fn new(visible_count: usize) -> Self {
        Self { visible_count }
    }

    /// All rows when `expanded`, otherwise the first `visible_count`. Order is
    /// stable across calls.
    pub fn rows(&self, result: &AnalysisResult, expanded: bool) -> Vec<MetricRow> {
        let mut rows = match result {
            AnalysisResult::Categorical(r) => categorical_rows(r),
            AnalysisResult::Probabilistic(r) => probabilistic_rows(r),
        };
        if !expanded {
            rows.truncate(self.visible_count);
        }
        rows
    }
}

fn categorical_rows(result: &CategoricalResult) -> Vec<MetricRow> {
    if let Some(metrics) = &result.feature_metrics {
        return metrics
            .iter()
            .map(|m| MetricRow {
                label: m.name.clone(),
                display_value: m.value.display(),
                tier: tier_for(m.score),
            })
            .collect();
    }

    // Older categorical payloads carry only the scalar fields.
    let reputation_score = match result.domain_reputation {
        crate::schema::DomainReputation::Good => 10,
        crate::schema::DomainReputation::Unknown => 50,
        crate::schema::DomainReputation::Poor => 90,
    };
    vec![
        MetricRow {
            label: "URL Risk Score".to_string(),
            display_value: result.score.to_string(),
            tier: tier_for(result.score),
        },
        MetricRow {
            label: "Redirections".to_string(),
            display_value: result.redirections_count.to_string(),
            tier: tier_for((result.redirections_count * 20).min(100) as u8),
        },
        MetricRow {
            label: "Shortened URL".to_string(),
            display_value: MetricValue::Bool(result.is_shortened).display(),
            tier: tier_for(if result.is_shortened { 70 } else { 10 }),
        },
        MetricRow {
            label: "Domain Reputation".to_string(),
            display_value: result.domain_reputation.label().to_string(),
            tier: tier_for(reputation_score),
        },
        MetricRow {
            label: "SSL Certificate".to_string(),
            display_value: MetricValue::Bool(result.ssl_status).display(),
            tier: tier_for(if result.ssl_status { 5 } else { 85 }),
        },
        MetricRow {
            label: "Bot Behavior Score".to_string(),
            display_value: result.bot_behavior_score.to_string(),
            tier: tier_for(result.bot_behavior_score),
        },
    ]
}

fn probabilistic_rows(result: &ProbabilisticResult) -> Vec<MetricRow> {
    let percent = |v: f64| format!("{:.0}%", v * 100.0);
    // Risk-oriented emphasis: high confidence and stability are calm rows.
    let inverse_score = |v: f64| ((1.0 - v.clamp(0.0, 1.0)) * 100.0).round() as u8;
    let direct_score = |v: f64| (v.clamp(0.0, 1.0) * 100.0).round() as u8;

    let mut rows = vec![
        MetricRow {
            label: "Model Confidence".to_string(),
            display_value: percent(result.confidence_score),
            tier: tier_for(inverse_score(result.confidence_score)),
        },
        MetricRow {
            label: "Prediction Stability".to_string(),
            display_value: percent(result.prediction_stability),
            tier: tier_for(inverse_score(result.prediction_stability)),
        },
        MetricRow {
            label: "Safe Probability".to_string(),
            display_value: percent(result.probabilities.safe),
            tier: tier_for(inverse_score(result.probabilities.safe)),
        },
        MetricRow {
            label: "Malicious Probability".to_string(),
            display_value: percent(result.probabilities.malicious),
            tier: tier_for(direct_score(result.probabilities.malicious)),
        },
        MetricRow {
            label: "Analysis Time".to_string(),
            display_value: format!("{:.2}s", result.analysis_time),
            tier: SeverityTier::Low,
        },
    ];

    rows.extend(result.feature_importances.iter().map(|fi| MetricRow {
        label: fi.feature.clone(),
        display_value: format!("{:.2}", fi.importance),
        tier: tier_for(direct_score(fi.importance)),
    }));

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        AnalysisResult, CategoricalResult, DomainReputation, FeatureMetric, MetricValue,
        RiskStatus,
    };
    use chrono::Utc;

    fn result_with_metrics(count: usize) -> AnalysisResult {
        let metrics = (0..count)
            .map(|i| FeatureMetric {
                name: format!("Metric {i}"),
                value: MetricValue::Number(i as f64),
                score: (i * 10).min(100) as u8,
                importance: 5,
            })
            .collect();
        AnalysisResult::Categorical(CategoricalResult {
            status: RiskStatus::Suspicious,
            score: 50,
            url: "https://t.co/abc".to_string(),
            redirections_count: 1,
            is_shortened: true,
            domain_reputation: DomainReputation::Unknown,
            ssl_status: false,
            bot_behavior_score: 40,
            timestamp: Utc::now(),
            details: None,
            feature_metrics: Some(metrics),
        })
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier_for(67), SeverityTier::High);
        assert_eq!(tier_for(66), SeverityTier::Medium);
        assert_eq!(tier_for(33), SeverityTier::Medium);
        assert_eq!(tier_for(32), SeverityTier::Low);
        assert_eq!(tier_for(0), SeverityTier::Low);
        assert_eq!(tier_for(100), SeverityTier::High);
    }

    #[test]
    fn truncates_to_visible_count_until_expanded() {
        let presenter = MetricPresenter::default();
        let result = result_with_metrics(10);

        let collapsed = presenter.rows(&result, false);
        assert_eq!(collapsed.len(), 3);

        let expanded = presenter.rows(&result, true);
        assert_eq!(expanded.len(), 10);

        // Order preserved: the collapsed view is a prefix of the expanded one.
        assert_eq!(&expanded[..3], &collapsed[..]);
        for (i, row) in expanded.iter().enumerate() {
            assert_eq!(row.label, format!("Metric {i}"));
        }
    }

    #[test]
    fn rows_are_stable_across_calls() {
        let presenter = MetricPresenter::new(4);
        let result = result_with_metrics(8);
        assert_eq!(presenter.rows(&result, false), presenter.rows(&result, false));
        assert_eq!(presenter.rows(&result, true), presenter.rows(&result, true));
    }

    #[test]
    fn scalar_fallback_when_no_feature_metrics() {
        let result = match result_with_metrics(0) {
            AnalysisResult::Categorical(mut r) => {
                r.feature_metrics = None;
                AnalysisResult::Categorical(r)
            }
            other => other,
        };
        let rows = MetricPresenter::default().rows(&result, true);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].label, "URL Risk Score");
        assert_eq!(rows[2].display_value, "Yes");
        assert_eq!(rows[4].tier, SeverityTier::High); // no SSL
    }

    #[test]
    fn probabilistic_rows_include_importances() {
        let raw = r#"{
            "url": "https://x.com/u/status/1",
            "is_safe": false,
            "confidence_score": 0.9,
            "prediction_stability": 0.8,
            "probabilities": {"safe": 0.1, "malicious": 0.9},
            "feature_importances": [
                {"feature": "url_length", "importance": 0.15},
                {"feature": "domain_age", "importance": 0.80}
            ],
            "analysis_time": 0.2,
            "timestamp": "2025-06-01T12:00:00Z"
        }"#;
        let result = crate::schema::decode_analysis(raw.as_bytes()).unwrap();
        let rows = MetricPresenter::default().rows(&result, true);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[3].label, "Malicious Probability");
        assert_eq!(rows[3].tier, SeverityTier::High);
        assert_eq!(rows[5].label, "url_length");
        assert_eq!(rows[5].tier, SeverityTier::Low);
        assert_eq!(rows[6].tier, SeverityTier::High);
    }
}
