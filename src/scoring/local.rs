//! Deterministic local scoring fallback.
//!
//! Everything derives from one stable 32-bit polynomial hash of the URL
//! string, so the same URL always yields the same verdict, score, and
//! diagnostic rows. No network, no state, no failure mode: empty and garbage
//! strings hash like anything else.

use chrono::Utc;

use crate::errors::AnalysisError;
use crate::schema::{
    AnalysisResult, CategoricalResult, DomainReputation, FeatureMetric, MetricValue, RiskStatus,
};
use crate::scoring::Classify;

/// Polynomial hash, base 31, wrapped to signed 32-bit then taken absolute.
/// Bit-reproducible across runs and platforms.
pub fn stable_hash(url: &str) -> u32 {
    let mut h: i32 = 0;
    for c in url.chars() {
        h = h.wrapping_mul(31).wrapping_add(c as i32);
    }
    h.wrapping_abs() as u32
}

/// Verdict bands are mutually exclusive and exhaustive over the hash space.
fn verdict_for(hash: u32) -> RiskStatus {
    match hash % 3 {
        2 => RiskStatus::Malicious,
        1 => RiskStatus::Suspicious,
        _ => RiskStatus::Safe,
    }
}

/// Overall risk score within the verdict-specific band:
/// malicious 75-99, suspicious 40-74, safe 0-39.
fn score_for(hash: u32, verdict: RiskStatus) -> u8 {
    match verdict {
        RiskStatus::Malicious => (75 + (hash / 3) % 25) as u8,
        RiskStatus::Suspicious => (40 + (hash / 3) % 35) as u8,
        _ => ((hash / 3) % 40) as u8,
    }
}

fn bot_score_for(hash: u32, verdict: RiskStatus) -> u8 {
    match verdict {
        RiskStatus::Malicious => (70 + (hash / 13) % 30) as u8,
        RiskStatus::Suspicious => (35 + (hash / 13) % 35) as u8,
        _ => ((hash / 13) % 35) as u8,
    }
}

fn details_for(verdict: RiskStatus) -> &'static str {
    match verdict {
        RiskStatus::Malicious => {
            "Multiple high-risk indicators were detected, including poor domain \
             reputation and bot-like posting behavior. We recommend avoiding this link."
        }
        RiskStatus::Suspicious => {
            "This URL has characteristics commonly associated with automated \
             accounts. Proceed with caution."
        }
        _ => {
            "No significant risk indicators were found. The destination and the \
             posting account look consistent with normal activity."
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalScorer;

impl LocalScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a URL without touching the network. Pure function of the input
    /// apart from the timestamp.
    pub fn score(&self, url: &str) -> CategoricalResult {
        let hash = stable_hash(url);
        let verdict = verdict_for(hash);
        let score = score_for(hash, verdict);

        let redirections_count = match verdict {
            RiskStatus::Malicious => 2 + (hash / 5) % 4,
            RiskStatus::Suspicious => 1 + (hash / 5) % 3,
            _ => (hash / 5) % 2,
        };
        let is_shortened = (hash / 7) % 2 == 1;
        let domain_reputation = match verdict {
            RiskStatus::Malicious => DomainReputation::Poor,
            RiskStatus::Suspicious => DomainReputation::Unknown,
            _ => DomainReputation::Good,
        };
        let ssl_status = match verdict {
            RiskStatus::Malicious => (hash / 11) % 4 == 0,
            RiskStatus::Suspicious => (hash / 11) % 2 == 0,
            _ => true,
        };
        let bot_behavior_score = bot_score_for(hash, verdict);

        let feature_metrics = build_feature_metrics(
            hash,
            verdict,
            score,
            redirections_count,
            is_shortened,
            domain_reputation,
            ssl_status,
            bot_behavior_score,
        );

        CategoricalResult {
            status: verdict,
            score,
            url: url.to_string(),
            redirections_count,
            is_shortened,
            domain_reputation,
            ssl_status,
            bot_behavior_score,
            timestamp: Utc::now(),
            details: Some(details_for(verdict).to_string()),
            feature_metrics: Some(feature_metrics),
        }
    }
}

impl Classify for LocalScorer {
    async fn classify(&self, url: &str) -> Result<AnalysisResult, AnalysisError> {
        Ok(AnalysisResult::Categorical(self.score(url)))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_feature_metrics(
    hash: u32,
    verdict: RiskStatus,
    score: u8,
    redirections_count: u32,
    is_shortened: bool,
    domain_reputation: DomainReputation,
    ssl_status: bool,
    bot_behavior_score: u8,
) -> Vec<FeatureMetric> {
    let reputation_score = match domain_reputation {
        DomainReputation::Good => 10,
        DomainReputation::Unknown => 50,
        DomainReputation::Poor => 90,
    };

    // Secondary heuristics, each tied to its own hash residue.
    let sentiment = match (hash / 17) % 3 {
        2 => ("Negative", 75u8),
        1 => ("Neutral", 40u8),
        _ => ("Positive", 10u8),
    };
    let posts_per_day = 1 + (hash / 19) % 24;
    let account_age_days = match verdict {
        RiskStatus::Malicious => (hash / 23) % 30,
        RiskStatus::Suspicious => 30 + (hash / 23) % 335,
        _ => 365 + (hash / 23) % 1000,
    };
    let age_score = if account_age_days < 30 {
        80
    } else if account_age_days < 180 {
        50
    } else {
        15
    };

    vec![
        FeatureMetric {
            name: "URL Risk Score".to_string(),
            value: MetricValue::Number(score as f64),
            score,
            importance: 10,
        },
        FeatureMetric {
            name: "Redirections".to_string(),
            value: MetricValue::Number(redirections_count as f64),
            score: (redirections_count * 20).min(100) as u8,
            importance: 7,
        },
        FeatureMetric {
            name: "Shortened URL".to_string(),
            value: MetricValue::Bool(is_shortened),
            score: if is_shortened { 70 } else { 10 },
            importance: 6,
        },
        FeatureMetric {
            name: "Domain Reputation".to_string(),
            value: MetricValue::Text(domain_reputation.label().to_string()),
            score: reputation_score,
            importance: 9,
        },
        FeatureMetric {
            name: "SSL Certificate".to_string(),
            value: MetricValue::Bool(ssl_status),
            score: if ssl_status { 5 } else { 85 },
            importance: 8,
        },
        FeatureMetric {
            name: "Bot Behavior Score".to_string(),
            value: MetricValue::Number(bot_behavior_score as f64),
            score: bot_behavior_score,
            importance: 9,
        },
        FeatureMetric {
            name: "Content Sentiment".to_string(),
            value: MetricValue::Text(sentiment.0.to_string()),
            score: sentiment.1,
            importance: 4,
        },
        FeatureMetric {
            name: "Posting Frequency".to_string(),
            value: MetricValue::Number(posts_per_day as f64),
            score: (posts_per_day * 4).min(100) as u8,
            importance: 5,
        },
        FeatureMetric {
            name: "Account Age".to_string(),
            value: MetricValue::Number(account_age_days as f64),
            score: age_score,
            importance: 6,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable() {
        let url = "https://twitter.com/user/status/123456789";
        assert_eq!(stable_hash(url), stable_hash(url));
        assert_eq!(stable_hash(""), 0);
    }

    #[test]
    fn repeated_scoring_is_deterministic() {
        let scorer = LocalScorer::new();
        for url in [
            "https://twitter.com/user/status/1",
            "https://t.co/a1b2c3",
            "",
            "not even a url \u{1F980}",
        ] {
            let a = scorer.score(url);
            let b = scorer.score(url);
            assert_eq!(a.status, b.status, "verdict unstable for {url:?}");
            assert_eq!(a.score, b.score, "score unstable for {url:?}");
            assert_eq!(a.feature_metrics, b.feature_metrics);
        }
    }

    #[test]
    fn verdict_bands_are_exclusive_and_exhaustive() {
        for hash in 0..3000u32 {
            let verdict = verdict_for(hash);
            let in_band = matches!(
                verdict,
                RiskStatus::Safe | RiskStatus::Suspicious | RiskStatus::Malicious
            );
            assert!(in_band);
            let score = score_for(hash, verdict);
            match verdict {
                RiskStatus::Malicious => assert!((75..=99).contains(&score)),
                RiskStatus::Suspicious => assert!((40..=74).contains(&score)),
                _ => assert!(score <= 39),
            }
        }
    }

    #[test]
    fn verdict_matches_hash_residue() {
        for url in ["a", "b", "c", "https://x.com/u/status/9", "t.co/zz"] {
            let scorer = LocalScorer::new();
            let result = scorer.score(url);
            let expected = match stable_hash(url) % 3 {
                2 => RiskStatus::Malicious,
                1 => RiskStatus::Suspicious,
                _ => RiskStatus::Safe,
            };
            assert_eq!(result.status, expected);
        }
    }

    #[test]
    fn produces_full_metric_set_and_narrative() {
        let result = LocalScorer::new().score("https://twitter.com/user/status/1");
        let metrics = result.feature_metrics.as_ref().unwrap();
        assert_eq!(metrics.len(), 9);
        assert_eq!(metrics[0].name, "URL Risk Score");
        assert!(metrics.iter().all(|m| m.score <= 100 && m.importance <= 10));
        assert!(result.details.is_some());
    }

    #[test]
    fn result_passes_schema_validation() {
        for url in ["https://x.com/a/status/1", "", "??", "https://t.co/q"] {
            let result = AnalysisResult::Categorical(LocalScorer::new().score(url));
            result.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn classify_never_fails() {
        let scorer = LocalScorer::new();
        assert!(scorer.classify("").await.is_ok());
        assert!(scorer.classify("garbage \u{0000} input").await.is_ok());
    }
}
