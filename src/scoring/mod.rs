//! Risk-scoring strategies.
//!
//! Two interchangeable implementations sit behind [`Classify`]: the
//! deterministic [`local::LocalScorer`] for offline/demo use, and the remote
//! classifier via [`AnalysisClient`], which performs no local computation and
//! surfaces the client's result or error unchanged.

pub mod local;

use std::future::Future;

use crate::client::AnalysisClient;
use crate::errors::AnalysisError;
use crate::schema::AnalysisResult;

/// A risk classifier: one URL in, one verdict with evidence out.
///
/// `classify` never fails for malformed-but-parseable input; only transport
/// and contract errors surface (and only from the remote strategy).
pub trait Classify {
    fn classify(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<AnalysisResult, AnalysisError>> + Send;
}

/// Remote strategy: pure delegation to the classifier service.
impl Classify for AnalysisClient {
    async fn classify(&self, url: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze(url).await
    }
}
