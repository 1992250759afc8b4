//! Execution-time prediction.
//!
//! A [`Predictor`] never fails: the remote implementation converts every
//! service failure into the local [`HeuristicPredictor`] estimate, so callers
//! always receive a complete [`PredictionResult`].

pub mod heuristic;
pub mod remote;

pub use heuristic::HeuristicPredictor;
pub use remote::RemotePredictor;

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::features::QueryFeatures;

/// Which strategy produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Model,
    Heuristic,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated execution time with a slow/fast classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Milliseconds, never negative
    pub predicted_time_ms: f64,
    pub is_slow: bool,
    /// In `[0, 1]`
    pub slow_probability: f64,
    /// `low`, `medium` or `high`
    pub confidence: String,
    pub source: PredictionSource,
}

/// Strategy producing a [`PredictionResult`] from query features.
///
/// `query_length` is the character count of the raw query text. Dropping the
/// returned future abandons any outbound work.
pub trait Predictor: Send + Sync {
    fn predict<'a>(
        &'a self,
        features: &'a QueryFeatures,
        query_length: usize,
    ) -> BoxFuture<'a, PredictionResult>;
}
