use futures::future::{self, BoxFuture, FutureExt};

use super::{PredictionResult, PredictionSource, Predictor};
use crate::features::QueryFeatures;

const BASE_MS: f64 = 10.0;
const PER_TABLE_MS: f64 = 20.0;
const PER_JOIN_MS: f64 = 80.0;
const PER_CONDITION_MS: f64 = 15.0;
const PER_SUBQUERY_MS: f64 = 200.0;
const WILDCARD_MS: f64 = 50.0;
const ORDER_BY_MS: f64 = 60.0;
const GROUP_BY_MS: f64 = 70.0;
const DISTINCT_MS: f64 = 40.0;
const NO_LIMIT_MS: f64 = 30.0;

/// Estimates above this many milliseconds are classified as slow
pub const SLOW_THRESHOLD_MS: f64 = 500.0;

/// Deterministic closed-form estimate used when no model is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor;

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, features: &QueryFeatures) -> PredictionResult {
        let mut time = BASE_MS
            + PER_TABLE_MS * features.table_count() as f64
            + PER_JOIN_MS * features.join_count as f64
            + PER_CONDITION_MS * features.condition_count as f64
            + PER_SUBQUERY_MS * features.subquery_count as f64;

        if features.has_wildcard {
            time += WILDCARD_MS;
        }
        if features.has_order_by {
            time += ORDER_BY_MS;
        }
        if features.has_group_by {
            time += GROUP_BY_MS;
        }
        if features.has_distinct {
            time += DISTINCT_MS;
        }
        if !features.has_limit {
            time += NO_LIMIT_MS;
        }

        PredictionResult {
            predicted_time_ms: time,
            is_slow: time > SLOW_THRESHOLD_MS,
            slow_probability: (time / 1000.0).min(1.0),
            confidence: "low".to_string(),
            source: PredictionSource::Heuristic,
        }
    }
}

impl Predictor for HeuristicPredictor {
    fn predict<'a>(
        &'a self,
        features: &'a QueryFeatures,
        _query_length: usize,
    ) -> BoxFuture<'a, PredictionResult> {
        future::ready(self.estimate(features)).boxed()
    }
}
