use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use tracing::{info, warn};

use super::{HeuristicPredictor, PredictionResult, PredictionSource, Predictor};
use crate::error::{AdvisorError, Result};
use crate::features::{FeatureVector, QueryFeatures};

const CONFIDENCE_LEVELS: [&str; 3] = ["low", "medium", "high"];

/// HTTP client for an external prediction service.
///
/// Request payload: the [`FeatureVector`] as JSON, POSTed to `<base_url>/predict`.
///
/// Response payload:
/// `{ "predicted_time_ms": 120.5, "is_slow": false, "slow_probability": 0.12,
///    "confidence": "high", "model_version": "optional" }`
///
/// One attempt per prediction, bounded by the client timeout. Any failure is
/// logged and answered by the heuristic fallback.
#[derive(Debug, Clone)]
pub struct RemotePredictor {
    endpoint: String,
    client: reqwest::Client,
    fallback: HeuristicPredictor,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predicted_time_ms: f64,
    is_slow: bool,
    slow_probability: f64,
    confidence: String,
    #[serde(default)]
    model_version: Option<String>,
}

impl RemotePredictor {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(AdvisorError::InvalidConfig(
                "prediction timeout must be > 0".to_string(),
            ));
        }
        let base_url = base_url.as_ref().trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AdvisorError::InvalidConfig(
                "prediction service URL must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisorError::InvalidConfig(format!("http client build failed: {e}")))?;

        Ok(Self {
            endpoint: format!("{base_url}/predict"),
            client,
            fallback: HeuristicPredictor::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single call to the prediction service, without fallback.
    pub async fn request(&self, vector: &FeatureVector) -> Result<PredictionResult> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(vector)
            .send()
            .await
            .map_err(|e| AdvisorError::PredictorUnavailable(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AdvisorError::PredictorUnavailable(format!(
                "status {}",
                resp.status()
            )));
        }

        let body: PredictResponse = resp
            .json()
            .await
            .map_err(|e| AdvisorError::PredictorUnavailable(format!("invalid response JSON: {e}")))?;
        validate_response(&body)?;

        info!(
            predicted_time_ms = body.predicted_time_ms,
            is_slow = body.is_slow,
            confidence = %body.confidence,
            model_version = body.model_version.as_deref().unwrap_or("unknown"),
            "model prediction"
        );

        Ok(PredictionResult {
            predicted_time_ms: body.predicted_time_ms,
            is_slow: body.is_slow,
            slow_probability: body.slow_probability,
            confidence: body.confidence,
            source: PredictionSource::Model,
        })
    }
}

impl Predictor for RemotePredictor {
    fn predict<'a>(
        &'a self,
        features: &'a QueryFeatures,
        query_length: usize,
    ) -> BoxFuture<'a, PredictionResult> {
        async move {
            let vector = features.to_vector(query_length);
            match self.request(&vector).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(endpoint = %self.endpoint, error = %e, "falling back to heuristic estimate");
                    self.fallback.estimate(features)
                }
            }
        }
        .boxed()
    }
}

fn validate_response(body: &PredictResponse) -> Result<()> {
    if !body.predicted_time_ms.is_finite() || body.predicted_time_ms < 0.0 {
        return Err(AdvisorError::PredictorUnavailable(format!(
            "predicted_time_ms out of range: {}",
            body.predicted_time_ms
        )));
    }
    if !(0.0..=1.0).contains(&body.slow_probability) {
        return Err(AdvisorError::PredictorUnavailable(format!(
            "slow_probability out of range: {}",
            body.slow_probability
        )));
    }
    if !CONFIDENCE_LEVELS.contains(&body.confidence.as_str()) {
        return Err(AdvisorError::PredictorUnavailable(format!(
            "unknown confidence '{}'",
            body.confidence
        )));
    }
    Ok(())
}
