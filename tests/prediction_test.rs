// Remote prediction against a local stub service
//
// Every failure mode of the service must come back as the heuristic estimate.

mod support;

use std::time::Duration;

use sql_advisor::{
    AdvisorError, HeuristicPredictor, PredictionSource, Predictor, RemotePredictor,
};
use support::{features_of, short_timeout, unused_base_url, StubPredictor};

const SQL: &str = "SELECT * FROM orders o JOIN users u ON u.id = o.user_id WHERE o.status = 'open' ORDER BY o.created_at";

const MODEL_RESPONSE: &str = r#"{"predicted_time_ms": 123.6, "is_slow": false, "slow_probability": 0.18, "confidence": "high", "model_version": "gbr-2"}"#;

#[tokio::test]
async fn test_model_prediction_passes_through() {
    let stub = StubPredictor::respond(200, MODEL_RESPONSE).await;
    let predictor = RemotePredictor::new(stub.base_url(), Duration::from_secs(2)).unwrap();
    let features = features_of(SQL);

    let result = predictor.predict(&features, SQL.len()).await;

    assert_eq!(result.source, PredictionSource::Model);
    assert_eq!(result.predicted_time_ms, 123.6);
    assert!(!result.is_slow);
    assert_eq!(result.slow_probability, 0.18);
    assert_eq!(result.confidence, "high");
}

#[tokio::test]
async fn test_request_carries_feature_vector() {
    let stub = StubPredictor::respond(200, MODEL_RESPONSE).await;
    let predictor = RemotePredictor::new(stub.base_url(), Duration::from_secs(2)).unwrap();
    let features = features_of(SQL);

    predictor.predict(&features, SQL.len()).await;

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("POST /predict "));

    let body = requests[0].json();
    assert_eq!(body.as_object().unwrap().len(), 14);
    assert_eq!(body["num_tables"], 2);
    assert_eq!(body["num_joins"], 1);
    assert_eq!(body["num_conditions"], 2);
    assert_eq!(body["num_subqueries"], 0);
    assert_eq!(body["has_wildcard"], 1);
    assert_eq!(body["has_order_by"], 1);
    assert_eq!(body["has_group_by"], 0);
    assert_eq!(body["has_limit"], 0);
    assert_eq!(body["num_where_columns"], 1);
    assert_eq!(body["num_order_columns"], 1);
    assert_eq!(body["num_group_columns"], 0);
    assert_eq!(body["query_length"], SQL.len());
}

#[tokio::test]
async fn test_request_errors_are_unavailable() {
    let stub = StubPredictor::respond(503, r#"{"detail": "model loading"}"#).await;
    let predictor = RemotePredictor::new(stub.base_url(), Duration::from_secs(2)).unwrap();
    let vector = features_of(SQL).to_vector(SQL.len());

    let err = predictor.request(&vector).await.unwrap_err();
    assert!(matches!(err, AdvisorError::PredictorUnavailable(_)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_bad_responses_fall_back_to_heuristic() {
    let bodies = [
        (500, MODEL_RESPONSE),
        (404, "not found"),
        (200, "not json"),
        (200, r#"{"predicted_time_ms": 10.0, "is_slow": false, "confidence": "high"}"#),
        (200, r#"{"predicted_time_ms": "ten", "is_slow": false, "slow_probability": 0.1, "confidence": "high"}"#),
        (200, r#"{"predicted_time_ms": 10.0, "is_slow": false, "slow_probability": 1.7, "confidence": "high"}"#),
        (200, r#"{"predicted_time_ms": -4.0, "is_slow": false, "slow_probability": 0.1, "confidence": "high"}"#),
        (200, r#"{"predicted_time_ms": 10.0, "is_slow": false, "slow_probability": 0.1, "confidence": "certain"}"#),
    ];
    let features = features_of(SQL);
    let expected = HeuristicPredictor::new().estimate(&features);

    for (status, body) in bodies {
        let stub = StubPredictor::respond(status, body).await;
        let predictor = RemotePredictor::new(stub.base_url(), Duration::from_secs(2)).unwrap();

        let result = predictor.predict(&features, SQL.len()).await;
        assert_eq!(result, expected, "status {} body {}", status, body);
    }
}

#[tokio::test]
async fn test_connection_refused_falls_back() {
    let predictor = RemotePredictor::new(unused_base_url().await, short_timeout()).unwrap();
    let features = features_of(SQL);

    let result = predictor.predict(&features, SQL.len()).await;
    assert_eq!(result.source, PredictionSource::Heuristic);
    assert_eq!(result.confidence, "low");
}

#[tokio::test]
async fn test_timeout_falls_back() {
    let stub = StubPredictor::silent().await;
    let predictor = RemotePredictor::new(stub.base_url(), short_timeout()).unwrap();
    let features = features_of(SQL);

    let started = std::time::Instant::now();
    let result = predictor.predict(&features, SQL.len()).await;

    assert_eq!(result, HeuristicPredictor::new().estimate(&features));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_heuristic_is_deterministic() {
    let features = features_of(SQL);
    let predictor = HeuristicPredictor::new();

    let first = tokio_test::block_on(predictor.predict(&features, SQL.len()));
    let second = tokio_test::block_on(predictor.predict(&features, 1));

    assert_eq!(first, second);
    // 10 + 2*20 + 80 + 2*15 + 50 + 60 + 30
    assert_eq!(first.predicted_time_ms, 300.0);
    assert!(!first.is_slow);
    assert_eq!(first.slow_probability, 0.3);
}
