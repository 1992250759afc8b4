// Query Analyzer - parse, extract, advise, predict
//
// Sequences the components and assembles one report per query. Only empty
// input and parse failures are returned as errors.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::extractor::FeatureExtractor;
use crate::features::QueryFeatures;
use crate::index_advisor::{IndexAdvisor, IndexDefinition, IndexSuggestion, NO_INDEX_PLACEHOLDER};
use crate::parser::{SqlDialect, SqlParser, SqlparserBackend};
use crate::predictor::{HeuristicPredictor, PredictionSource, Predictor, RemotePredictor};
use crate::rewrite::RewriteAdvisor;

/// Complete analysis of one query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub query_features: QueryFeatures,
    /// First suggestion, or [`NO_INDEX_PLACEHOLDER`]
    pub suggested_index: String,
    pub suggested_indexes: Vec<String>,
    pub optimized_query: String,
    pub optimization_tips: Vec<String>,
    /// Rounded milliseconds
    pub predicted_time: i64,
    pub is_slow: bool,
    pub slow_probability: f64,
    pub confidence: String,
    pub prediction_source: PredictionSource,
    /// `CREATE INDEX` suggestions only, for migration scripts
    #[serde(skip)]
    pub index_definitions: Vec<IndexDefinition>,
}

pub struct QueryAnalyzer {
    parser: Box<dyn SqlParser>,
    predictor: Arc<dyn Predictor>,
}

impl QueryAnalyzer {
    pub fn new(parser: impl SqlParser + 'static, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            parser: Box::new(parser),
            predictor,
        }
    }

    /// Heuristic predictions only
    pub fn offline(dialect: SqlDialect) -> Self {
        Self::new(
            SqlparserBackend::new(dialect),
            Arc::new(HeuristicPredictor::new()),
        )
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        config.validate()?;
        let predictor: Arc<dyn Predictor> = match &config.predictor_url {
            Some(url) => Arc::new(RemotePredictor::new(url, config.predictor_timeout())?),
            None => Arc::new(HeuristicPredictor::new()),
        };
        Ok(Self::new(SqlparserBackend::new(config.dialect), predictor))
    }

    pub async fn analyze(&self, sql: &str) -> Result<AnalysisReport> {
        if sql.trim().is_empty() {
            return Err(AdvisorError::EmptyQuery);
        }

        let statement = self.parser.parse(sql)?;
        let features = FeatureExtractor::extract(&statement);
        debug!(?features, "extracted query features");

        let suggestions = IndexAdvisor::suggest(&features);
        let suggested_indexes: Vec<String> =
            suggestions.iter().map(IndexSuggestion::to_string).collect();
        let index_definitions: Vec<IndexDefinition> = suggestions
            .iter()
            .filter_map(IndexSuggestion::as_index)
            .cloned()
            .collect();

        let rewrite = RewriteAdvisor::rewrite(sql, &features);
        debug!(tips = rewrite.tips.len(), "rewrite computed");

        let prediction = self
            .predictor
            .predict(&features, sql.chars().count())
            .await;

        Ok(AnalysisReport {
            suggested_index: suggested_indexes
                .first()
                .cloned()
                .unwrap_or_else(|| NO_INDEX_PLACEHOLDER.to_string()),
            suggested_indexes,
            optimized_query: rewrite.optimized_query,
            optimization_tips: rewrite.tips,
            predicted_time: prediction.predicted_time_ms.round() as i64,
            is_slow: prediction.is_slow,
            slow_probability: prediction.slow_probability,
            confidence: prediction.confidence,
            prediction_source: prediction.source,
            index_definitions,
            query_features: features,
        })
    }
}
