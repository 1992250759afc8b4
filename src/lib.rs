pub mod analyzer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod features;
pub mod index_advisor;
pub mod parser;
pub mod predictor;
pub mod rewrite;

pub use analyzer::{AnalysisReport, QueryAnalyzer};
pub use config::AdvisorConfig;
pub use error::{AdvisorError, Result};
pub use extractor::FeatureExtractor;
pub use features::{FeatureVector, QueryFeatures};
pub use index_advisor::{
    render_create_script, render_drop_script, IndexAdvisor, IndexDefinition, IndexSuggestion,
    NO_INDEX_PLACEHOLDER,
};
pub use parser::{statement_kind, SqlDialect, SqlParser, SqlparserBackend};
pub use predictor::{
    HeuristicPredictor, PredictionResult, PredictionSource, Predictor, RemotePredictor,
};
pub use rewrite::{RewriteAdvisor, RewriteResult};

/// Analyze a single query with heuristic predictions and the generic dialect.
///
/// # Example
///
/// ```ignore
/// let report = sql_advisor::analyze_offline("SELECT id FROM orders WHERE user_id = 1").await?;
/// assert_eq!(report.suggested_index, "CREATE INDEX idx_orders_user_id ON orders(user_id);");
/// ```
pub async fn analyze_offline(sql: &str) -> Result<AnalysisReport> {
    QueryAnalyzer::offline(SqlDialect::Generic).analyze(sql).await
}
