use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use sql_advisor::{
    render_create_script, render_drop_script, AdvisorConfig, AdvisorError, AnalysisReport,
    IndexDefinition, QueryAnalyzer, SqlDialect,
};
use tracing_subscriber::EnvFilter;
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: [&str; 3] = ["target", ".git", "node_modules"];

#[derive(Parser, Debug)]
#[command(name = "sql-analyzer")]
#[command(version)]
#[command(about = "Analyze SQL queries: features, index suggestions, rewrites and execution-time estimates")]
#[command(
    long_about = "Analyze SQL queries: features, index suggestions, rewrites and execution-time estimates.\n\n\
    The query is taken from the positional argument, --file, every *.sql file under --dir,\n\
    or standard input. Predictions come from the service at SQL_ADVISOR_PREDICTOR_URL\n\
    (default http://localhost:8000) and fall back to a local heuristic."
)]
struct Args {
    /// SQL text to analyze
    query: Option<String>,

    /// Read the query from a file
    #[arg(short = 'f', long = "file", conflicts_with_all = ["query", "dir"])]
    file: Option<PathBuf>,

    /// Analyze every *.sql file under a directory
    #[arg(short = 'd', long = "dir", conflicts_with = "query")]
    dir: Option<PathBuf>,

    /// Print the JSON report instead of the summary
    #[arg(short = 'j', long = "json", default_value = "false")]
    json: bool,

    /// Use the heuristic estimate only
    #[arg(long = "offline", default_value = "false")]
    offline: bool,

    /// Base URL of the prediction service
    #[arg(long = "predictor-url", value_name = "URL", conflicts_with = "offline")]
    predictor_url: Option<String>,

    /// Prediction service timeout
    #[arg(long = "timeout-ms", value_name = "MS")]
    timeout_ms: Option<u64>,

    /// SQL dialect used for parsing
    #[arg(long = "dialect", value_name = "generic|postgres|mysql|sqlite")]
    dialect: Option<String>,

    /// Write CREATE/DROP index scripts into this directory
    #[arg(long = "emit-ddl", value_name = "DIR")]
    emit_ddl: Option<PathBuf>,
}

/// One query to analyze and where it came from
#[derive(Debug, Clone)]
struct QueryInput {
    source: String,
    sql: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, AdvisorError> {
    let config = build_config(&args)?;
    let analyzer = QueryAnalyzer::from_config(&config)?;
    let inputs = collect_inputs(&args)?;

    if inputs.is_empty() {
        eprintln!("No .sql files found!");
        return Ok(ExitCode::from(1));
    }

    if !args.json {
        println!("🔍 SQL Query Analyzer");
        println!("===================\n");
        println!("Dialect: {}\n", config.dialect);
    }

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for input in &inputs {
        match analyzer.analyze(&input.sql).await {
            Ok(report) => {
                if !args.json {
                    print!("{}", render_report(&input.source, &report));
                }
                reports.push((input.source.clone(), report));
            }
            Err(e) if e.is_client_error() => {
                eprintln!("❌ {}: {}", input.source, e);
                failures += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if args.json {
        print_json(&reports)?;
    }

    if let Some(dir) = &args.emit_ddl {
        let indexes: Vec<IndexDefinition> = reports
            .iter()
            .flat_map(|(_, report)| report.index_definitions.iter().cloned())
            .collect();
        let (create_file, drop_file) = write_ddl(dir, &indexes, config.dialect)?;
        if !args.json {
            println!("   💾 Saved: {}", create_file.display());
            println!("   💾 Saved: {}", drop_file.display());
            println!();
        }
    }

    if failures > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Environment first, then command-line overrides
fn build_config(args: &Args) -> Result<AdvisorConfig, AdvisorError> {
    let mut config = AdvisorConfig::from_env()?;

    if let Some(url) = &args.predictor_url {
        config.predictor_url = Some(url.clone());
    }
    if let Some(ms) = args.timeout_ms {
        config.predictor_timeout_ms = ms;
    }
    if let Some(dialect) = &args.dialect {
        config.dialect = dialect.parse()?;
    }
    if args.offline {
        config = config.offline();
    }

    config.validate()?;
    Ok(config)
}

fn collect_inputs(args: &Args) -> Result<Vec<QueryInput>, AdvisorError> {
    if let Some(sql) = &args.query {
        return Ok(vec![QueryInput {
            source: "<argument>".to_string(),
            sql: sql.clone(),
        }]);
    }

    if let Some(path) = &args.file {
        return Ok(vec![read_input(path)?]);
    }

    if let Some(dir) = &args.dir {
        return collect_sql_files(dir)?
            .iter()
            .map(|path| read_input(path))
            .collect();
    }

    let mut sql = String::new();
    std::io::stdin().read_to_string(&mut sql)?;
    Ok(vec![QueryInput {
        source: "<stdin>".to_string(),
        sql,
    }])
}

fn read_input(path: &Path) -> Result<QueryInput, AdvisorError> {
    Ok(QueryInput {
        source: path.display().to_string(),
        sql: fs::read_to_string(path)?,
    })
}

/// `*.sql` files under `dir`, sorted, skipping build and VCS directories
fn collect_sql_files(dir: &Path) -> Result<Vec<PathBuf>, AdvisorError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().map_or(false, |e| e == "sql") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| SKIPPED_DIRS.contains(&name))
}

fn print_json(reports: &[(String, AnalysisReport)]) -> Result<(), AdvisorError> {
    let rendered = match reports {
        [(_, report)] => serde_json::to_string_pretty(report),
        many => {
            let entries: Vec<serde_json::Value> = many
                .iter()
                .map(|(source, report)| serde_json::json!({ "source": source, "report": report }))
                .collect();
            serde_json::to_string_pretty(&entries)
        }
    }
    .map_err(std::io::Error::from)?;

    println!("{}", rendered);
    Ok(())
}

fn write_ddl(
    dir: &Path,
    indexes: &[IndexDefinition],
    dialect: SqlDialect,
) -> Result<(PathBuf, PathBuf), AdvisorError> {
    fs::create_dir_all(dir)?;

    let create_file = dir.join(format!("indexes_{}.sql", dialect));
    fs::write(&create_file, render_create_script(indexes, dialect))?;

    let drop_file = dir.join(format!("drop_indexes_{}.sql", dialect));
    fs::write(&drop_file, render_drop_script(indexes, dialect))?;

    Ok((create_file, drop_file))
}

fn render_report(source: &str, report: &AnalysisReport) -> String {
    let features = &report.query_features;
    let mut out = String::new();

    out.push_str(&format!("📄 Query: {}\n", source));
    out.push_str(&format!("   Type: {}\n", features.query_type));
    out.push_str("\n📊 Features\n");
    if !features.tables.is_empty() {
        out.push_str(&format!("   Tables: {}\n", features.tables.join(", ")));
    }
    out.push_str(&format!(
        "   Joins: {} | Conditions: {} | Subqueries: {}\n",
        features.join_count, features.condition_count, features.subquery_count
    ));

    let flags: Vec<&str> = [
        (features.has_wildcard, "SELECT *"),
        (features.has_distinct, "DISTINCT"),
        (features.has_group_by, "GROUP BY"),
        (features.has_having, "HAVING"),
        (features.has_order_by, "ORDER BY"),
        (features.has_limit, "LIMIT"),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| *name)
    .collect();
    if !flags.is_empty() {
        out.push_str(&format!("   Clauses: {}\n", flags.join(", ")));
    }
    if !features.where_columns.is_empty() {
        out.push_str(&format!("   WHERE columns: {}\n", features.where_columns.join(", ")));
    }

    out.push_str(&format!("\n✨ Recommended: {}\n", report.suggested_index));
    if report.suggested_indexes.len() > 1 {
        out.push_str("   Alternatives:\n");
        for suggestion in &report.suggested_indexes[1..] {
            out.push_str(&format!("   - {}\n", suggestion));
        }
    }

    out.push_str(&format!("\n🛠  Optimized: {}\n", report.optimized_query));
    if !report.optimization_tips.is_empty() {
        out.push_str("💡 Tips:\n");
        for tip in &report.optimization_tips {
            out.push_str(&format!("   - {}\n", tip));
        }
    }

    out.push_str(&format!(
        "\n⏱  Predicted: {} ms ({}, probability {:.2}, confidence {}, source {})\n\n",
        report.predicted_time,
        if report.is_slow { "🐢 slow" } else { "⚡ fast" },
        report.slow_probability,
        report.confidence,
        report.prediction_source
    ));
    out
}
