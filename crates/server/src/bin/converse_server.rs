use anyhow::Result;
use clap::{Parser, ValueEnum};
use converse_vector_store::{FinderConfig, Metric, DEFAULT_DIMENSION};
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    /// Cosine similarity; scores in [-1, 1], higher is closer.
    Cosine,
    /// Euclidean distance; scores are negated distance.
    L2,
}

impl From<MetricArg> for Metric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Cosine => Metric::Cosine,
            MetricArg::L2 => Metric::L2,
        }
    }
}

/// Conversation core server: topic namespace, turn ordering, related-turn
/// search.
#[derive(Debug, Parser)]
#[command(name = "converse-server", version)]
struct Args {
    /// Address to bind, e.g. 127.0.0.1:8420.
    #[arg(long, default_value = "127.0.0.1:8420")]
    bind: String,

    /// Embedding dimension. Must match the model producing the vectors.
    #[arg(long, default_value_t = DEFAULT_DIMENSION)]
    dimension: usize,

    /// Distance metric matching the stored embeddings.
    #[arg(long, value_enum, default_value = "cosine")]
    metric: MetricArg,

    /// Drop related-turn candidates at or beyond this distance.
    #[arg(long, default_value_t = 0.95)]
    distance_ceiling: f32,

    /// Disable the distance ceiling entirely.
    #[arg(long)]
    no_distance_ceiling: bool,

    /// Per-request store deadline in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let bind = std::env::var("CONVERSE_BIND").unwrap_or(args.bind);
    let finder_config = FinderConfig {
        metric: args.metric.into(),
        dimension: args.dimension,
        distance_ceiling: (!args.no_distance_ceiling).then_some(args.distance_ceiling),
    };

    converse_server::serve(
        &bind,
        finder_config,
        Duration::from_millis(args.request_timeout_ms),
    )
    .await
}
