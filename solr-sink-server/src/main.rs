use clap::Parser;
use serde::Deserialize;
use solr_sink::{
    AdminTransport, DispatchError, DispatchTransport, InMemoryCluster, Record, SinkConfig,
    SinkError, SinkTask,
};
use solr_sink_http::{BufferedDispatcher, DispatchMode, SolrClient, SolrConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Parser)]
#[command(name = "solr-sink", version, about = "Stream NDJSON change records into Solr")]
struct Cli {
    /// JSON config file (task, collection policy, topic remapping, solr connection)
    #[arg(long, env = "SOLR_SINK_CONFIG")]
    config: Option<PathBuf>,

    /// Solr base URL, e.g. http://localhost:8983/solr
    #[arg(long, env = "SOLR_SINK_SOLR_URL")]
    solr_url: Option<String>,

    /// Newline-delimited JSON records; "-" reads stdin
    #[arg(long, env = "SOLR_SINK_INPUT", default_value = "-")]
    input: String,

    /// Records per batch
    #[arg(long, env = "SOLR_SINK_BATCH_SIZE", default_value_t = 500)]
    batch_size: usize,

    /// Redeliveries of a batch after a retriable failure
    #[arg(long, env = "SOLR_SINK_MAX_RETRIES", default_value_t = 5)]
    max_retries: u32,

    /// Initial backoff between redeliveries, doubled each attempt
    #[arg(long, env = "SOLR_SINK_RETRY_BACKOFF_MS", default_value_t = 1000)]
    retry_backoff_ms: u64,

    /// Queue updates per collection and send them as one command stream
    #[arg(long)]
    buffered: bool,

    /// Apply records to an in-process cluster and print collection sizes
    #[arg(long)]
    dry_run: bool,
}

/// The `solr` section of the config file. Other sections belong to [`SinkConfig`].
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    solr: SolrConfig,
}

struct RetryPolicy {
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(MAX_BACKOFF_MS),
        )
    }
}

#[derive(Debug, Default)]
struct RunStats {
    records: usize,
    batches: usize,
    redeliveries: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.batch_size == 0 {
        return Err("--batch-size must be at least 1".into());
    }

    let sink_config = SinkConfig::load(cli.config.as_deref())?;
    let solr_config = resolve_solr_config(&cli)?;
    let retry = RetryPolicy {
        max_retries: cli.max_retries,
        initial_backoff_ms: cli.retry_backoff_ms,
    };
    let reader = open_input(&cli.input).await?;

    if cli.dry_run {
        let cluster = InMemoryCluster::new();
        let task = SinkTask::new(sink_config, cluster.clone(), cluster.clone());
        let stats = pump(task, reader, cli.batch_size, &retry).await?;
        report(&stats);
        for (name, docs) in cluster.snapshot() {
            println!("{}\t{}", name, docs.len());
        }
        return Ok(());
    }

    let client = SolrClient::new(solr_config)?;
    tracing::info!(
        "Sending to {} ({:?} dispatch)",
        client.config().url,
        client.config().mode
    );
    let stats = match client.config().mode {
        DispatchMode::Direct => {
            let task = SinkTask::new(sink_config, client.clone(), client);
            pump(task, reader, cli.batch_size, &retry).await?
        }
        DispatchMode::Buffered => {
            let task = SinkTask::new(sink_config, client.clone(), BufferedDispatcher::new(client));
            pump(task, reader, cli.batch_size, &retry).await?
        }
    };
    report(&stats);
    Ok(())
}

fn resolve_solr_config(cli: &Cli) -> Result<SolrConfig, SinkError> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                SinkError::Config(format!("failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str::<FileConfig>(&content)
                .map_err(|e| SinkError::Config(format!("invalid solr section: {}", e)))?
                .solr
        }
        None => SolrConfig::default(),
    };
    if let Some(url) = &cli.solr_url {
        config.url = url.clone();
    }
    if cli.buffered {
        config.mode = DispatchMode::Buffered;
    }
    config.validate()?;
    Ok(config)
}

async fn open_input(
    input: &str,
) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, Box<dyn std::error::Error>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .map_err(|e| format!("failed to open {}: {}", input, e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Poll records from `reader`, push them in batches, and redeliver a batch
/// after retriable failures. Returns once the input is exhausted.
async fn pump<A, D>(
    mut task: SinkTask<A, D>,
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    batch_size: usize,
    retry: &RetryPolicy,
) -> Result<RunStats, Box<dyn std::error::Error>>
where
    A: AdminTransport,
    D: DispatchTransport,
{
    let mut stats = RunStats::default();
    let mut batch: Vec<Record> = Vec::with_capacity(batch_size);
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)
            .map_err(|e| SinkError::InvalidRecord(format!("line {}: {}", line_no, e)))?;
        batch.push(record);

        if batch.len() >= batch_size {
            deliver(&mut task, &batch, retry, &mut stats).await?;
            batch.clear();
            task.flush();
        }
    }
    if !batch.is_empty() {
        deliver(&mut task, &batch, retry, &mut stats).await?;
        task.flush();
    }

    task.stop();
    Ok(stats)
}

async fn deliver<A, D>(
    task: &mut SinkTask<A, D>,
    batch: &[Record],
    retry: &RetryPolicy,
    stats: &mut RunStats,
) -> Result<(), DispatchError>
where
    A: AdminTransport,
    D: DispatchTransport,
{
    let mut attempt = 0;
    loop {
        match task.process_batch(batch).await {
            Ok(()) => {
                stats.records += batch.len();
                stats.batches += 1;
                return Ok(());
            }
            Err(e) if e.is_retriable() && attempt < retry.max_retries => {
                let wait = retry.backoff(attempt);
                attempt += 1;
                stats.redeliveries += 1;
                tracing::warn!(
                    "Batch of {} record(s) failed, redelivering in {}ms (attempt {}/{}): {}",
                    batch.len(),
                    wait.as_millis(),
                    attempt,
                    retry.max_retries,
                    e
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn report(stats: &RunStats) {
    tracing::info!(
        "Done: {} record(s) in {} batch(es), {} redelivery(ies)",
        stats.records,
        stats.batches,
        stats.redeliveries
    );
}
