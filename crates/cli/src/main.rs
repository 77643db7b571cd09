use clap::Parser;
use color_eyre::eyre::Result;
use fanpipe::{PipelineConfig, RunReport, Supervisor};
use prettytable::{Cell, Row};
use std::time::Duration;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Runs a deadline-bound fan-out/fan-in pipeline and verifies that every generated number comes out the other end"
)]
pub struct App {
    /// Number of workers (and of per-worker output channels)
    #[clap(long, env = "FANPIPE_WORKERS", default_value_t = fanpipe::config::DEFAULT_WORKERS)]
    workers: usize,

    /// How long the generator keeps producing, in milliseconds
    #[clap(long, env = "FANPIPE_DEADLINE_MS", default_value_t = 1000)]
    deadline_ms: u64,

    /// Simulated processing delay per item, in milliseconds
    #[clap(long, env = "FANPIPE_DELAY_MS", default_value_t = 1)]
    delay_ms: u64,

    /// Capacity of the shared input channel
    #[clap(long, env = "FANPIPE_INPUT_BUFFER", default_value_t = 1)]
    input_buffer: usize,

    /// Capacity of each worker's output channel
    #[clap(long, env = "FANPIPE_BRANCH_BUFFER", default_value_t = 1)]
    branch_buffer: usize,

    /// Capacity of the merged output channel [default: number of workers]
    #[clap(long, env = "FANPIPE_MERGED_BUFFER")]
    merged_buffer: Option<usize>,

    /// Log channel depths at this interval, in milliseconds
    #[clap(long, env = "FANPIPE_MONITOR_MS")]
    monitor_ms: Option<u64>,

    /// Print the report as JSON
    #[clap(long, default_value = "false")]
    json: bool,

    /// Whether to display additional information.
    #[clap(long, env = "FANPIPE_VERBOSE", default_value = "false")]
    verbose: bool,
}

impl App {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            self.workers,
            Duration::from_millis(self.deadline_ms),
            Duration::from_millis(self.delay_ms),
        )
        .with_input_buffer(self.input_buffer)
        .with_branch_buffer(self.branch_buffer);

        if let Some(capacity) = self.merged_buffer {
            config = config.with_merged_buffer(capacity);
        }
        if let Some(ms) = self.monitor_ms {
            config = config.with_monitor_interval(Duration::from_millis(ms));
        }
        config
    }
}

fn branch_table(report: &RunReport) -> prettytable::Table {
    let mut table = prettytable::Table::new();
    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();
    table.set_format(format);

    table.set_titles(Row::new(vec![
        Cell::new("Worker"),
        Cell::new("Relayed"),
        Cell::new("Collected"),
    ]));
    for (branch, amount) in report.totals.amounts.iter().enumerate() {
        let relayed = report.relayed.get(branch).copied().unwrap_or_default();
        table.add_row(Row::new(vec![
            Cell::new(&branch.to_string()),
            Cell::new(&relayed.to_string()),
            Cell::new(&amount.to_string()),
        ]));
    }
    table
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", report);
    println!();
    branch_table(report).printstd();
    println!("Elapsed: {} ms", report.elapsed().num_milliseconds());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();

    tracing_subscriber::fmt()
        .with_max_level(if app.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut supervisor = Supervisor::new(app.config())?;
    let report = supervisor.run().await?;

    print_report(&report, app.json)?;

    report.ensure_ok()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_defaults() {
        let app = App::try_parse_from(["fanpipe"]).unwrap();
        assert_eq!(app.config(), PipelineConfig::default());
        assert!(!app.json);
    }

    #[test]
    fn flags_map_onto_config() {
        let app = App::try_parse_from([
            "fanpipe",
            "--workers",
            "3",
            "--deadline-ms",
            "200",
            "--delay-ms",
            "0",
            "--merged-buffer",
            "12",
            "--monitor-ms",
            "50",
            "--json",
        ])
        .unwrap();

        let config = app.config();
        assert_eq!(config.workers, 3);
        assert_eq!(config.deadline, Duration::from_millis(200));
        assert_eq!(config.per_item_delay, Duration::ZERO);
        assert_eq!(config.merged_capacity(), 12);
        assert_eq!(config.monitor_interval, Some(Duration::from_millis(50)));
        assert!(app.json);
    }

    #[tokio::test]
    async fn table_has_a_row_per_worker() {
        let config = PipelineConfig::default()
            .with_workers(3)
            .with_deadline(Duration::from_millis(10));
        let report = Supervisor::new(config).unwrap().run().await.unwrap();

        let table = branch_table(&report);
        assert_eq!(table.len(), 3);
    }
}
