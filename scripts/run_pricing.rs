// scripts/run_pricing.rs
use clap::Parser;
use mc_sde_pricer::config::SimulationConfig;
use mc_sde_pricer::mc::{MonteCarloEngine, PricingSummary};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prices every instrument of a TOML simulation config
#[derive(Parser, Debug)]
#[command(name = "run_pricing")]
#[command(version, about, long_about = None)]
struct Args {
    /// Simulation config (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Worker threads; overrides the config. 0 uses every available CPU
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Write the results table to a CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

struct Row {
    name: String,
    summary: PricingSummary,
}

fn collect_rows(engine: &MonteCarloEngine) -> Vec<Row> {
    engine
        .subscribers()
        .filter_map(|(_, pricer)| {
            pricer.summary().map(|s| Row {
                name: pricer.describe(),
                summary: *s,
            })
        })
        .collect()
}

/// Quotes a CSV field when it holds a separator, quote or line break.
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn write_results_to_csv(rows: &[Row], config: &SimulationConfig, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    let m = &config.market;
    writeln!(
        file,
        "# rate={} volatility={} carry={} spot={} expiry={}",
        m.rate, m.volatility, m.carry, m.spot, m.expiry
    )?;
    writeln!(file, "# steps={} paths={} seed={}", config.steps, config.paths, config.seed)?;
    writeln!(file, "Instrument,Price,Std_Dev,Std_Error,CI95_Low,CI95_High,Paths")?;
    for row in rows {
        let (lo, hi) = row.summary.confidence_95();
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            csv_field(&row.name),
            row.summary.price,
            row.summary.std_dev,
            row.summary.std_error,
            lo,
            hi,
            row.summary.paths
        )?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut config = SimulationConfig::from_file(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    let workers = config.worker_count();

    tracing::info!(
        config = %args.config.display(),
        instruments = config.instruments.len(),
        "configuration loaded"
    );

    let mut engine = config.build_engine()?;
    let start = Instant::now();
    match workers {
        Some(n) => engine.run_parallel(n)?,
        None => engine.run()?,
    }
    let elapsed = start.elapsed();

    let rows = collect_rows(&engine);

    println!("\n{:=<80}", "");
    println!(
        "{} / {} / {}  ({} paths, {} steps, {:.2} ms)",
        engine.scheme().process().name(),
        engine.scheme().name(),
        engine.source().kind().name(),
        engine.paths(),
        engine.scheme().steps(),
        elapsed.as_secs_f64() * 1000.0
    );
    println!("{:=<80}", "");
    println!(
        "{:<30} {:>10} {:>10} {:>10} {:>16}",
        "Instrument", "Price", "Std Dev", "Std Err", "95% CI"
    );
    println!("{:-<80}", "");
    for row in &rows {
        let (lo, hi) = row.summary.confidence_95();
        println!(
            "{:<30} {:>10.4} {:>10.4} {:>10.4} {:>16}",
            row.name,
            row.summary.price,
            row.summary.std_dev,
            row.summary.std_error,
            format!("[{:.3}, {:.3}]", lo, hi)
        );
    }
    println!("{:=<80}", "");

    if let Some(path) = &args.csv {
        write_results_to_csv(&rows, &config, path)?;
        tracing::info!(path = %path.display(), "results written");
    }

    Ok(())
}
