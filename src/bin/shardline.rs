use anyhow::{Context, Result};
use clap::Parser;
use shardline::probe::validate_plan;
use shardline::{Coordinator, LineTerminator, ReadConfig, ShortfallPolicy, TextEncoding};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Read a line-delimited file in parallel and report line counts.
#[derive(Parser, Debug)]
#[command(name = "shardline", version, about)]
struct Args {
    /// File to read.
    file: PathBuf,

    /// Number of partitions read concurrently.
    #[arg(short = 'n', long)]
    concurrency: Option<usize>,

    /// Bytes per read chunk.
    #[arg(short = 'b', long)]
    buffer_size: Option<usize>,

    /// Lines end with `\n` instead of `\r\n`.
    #[arg(long)]
    lf: bool,

    /// Replace invalid UTF-8 instead of failing.
    #[arg(long)]
    lossy: bool,

    /// Return fewer partitions instead of failing when terminators run out.
    #[arg(long)]
    degrade: bool,

    /// JSON config file; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the read statistics as JSON.
    #[arg(long)]
    json: bool,

    /// Probe every partition boundary before reading.
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn read_config(&self) -> Result<ReadConfig> {
        let mut cfg = match &self.config {
            Some(path) => ReadConfig::from_json_file(path)?,
            None => ReadConfig::default(),
        };
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(b) = self.buffer_size {
            cfg.buffer_size = b;
        }
        if self.lf {
            cfg.terminator = LineTerminator::Lf;
        }
        if self.lossy {
            cfg.encoding = TextEncoding::Utf8Lossy;
        }
        if self.degrade {
            cfg.shortfall = ShortfallPolicy::Degrade;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = args.read_config()?;
    let coordinator = Coordinator::new(cfg);

    let plan = coordinator
        .plan(&args.file)
        .with_context(|| format!("plan {}", args.file.display()))?;
    for p in &plan {
        match p.end {
            Some(end) => println!("Reading: {} - {end}", p.start),
            None => println!("Reading: {} - EOF", p.start),
        }
    }

    if args.validate {
        for check in validate_plan(&args.file, &plan, &coordinator.config)? {
            println!("Boundary {} @ {}: {}", check.index, check.offset, check.state);
        }
    }

    let outcome = coordinator
        .read(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;

    println!("Results: {}", outcome.stats.total_lines);
    println!("Empty Rows: {}", outcome.stats.blank_lines);
    if args.json {
        println!("{}", outcome.stats.to_json()?);
    }
    Ok(())
}
