use std::collections::HashSet;
use std::fs;
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use calcview::config::AppConfig;
use calcview::{CalcViewError, Document, LayoutEngine};

/// Auto-layout a calculation view and write the positions back into it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input calculation view
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Only lay out these node ids, keeping them centered where they were
    #[arg(short, long = "select", value_name = "ID")]
    select: Vec<String>,

    /// Keep the current positions and only rewrite the layout block
    #[arg(long)]
    keep_positions: bool,

    /// Print the graph as JSON instead of the document
    #[arg(long)]
    graph: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    if let Err(err) = run(&args) {
        error!("{err}");
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CalcViewError> {
    info!(input_path = args.input; "Processing calculation view");

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let source = fs::read_to_string(&args.input)?;
    let mut document = Document::load(source)?;

    if !args.keep_positions {
        let engine = LayoutEngine::from_config(&config.layout);
        let focus: HashSet<String> = args.select.iter().cloned().collect();
        document.auto_layout(&engine, Some(&focus));
    }

    let output = if args.graph {
        document.graph().to_json()?
    } else {
        document.save()?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            info!(output_path = path.as_str(); "Written");
        }
        None => print!("{output}"),
    }

    Ok(())
}
