use anyhow::{Context, Result};
use birth_chance::{Client, Config, pipeline};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "birth-chance",
    version,
    about = "Estimate the yearly chance of being born in Canada from World Bank indicators"
)]
struct Cli {
    /// TOML file with [api], [output] and [charts] sections; missing keys use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for the charts and the database (default: current directory).
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Records requested per indicator; must cover the whole series.
    #[arg(long)]
    per_page: Option<u32>,
    /// Indicators API root (default https://api.worldbank.org/v2).
    #[arg(long)]
    base_url: Option<String>,
    /// Also save the yearly summary (format from extension: .csv or .json).
    #[arg(long)]
    export: Option<PathBuf>,
    /// Log debug details.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Log warnings and errors only.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(dir) = &self.out_dir {
            cfg.output.dir = dir.clone();
        }
        if let Some(n) = self.per_page {
            cfg.api.per_page = n;
        }
        if let Some(url) = &self.base_url {
            cfg.api.base_url = url.clone();
        }
        if let Some(path) = &self.export {
            cfg.output.export = Some(path.clone());
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<bool> {
    let cfg = cli.load_config()?;
    let client = Client::new(&cfg.api.base_url, cfg.api.per_page, cfg.api.timeout_secs)?;
    let report = pipeline::run(&cfg, &client)?;
    info!(
        "{} years summarised, {} files written, {} stage(s) failed",
        report.yearly.len(),
        report.written.len(),
        report.failures.len()
    );
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
