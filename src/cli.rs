use crate::{
    stdin_is_piped, Config, FaviconError, OutputSink, ScanRunner, ScanSummary, SignatureDb,
    TargetProducer, TargetSource,
};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio::fs;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "favirecon")]
#[command(about = "Use favicon.ico to improve your target recon phase. Quickly detect technologies, WAF, exposed panels, known services.")]
#[command(version)]
pub struct Cli {
    #[arg(short = 'u', long = "url", help = "Input domain or URL")]
    pub url: Option<String>,

    #[arg(short = 'l', long = "list", help = "File containing input domains")]
    pub list: Option<PathBuf>,

    #[arg(long, help = "Treat inputs as CIDR ranges and scan every address")]
    pub cidr: bool,

    #[arg(long = "hash", value_delimiter = ',', allow_hyphen_values = true, help = "Filter results having these favicon hashes (comma separated)")]
    pub hash: Vec<String>,

    #[arg(short, long, help = "Concurrency level (default: 100)")]
    pub concurrency: Option<usize>,

    #[arg(short, long, help = "Connection timeout in seconds (default: 10)")]
    pub timeout: Option<u64>,

    #[arg(short, long = "rate-limit", help = "Max requests per second (default: unlimited)")]
    pub rate_limit: Option<u32>,

    #[arg(short, long, help = "HTTP proxy to use, e.g. http://127.0.0.1:8080")]
    pub proxy: Option<String>,

    #[arg(long, help = "Custom User-Agent (default: random browser UA)")]
    pub user_agent: Option<String>,

    #[arg(short, long, help = "File to write output results")]
    pub output: Option<PathBuf>,

    #[arg(short, long, help = "JSON output")]
    pub json: bool,

    #[arg(short, long, help = "Verbose output")]
    pub verbose: bool,

    #[arg(short, long, help = "Silent output. Print only results")]
    pub silent: bool,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,
}

const BANNER: &str = r#"    ____            _
   / __/___  __  __(_)_______  _________  ____
  / /_/ __ `/ | / / / ___/ _ \/ ___/ __ \/ __ \
 / __/ /_/ /| |/ / / /  /  __/ /__/ /_/ / / / /
/_/  \__,_/ |___/_/_/   \___/\___/\____/_/ /_/
"#;

/// Prints the banner to stderr at most once per value.
#[derive(Debug)]
pub struct Banner {
    shown: Once,
}

impl Banner {
    pub fn new() -> Self {
        Self { shown: Once::new() }
    }

    pub fn show(&self, silent: bool) {
        if silent {
            return;
        }
        self.shown.call_once(|| {
            eprintln!("{BANNER}                                    v{}\n", env!("CARGO_PKG_VERSION"));
        });
    }

    pub fn is_shown(&self) -> bool {
        self.shown.is_completed()
    }
}

impl Default for Banner {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the effective configuration: JSON file (if any), then flags.
pub async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path).await?,
        None => Config::default(),
    };

    apply_overrides(&mut config, args);
    config.validate()?;

    Ok(config)
}

async fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    Ok(config)
}

/// Flags given on the command line win over the configuration file.
pub fn apply_overrides(config: &mut Config, args: &Cli) {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = std::time::Duration::from_secs(timeout);
    }
    if let Some(rate_limit) = args.rate_limit {
        config.rate_limit = rate_limit;
    }
    if let Some(proxy) = &args.proxy {
        config.proxy = Some(proxy.clone());
    }
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = Some(user_agent.clone());
    }
    if let Some(output) = &args.output {
        config.output_file = Some(output.clone());
    }
    if !args.hash.is_empty() {
        config.hashes = args.hash.clone();
    }
    config.json |= args.json;
    config.verbose |= args.verbose;
    config.silent |= args.silent;
}

/// Input sources in the order they are read: stdin, list file, literal.
pub fn input_sources(args: &Cli, stdin_piped: bool) -> Result<Vec<TargetSource>, FaviconError> {
    let mut sources = Vec::new();

    if stdin_piped {
        sources.push(TargetSource::Stdin);
    }
    if let Some(list) = &args.list {
        sources.push(TargetSource::File(list.clone()));
    }
    if let Some(url) = &args.url {
        sources.push(TargetSource::Literal(url.clone()));
    }

    if sources.is_empty() {
        return Err(FaviconError::Configuration("no input specified".to_string()));
    }

    Ok(sources)
}

pub struct CliRunner {
    pub config: Config,
    runner: ScanRunner,
    producer: TargetProducer,
    banner: Banner,
}

impl CliRunner {
    pub fn new(config: Config, args: &Cli) -> anyhow::Result<Self> {
        let banner = Banner::new();
        banner.show(config.silent);

        let sources = input_sources(args, stdin_is_piped())?;
        let signatures = SignatureDb::embedded().context("error while loading the signature database")?;
        info!("Loaded {} favicon signatures", signatures.len());

        let runner = ScanRunner::new(config.clone(), signatures)?;

        Ok(Self {
            config,
            runner,
            producer: TargetProducer::new(sources, args.cidr),
            banner,
        })
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    pub async fn run(&self) -> anyhow::Result<ScanSummary> {
        let sink = OutputSink::new(self.config.json, self.config.output_file.as_deref())
            .await
            .context("cannot create output file")?;

        let summary = self.runner.run(self.producer.clone(), &sink).await?;
        Ok(summary)
    }
}

/// Log level for a run: off when silent, debug when verbose.
pub fn log_level(config: &Config) -> tracing_subscriber::filter::LevelFilter {
    if config.silent {
        tracing_subscriber::filter::LevelFilter::OFF
    } else if config.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    }
}

pub fn setup_logging(config: &Config) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(log_level(config))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}
