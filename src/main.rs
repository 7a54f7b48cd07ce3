use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use acubench::models::{CpuReport, RamReport, StorageReport};
use acubench::{BenchError, Engine, Environment, Result, RunConfig};
use serde::Serialize;
use tracing::{error, info};

const USAGE: &str = "usage: acubench [cpu|cpu-mt|ram|storage|all] \
                     [--json] [--dir PATH] [--config FILE] [--save-config]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suite {
    Cpu,
    CpuMultithread,
    Ram,
    Storage,
    All,
}

impl Suite {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "cpu" => Some(Suite::Cpu),
            "cpu-mt" => Some(Suite::CpuMultithread),
            "ram" => Some(Suite::Ram),
            "storage" => Some(Suite::Storage),
            "all" => Some(Suite::All),
            _ => None,
        }
    }

    fn includes(self, other: Suite) -> bool {
        self == Suite::All || self == other
    }
}

struct Args {
    suite: Suite,
    json: bool,
    save_config: bool,
    dir: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        suite: Suite::All,
        json: false,
        save_config: false,
        dir: None,
        config: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--save-config" => args.save_config = true,
            "--dir" => args.dir = Some(flag_value(&mut iter, "--dir")?),
            "--config" => args.config = Some(flag_value(&mut iter, "--config")?),
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            name => {
                args.suite = Suite::parse(name)
                    .ok_or_else(|| BenchError::InvalidArgument(format!("{}\n{}", name, USAGE)))?;
            }
        }
    }

    Ok(args)
}

fn flag_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<PathBuf> {
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| BenchError::InvalidArgument(format!("{} needs a path\n{}", flag, USAGE)))
}

#[derive(Debug, Default, Serialize)]
struct RunOutput {
    environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpu: Option<CpuReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpu_multithread: Option<CpuReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ram: Option<RamReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StorageReport>,
}

/// Run a blocking suite call off the async runtime with a spinner on stderr
async fn run_suite<T, F>(label: &'static str, engine: &Arc<Engine>, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Engine) -> Result<T> + Send + 'static,
{
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(label);
    pb.enable_steady_tick(Duration::from_millis(120));

    let engine = Arc::clone(engine);
    let result = tokio::task::spawn_blocking(move || call(&engine))
        .await
        .unwrap_or(Err(BenchError::WorkerPanicked));

    pb.finish_and_clear();
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => RunConfig::load_from(path)?,
        None => RunConfig::load()?,
    };
    if let Some(dir) = args.dir {
        config.storage = config.storage.with_dir(dir);
    }
    if args.save_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        info!("configuration saved");
    }

    let engine = Arc::new(Engine::detect(&config.storage.dir).with_options(config.options));
    info!(suite = ?args.suite, "starting benchmark");

    let mut output = RunOutput {
        environment: Some(engine.environment().clone()),
        ..Default::default()
    };
    let mut first_error = None;
    let mut record = |suite: &str, err: BenchError| {
        error!(suite, error = %err, "suite failed");
        first_error.get_or_insert(err);
    };

    if args.suite.includes(Suite::Cpu) {
        let cpu = config.cpu;
        match run_suite("cpu", &engine, move |e| e.cpu(&cpu)).await {
            Ok(report) => output.cpu = Some(report),
            Err(err) => record("cpu", err),
        }
    }

    if args.suite.includes(Suite::CpuMultithread) {
        let cpu = config.cpu;
        let call = move |e: &Engine| e.cpu_multithread(&cpu);
        match run_suite("cpu (multithread)", &engine, call).await {
            Ok(report) => output.cpu_multithread = Some(report),
            Err(err) => record("cpu_multithread", err),
        }
    }

    if args.suite.includes(Suite::Ram) {
        let ram = config.ram;
        match run_suite("ram", &engine, move |e| e.ram(&ram)).await {
            Ok(report) => output.ram = Some(report),
            Err(err) => record("ram", err),
        }
    }

    if args.suite.includes(Suite::Storage) {
        let storage = config.storage.clone();
        match run_suite("storage", &engine, move |e| e.storage(&storage)).await {
            Ok(report) => output.storage = Some(report),
            Err(err) => record("storage", err),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if let Some(report) = &output.cpu {
            println!("{}\n", report);
        }
        if let Some(report) = &output.cpu_multithread {
            println!("[multithread] {}\n", report);
        }
        if let Some(report) = &output.ram {
            println!("{}\n", report);
        }
        if let Some(report) = &output.storage {
            println!("{}\n", report);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
