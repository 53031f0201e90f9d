mod cli;
mod download;
mod error;
mod list;

use crate::cli::Args;
use crate::download::Outcome;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use mongodl_cache::transport::HttpTransport;
use mongodl_cache::{Cache, Retry};
use mongodl_config::Config;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "warn",
        _ => "info",
    };
    // The catalog rebuild issues thousands of statements.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{level},sqlx=warn")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn execute(cache: &Cache, args: &Args, config: &Config) -> Result<ExitCode> {
    let retry = Retry::new(config.retries);
    retry.run(|| cache.refresh()).await.or_raise(|| ErrorKind::Cache)?;

    if args.list {
        list::print(&cache.catalog(), &args.filters(), &mut std::io::stdout().lock()).await?;
        return Ok(ExitCode::SUCCESS);
    }
    let request = args.request(config)?;
    match download::download(cache, &request, &retry).await? {
        Outcome::Resolved(url) => println!("{url}"),
        Outcome::Extracted(report) if report.count() == 0 && args.empty_is_error => return Ok(ExitCode::FAILURE),
        Outcome::Extracted(_) => {},
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    args.configure(&mut config);
    tracing::debug!(?config, "configuration loaded");

    let transport = HttpTransport::new(config.timeout()).or_raise(|| ErrorKind::Cache)?;
    let cache = Cache::open(&config.cache_dir, Arc::new(transport))
        .await
        .or_raise(|| ErrorKind::Cache)?
        .with_manifest_url(config.manifest_url.clone());
    let result = execute(&cache, &args, &config).await;
    cache.close().await;
    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}
