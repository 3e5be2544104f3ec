//! run-remote CLI
//!
//! Builds the program, uploads it to every host given after `--`, and
//! launches it on all of them at once, each instance told its index and the
//! participant count.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rr_core::config::resolve_config;
use rr_core::{DeployError, DryRunExecutor, ProcessRunner};
use run_remote::args::{parse_args, usage, ParsedArgs};
use run_remote::commands::Deployer;
use run_remote::options::EnvOptions;
use run_remote::output::{format_hosts, print_error, print_success, print_warning};

#[tokio::main]
async fn main() -> ExitCode {
    let options = match EnvOptions::from_env() {
        Ok(options) => options,
        Err(e) => e.exit(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| options.log_level().into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DeployError>() {
                Some(DeployError::Usage(msg)) => {
                    print_error(msg);
                    println!("{}", usage());
                }
                _ => print_error(&format!("{:#}", e)),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(options: &EnvOptions) -> Result<()> {
    let request = match parse_args(std::env::args().skip(1))? {
        ParsedArgs::Help => {
            println!("{}", usage());
            return Ok(());
        }
        ParsedArgs::Deploy(request) => request,
    };

    let config =
        resolve_config(options.config.as_deref()).context("Failed to load configuration")?;

    if options.dry_run {
        print_warning("Dry run: commands are printed, not executed");
        let executor = DryRunExecutor::new();
        Deployer::new(&executor, &config)
            .skip_artifact_check()
            .deploy(&request)
            .await?;
    } else {
        let executor = ProcessRunner::new();
        Deployer::new(&executor, &config).deploy(&request).await?;
    }

    print_success(&format!(
        "{} launched on {}",
        config.program,
        format_hosts(&request.hosts)
    ));
    Ok(())
}
