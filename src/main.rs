use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gex_charts::config::{self, AppConfig, Overrides};
use gex_charts::pipeline::RunOutcome;
use gex_charts::{animate, backfill, example, run, schema};

mod cli;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();
    init_tracing(cli.json);

    let config_path = cli.config.as_deref();
    match cli.command {
        cli::Command::Schema => schema::run(),
        cli::Command::Example => example::run(),
        cli::Command::Watch {
            input_dir,
            output_dir,
            write_policy,
            no_initial_scan,
        } => {
            let overrides = Overrides {
                input_dir,
                output_dir,
                write_policy,
                no_initial_scan,
                ..Default::default()
            };
            run::watch(config::load(config_path, &overrides)?)
        }
        cli::Command::Poll {
            interval_secs,
            once,
            input_dir,
            output_dir,
            write_policy,
        } => {
            let overrides = Overrides {
                input_dir,
                output_dir,
                write_policy,
                poll_interval_secs: interval_secs,
                ..Default::default()
            };
            run::poll(config::load(config_path, &overrides)?, once)
        }
        cli::Command::Render {
            file,
            output_dir,
            write_policy,
        } => {
            let overrides = Overrides {
                output_dir,
                write_policy,
                ..Default::default()
            };
            render(&config::load(config_path, &overrides)?, &file)
        }
        cli::Command::Backfill { root } => {
            backfill::run(config::load(config_path, &Overrides::default())?, root)
        }
        cli::Command::Index { root } => {
            backfill::run_index(&config::load(config_path, &Overrides::default())?, root)
        }
        cli::Command::Animate { dir, date } => {
            animate::run(&config::load(config_path, &Overrides::default())?, dir, date)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// One file, no webhook. Errors surface as a non-zero exit.
fn render(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let outcome = config
        .pipeline
        .run_file(file, &config.output_dir)
        .with_context(|| format!("rendering {}", file.display()))?;
    match outcome {
        RunOutcome::Written(artifact) => {
            info!(artifact = %artifact.path.display(), "chart written")
        }
        RunOutcome::Skipped(target) => {
            info!(target = %target.display(), "artifact exists, skipped")
        }
        RunOutcome::Empty => info!("no rows left after filtering, nothing written"),
        RunOutcome::Unrouted => anyhow::bail!(
            "{} does not match any configured route",
            file.display()
        ),
    }
    Ok(())
}
