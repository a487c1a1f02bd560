//! sunit-async - asynchronous xUnit suite runner
//!
//! Runs the built-in suites on a virtual clock (deterministic, instant) or
//! on real tokio timers and reports the outcome of every test.
//!
//! ## Usage
//!
//! ```bash
//! # Run the self-checking suite on the virtual clock
//! sunit-async run --suite async
//!
//! # Run two fakes on real timers and save JSON results
//! sunit-async run --suite fakes --select fakeTimeout,testPass \
//!     --clock runtime --format json --output results.json
//!
//! # List suites and their selectors
//! sunit-async list --detailed
//!
//! # Write a default configuration file
//! sunit-async config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod cli;

use cli::Args;
use sunit_async::config::env::{print_env_help, EnvConfig};
use sunit_async::config::AppConfig;
use sunit_async::fixtures;
use sunit_async::output::{write_results_to_file, ResultFormatter};
use sunit_async::utils::logger::{init_logger, LogLevel};
use sunit_async::{ClockKind, Harness};

fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config_path = match &args.command {
        cli::Command::Run(run_args) => run_args.config.clone(),
        _ => None,
    }
    .or_else(|| env.config_file.clone());

    let mut config = AppConfig::load_or_default(config_path.as_deref().map(Path::new))?;
    config.merge_env(&env);

    let level = if args.verbose {
        config.log_level().max_verbosity(LogLevel::Debug)
    } else {
        config.log_level()
    };
    init_logger(level);
    debug!("Effective configuration: {:?}", config);

    match args.command {
        cli::Command::Run(run_args) => {
            let passed = run_suite(run_args, config)?;
            if !passed {
                std::process::exit(1);
            }
        }
        cli::Command::List(list_args) => {
            list_suites(list_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &env)?;
        }
    }

    Ok(())
}

/// Run one suite; `Ok(false)` when any test did not pass
fn run_suite(args: cli::RunArgs, mut config: AppConfig) -> Result<bool> {
    if let Some(clock) = &args.clock {
        config.clock = ClockKind::from_str(clock)
            .ok_or_else(|| anyhow::anyhow!("Unknown clock: {clock}. Valid: manual, runtime"))?;
    }
    if let Some(timeout) = args.harness_timeout {
        config.harness_timeout_ms = timeout;
    }
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    if args.no_color {
        config.colorize = false;
    }
    config.validate()?;

    let builtin = fixtures::find_suite(&args.suite)
        .ok_or_else(|| anyhow::anyhow!("Unknown suite: {}. See `sunit-async list`", args.suite))?;
    let mut suite = builtin.build()?;
    if !args.select.is_empty() {
        suite = suite.select(args.select.as_slice())?;
    }

    info!(
        "Running {} ({} tests) on the {} clock",
        builtin.name,
        suite.len(),
        config.clock
    );

    let snapshot = Harness::new(config.clock)
        .with_timeout(config.harness_timeout())
        .run(suite)?;

    let format = config.output_format();
    let formatter = ResultFormatter::new(format).with_color(config.colorize);
    println!("{}", formatter.format_snapshot(&snapshot));

    if let Some(output) = &args.output {
        write_results_to_file(output, &snapshot, format)?;
        println!("✓ Results saved to: {output}");
    }

    Ok(snapshot.is_all_passed())
}

fn list_suites(args: cli::ListArgs) -> Result<()> {
    println!("\nBuilt-in Suites\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for builtin in fixtures::builtin_suites() {
        let suite = builtin.build()?;
        println!(
            "  {:12} {:3} tests  {}",
            builtin.name,
            suite.len(),
            builtin.description
        );

        if args.detailed {
            for selector in suite.selectors() {
                println!("      - {selector}");
            }
            println!();
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            AppConfig::default().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { file, format } => {
            let mut config = AppConfig::load_or_default(file.as_deref().map(Path::new))?;
            config.merge_env(env);
            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .map(PathBuf::from)
                .or_else(AppConfig::find)
                .context("No configuration file found")?;

            match AppConfig::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {}", path.display());
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => {
            env.print_summary();
            println!();
            print_env_help();
        }
    }

    Ok(())
}
