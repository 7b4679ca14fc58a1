// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

mod cli;
mod commands;

use std::process;
use anyhow::Result;
use clap::Parser;
use clap::CommandFactory;

use kubedb_common::config::{AppConfig, AppConfigBuilder};
use kubedb_common::constant::{APP_NAME, DEFAULT_LOG_LEVEL};
use kubedb_common::telemetry::{error, info, setup_logging};

use crate::cli::{CliArgs, Commands};

fn load_config(args: &CliArgs, catalog: Option<&str>, output: Option<&str>) -> Result<AppConfig> {
    let mut builder = AppConfigBuilder::default();
    if let Some(path) = args.config.as_deref() {
        builder.with_file(path);
    }
    let config = builder
        .with_env()
        .with_override_option("defaulter.catalog_file", catalog)
        .with_override_option("defaulter.output", output)
        .build()?;
    Ok(config)
}

fn run(args: &CliArgs, cmd: &Commands) -> Result<String> {
    match cmd {
        Commands::Default { manifest, catalog, output } => {
            let config = load_config(args, catalog.catalog.as_deref(), output.as_deref())?;
            let catalog = commands::load_catalog(&config.defaulter.catalog_file)?;
            let db = commands::parse_manifest(&commands::read_input(&manifest.file)?)?;
            commands::default(db, &catalog, &config.defaulter)
        },
        Commands::Validate { manifest, catalog, delete } => {
            let db = commands::parse_manifest(&commands::read_input(&manifest.file)?)?;
            if *delete {
                return commands::validate(&db, &Default::default(), true);
            }
            let config = load_config(args, catalog.catalog.as_deref(), None)?;
            let catalog = commands::load_catalog(&config.defaulter.catalog_file)?;
            commands::validate(&db, &catalog, false)
        },
        Commands::Names { manifest } => {
            let db = commands::parse_manifest(&commands::read_input(&manifest.file)?)?;
            commands::names(&db)
        },
        Commands::Ready { manifest, workloads } => {
            let db = commands::parse_manifest(&commands::read_input(&manifest.file)?)?;
            let workloads = commands::parse_workloads(&commands::read_input(workloads)?)?;
            commands::ready(&db, workloads)
        },
        Commands::Hash { manifest } => {
            let db = commands::parse_manifest(&commands::read_input(&manifest.file)?)?;
            commands::hash(&db)
        },
    }
}

fn main() {
    let args = CliArgs::parse();

    setup_logging(DEFAULT_LOG_LEVEL);

    let Some(cmd) = args.cmd.as_ref() else {
        let mut cmd = CliArgs::command();
        let _ = cmd.print_help();
        process::exit(1);
    };

    info!(
        event = "Starting",
        app = APP_NAME,
        version = env!("CARGO_PKG_VERSION"),
    );

    match run(&args, cmd) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            error!(
                event = "Error",
                error = %format!("{:#}", e),
            );
            process::exit(1);
        },
    }
}
