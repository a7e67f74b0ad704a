// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod ingest;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use runtime::FileRuntime;
use shelfgrid_core::RowStore;
use shelfgrid_view::GridApp;
use std::env;
use std::path::PathBuf;
use tracing::info;

const DEMO_ROWS: usize = 6_000;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `shelfgrid --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    logging::init(&config.log_path()?, options.log_level.as_deref())?;

    let records = match (&options.data_path, options.demo) {
        (Some(path), _) => ingest::load_records(path)?,
        (None, true) => shelfgrid_testkit::sample_products(DEMO_ROWS),
        (None, false) => bail!("no data to show; pass --data <file.json> or --demo"),
    };

    let mut store = RowStore::new(config.store_options());
    store.set_all_data(records);

    let mut runtime = FileRuntime::new(config.layout_path()?);
    if let Some(stored) = runtime.load_layout()? {
        store.restore_layout(stored);
    }
    let grid_options = config.grid_options()?;
    info!(
        rows = store.rows().len(),
        layout = %runtime.layout_path().display(),
        "grid ready"
    );
    if options.check_only {
        return Ok(());
    }

    let mut app = GridApp::new(store, grid_options);
    shelfgrid_view::run_app(&mut app, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data_path: Option<PathBuf>,
    log_level: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data_path: None,
        log_level: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--data requires a JSON file path"))?;
                options.data_path = Some(PathBuf::from(value.as_ref()));
            }
            "--log-level" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--log-level requires a filter such as warn or debug")
                })?;
                options.log_level = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("shelfgrid");
    println!("  --data <path>            Load rows from a JSON array of objects");
    println!("  --demo                   Launch with generated sample products");
    println!("  --config <path>          Use a specific config path");
    println!("  --log-level <filter>     Log filter (overrides SHELFGRID_LOG)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config, data and layout, then exit");
    println!("  --help                   Show this help");
}
