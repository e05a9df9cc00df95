// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use hiertable_engine::HierTable;
use hiertable_model::{AutomationDriver, CategoryPath, EditRequest, TableSettings};
use hiertable_testkit::{TABLE, demo_desktop};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEMO_TABLE: &str = "demo";

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
            "load config {}; run `hiertable --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    init_tracing(config.log_level(), options.verbose)?;
    debug!(path = %options.config_path.display(), tables = config.tables.len(), "loaded config");

    let (label, settings) = resolve_table(&config, &options)?;
    if options.check_only {
        return Ok(());
    }

    if !options.demo {
        bail!(
            "table operations need a live desktop driver; only the simulated one is bundled, run with --demo"
        );
    }

    let mut table = HierTable::new(demo_desktop(), TABLE, label, settings);
    run_action(&mut table, options.action.as_ref())
}

fn init_tracing(level: &str, verbose: bool) -> Result<()> {
    let default_directive = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .with_context(|| format!("invalid log filter {default_directive:?}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

/// Settings for the selected table. Demo mode falls back to the demo
/// chart of accounts when the config defines no tables.
fn resolve_table(config: &Config, options: &CliOptions) -> Result<(String, TableSettings)> {
    if options.demo && config.tables.is_empty() && options.table.is_none() {
        return Ok((DEMO_TABLE.to_owned(), demo_settings()));
    }
    if options.check_only && options.table.is_none() && config.tables.len() != 1 {
        return Ok((String::new(), TableSettings::default()));
    }

    let table = config.table(options.table.as_deref())?;
    Ok((table.name.trim().to_owned(), table.settings.clone()))
}

fn demo_settings() -> TableSettings {
    TableSettings {
        category_column: Some("Account".to_owned()),
        ..TableSettings::default()
    }
}

fn run_action<D: AutomationDriver>(
    table: &mut HierTable<D>,
    action: Option<&Action>,
) -> Result<()> {
    match action {
        None => {
            table.scan_structure()?;
            let metadata = table.metadata();
            println!("{} ({} columns)", table.label(), metadata.column_count);
            for header in &metadata.headers {
                println!("  {header}");
            }
        }
        Some(Action::GetRow(path)) => match table.get_row(path)? {
            Some(row) => {
                for (column, value) in row.iter() {
                    println!("{column} = {value}");
                }
            }
            None => println!("no row matches {path}"),
        },
        Some(Action::Children { path, column }) => match table.get_child_values(path, column)? {
            Some(values) => {
                for value in values {
                    println!("{value}");
                }
            }
            None => println!("no row matches {path}"),
        },
        Some(Action::Edit { path, edits }) => match table.edit_cells(path, edits)? {
            Some(outcome) => {
                for (column, value) in outcome.iter() {
                    println!("{column} = {value}");
                }
            }
            None => println!("no row matches {path}"),
        },
        Some(Action::CollapseAll) => {
            let outcome = table.collapse_all()?;
            println!("{}", outcome.message);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    GetRow(CategoryPath),
    Children { path: CategoryPath, column: String },
    Edit { path: CategoryPath, edits: EditRequest },
    CollapseAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    demo: bool,
    verbose: bool,
    table: Option<String>,
    action: Option<Action>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        demo: false,
        verbose: false,
        table: None,
        action: None,
        show_help: false,
    };
    let mut children_column = None;
    let mut edits = EditRequest::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value = |what: &str| {
            iter.next()
                .map(|value| value.as_ref().to_owned())
                .ok_or_else(|| anyhow!("{} requires {what}", arg.as_ref()))
        };
        match arg.as_ref() {
            "--config" => {
                options.config_path = PathBuf::from(value("a file path")?);
            }
            "--table" => {
                options.table = Some(value("a table name")?);
            }
            "--get-row" => {
                let path = CategoryPath::parse(&value("a category path")?);
                set_action(&mut options.action, Action::GetRow(path))?;
            }
            "--children" => {
                let path = CategoryPath::parse(&value("a category path")?);
                set_action(
                    &mut options.action,
                    Action::Children {
                        path,
                        column: String::new(),
                    },
                )?;
            }
            "--column" => {
                children_column = Some(value("a column name")?);
            }
            "--edit" => {
                let path = CategoryPath::parse(&value("a category path")?);
                set_action(
                    &mut options.action,
                    Action::Edit {
                        path,
                        edits: EditRequest::new(),
                    },
                )?;
            }
            "--set" => {
                let pair = value("a column=value pair")?;
                let Some((column, cell)) = pair.split_once('=') else {
                    bail!("--set expects column=value, got {pair:?}");
                };
                edits.insert(column.trim(), cell);
            }
            "--collapse-all" => {
                set_action(&mut options.action, Action::CollapseAll)?;
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
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    match &mut options.action {
        Some(Action::Children { column, .. }) => {
            *column = children_column
                .ok_or_else(|| anyhow!("--children requires --column <name>"))?;
        }
        Some(Action::Edit { edits: target, .. }) => {
            if edits.is_empty() {
                bail!("--edit requires at least one --set column=value");
            }
            *target = edits;
        }
        _ => {
            if children_column.is_some() {
                bail!("--column only applies to --children");
            }
            if !edits.is_empty() {
                bail!("--set only applies to --edit");
            }
        }
    }

    Ok(options)
}

fn set_action(slot: &mut Option<Action>, action: Action) -> Result<()> {
    if slot.is_some() {
        bail!("choose one of --get-row, --children, --edit or --collapse-all");
    }
    *slot = Some(action);
    Ok(())
}

fn print_help() {
    println!("hiertable");
    println!("  --config <path>             Use a specific config path");
    println!("  --print-config-path         Print resolved config path");
    println!("  --print-example-config      Print a config template");
    println!("  --check                     Validate config and table selection");
    println!("  --demo                      Run against the simulated demo desktop");
    println!("  --table <name>              Table from config (optional with one table)");
    println!("  --get-row <a/b/c>           Print the row at a category path");
    println!("  --children <a/b> --column <c>");
    println!("                              Print a column of the children of a row");
    println!("  --edit <a/b> --set <col=value> ...");
    println!("                              Edit cells of a row and print the result");
    println!("  --collapse-all              Collapse every row");
    println!("  --verbose, -v               Log at debug level");
    println!("  --help                      Show this help");
}
