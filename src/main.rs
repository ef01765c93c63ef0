use anyhow::{anyhow, Context, Result};
use crossterm::style::Stylize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

mod table_display;

use record_grid::config::Config;
use record_grid::core::GridController;
use record_grid::data::data_source::HttpDataSource;
use record_grid::data::query::SortDirection;
use record_grid::data::record::{FieldValue, RecordKey};
use record_grid::services::DataLoaderService;
use record_grid::state::events::GridIntent;
use record_grid::utils::logging::{init_tracing, LogRingBuffer};
use table_display::display_page;

fn print_help() {
    println!("{}", "Record Grid - searchable, sortable record table".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  record-grid [OPTIONS]");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {}  - Case-insensitive search in one column",
        "--search COLUMN TEXT".green()
    );
    println!(
        "  {} - Keep rows whose column matches VALUE (repeatable)",
        "--filter COLUMN VALUE".green()
    );
    println!("  {}  - Sort by a column", "--sort COLUMN asc|desc".green());
    println!("  {}              - Show page N", "--page N".green());
    println!(
        "  {} - Edit one field of a record and save it",
        "--set KEY FIELD VALUE".green()
    );
    println!("  {}          - Delete a record", "--delete KEY".green());
    println!("  {}             - Fetch from URL instead of the configured source", "--url URL".green());
    println!("  {}            - Echo logs to stderr", "--verbose".green());
    println!("  {}             - Print the last N log entries after the table", "--logs N".green());
    println!(
        "  {}    - Write the config file with defaults",
        "--generate-config".green()
    );
    println!("  {}               - Show this help", "--help".green());
    println!();
}

/// Options parsed from the command line
#[derive(Debug, Default)]
struct CliOptions {
    search: Option<(String, String)>,
    filters: Vec<(String, String)>,
    sort: Option<(String, SortDirection)>,
    page: Option<usize>,
    edits: Vec<(RecordKey, String, String)>,
    deletes: Vec<RecordKey>,
    url: Option<String>,
    verbose: bool,
    logs: Option<usize>,
}

/// Log entries shown after a failed load or intent when `--logs` is not given
const FAILURE_LOG_TAIL: usize = 10;

fn take_values<'a>(args: &'a [String], pos: usize, count: usize, flag: &str) -> Result<&'a [String]> {
    args.get(pos + 1..pos + 1 + count)
        .ok_or_else(|| anyhow!("{} expects {} argument(s)", flag, count))
}

fn parse_key(value: &str) -> Result<RecordKey> {
    value
        .parse::<i64>()
        .map(RecordKey)
        .with_context(|| format!("Invalid record key: {}", value))
}

fn parse_args(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut pos = 1;

    while pos < args.len() {
        let flag = args[pos].as_str();
        let consumed = match flag {
            "--search" => {
                let values = take_values(args, pos, 2, flag)?;
                options.search = Some((values[0].clone(), values[1].clone()));
                2
            }
            "--filter" => {
                let values = take_values(args, pos, 2, flag)?;
                options.filters.push((values[0].clone(), values[1].clone()));
                2
            }
            "--sort" => {
                let values = take_values(args, pos, 2, flag)?;
                let direction = SortDirection::parse(&values[1])
                    .ok_or_else(|| anyhow!("Sort direction must be asc or desc, got {}", values[1]))?;
                options.sort = Some((values[0].clone(), direction));
                2
            }
            "--page" => {
                let values = take_values(args, pos, 1, flag)?;
                let page = values[0]
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: {}", values[0]))?;
                options.page = Some(page);
                1
            }
            "--set" => {
                let values = take_values(args, pos, 3, flag)?;
                options
                    .edits
                    .push((parse_key(&values[0])?, values[1].clone(), values[2].clone()));
                3
            }
            "--delete" => {
                let values = take_values(args, pos, 1, flag)?;
                options.deletes.push(parse_key(&values[0])?);
                1
            }
            "--url" => {
                let values = take_values(args, pos, 1, flag)?;
                options.url = Some(values[0].clone());
                1
            }
            "--logs" => {
                let values = take_values(args, pos, 1, flag)?;
                let count = values[0]
                    .parse::<usize>()
                    .with_context(|| format!("Invalid log count: {}", values[0]))?;
                options.logs = Some(count);
                1
            }
            "--verbose" => {
                options.verbose = true;
                0
            }
            other => return Err(anyhow!("Unknown option: {} (try --help)", other)),
        };
        pos += consumed + 1;
    }

    Ok(options)
}

/// Turn the parsed options into intents, in the order a user would issue them
fn intents_for(options: &CliOptions) -> Vec<GridIntent> {
    let mut intents = Vec::new();

    for (key, field, value) in &options.edits {
        intents.push(GridIntent::BeginEdit { key: *key });
        intents.push(GridIntent::UpdateField {
            key: *key,
            name: field.clone(),
            // numeric columns convert text on save
            value: FieldValue::from(value.as_str()),
        });
        intents.push(GridIntent::Save { key: *key });
    }

    for key in &options.deletes {
        intents.push(GridIntent::RequestDelete { key: *key });
        intents.push(GridIntent::ConfirmDelete { key: *key });
    }

    if let Some((column, text)) = &options.search {
        intents.push(GridIntent::SetSearch {
            column: column.clone(),
            text: text.clone(),
        });
    }

    let mut filters: Vec<(String, BTreeSet<String>)> = Vec::new();
    for (column, value) in &options.filters {
        match filters.iter_mut().find(|(c, _)| c == column) {
            Some((_, values)) => {
                values.insert(value.clone());
            }
            None => filters.push((column.clone(), BTreeSet::from([value.clone()]))),
        }
    }
    for (column, values) in filters {
        intents.push(GridIntent::SetColumnFilter { column, values });
    }

    if let Some((column, direction)) = &options.sort {
        intents.push(GridIntent::SetSort {
            column: column.clone(),
            direction: *direction,
        });
    }

    if let Some(page) = options.page {
        intents.push(GridIntent::SetPage(page));
    }

    intents
}

/// How many buffered log lines to print once the table is shown
fn log_tail_len(options: &CliOptions, failures: usize) -> usize {
    match options.logs {
        Some(count) => count,
        // stderr already carried every line
        None if options.verbose => 0,
        None if failures > 0 => FAILURE_LOG_TAIL,
        None => 0,
    }
}

fn recent_log_lines(buffer: &LogRingBuffer, count: usize) -> Vec<String> {
    buffer
        .get_recent(count)
        .iter()
        .map(|entry| entry.format_for_display())
        .collect()
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Error creating config directory")?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {}", path.display()))?;
    println!("Configuration file created at: {:?}", path);
    println!("Edit this file to customize the record grid.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--generate-config") {
        return generate_config();
    }

    let options = parse_args(&args)?;
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}", format!("Using default config: {:#}", e).yellow());
        Config::default()
    });

    let log_buffer = init_tracing(
        &config.logging.level,
        config.logging.buffer_size,
        options.verbose,
    );

    let url = options.url.clone().unwrap_or_else(|| config.source.url.clone());
    let source = Arc::new(HttpDataSource::new(&url, config.source.timeout())?);

    let mut grid = GridController::from_config(&config);
    let mut loader = DataLoaderService::new();
    loader.start_load(&mut grid, source);

    let mut failures = 0;
    println!("{}", format!("Loading records from {}", url).cyan());
    for outcome in loader.drain(&mut grid).await {
        if let Err(e) = outcome {
            failures += 1;
            eprintln!("{}", format!("Error: {}", e).red());
        }
    }

    for intent in intents_for(&options) {
        if let Err(e) = grid.dispatch(intent) {
            failures += 1;
            eprintln!("{}", format!("Error: {}", e).red());
            // leave no half-finished edit behind
            grid.cancel();
        }
    }

    for record in grid.intent_history() {
        let status = if record.succeeded { "ok" } else { "rejected" };
        info!(target: "record_grid", "intent {:?}: {}", record.intent, status);
    }

    display_page(&grid.render_state());

    let tail = log_tail_len(&options, failures);
    if tail > 0 {
        println!();
        println!("{}", "Recent log entries:".yellow());
        for line in recent_log_lines(&log_buffer, tail) {
            println!("  {}", line);
        }
    }
    Ok(())
}
