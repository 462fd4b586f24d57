use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod catalog;
mod controller;
mod dataset;
mod domain;
mod inputter;
mod model;
mod search;
mod ui;

use controller::Controller;
use dataset::Dataset;
use domain::{SearchConfig, SearchError};
use model::{Model, Status};
use ui::TableUI;

const LOG_ENV: &str = "USER_SEARCH_LOG";

/// Real-time search over a list of users
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// User list to search (json, csv, parquet or arrow)
    #[arg(default_value = "data/users.json")]
    data_file: String,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level used when USER_SEARCH_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Table title, defaults to the data file name
    #[arg(long)]
    title: Option<String>,

    /// Start with this query in the search box
    #[arg(long, default_value = "")]
    query: String,

    /// Event poll timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// The terminal belongs to the ui, so logs only go to a file
fn init_logging(cli: &Cli) -> Result<(), SearchError> {
    if let Some(path) = &cli.log_file {
        let file = File::create(path)?;
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .with(ErrorLayer::default())
            .init();
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), SearchError> {
    init_logging(&cli)?;

    // Fail before touching the terminal if the data is unusable
    let dataset = Dataset::load(&cli.data_file)?;

    let cfg = SearchConfig::default()
        .event_poll_time(cli.poll_ms)
        .source_name(cli.title.clone().unwrap_or_default())
        .query(cli.query.clone());

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    let mut model = Model::init(&cfg, dataset, size.width as usize, size.height as usize);
    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    let state = model.state();
    info!(
        "Quit with {} = {:?}, {} users shown",
        state.filter.code(),
        state.query,
        model.filtered().count()
    );
    Ok(())
}
