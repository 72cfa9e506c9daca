mod command;
mod filters;
mod interest;
mod normalize;
mod orchestrator;
mod outbound;
mod query;
mod render;
mod settings;
mod terminal;

use std::{
    io::{stdout, Stdout},
    process::exit,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

use crate::{
    command::{CityTarget, Command, USAGE},
    filters::SearchFilters,
    interest::InterestModel,
    orchestrator::{SearchOrchestrator, SearchRound},
    outbound::HttpBackend,
    settings::{Args, Settings},
    terminal::{format_interests, print, TerminalCities, TerminalResults},
};

type Orchestrator =
    SearchOrchestrator<HttpBackend, TerminalResults<Stdout>, TerminalCities<Stdout>>;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let settings = match Settings::from_args(&args) {
        Ok(ret) => ret,
        Err(error) => {
            eprintln!("Problem while loading settings. {error}");
            exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(settings.log.level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(settings).await {
        error!("{:#}", error);
        exit(1);
    }
}

async fn run(settings: Settings) -> Result<()> {
    info!("Event radar, backend at {}", settings.backend.url);

    let backend = Arc::new(
        HttpBackend::new(&settings.backend.url).context("Problem while building HTTP client")?,
    );
    let interests = InterestModel::new(
        settings.interests.rating_source(),
        settings.interests.default_weight(),
    );
    let mut orchestrator = SearchOrchestrator::new(
        backend,
        SearchFilters::new(interests),
        settings.display.limits(),
        TerminalResults::new(stdout()),
        TerminalCities::new(stdout()),
    );

    match orchestrator.load_categories().await {
        Ok(count) => info!("Loaded {count} categories"),
        Err(error) => error!("Problem while loading categories. {:#}", error),
    }
    print(&format!("{USAGE}\n"));
    let mut pending = Some(issued(orchestrator.search().await));

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Some(round) = execute(&mut orchestrator, command).await {
                    pending = Some(issued(round));
                }
            }
            Err(error) => print(&format!("{error}\n")),
        }
    }

    // Older rounds can no longer commit; only the latest is worth waiting for.
    if let Some(round) = pending {
        round.settled().await;
    }
    Ok(())
}

async fn execute(orchestrator: &mut Orchestrator, command: Command) -> Option<SearchRound> {
    match command {
        Command::Help => {
            print(&format!("{USAGE}\n"));
            None
        }
        Command::List => {
            print(&format_interests(&orchestrator.filters().interests));
            None
        }
        Command::Toggle(input) => {
            let label = resolve(orchestrator, &input)?;
            orchestrator.toggle_interest(&label).await
        }
        Command::Weight(input, value) => {
            let label = resolve(orchestrator, &input)?;
            orchestrator.change_weight(&label, value).await
        }
        Command::Query(text) => Some(orchestrator.change_text(text).await),
        Command::Dates(range) => Some(orchestrator.change_dates(range).await),
        Command::Sort => Some(orchestrator.toggle_sort().await),
        Command::City(CityTarget::Name(name)) => Some(orchestrator.select_city(name).await),
        Command::City(CityTarget::Number(number)) => {
            let chip = orchestrator
                .city_panel()
                .lock()
                .await
                .chip(number)
                .map(|c| c.name.clone());
            match chip {
                Some(name) => Some(orchestrator.select_city(name).await),
                None => {
                    print(&format!("No city #{number} in the current list\n"));
                    None
                }
            }
        }
        Command::Search => Some(orchestrator.search().await),
        Command::Quit => None,
    }
}

/// Maps user input onto a loaded category label.
fn resolve(orchestrator: &Orchestrator, input: &str) -> Option<String> {
    let label = orchestrator
        .filters()
        .interests
        .resolve(input)
        .map(ToString::to_string);
    if label.is_none() {
        print(&format!("Unknown category `{input}`\n"));
    }
    label
}

/// Results render on their own as they arrive; the round is not awaited here.
fn issued(round: SearchRound) -> SearchRound {
    debug!(generation = round.generation(), "Search issued");
    round
}
