//! CLI entry point for reel.

mod cli;

use cli::{Args, Command, ConfigCommand, FilterArgs};
use clap::Parser;
use reel::api::{ApiClient, Resource, SearchClient};
use reel::config::{
    initialize_default_global_config, load_config, message_resolver, render_config, validate,
    Config, GlobalConfigInitResult,
};
use reel::error::AppError;
use reel::filters::SearchCriteria;
use reel::geo::FixedLocation;
use reel::logging::init_logging;
use reel::retry::MessageResolver;
use reel::search::{locate, SearchLifecycle, SearchSession};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Command::Config {
        action: ConfigCommand::Init,
    } = &args.command
    {
        match initialize_default_global_config() {
            Ok(GlobalConfigInitResult::Created { path }) => {
                println!("created {}", path.display());
            }
            Ok(GlobalConfigInitResult::AlreadyInitialized { path }) => {
                println!("{} already exists", path.display());
            }
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match load_config(args.config.as_deref()).and_then(|mut config| {
        apply_cli_overrides(&mut config, &args);
        validate(&config)?;
        Ok(config)
    }) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let resolver = match message_resolver(&config) {
        Ok(resolver) => Arc::new(resolver),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let outcome = match &args.command {
        Command::Search { resource, filters } => {
            run_search(&config, resolver, resource, filters).await
        }
        Command::Live { resource, filters } => run_live(&config, resolver, resource, filters).await,
        Command::Config { .. } => render_config(&config)
            .map(|text| print!("{text}"))
            .map_err(AppError::from),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(url) = &args.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
}

fn parse_resource(value: &str) -> Result<Resource, AppError> {
    value.parse().map_err(AppError::Usage)
}

/// Criteria from CLI flags, with coordinates resolved when given.
///
/// A location failure is reported with its user-facing alert and no request
/// is sent.
async fn criteria_from_args(
    config: &Config,
    filters: &FilterArgs,
) -> Result<SearchCriteria, AppError> {
    let criteria = SearchCriteria {
        query: filters.query.clone(),
        category: filters.category.clone(),
        chain: filters.chain.clone(),
        coordinates: None,
    };
    if !filters.has_location() {
        return Ok(criteria);
    }

    let radius_km = filters.radius_km.unwrap_or(config.search.radius_km);
    let provider = FixedLocation::from_parts(filters.latitude, filters.longitude, radius_km);
    Ok(locate(&provider, criteria).await?)
}

fn new_session(config: &Config, resolver: Arc<MessageResolver>, resource: Resource) -> SearchSession {
    let client: Arc<dyn SearchClient> = Arc::new(ApiClient::new(&config.api));
    SearchSession::new(
        client,
        resolver,
        resource,
        config.search.quiet_period(),
        config.retry.execute_options(resource.search_operation()),
    )
}

async fn run_search(
    config: &Config,
    resolver: Arc<MessageResolver>,
    resource: &str,
    filters: &FilterArgs,
) -> Result<(), AppError> {
    let resource = parse_resource(resource)?;
    let criteria = criteria_from_args(config, filters).await?;
    let session = new_session(config, resolver, resource);

    match session.search_now(&criteria).await {
        Ok(value) => {
            print_json(&value);
            Ok(())
        }
        Err(_) => {
            let message = session
                .lifecycle()
                .error_message()
                .unwrap_or(reel::retry::UNEXPECTED_MESSAGE)
                .to_string();
            Err(AppError::Request(message))
        }
    }
}

/// Each stdin line replaces the query; results print as searches settle.
async fn run_live(
    config: &Config,
    resolver: Arc<MessageResolver>,
    resource: &str,
    filters: &FilterArgs,
) -> Result<(), AppError> {
    let resource = parse_resource(resource)?;
    let base = criteria_from_args(config, filters).await?;
    let session = new_session(config, resolver, resource);

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            print_settled(&state);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let criteria = SearchCriteria {
            query: Some(line),
            ..base.clone()
        };
        session.update(&criteria);
    }

    session.settled().await;
    drop(session);
    let _ = printer.await;
    Ok(())
}

fn print_settled(state: &SearchLifecycle) {
    if state.loading {
        return;
    }
    if let Some(message) = state.error_message() {
        eprintln!("error: {message}");
    } else if let Some(value) = &state.data {
        print_json(value);
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
