use std::sync::Arc;

use anyhow::Result;
use rental_search::features::{
    listings::repository::HttpSearchClient,
    search::{
        controller::{SearchController, SearchHandle, SearchSettings},
        history::RecentSearches,
        models::{SearchFilters, SearchState},
        url_sync::{AddressBar, MemoryAddressBar},
    },
};
use shared::{services::kv::MemoryStore, utilities::config::Config};
use time::macros::format_description;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt::time::LocalTime};
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::init().await?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(config.tracing_level).into())
                .from_env_lossy(),
        )
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        )))
        .init();

    let start_url = match std::env::args().nth(1) {
        Some(arg) => Url::parse(&arg)?,
        None => config.frontend_endpoint.join("search")?,
    };
    info!("Starting search at {}", start_url);

    let client = Arc::new(HttpSearchClient::from_config(&config)?);
    let store = Arc::new(MemoryStore::new());
    let settings = SearchSettings::from(&config);

    let (handle, controller) = SearchController::spawn(
        client,
        settings,
        MemoryAddressBar::new(start_url),
        Arc::clone(&store),
    );

    let printer = tokio::spawn(print_updates(handle.clone()));
    read_commands(&handle).await?;

    let address_bar = controller.await?;
    printer.abort();

    println!("Final URL: {}", address_bar.current());
    let recent = RecentSearches::new(store, config.recent_search_limit).list()?;
    if !recent.is_empty() {
        println!("Recent searches: {}", recent.join(", "));
    }

    Ok(())
}

/// Plain lines are search text; lines starting with `:` are commands.
async fn read_commands(handle: &SearchHandle) -> Result<()> {
    let mut filters = SearchFilters::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = line.strip_prefix(':') else {
            handle.text_changed(line)?;
            continue;
        };

        let mut parts = command.split_whitespace();
        match parts.next() {
            Some("more") => handle.load_more()?,
            Some("retry") => handle.retry()?,
            Some("category") => {
                filters.category = parts.next().map(str::to_string);
                handle.filters_changed(filters.clone())?;
            }
            Some("location") => {
                let location = parts.collect::<Vec<_>>().join(" ");
                filters.location = Some(location);
                handle.filters_changed(filters.clone())?;
            }
            Some("price") => {
                filters.min_price = parts.next().map(str::to_string);
                filters.max_price = parts.next().map(str::to_string);
                handle.filters_changed(filters.clone())?;
            }
            Some("dates") => {
                filters.check_in = parts.next().map(str::to_string);
                filters.check_out = parts.next().map(str::to_string);
                handle.filters_changed(filters.clone())?;
            }
            Some("guests") => {
                filters.guests = parts.next().map(str::to_string);
                handle.filters_changed(filters.clone())?;
            }
            Some("feature") => {
                filters.features.extend(parts.map(str::to_string));
                handle.filters_changed(filters.clone())?;
            }
            Some("sort") => {
                filters.sort_by = parts.next().unwrap_or_default().parse().unwrap_or_default();
                handle.filters_changed(filters.clone())?;
            }
            Some("reset") => {
                filters = SearchFilters::default();
                handle.filters_changed(filters.clone())?;
            }
            Some("quit") => break,
            other => println!("Unknown command: {}", other.unwrap_or_default()),
        }
    }

    handle.shutdown()?;
    Ok(())
}

async fn print_updates(handle: SearchHandle) {
    let mut state = handle.subscribe();
    let mut suggestions = handle.subscribe_suggestions();

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                println!("{}", describe(&snapshot));
            }
            changed = suggestions.changed() => {
                if changed.is_err() {
                    break;
                }
                let texts: Vec<String> = suggestions
                    .borrow_and_update()
                    .iter()
                    .map(|suggestion| suggestion.text.clone())
                    .collect();
                if !texts.is_empty() {
                    println!("  suggestions: {}", texts.join(" | "));
                }
            }
        }
    }
}

fn describe(state: &SearchState) -> String {
    if state.loading {
        return format!("[{:?}] page {}...", state.phase, state.page);
    }
    if let Some(error) = state.error.as_ref().filter(|error| error.is_user_visible()) {
        return format!("error: {} (:retry to try again)", error);
    }

    let titles: Vec<&str> = state
        .results
        .iter()
        .map(|listing| listing.title().unwrap_or(listing.id.as_str()))
        .collect();
    format!(
        "{} of {} listings, page {}{}: {}",
        state.results.len(),
        state.total,
        state.page,
        if state.has_more { " (:more)" } else { "" },
        titles.join(", ")
    )
}
