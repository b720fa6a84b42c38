use std::io::Write;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::{broadcast, mpsc},
};
use wearweather_core::{
    Companion, Config, Coordinates, FixedPlaceName, GroupStore, OverrideStore, ProcessRole,
    ProviderId, Scenario, SessionEvent, WeatherCache, WeatherSession,
    provider::default_provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wearweather", version, about = "What to wear for today's weather")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a weather provider and make it the default.
    Configure {
        /// Provider short name: "mock" or "openweather".
        provider: String,
    },

    /// Refresh weather and show today's outfit.
    Show {
        /// Latitude; defaults to the configured location.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude; defaults to the configured location.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Ignore a still-valid cache.
        #[arg(long)]
        force: bool,
    },

    /// Follow location updates read from stdin as "lat,lon" lines.
    Watch,

    /// Render the companion widget from the shared snapshot.
    Widget {
        /// Keep re-rendering on the widget schedule until interrupted.
        #[arg(long)]
        follow: bool,
    },

    /// Inspect or pin the mock weather scenario.
    Scenario {
        #[command(subcommand)]
        action: ScenarioAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScenarioAction {
    /// Show the active scenario and whether it is pinned.
    Show,
    /// List all scenarios.
    List,
    /// Pin a scenario until cleared.
    Set {
        /// Scenario name, e.g. "rainy" or "cold-cloudy".
        name: String,
    },
    /// Return to time-based scenario selection.
    Clear,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure { provider } => configure(config, &provider),
            Command::Show { lat, lon, force } => {
                let location = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(&config, location, force).await
            }
            Command::Watch => watch(&config).await,
            Command::Widget { follow } => widget(&config, follow).await,
            Command::Scenario { action } => scenario(&config, action),
        }
    }
}

fn configure(mut config: Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    if id.needs_api_key() {
        let prompt = if config.is_provider_configured(id) {
            format!("New API key for {id} (replaces the stored one):")
        } else {
            format!("API key for {id}:")
        };
        let api_key = inquire::Password::new(&prompt)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    } else {
        config.set_default_provider(id);
    }

    config.save()?;
    println!("Default provider set to {id}.");
    Ok(())
}

fn open_shared(config: &Config, role: ProcessRole) -> GroupStore {
    GroupStore::probe(&config.store_locations(role))
}

fn build_session(config: &Config) -> anyhow::Result<WeatherSession> {
    let shared = open_shared(config, ProcessRole::App);
    let locations = config.store_locations(ProcessRole::App);
    let local = GroupStore::local_or_memory(locations.local.as_deref());

    let provider = default_provider_from_config(config, &shared)?;
    let resolver = FixedPlaceName::new(config.location.mock_place_name.clone());

    Ok(WeatherSession::new(
        provider,
        Box::new(resolver),
        WeatherCache::new(local),
        shared,
        &config.location,
    ))
}

async fn show(config: &Config, location: Option<Coordinates>, force: bool) -> anyhow::Result<()> {
    let session = build_session(config)?;

    let outcome = match location {
        Some(coords) => {
            session.update_location_name(coords).await;
            session.refresh(Some(coords), force).await
        }
        None => session.refresh(None, force).await,
    };

    match outcome {
        Ok(outcome) => {
            tracing::info!("Refresh outcome: {:?}", outcome);
            print!("{}", render::session(&session.state(), Local::now().date_naive()));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn watch(config: &Config) -> anyhow::Result<()> {
    let session = build_session(config)?;
    let stdin = BufReader::new(tokio::io::stdin());
    watch_lines(&session, stdin, &mut std::io::stdout()).await
}

/// Feed "lat,lon" lines into the session and print every settled state.
/// Returns once `input` is exhausted and the last refresh has been printed.
async fn watch_lines<R>(
    session: &WeatherSession,
    input: R,
    out: &mut impl Write,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut events = session.subscribe();
    let (tx, rx) = mpsc::channel(8);

    let reader = async move {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match parse_coordinates(&line) {
                Some(coords) => {
                    if tx.send(coords).await.is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("Expected \"lat,lon\", got: {line}"),
            }
        }
        anyhow::Ok(())
    };

    let follower = async {
        let (read, ()) = tokio::join!(reader, session.follow(rx));
        read
    };
    tokio::pin!(follower);

    let today = Local::now().date_naive();
    let read = loop {
        tokio::select! {
            read = &mut follower => break read,
            Ok(event) = events.recv() => print_settled(out, &event, today)?,
        }
    };

    // Whatever the follower broadcast on its way out is still queued.
    loop {
        match events.try_recv() {
            Ok(event) => print_settled(out, &event, today)?,
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    read
}

fn print_settled(
    out: &mut impl Write,
    event: &SessionEvent,
    today: NaiveDate,
) -> anyhow::Result<()> {
    match event {
        SessionEvent::StateChanged(state)
            if !state.is_loading && (state.weather.is_some() || state.error_message.is_some()) =>
        {
            write!(out, "{}", render::session(state, today))?;
            out.flush()?;
        }
        _ => {}
    }
    Ok(())
}

fn parse_coordinates(line: &str) -> Option<Coordinates> {
    let (lat, lon) = line.trim().split_once(',')?;
    let lat = lat.trim().parse().ok()?;
    let lon = lon.trim().parse().ok()?;
    Some(Coordinates::new(lat, lon))
}

async fn widget(config: &Config, follow: bool) -> anyhow::Result<()> {
    let companion = Companion::new(
        open_shared(config, ProcessRole::Widget),
        config.location.mock_place_name.clone(),
    );

    loop {
        let entry = companion.entry(Local::now());
        print!("{}", render::widget(&entry));

        if !follow {
            return Ok(());
        }

        let wait = (entry.next_refresh - entry.date)
            .to_std()
            .context("Widget refresh interval must be positive")?;

        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for Ctrl-C")?;
                return Ok(());
            }
        }
    }
}

fn scenario(config: &Config, action: ScenarioAction) -> anyhow::Result<()> {
    let overrides = OverrideStore::new(open_shared(config, ProcessRole::App));

    match action {
        ScenarioAction::Show => {
            let pinned = overrides.get();
            let active = wearweather_core::scenario::scenario_for_time(&Local::now(), pinned);
            let how = if pinned.is_some() { "pinned" } else { "by time of day" };
            println!("{} ({}) - {}", active, active.title(), how);
        }
        ScenarioAction::List => {
            for scenario in Scenario::ALL {
                let t = scenario.template();
                println!(
                    "{:<12} {:<14} {}",
                    scenario.as_str(),
                    scenario.title(),
                    t.temperature_text(),
                );
            }
        }
        ScenarioAction::Set { name } => {
            let scenario = Scenario::try_from(name.as_str())?;
            overrides.set(scenario);
            println!("Pinned scenario: {scenario}");
        }
        ScenarioAction::Clear => {
            overrides.clear();
            println!("Scenario override cleared.");
        }
    }

    Ok(())
}
