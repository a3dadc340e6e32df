use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geoweather_core::{
    Config, Coordinates, ForecastEntry, LocationMode, RefreshOutcome, ScreenController,
    ScreenState, SortCriterion, Units, WeatherReport, location::location_from_config,
    provider::source_from_config,
};
use inquire::{InquireError, Select};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    prompt::{PromptedLocation, configure},
    render::{Layout, RenderOptions, render_screen},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Current weather and forecast for where you are")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, units and location source.
    Configure,

    /// Load the weather once and print it.
    Show(ScreenArgs),

    /// Interactive screen with refresh and sort controls.
    Run(ScreenArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortArg {
    #[default]
    Date,
    Temp,
}

impl From<SortArg> for SortCriterion {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => SortCriterion::Chronological,
            SortArg::Temp => SortCriterion::TemperatureDesc,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ScreenArgs {
    /// Latitude to use instead of locating this machine.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of locating this machine.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Initial forecast order.
    #[arg(long, value_enum, default_value_t = SortArg::Date)]
    pub sort: SortArg,

    #[arg(long, value_enum, default_value_t = Layout::Auto)]
    pub layout: Layout,

    /// Allow location access without asking.
    #[arg(short, long)]
    pub yes: bool,

    /// Print the screen as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl ScreenArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonScreen<'a> {
    state: &'static str,
    sort: SortCriterion,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a WeatherReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<Vec<ForecastEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// What the interactive screen offers after each render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Refresh,
    SortByDate,
    SortByTemp,
    StartOver,
    Quit,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Refresh => "Refresh",
            Action::SortByDate => "Sort by date",
            Action::SortByTemp => "Sort by temperature",
            Action::StartOver => "Start over",
            Action::Quit => "Quit",
        })
    }
}

fn actions_for(state: &ScreenState, sort: SortCriterion) -> Vec<Action> {
    let mut actions = Vec::new();
    if state.can_refresh() {
        actions.push(Action::Refresh);
    }
    if state.report().is_some() {
        match sort {
            SortCriterion::Chronological => actions.push(Action::SortByTemp),
            SortCriterion::TemperatureDesc => actions.push(Action::SortByDate),
        }
    }
    if state.error().is_some() {
        actions.push(Action::StartOver);
    }
    actions.push(Action::Quit);
    actions
}

struct Screen {
    controller: Arc<ScreenController>,
    layout: Layout,
    units: Units,
    icon_host: String,
    json: bool,
}

impl Screen {
    fn build(config: &Config, args: &ScreenArgs) -> Result<Self> {
        let weather = source_from_config(config)?;

        let explicit = args.coordinates();
        let inner = location_from_config(config, explicit)?;
        let pre_granted = args.yes
            || config.location.allow
            || explicit.is_some()
            || config.location.mode == LocationMode::Fixed;
        let location = PromptedLocation::new(inner, pre_granted);

        let controller = ScreenController::new(Arc::new(location), Arc::from(weather));
        controller.set_sort(args.sort.into());

        Ok(Self {
            controller: Arc::new(controller),
            layout: args.layout,
            units: config.units,
            icon_host: config.icon_host.clone(),
            json: args.json,
        })
    }

    /// Layout for a terminal of `size`; re-resolved on every print so resizes are picked up.
    fn render_options(&self, size: Option<(u16, u16)>) -> RenderOptions {
        let (orientation, width) = self.layout.resolve_for(size);
        RenderOptions {
            orientation,
            width,
            units: self.units,
            icon_host: self.icon_host.clone(),
        }
    }

    fn print(&self) -> Result<()> {
        let state = self.controller.snapshot();
        let forecast = self.controller.sorted_forecast();
        let sort = self.controller.sort_criterion();

        if self.json {
            let screen = JsonScreen {
                state: state.name(),
                sort,
                report: state.report().map(|r| r.as_ref()),
                forecast,
                error: state.error().map(|e| e.to_string()),
                message: state.error().map(|e| e.user_message()),
            };
            let text = serde_json::to_string_pretty(&screen)
                .context("Failed to serialize screen to JSON")?;
            println!("{text}");
        } else {
            let opts = self.render_options(crossterm::terminal::size().ok());
            print!("{}", render_screen(&state, forecast.as_deref(), sort, &opts));
        }
        Ok(())
    }

    async fn show(&self) -> Result<ExitCode> {
        let state = self.controller.start().await;
        self.print()?;
        Ok(exit_code(&state))
    }

    async fn run_interactive(&self) -> Result<ExitCode> {
        let mut rx = self.controller.transitions();
        let progress = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(state) => {
                        if matches!(*state, ScreenState::FetchingWeather { .. })
                            || state.is_refreshing()
                        {
                            eprintln!("Getting weather data...");
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.controller.start().await;

        let result = loop {
            self.print()?;

            let state = self.controller.snapshot();
            let actions = actions_for(&state, self.controller.sort_criterion());
            let choice =
                tokio::task::spawn_blocking(move || Select::new("What next?", actions).prompt())
                    .await
                    .context("Prompt task failed")?;

            let action = match choice {
                Ok(action) => action,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    Action::Quit
                }
                Err(e) => break Err(e.into()),
            };

            match action {
                Action::Refresh => {
                    if let RefreshOutcome::Ignored = self.controller.refresh().await {
                        tracing::info!("refresh ignored");
                    }
                }
                Action::SortByDate => self.controller.set_sort(SortCriterion::Chronological),
                Action::SortByTemp => self.controller.set_sort(SortCriterion::TemperatureDesc),
                Action::StartOver => {
                    self.controller.start().await;
                }
                Action::Quit => break Ok(exit_code(&self.controller.snapshot())),
            }
        };

        progress.abort();
        result
    }
}

fn exit_code(state: &ScreenState) -> ExitCode {
    if state.report().is_some() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        match self.command {
            Command::Configure => {
                let existing = Config::load()?;
                let cfg = configure(existing)?;
                let path = cfg.save()?;
                println!("Configuration saved to {}", path.display());
                Ok(ExitCode::SUCCESS)
            }
            Command::Show(args) => {
                let config = Config::load()?;
                Screen::build(&config, &args)?.show().await
            }
            Command::Run(args) => {
                let config = Config::load()?;
                Screen::build(&config, &args)?.run_interactive().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use crate::render::Orientation;
    use geoweather_core::ScreenError;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_coordinates() {
        let cli = Cli::parse_from([
            "geoweather", "show", "--lat", "35.0", "--lon", "-139.5", "--sort", "temp",
        ]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.coordinates(), Some(Coordinates::new(35.0, -139.5)));
        assert_eq!(SortCriterion::from(args.sort), SortCriterion::TemperatureDesc);
        assert_eq!(args.layout, Layout::Auto);
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["geoweather", "show", "--lat", "35.0"]).is_err());
    }

    #[test]
    fn denied_screen_only_offers_start_over_and_quit() {
        let actions = actions_for(&ScreenState::PermissionDenied, SortCriterion::Chronological);
        assert_eq!(actions, vec![Action::StartOver, Action::Quit]);
    }

    #[test]
    fn failed_refresh_offers_refresh_again() {
        let state = ScreenState::FetchFailed {
            error: ScreenError::Network("boom".into()),
            refresh_coords: Some(Coordinates::new(1.0, 2.0)),
        };
        let actions = actions_for(&state, SortCriterion::Chronological);
        assert_eq!(actions, vec![Action::Refresh, Action::StartOver, Action::Quit]);
    }

    fn screen(args: &[&str]) -> Screen {
        let mut config = Config::default();
        config.set_api_key("TEST_KEY".into());
        let cli = Cli::parse_from(args);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        Screen::build(&config, &args).unwrap()
    }

    #[test]
    fn auto_layout_follows_terminal_resizes() {
        let screen = screen(&["geoweather", "run", "--lat", "35", "--lon", "139"]);

        let wide = screen.render_options(Some((120, 30)));
        assert_eq!(wide.orientation, Orientation::Landscape);
        assert_eq!(wide.width, 120);

        let narrow = screen.render_options(Some((50, 40)));
        assert_eq!(narrow.orientation, Orientation::Portrait);
        assert_eq!(narrow.width, 50);
    }

    #[test]
    fn forced_layout_ignores_terminal_shape() {
        let screen =
            screen(&["geoweather", "run", "--lat", "35", "--lon", "139", "--layout", "portrait"]);
        let opts = screen.render_options(Some((200, 20)));
        assert_eq!(opts.orientation, Orientation::Portrait);
    }
}
