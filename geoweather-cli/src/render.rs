//! Text rendering of a screen snapshot.
//!
//! Portrait stacks everything in one column; landscape puts the headline next to the
//! detail panel and lays forecast cards out side by side.

use chrono::{DateTime, TimeZone};
use clap::ValueEnum;
use geoweather_core::{
    CurrentWeather, ForecastEntry, ScreenState, SortCriterion, Units, display_temp,
    error::{PERMISSION_HINT, PERMISSION_MESSAGE, UNAVAILABLE_MESSAGE},
};

const LOADING_MESSAGE: &str = "Getting weather data...";
const CARD_WIDTH: usize = 14;
const LEFT_PANEL_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Layout {
    /// Pick from the terminal's shape.
    #[default]
    Auto,
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Terminal cells are roughly twice as tall as they are wide, so a screen is
/// landscape when it has more than two columns per row.
pub fn orientation_for(cols: u16, rows: u16) -> Orientation {
    if cols >= 60 && u32::from(cols) > u32::from(rows) * 2 {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

impl Layout {
    /// Resolve against the terminal's current size.
    pub fn resolve(self) -> (Orientation, usize) {
        self.resolve_for(crossterm::terminal::size().ok())
    }

    /// Resolve to an orientation and a usable width for a `(cols, rows)` terminal.
    pub fn resolve_for(self, size: Option<(u16, u16)>) -> (Orientation, usize) {
        let width = size.map(|(cols, _)| usize::from(cols)).unwrap_or(80);

        let orientation = match self {
            Layout::Portrait => Orientation::Portrait,
            Layout::Landscape => Orientation::Landscape,
            Layout::Auto => size
                .map(|(cols, rows)| orientation_for(cols, rows))
                .unwrap_or(Orientation::Portrait),
        };

        (orientation, width)
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub orientation: Orientation,
    pub width: usize,
    pub units: Units,
    pub icon_host: String,
}

/// Date and time labels for a forecast timestamp, e.g. `("Tue, Nov 14", "22:13")`.
pub fn format_date_time<Tz: TimeZone>(dt: i64, tz: &Tz) -> Option<(String, String)>
where
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::from_timestamp(dt, 0)?;
    let local = utc.with_timezone(tz);
    Some((local.format("%a, %b %-d").to_string(), local.format("%H:%M").to_string()))
}

/// Render the screen. `forecast` is the display ordering of the loaded forecast.
pub fn render_screen(
    state: &ScreenState,
    forecast: Option<&[ForecastEntry]>,
    sort: SortCriterion,
    opts: &RenderOptions,
) -> String {
    match state {
        ScreenState::PermissionDenied => format!("{PERMISSION_MESSAGE}\n{PERMISSION_HINT}\n"),
        ScreenState::WeatherLoaded { report, refreshing } => {
            let mut out = String::new();
            if *refreshing {
                out.push_str("Refreshing...\n\n");
            }
            match opts.orientation {
                Orientation::Portrait => render_current_portrait(&mut out, &report.current, opts),
                Orientation::Landscape => render_current_landscape(&mut out, &report.current, opts),
            }
            let entries = forecast.unwrap_or(report.forecast.as_slice());
            render_forecast(&mut out, entries, sort, opts, &chrono::Local);
            out
        }
        ScreenState::FetchFailed { .. } => format!("{UNAVAILABLE_MESSAGE}\n"),
        ScreenState::Idle
        | ScreenState::PermissionRequested
        | ScreenState::LocationAcquired { .. }
        | ScreenState::FetchingWeather { .. } => format!("{LOADING_MESSAGE}\n"),
    }
}

fn headline(current: &CurrentWeather, opts: &RenderOptions) -> Vec<String> {
    let mut lines = vec![current.name.clone(), display_temp(current.temp)];
    if let Some(condition) = current.primary_condition() {
        lines.push(condition.description.clone());
        lines.push(condition.icon_url(&opts.icon_host));
    }
    lines
}

fn details(current: &CurrentWeather, opts: &RenderOptions) -> Vec<(&'static str, String)> {
    vec![
        ("Feels like", display_temp(current.feels_like)),
        ("Humidity", format!("{}%", current.humidity)),
        ("Wind", format!("{} {}", current.wind_speed, opts.units.wind_label())),
    ]
}

fn render_current_portrait(out: &mut String, current: &CurrentWeather, opts: &RenderOptions) {
    for line in headline(current, opts) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');

    let row: Vec<String> = details(current, opts)
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect();
    out.push_str(&row.join("   "));
    out.push('\n');
}

fn render_current_landscape(out: &mut String, current: &CurrentWeather, opts: &RenderOptions) {
    let left = headline(current, opts);
    let right: Vec<String> = details(current, opts)
        .into_iter()
        .map(|(label, value)| format!("{label:<11}{value}"))
        .collect();

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).map(String::as_str).unwrap_or("");
        let r = right.get(i).map(String::as_str).unwrap_or("");
        let width = LEFT_PANEL_WIDTH.max(l.len() + 2);
        out.push_str(&format!("{l:<width$}{r}\n"));
    }
}

fn sort_controls(sort: SortCriterion) -> String {
    [SortCriterion::Chronological, SortCriterion::TemperatureDesc]
        .iter()
        .map(|c| {
            if *c == sort {
                format!("[{}]", c.label())
            } else {
                format!(" {} ", c.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct Card {
    date: String,
    time: String,
    temp: String,
    main: String,
}

fn card<Tz: TimeZone>(entry: &ForecastEntry, tz: &Tz) -> Card
where
    Tz::Offset: std::fmt::Display,
{
    let (date, time) = format_date_time(entry.dt, tz)
        .unwrap_or_else(|| (entry.dt.to_string(), String::new()));
    Card {
        date,
        time,
        temp: display_temp(entry.temp),
        main: entry.condition.main.clone(),
    }
}

fn render_forecast<Tz: TimeZone>(
    out: &mut String,
    entries: &[ForecastEntry],
    sort: SortCriterion,
    opts: &RenderOptions,
    tz: &Tz,
) where
    Tz::Offset: std::fmt::Display,
{
    out.push_str(&format!("\n5-Day Forecast   {}\n", sort_controls(sort)));
    let cards: Vec<Card> = entries.iter().map(|e| card(e, tz)).collect();

    match opts.orientation {
        Orientation::Portrait => {
            for c in &cards {
                out.push_str(&format!("{:<12} {:<6} {:>5}  {}\n", c.date, c.time, c.temp, c.main));
            }
        }
        Orientation::Landscape => {
            let per_row = (opts.width / CARD_WIDTH).max(1);
            for row in cards.chunks(per_row) {
                let fields: [fn(&Card) -> &str; 4] = [
                    |c| c.date.as_str(),
                    |c| c.time.as_str(),
                    |c| c.temp.as_str(),
                    |c| c.main.as_str(),
                ];
                for field in fields {
                    let line: String = row
                        .iter()
                        .map(|c| format!("{:<width$}", field(c), width = CARD_WIDTH))
                        .collect();
                    out.push_str(line.trim_end());
                    out.push('\n');
                }
                out.push('\n');
            }
        }
    }
}
