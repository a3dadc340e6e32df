//! Screen controller: permission, position, fetch cycle, refresh.
//!
//! The controller owns the only copy of the view state. Every transition publishes a
//! fresh `Arc<ScreenState>` snapshot; nothing is ever patched in place, so a renderer
//! holding a snapshot always sees current conditions and forecast from the same cycle.
//!
//! At most one cycle runs at a time. `start` or `refresh` calls that arrive while a
//! cycle is in flight are ignored.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::{broadcast, watch};

use crate::{
    ScreenError,
    location::{LocationProvider, Permission},
    model::{Coordinates, ForecastEntry, WeatherReport},
    provider::{WeatherSource, fetch_report},
    sort::{SortCriterion, sort_forecast},
};

static PERMISSION_DENIED: ScreenError = ScreenError::PermissionDenied;

/// One full cycle publishes at most five states; leave headroom for slow listeners.
const TRANSITION_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState {
    Idle,
    PermissionRequested,
    /// Terminal for this attempt; the user has to grant access outside the app.
    PermissionDenied,
    LocationAcquired {
        coords: Coordinates,
    },
    FetchingWeather {
        coords: Coordinates,
    },
    WeatherLoaded {
        report: Arc<WeatherReport>,
        /// A refresh is running; `report` is the previous cycle's data.
        refreshing: bool,
    },
    FetchFailed {
        error: ScreenError,
        /// Coordinates a manual refresh may reuse. Only set once a cycle has succeeded.
        refresh_coords: Option<Coordinates>,
    },
}

impl ScreenState {
    pub fn name(&self) -> &'static str {
        match self {
            ScreenState::Idle => "idle",
            ScreenState::PermissionRequested => "permission_requested",
            ScreenState::PermissionDenied => "permission_denied",
            ScreenState::LocationAcquired { .. } => "location_acquired",
            ScreenState::FetchingWeather { .. } => "fetching_weather",
            ScreenState::WeatherLoaded { .. } => "weather_loaded",
            ScreenState::FetchFailed { .. } => "fetch_failed",
        }
    }

    pub fn report(&self) -> Option<&Arc<WeatherReport>> {
        match self {
            ScreenState::WeatherLoaded { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ScreenError> {
        match self {
            ScreenState::PermissionDenied => Some(&PERMISSION_DENIED),
            ScreenState::FetchFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// True while the first load is still running (a refresh keeps showing data).
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ScreenState::Idle
                | ScreenState::PermissionRequested
                | ScreenState::LocationAcquired { .. }
                | ScreenState::FetchingWeather { .. }
        )
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self, ScreenState::WeatherLoaded { refreshing: true, .. })
    }

    /// Whether a pull-to-refresh is possible from here.
    pub fn can_refresh(&self) -> bool {
        matches!(
            self,
            ScreenState::WeatherLoaded { refreshing: false, .. }
                | ScreenState::FetchFailed { refresh_coords: Some(_), .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The refresh ran; this is the state it settled in.
    Settled(Arc<ScreenState>),
    /// Another cycle was in flight or there was nothing to refresh.
    Ignored,
}

/// Resets the in-flight flag when a cycle ends, including when its future is dropped.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct ScreenController {
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherSource>,
    state: watch::Sender<Arc<ScreenState>>,
    transitions: broadcast::Sender<Arc<ScreenState>>,
    sort: watch::Sender<SortCriterion>,
    in_flight: AtomicBool,
}

impl ScreenController {
    pub fn new(location: Arc<dyn LocationProvider>, weather: Arc<dyn WeatherSource>) -> Self {
        let (state, _) = watch::channel(Arc::new(ScreenState::Idle));
        let (sort, _) = watch::channel(SortCriterion::default());
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);

        Self {
            location,
            weather,
            state,
            transitions,
            sort,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<ScreenState> {
        self.state.borrow().clone()
    }

    /// Observe the latest snapshot. States superseded before the receiver looks are
    /// skipped; use [`ScreenController::transitions`] to see each one.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ScreenState>> {
        self.state.subscribe()
    }

    /// Every snapshot published from now on, in order.
    pub fn transitions(&self) -> broadcast::Receiver<Arc<ScreenState>> {
        self.transitions.subscribe()
    }

    pub fn sort_criterion(&self) -> SortCriterion {
        *self.sort.borrow()
    }

    /// Change the forecast ordering. The screen state is left alone.
    pub fn set_sort(&self, criterion: SortCriterion) {
        self.sort.send_replace(criterion);
    }

    /// Forecast in the selected order, derived from the loaded report.
    pub fn sorted_forecast(&self) -> Option<Vec<ForecastEntry>> {
        let snapshot = self.snapshot();
        snapshot
            .report()
            .map(|report| sort_forecast(&report.forecast, self.sort_criterion()))
    }

    fn publish(&self, state: ScreenState) -> Arc<ScreenState> {
        tracing::debug!(state = state.name(), "screen state changed");
        let snapshot = Arc::new(state);
        self.state.send_replace(snapshot.clone());
        // Err only means nobody is listening.
        self.transitions.send(snapshot.clone()).ok();
        snapshot
    }

    /// Run the whole flow: permission, position, then one fetch cycle.
    ///
    /// Returns the state the flow settled in. Ignored (returning the current snapshot)
    /// while another cycle is in flight.
    pub async fn start(&self) -> Arc<ScreenState> {
        let Some(_guard) = FlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("start requested while a fetch cycle is in flight, ignoring");
            return self.snapshot();
        };

        self.publish(ScreenState::PermissionRequested);

        match self.location.request_foreground_permission().await {
            Ok(Permission::Granted) => {}
            Ok(Permission::Denied) => {
                tracing::warn!("location permission denied");
                return self.publish(ScreenState::PermissionDenied);
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "location permission request failed");
                return self.publish(ScreenState::FetchFailed {
                    error: ScreenError::LocationUnavailable(format!("{e:#}")),
                    refresh_coords: None,
                });
            }
        }

        let coords = match self.location.current_position().await {
            Ok(coords) => coords,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "could not acquire position");
                return self.publish(ScreenState::FetchFailed {
                    error: ScreenError::LocationUnavailable(format!("{e:#}")),
                    refresh_coords: None,
                });
            }
        };

        tracing::info!(%coords, "location acquired");
        self.publish(ScreenState::LocationAcquired { coords });

        self.fetch_cycle(coords, None, false).await
    }

    /// Pull-to-refresh: refetch for the last known coordinates.
    ///
    /// Never asks the location provider again.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = FlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("refresh requested while a fetch cycle is in flight, ignoring");
            return RefreshOutcome::Ignored;
        };

        let snapshot = self.snapshot();
        let (coords, shown) = match &*snapshot {
            ScreenState::WeatherLoaded { report, .. } => (report.coords, Some(report.clone())),
            ScreenState::FetchFailed { refresh_coords: Some(coords), .. } => (*coords, None),
            other => {
                tracing::debug!(state = other.name(), "nothing to refresh");
                return RefreshOutcome::Ignored;
            }
        };

        tracing::info!(%coords, "refreshing weather");
        RefreshOutcome::Settled(self.fetch_cycle(coords, shown, true).await)
    }

    async fn fetch_cycle(
        &self,
        coords: Coordinates,
        shown: Option<Arc<WeatherReport>>,
        refreshable: bool,
    ) -> Arc<ScreenState> {
        match shown {
            Some(report) => self.publish(ScreenState::WeatherLoaded { report, refreshing: true }),
            None => self.publish(ScreenState::FetchingWeather { coords }),
        };

        match fetch_report(self.weather.as_ref(), coords).await {
            Ok(report) => {
                tracing::info!(
                    place = %report.current.name,
                    forecast_entries = report.forecast.len(),
                    "weather loaded"
                );
                self.publish(ScreenState::WeatherLoaded {
                    report: Arc::new(report),
                    refreshing: false,
                })
            }
            Err(error) => {
                tracing::error!(%error, "weather fetch failed");
                self.publish(ScreenState::FetchFailed {
                    error,
                    refresh_coords: refreshable.then_some(coords),
                })
            }
        }
    }
}
