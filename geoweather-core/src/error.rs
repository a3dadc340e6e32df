use thiserror::Error;

pub const PERMISSION_MESSAGE: &str = "Location permission is required to fetch weather data.";
pub const PERMISSION_HINT: &str =
    "Please enable location services in your device settings and try again.";
pub const UNAVAILABLE_MESSAGE: &str = "Unable to load weather data";

/// Why a screen ended up without weather to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("weather request failed: {0}")]
    Network(String),

    /// Current conditions arrived but the forecast did not; nothing is committed.
    #[error("forecast request failed after current conditions loaded: {0}")]
    PartialData(String),
}

impl ScreenError {
    /// Static, user-facing text for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            ScreenError::PermissionDenied => PERMISSION_MESSAGE,
            ScreenError::LocationUnavailable(_)
            | ScreenError::Network(_)
            | ScreenError::PartialData(_) => UNAVAILABLE_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_are_static() {
        assert_eq!(ScreenError::PermissionDenied.user_message(), PERMISSION_MESSAGE);
        assert_eq!(
            ScreenError::PartialData("boom".into()).user_message(),
            UNAVAILABLE_MESSAGE
        );
        assert_eq!(
            ScreenError::LocationUnavailable("timeout".into()).user_message(),
            UNAVAILABLE_MESSAGE
        );
    }

    #[test]
    fn display_keeps_detail() {
        let err = ScreenError::Network("status 500".into());
        assert!(err.to_string().contains("status 500"));
    }
}
