use thiserror::Error;

pub const USAGE_HINT: &str =
    "Try: show luxury hotels / change day 2 to shopping / choose hotel 2 / show last trip";

/// Recoverable conditions reported back to the user as the reply text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConciergeError {
    #[error("Destination not recognized. Available cities: {}.", .known.join(", "))]
    UnresolvedDestination { known: Vec<String> },

    #[error("Destination '{city}' not found in dataset.")]
    DatasetMiss { city: String },

    #[error("No previous trips found in memory.")]
    NoHistory,

    #[error("Please plan a trip first.")]
    NoActiveSession,

    #[error("Invalid selection: {reason}")]
    InvalidSelection { reason: String },

    #[error("{}", USAGE_HINT)]
    UnrecognizedCommand,
}

impl ConciergeError {
    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UnresolvedDestination { .. } => "unresolved_destination",
            Self::DatasetMiss { .. } => "dataset_miss",
            Self::NoHistory => "no_history",
            Self::NoActiveSession => "no_active_session",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::UnrecognizedCommand => "unrecognized_command",
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed reading dataset at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset contains no cities")]
    Empty,

    #[error("city '{city}' has no hotels")]
    CityWithoutHotels { city: String },
}
