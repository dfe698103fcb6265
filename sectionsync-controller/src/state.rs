//! Fetch lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a results controller is in its fetch lifecycle.
///
/// `Initial → Loading → Loaded`; every new fetch goes back to `Loading`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    /// No fetch has been performed yet.
    #[default]
    Initial,
    /// A fetch was issued and its first results have not arrived.
    Loading,
    /// The current fetch has delivered results at least once.
    Loaded,
}

impl FetchState {
    /// Returns true once the current fetch has delivered results.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_initial() {
        assert_eq!(FetchState::default(), FetchState::Initial);
        assert!(!FetchState::Loading.is_loaded());
        assert!(FetchState::Loaded.is_loaded());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&FetchState::Loaded).unwrap();
        assert_eq!(json, "\"loaded\"");
        let back: FetchState = serde_json::from_str("\"loading\"").unwrap();
        assert_eq!(back, FetchState::Loading);
    }
}
