//! Enumeration types for the Solo Quest progression core.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Appraisal rank
// ---------------------------------------------------------------------------

/// The graded quality of a voice report.
///
/// Wire values are uppercase (`"S"`, `"A"`, `"B"`, `"C"`, `"RETRY"`) to
/// match the JSON the grading model is instructed to emit. [`Rank::Retry`]
/// is the inaudible sentinel: the report could not be heard and the player
/// should be asked to try again. It is never written to the appraisal log;
/// a second consecutive inaudible attempt is forced to [`Rank::C`] before
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum Rank {
    /// An outstanding report: specific, energetic, beyond expectations.
    S,
    /// A solid, clear report.
    A,
    /// An ordinary or subdued report.
    B,
    /// A minimal report, or the forced fallback after repeated failures.
    C,
    /// Inaudible; the player is asked to report again.
    Retry,
}

impl Rank {
    /// True if this rank is a terminal grading outcome (anything but the
    /// inaudible sentinel).
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Retry)
    }
}

impl core::fmt::Display for Rank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::Retry => "RETRY",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rank_uses_uppercase_wire_values() {
        assert_eq!(serde_json::to_string(&Rank::S).unwrap(), "\"S\"");
        assert_eq!(serde_json::to_string(&Rank::Retry).unwrap(), "\"RETRY\"");

        let parsed: Rank = serde_json::from_str("\"RETRY\"").unwrap();
        assert_eq!(parsed, Rank::Retry);
    }

    #[test]
    fn only_retry_is_non_terminal() {
        assert!(Rank::S.is_terminal());
        assert!(Rank::A.is_terminal());
        assert!(Rank::B.is_terminal());
        assert!(Rank::C.is_terminal());
        assert!(!Rank::Retry.is_terminal());
    }
}
