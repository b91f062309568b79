//! Rank-to-reward policy: XP per rank and the inaudible-retry resolution.
//!
//! Two pure rules live here:
//!
//! - [`xp_for_rank`]: the total mapping from a graded rank to an XP award.
//! - [`resolve_rank`]: what a raw rank means for the current attempt.
//!   The first inaudible result asks the player to report again; a second
//!   consecutive inaudible result is forced to rank C so a session can
//!   never loop forever, while still rewarding the effort.

use quest_types::Rank;

/// XP awarded for each terminal rank.
///
/// S→100, A→50, B→30, C→10. The inaudible sentinel awards nothing.
pub const fn xp_for_rank(rank: Rank) -> u64 {
    match rank {
        Rank::S => 100,
        Rank::A => 50,
        Rank::B => 30,
        Rank::C => 10,
        Rank::Retry => 0,
    }
}

/// The outcome of applying the retry policy to a raw graded rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankResolution {
    /// The attempt is terminal with this rank; award XP and log it.
    Terminal(Rank),
    /// First inaudible result: ask the player to report again. No XP,
    /// no log entry.
    RetryRequested,
}

/// Resolve a raw rank from the grading backend against the retry policy.
///
/// `is_retry` is true when this attempt is already the second of a
/// reporting session. An inaudible second attempt degrades to
/// [`Rank::C`] instead of requesting a third.
pub const fn resolve_rank(rank: Rank, is_retry: bool) -> RankResolution {
    match rank {
        Rank::Retry if is_retry => RankResolution::Terminal(Rank::C),
        Rank::Retry => RankResolution::RetryRequested,
        terminal => RankResolution::Terminal(terminal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_mapping_is_the_fixed_table() {
        assert_eq!(xp_for_rank(Rank::S), 100);
        assert_eq!(xp_for_rank(Rank::A), 50);
        assert_eq!(xp_for_rank(Rank::B), 30);
        assert_eq!(xp_for_rank(Rank::C), 10);
        assert_eq!(xp_for_rank(Rank::Retry), 0);
    }

    #[test]
    fn first_inaudible_requests_retry() {
        assert_eq!(resolve_rank(Rank::Retry, false), RankResolution::RetryRequested);
    }

    #[test]
    fn second_inaudible_is_forced_to_c() {
        assert_eq!(
            resolve_rank(Rank::Retry, true),
            RankResolution::Terminal(Rank::C)
        );
    }

    #[test]
    fn audible_ranks_are_terminal_either_way() {
        for rank in [Rank::S, Rank::A, Rank::B, Rank::C] {
            assert_eq!(resolve_rank(rank, false), RankResolution::Terminal(rank));
            assert_eq!(resolve_rank(rank, true), RankResolution::Terminal(rank));
        }
    }
}
