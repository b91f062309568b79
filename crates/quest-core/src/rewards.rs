//! Reward unlock evaluation.
//!
//! A reward is unlocked once the player's level reaches its target. The
//! "next reward" shown on the home screen is the locked reward with the
//! smallest target level strictly above the current level. Ties on target
//! level resolve to the earliest-created reward; callers pass rewards in
//! creation order (the store lists them ordered by
//! `(target_level, created_at)`), and the evaluator preserves slice order.

use quest_types::Reward;

/// True once the player's level has reached the reward's target.
pub const fn is_unlocked(level: u32, reward: &Reward) -> bool {
    level >= reward.target_level
}

/// The locked reward with the smallest target level strictly greater than
/// `level`, or `None` when everything is unlocked (or the list is empty).
///
/// Stable for a given input set: among equal target levels the first in
/// slice order wins.
pub fn next_reward(level: u32, rewards: &[Reward]) -> Option<&Reward> {
    rewards
        .iter()
        .filter(|reward| reward.target_level > level)
        .min_by_key(|reward| reward.target_level)
}

/// Split a reward list into (unlocked, still locked) by the given level,
/// preserving input order within each half.
pub fn partition_unlocked(level: u32, rewards: &[Reward]) -> (Vec<&Reward>, Vec<&Reward>) {
    rewards.iter().partition(|reward| is_unlocked(level, reward))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use quest_types::{PlayerId, Reward, RewardId};

    use super::*;

    fn reward(title: &str, target_level: u32) -> Reward {
        Reward {
            id: RewardId::new(),
            player_id: PlayerId::new(),
            title: title.to_owned(),
            target_level,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unlocked_iff_level_reaches_target() {
        let ice_cream = reward("ice cream", 5);
        assert!(!is_unlocked(4, &ice_cream));
        assert!(is_unlocked(5, &ice_cream));
        assert!(is_unlocked(6, &ice_cream));
    }

    #[test]
    fn next_reward_picks_closest_unmet_threshold() {
        // Targets [3, 5, 5, 10] with a level-4 player: one of the
        // level-5 rewards, specifically the first-created.
        let rewards = vec![
            reward("sticker", 3),
            reward("ice cream", 5),
            reward("cinema", 5),
            reward("aquarium", 10),
        ];

        let next = next_reward(4, &rewards).unwrap();
        assert_eq!(next.target_level, 5);
        assert_eq!(next.title, "ice cream");
    }

    #[test]
    fn next_reward_is_none_once_everything_is_unlocked() {
        let rewards = vec![reward("sticker", 3), reward("aquarium", 10)];
        assert!(next_reward(10, &rewards).is_none());
        assert!(next_reward(4, &[]).is_none());
    }

    #[test]
    fn tie_break_is_stable_run_to_run() {
        let rewards = vec![reward("first", 7), reward("second", 7)];
        for _ in 0..10 {
            assert_eq!(next_reward(2, &rewards).unwrap().title, "first");
        }
    }

    #[test]
    fn partition_keeps_order_within_halves() {
        let rewards = vec![
            reward("sticker", 3),
            reward("ice cream", 5),
            reward("aquarium", 10),
        ];
        let (unlocked, locked) = partition_unlocked(5, &rewards);
        assert_eq!(
            unlocked.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            vec!["sticker", "ice cream"]
        );
        assert_eq!(locked.len(), 1);
        assert_eq!(locked.first().unwrap().title, "aquarium");
    }
}
