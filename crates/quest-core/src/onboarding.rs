//! Hero onboarding: create a player profile under the signed-in parent.
//!
//! The per-parent child cap is a soft quota (a policy choice, not a
//! technical constraint). It is enforced inside the store's creation
//! query rather than with a client-side count, so a stale client cannot
//! bypass it by racing two creations.

use tracing::info;

use quest_types::{NewPlayer, Player};

use crate::error::CoreError;
use crate::ports::{Identity, ProgressStore};

/// Create a new hero for the authenticated parent.
///
/// # Errors
///
/// [`CoreError::Unauthorized`] when no parent session exists;
/// [`CoreError::Storage`] for cap violations and write failures.
pub async fn onboard_player<S: ProgressStore, I: Identity>(
    store: &S,
    identity: &I,
    name: String,
    mana_color: String,
    child_cap: u32,
) -> Result<Player, CoreError> {
    let parent_id = identity.current_parent().ok_or(CoreError::Unauthorized)?;

    let player = store
        .create_player(
            NewPlayer {
                parent_id,
                name,
                mana_color,
            },
            child_cap,
        )
        .await?;

    info!(player_id = %player.id, parent_id = %parent_id, "hero created");
    Ok(player)
}
