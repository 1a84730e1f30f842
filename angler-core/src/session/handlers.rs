//! Inventory and market report handling.
//!
//! Both handlers run on their own task so a slow advisor never holds
//! up chunk processing.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use super::{Link, Session, lock};
use crate::advisor::Intent;
use crate::error::AnglerError;
use crate::message::Command;
use crate::report::{parse_inventory, parse_market};

/// Holds the inventory in-progress flag; dropping it clears the flag.
pub(crate) struct InventoryGuard {
    session: Arc<Session>,
}

impl InventoryGuard {
    pub(crate) fn acquire(session: &Arc<Session>) -> Option<Self> {
        session
            .inventory_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                session: session.clone(),
            })
    }
}

impl Drop for InventoryGuard {
    fn drop(&mut self) {
        self.session
            .inventory_in_progress
            .store(false, Ordering::SeqCst);
    }
}

pub(crate) async fn handle_inventory(
    session: Arc<Session>,
    link: Link,
    text: String,
    _guard: InventoryGuard,
) {
    let report = parse_inventory(&text);
    let to_eat = {
        let mut game = lock(&session.game);
        game.apply_inventory(&report);
        info!(
            gold = game.gold,
            xp = game.current_xp,
            items = game.inventory.len(),
            eat = game.fish_to_eat.len(),
            sell = game.fish_to_sell.len(),
            future_gold = game.future_gold,
            future_xp = game.future_xp,
            "inventory updated"
        );
        game.fish_to_eat.clone()
    };

    let rod = report.rod;
    let result = async {
        if let Some(rod) = rod {
            info!(%rod, "equipping enhanced rod");
            link.send(Command::Use(rod)).await?;
            session.clock.sleep(session.settings.command_delay).await;
        }
        for fish in to_eat {
            info!(name = %fish.name, quantity = fish.quantity, rarity = ?fish.rarity, "eating");
            link.send(Command::Eat {
                name: fish.name,
                quantity: fish.quantity,
            })
            .await?;
            session.clock.sleep(session.settings.command_delay).await;
        }
        link.send(Command::Market).await?;
        session.consult(&link, Intent::Eat).await?;
        session.consult(&link, Intent::Sale).await
    }
    .await;

    if let Err(e) = result {
        session.lose_link(&link, &e);
    }
}

pub(crate) async fn handle_market(session: Arc<Session>, link: Link, text: String) {
    let items = parse_market(&text);
    info!(items = items.len(), "market updated");
    lock(&session.game).apply_market(items);

    let result = async {
        session.consult(&link, Intent::Purchase).await?;
        session.consult(&link, Intent::Poison).await
    }
    .await;

    if let Err(e) = result {
        session.lose_link(&link, &e);
    }
}

impl Session {
    /// Ask the advisor about `intent` and forward whatever it returns.
    ///
    /// Only transport faults are returned; advisor faults and timeouts
    /// count as no action.
    async fn consult(&self, link: &Link, intent: Intent) -> Result<(), AnglerError> {
        let snapshot = self.snapshot();
        let limit = self.settings.advisor_timeout;
        let reply = tokio::time::timeout(limit, self.advisor.advise(&snapshot, intent))
            .await
            .map_err(|_| AnglerError::Timeout(limit))
            .and_then(|r| r);
        let advice = match reply {
            Ok(advice) => advice,
            Err(e) => {
                warn!(%intent, "advisor failed: {e}");
                return Ok(());
            }
        };
        if advice.is_no_action() {
            debug!(%intent, "advisor: no action");
            return Ok(());
        }
        for command in advice.commands() {
            info!(%intent, "advisor: {command}");
            link.send(Command::Raw(command.clone())).await?;
            self.clock.sleep(self.settings.command_delay).await;
        }
        Ok(())
    }
}
