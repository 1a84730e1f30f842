//! Deterministic advisor.
//!
//! - **Eat**: nothing extra; the engine already eats legendary and epic
//!   fish.
//! - **Sale**: every other fish, while selling.
//! - **Purchase**: the cheapest affordable item not already owned, while
//!   buying and above the gold floor.
//! - **Poison**: the best-ranked player above us, skipping allies and
//!   anyone poisoned recently.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::info;

use angler_core::{
    Advice, Advisor, AnglerError, Command, GameState, Intent, LeaderboardSource, fetch_or_empty,
};

use crate::config::AnglerConfig;

pub struct RuleAdvisor {
    player: String,
    min_purchase_gold: u64,
    price_caps: BTreeMap<String, u64>,
    leaderboard: Option<Arc<dyn LeaderboardSource>>,
    alliance: Vec<String>,
    poison_kind: String,
    poison_cooldown: Duration,
    /// Username → when we last poisoned them.
    poisoned: Mutex<HashMap<String, Instant>>,
}

impl RuleAdvisor {
    pub fn new(config: &AnglerConfig, leaderboard: Option<Arc<dyn LeaderboardSource>>) -> Self {
        let advisor = &config.advisor;
        Self {
            player: config.session.player.clone(),
            min_purchase_gold: advisor.min_purchase_gold,
            price_caps: advisor.price_caps.clone(),
            leaderboard,
            alliance: advisor.alliance.clone(),
            poison_kind: advisor.poison_kind.clone(),
            poison_cooldown: Duration::from_secs(advisor.poison_cooldown_secs),
            poisoned: Mutex::new(HashMap::new()),
        }
    }

    fn sale(&self, state: &GameState) -> Advice {
        if !state.selling() {
            return Advice::NoAction;
        }
        commands(
            state
                .fish_to_sell
                .iter()
                .map(|f| Command::Sell {
                    name: f.name.clone(),
                    quantity: f.quantity,
                }),
        )
    }

    fn purchase(&self, state: &GameState) -> Advice {
        if !state.buying() {
            return Advice::NoAction;
        }
        if state.gold < self.min_purchase_gold {
            info!(gold = state.gold, "not enough gold to buy anything");
            return Advice::NoAction;
        }
        let pick = state
            .market
            .iter()
            .filter(|item| item.price <= state.gold)
            .filter(|item| !state.owns(&item.name))
            .filter(|item| {
                self.price_caps
                    .get(&item.name)
                    .is_none_or(|cap| item.price <= *cap)
            })
            .min_by_key(|item| item.price);
        match pick {
            Some(item) => commands([Command::Buy(item.index)]),
            None => Advice::NoAction,
        }
    }

    async fn poison(&self) -> Advice {
        let Some(source) = &self.leaderboard else {
            return Advice::NoAction;
        };
        let players = fetch_or_empty(source.as_ref()).await;
        let Some(my_rank) = players
            .iter()
            .find(|p| p.username == self.player)
            .map(|p| p.rank)
        else {
            info!(player = %self.player, "not ranked yet");
            return Advice::NoAction;
        };

        let now = Instant::now();
        let mut poisoned = self.poisoned.lock().unwrap_or_else(PoisonError::into_inner);
        let target = players
            .iter()
            .filter(|p| p.rank < my_rank)
            .filter(|p| !self.alliance.iter().any(|a| a.eq_ignore_ascii_case(&p.username)))
            .filter(|p| {
                poisoned
                    .get(&p.username)
                    .is_none_or(|at| now.duration_since(*at) >= self.poison_cooldown)
            })
            .min_by_key(|p| p.rank);

        match target {
            Some(p) => {
                poisoned.insert(p.username.clone(), now);
                commands([Command::Poison {
                    target: p.username.clone(),
                    kind: self.poison_kind.clone(),
                }])
            }
            None => {
                info!("no valid poison targets");
                Advice::NoAction
            }
        }
    }
}

fn commands(cmds: impl IntoIterator<Item = Command>) -> Advice {
    let lines: Vec<String> = cmds.into_iter().map(|c| c.to_string()).collect();
    if lines.is_empty() {
        Advice::NoAction
    } else {
        Advice::Commands(lines)
    }
}

#[async_trait]
impl Advisor for RuleAdvisor {
    async fn advise(&self, snapshot: &GameState, intent: Intent) -> Result<Advice, AnglerError> {
        Ok(match intent {
            Intent::Eat => Advice::NoAction,
            Intent::Sale => self.sale(snapshot),
            Intent::Purchase => self.purchase(snapshot),
            Intent::Poison => self.poison().await,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
