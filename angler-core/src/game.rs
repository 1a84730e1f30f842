//! Process-wide game state shared between report handlers and the
//! advisor.
//!
//! Only the report handlers mutate a [`GameState`]; everybody else
//! works on a cloned snapshot and must assume it may be stale.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::report::InventoryReport;

// ── Rarity ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Other(String),
}

impl Rarity {
    /// Case-insensitive parse; unknown tiers are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "common" => Rarity::Common,
            "uncommon" => Rarity::Uncommon,
            "rare" => Rarity::Rare,
            "epic" => Rarity::Epic,
            "legendary" => Rarity::Legendary,
            _ => Rarity::Other(raw.to_string()),
        }
    }

    /// Legendary and epic fish are eaten for XP; everything else is sold.
    pub fn is_edible(&self) -> bool {
        matches!(self, Rarity::Legendary | Rarity::Epic)
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "common"),
            Rarity::Uncommon => write!(f, "uncommon"),
            Rarity::Rare => write!(f, "rare"),
            Rarity::Epic => write!(f, "epic"),
            Rarity::Legendary => write!(f, "legendary"),
            Rarity::Other(s) => write!(f, "{s}"),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────

/// One fish line of an inventory report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FishRecord {
    /// Base species name, the token `/eat` and `/sell` expect.
    pub name: String,
    pub rarity: Rarity,
    pub quantity: u32,
    /// Gold per fish when sold.
    pub gold_value: u64,
    /// XP per fish when eaten.
    pub xp_value: u64,
}

/// One entry of a market report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketItem {
    pub index: u32,
    pub name: String,
    pub description: String,
    pub price: u64,
}

/// Which phase the advisor should consider active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Selling,
    Buying,
}

// ── GameState ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub gold: u64,
    pub current_xp: u64,
    /// Item name → owned count.
    pub inventory: BTreeMap<String, u32>,
    pub fish_to_eat: Vec<FishRecord>,
    pub fish_to_sell: Vec<FishRecord>,
    /// Deduplicated by name, lowest price kept.
    pub market: Vec<MarketItem>,
    pub owned_items: BTreeSet<String>,
    /// Gold the current fish would fetch if all were sold.
    pub future_gold: u64,
    /// XP the current fish would give if all were eaten.
    pub future_xp: u64,
    pub mode: Mode,
}

impl GameState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn selling(&self) -> bool {
        self.mode == Mode::Selling
    }

    pub fn buying(&self) -> bool {
        self.mode == Mode::Buying
    }

    /// Replace inventory-derived fields with a freshly parsed report.
    pub fn apply_inventory(&mut self, report: &InventoryReport) {
        self.gold = report.gold;
        self.current_xp = report.xp;
        self.inventory = report.items.clone();
        self.owned_items = report.items.keys().cloned().collect();

        let (eat, sell): (Vec<FishRecord>, Vec<FishRecord>) = report
            .fish
            .iter()
            .cloned()
            .partition(|f| f.rarity.is_edible());
        self.fish_to_eat = eat;
        self.fish_to_sell = sell;

        self.future_gold = report
            .fish
            .iter()
            .map(|f| f.gold_value * u64::from(f.quantity))
            .sum();
        self.future_xp = report
            .fish
            .iter()
            .map(|f| f.xp_value * u64::from(f.quantity))
            .sum();
    }

    /// Replace the market snapshot.
    pub fn apply_market(&mut self, items: Vec<MarketItem>) {
        self.market = items;
    }

    pub fn owns(&self, item: &str) -> bool {
        self.owned_items.contains(item)
    }
}
