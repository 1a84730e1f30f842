//! Extraction of structured data from the server's report text.
//!
//! Both parsers are total: a field whose pattern does not match falls
//! back to zero or empty instead of failing the whole report.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::game::{FishRecord, MarketItem, Rarity};

static GOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGold:\s?([\d,]+)").expect("static regex"));

static XP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:XP|Experience):\s?([\d,]+)").expect("static regex"));

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\p{L}\p{N}]*(\p{L}[\p{L} ]*):\s*$").expect("static regex")
});

static FISH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^\p{L}\p{N}]*(?P<name>[^()]+?)\s*\((?P<rarity>[^)]+)\)(?:\s*-\s*x(?P<qty>\d+))?(?:.*?XP:\s*(?P<xp>\d+))?(?:.*?Gold:\s*(?P<gold>\d+))?",
    )
    .expect("static regex")
});

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^\p{L}\p{N}]*(?:(?P<id>[A-Za-z0-9_-]*\d[A-Za-z0-9_-]*)\s+)?(?P<name>[^(]+?)(?:\s*\([^)]*\))?(?:\s*-?\s*x(?P<qty>\d+))?\s*$",
    )
    .expect("static regex")
});

static MARKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+)\]\s*(.*?)\s+-\s+(.*?)\s+-\s+(\d+)\s*gold").expect("static regex")
});

const ENHANCED_ROD: &str = "enhanced fishing rod";

// ── Inventory ────────────────────────────────────────────────────

/// Everything extracted from one inventory report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryReport {
    pub gold: u64,
    pub xp: u64,
    /// Item name → count of identical entries.
    pub items: BTreeMap<String, u32>,
    pub fish: Vec<FishRecord>,
    /// Identifier of the first enhanced rod listed, if any.
    pub rod: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Fish,
    Items,
    Other,
}

pub fn parse_inventory(text: &str) -> InventoryReport {
    let mut report = InventoryReport {
        gold: first_number(&GOLD_RE, text),
        xp: first_number(&XP_RE, text),
        ..Default::default()
    };

    let mut section = Section::Header;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(caps) = SECTION_RE.captures(trimmed) {
            section = match caps[1].trim().to_ascii_lowercase().as_str() {
                "fish" => Section::Fish,
                "items" => Section::Items,
                _ => Section::Other,
            };
            continue;
        }

        match section {
            Section::Fish => {
                if let Some(fish) = parse_fish_line(trimmed) {
                    report.fish.push(fish);
                }
            }
            Section::Items => parse_item_line(trimmed, &mut report),
            Section::Header | Section::Other => {}
        }
    }

    report
}

fn parse_fish_line(line: &str) -> Option<FishRecord> {
    let caps = FISH_RE.captures(line)?;
    let display = caps.name("name")?.as_str();
    Some(FishRecord {
        name: base_name(display),
        rarity: Rarity::parse(&caps["rarity"]),
        quantity: caps
            .name("qty")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1),
        gold_value: caps
            .name("gold")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0),
        xp_value: caps
            .name("xp")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0),
    })
}

fn parse_item_line(line: &str, report: &mut InventoryReport) {
    let Some(caps) = ITEM_RE.captures(line) else {
        return;
    };
    let name = caps["name"].trim().to_string();
    if name.is_empty() {
        return;
    }
    let count = caps
        .name("qty")
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1);

    if report.rod.is_none() && name.to_ascii_lowercase().contains(ENHANCED_ROD) {
        if let Some(id) = caps.name("id") {
            report.rod = Some(id.as_str().to_string());
        }
    }

    *report.items.entry(name).or_insert(0) += count;
}

/// The species token the server expects: first word of the display
/// name, without a trailing possessive.
pub fn base_name(display: &str) -> String {
    let first = display.split_whitespace().next().unwrap_or("");
    first
        .strip_suffix("'s")
        .or_else(|| first.strip_suffix("’s"))
        .unwrap_or(first)
        .to_string()
}

fn first_number(re: &Regex, text: &str) -> u64 {
    re.captures(text)
        .and_then(|c| c[1].replace(',', "").parse().ok())
        .unwrap_or(0)
}

// ── Market ───────────────────────────────────────────────────────

/// Every `[<index>] <name> - <description> - <price> gold` line, one
/// entry per name at its lowest price, in first-seen order.
pub fn parse_market(text: &str) -> Vec<MarketItem> {
    let mut items: Vec<MarketItem> = Vec::new();

    for line in text.lines() {
        let Some(caps) = MARKET_RE.captures(line) else {
            continue;
        };
        let (Ok(index), Ok(price)) = (caps[1].parse::<u32>(), caps[4].parse::<u64>()) else {
            continue;
        };
        let item = MarketItem {
            index,
            name: caps[2].trim().to_string(),
            description: caps[3].trim().to_string(),
            price,
        };

        match items.iter_mut().find(|existing| existing.name == item.name) {
            Some(existing) if item.price < existing.price => *existing = item,
            Some(_) => {}
            None => items.push(item),
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVENTORY: &str = "\
📦 Inventory for deltadax
💰 Gold: 1520
⭐ XP: 880
Fish:
🐟 Thunder Fin (legendary) - x2 - XP: 10, Gold: 50
🐠 Ghost Koi (epic) - x1 - XP: 25, Gold: 40
🐟 Neptune's Carp (common) - x4 - XP: 1, Gold: 3
Items:
🎣 r-77 Enhanced Fishing Rod (+10% luck)
🎣 r-91 Enhanced Fishing Rod (+10% luck)
🧪 Poison of Delay
🧪 Poison of Delay
";

    #[test]
    fn parses_header_numbers() {
        let report = parse_inventory(INVENTORY);
        assert_eq!(report.gold, 1520);
        assert_eq!(report.xp, 880);
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let report = parse_inventory("Inventory for deltadax\nFish:\nItems:\n");
        assert_eq!(report.gold, 0);
        assert_eq!(report.xp, 0);
        assert!(report.fish.is_empty());
        assert!(report.items.is_empty());
    }

    #[test]
    fn fish_section_yields_base_names() {
        let report = parse_inventory(INVENTORY);
        let names: Vec<_> = report.fish.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Thunder", "Ghost", "Neptune"]);
        assert_eq!(report.fish[0].rarity, Rarity::Legendary);
        assert_eq!(report.fish[2].quantity, 4);
    }

    #[test]
    fn scenario_single_legendary_fish() {
        let report =
            parse_inventory("Fish:\n🐟 Thunder Fin (legendary) - x2 - XP: 10, Gold: 50\nItems:\n");
        assert_eq!(
            report.fish,
            vec![FishRecord {
                name: "Thunder".into(),
                rarity: Rarity::Legendary,
                quantity: 2,
                gold_value: 50,
                xp_value: 10,
            }]
        );
    }

    #[test]
    fn items_are_counted_and_first_rod_wins() {
        let report = parse_inventory(INVENTORY);
        assert_eq!(report.items.get("Poison of Delay"), Some(&2));
        assert_eq!(report.items.get("Enhanced Fishing Rod"), Some(&2));
        assert_eq!(report.rod.as_deref(), Some("r-77"));
    }

    #[test]
    fn rod_without_identifier_is_not_usable() {
        let report = parse_inventory("Items:\n🎣 Enhanced Fishing Rod\n");
        assert_eq!(report.items.get("Enhanced Fishing Rod"), Some(&1));
        assert!(report.rod.is_none());
    }

    #[test]
    fn items_section_ends_at_next_header() {
        let report = parse_inventory("Items:\nLucky Charm\nStats:\nStrength 5\n");
        assert_eq!(report.items.len(), 1);
        assert!(report.items.contains_key("Lucky Charm"));
    }

    #[test]
    fn base_name_strips_possessive() {
        assert_eq!(base_name("Neptune's Carp"), "Neptune");
        assert_eq!(base_name("Kraken’s Eye"), "Kraken");
        assert_eq!(base_name("Carp"), "Carp");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn market_lines_are_parsed() {
        let text = "🛒 MARKET ITEMS\n[1] Bait - cheap lure - 10 gold\nnoise\n[2] Net - wide - 250 gold\n";
        let items = parse_market(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].index, 2);
        assert_eq!(items[1].name, "Net");
        assert_eq!(items[1].description, "wide");
        assert_eq!(items[1].price, 250);
    }

    #[test]
    fn market_dedupes_keeping_lowest_price() {
        let items = parse_market("[1] Potion - heal - 100 gold\n[2] Potion - heal - 80 gold\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Potion");
        assert_eq!(items[0].price, 80);
        assert_eq!(items[0].index, 2);

        let items = parse_market("[1] Potion - heal - 80 gold\n[2] Potion - heal - 100 gold\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].index, 1);
    }
}
