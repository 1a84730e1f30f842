//! Turns the unframed inbound text stream into typed session events.
//!
//! Most markers are matched against the chunk that just arrived. The
//! inventory report is the exception: it spans several reads, so it is
//! matched against everything buffered since the last reset and handed
//! over whole.

use std::sync::LazyLock;

use regex::Regex;

static COOLDOWN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:wait|cooldown)[^\d]*(\d+)\s?(second|minute)s?").expect("static regex")
});

/// Raw buffer size beyond which the oldest half is discarded.
pub const MAX_BUFFER_LEN: usize = 256 * 1024;

// ── Markers ──────────────────────────────────────────────────────

/// Literal texts the server uses to announce prompts and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub credential_prompt: String,
    pub skip_animation: String,
    pub market_header: String,
    /// Player-specific, e.g. `Inventory for <player>`.
    pub inventory_header: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            credential_prompt: "Enter your Operative ID (invite code):".into(),
            skip_animation: "Press any key now to skip animations".into(),
            market_header: "MARKET ITEMS".into(),
            inventory_header: "Inventory for".into(),
        }
    }
}

// ── Events ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server asks for the invitation code.
    CredentialRequested,
    /// The intro animation can be skipped with a keystroke.
    SkipProbe,
    /// The server announced how long to wait before acting again.
    CooldownAnnounced { millis: u64 },
    /// A market listing arrived; `text` is the whole chunk.
    MarketReportComplete { text: String },
    /// An inventory report finished; `text` is the reassembled buffer.
    InventoryReportComplete { text: String },
}

/// Result of feeding one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// Lines completed by this chunk, without terminators.
    pub lines: Vec<String>,
    /// Events in priority order.
    pub events: Vec<SessionEvent>,
}

// ── EventSegmenter ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EventSegmenter {
    markers: Markers,
    /// Everything received since the last reset.
    buffer: String,
    /// Tail of the last chunk that did not end in a newline.
    partial_line: String,
}

impl EventSegmenter {
    pub fn new(markers: Markers) -> Self {
        Self {
            markers,
            buffer: String::new(),
            partial_line: String::new(),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Forget everything buffered. Used on reconnect.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.partial_line.clear();
    }

    /// Start measuring the next inventory report from a clean slate.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    pub fn feed(&mut self, chunk: &str) -> Segment {
        self.buffer.push_str(chunk);
        self.bound_buffer();

        let lines = self.split_lines(chunk);
        let mut events = Vec::new();

        if chunk.contains(&self.markers.credential_prompt) {
            events.push(SessionEvent::CredentialRequested);
            return Segment { lines, events };
        }

        if chunk.contains(&self.markers.skip_animation) {
            events.push(SessionEvent::SkipProbe);
        }

        if let Some(millis) = parse_cooldown(chunk) {
            events.push(SessionEvent::CooldownAnnounced { millis });
        }

        if chunk.contains(&self.markers.market_header) {
            events.push(SessionEvent::MarketReportComplete {
                text: chunk.to_string(),
            });
        }

        if self.buffer.contains(&self.markers.inventory_header) {
            let text = std::mem::take(&mut self.buffer);
            events.push(SessionEvent::InventoryReportComplete { text });
        }

        Segment { lines, events }
    }

    fn split_lines(&mut self, chunk: &str) -> Vec<String> {
        self.partial_line.push_str(chunk);
        let Some(last_newline) = self.partial_line.rfind('\n') else {
            if self.partial_line.len() > MAX_BUFFER_LEN {
                return vec![std::mem::take(&mut self.partial_line)];
            }
            return Vec::new();
        };
        let rest = self.partial_line.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial_line, rest);
        complete
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    fn bound_buffer(&mut self) {
        if self.buffer.len() <= MAX_BUFFER_LEN {
            return;
        }
        let mut cut = self.buffer.len() - MAX_BUFFER_LEN / 2;
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }
        self.buffer.drain(..cut);
    }
}

/// Cooldown in milliseconds announced by `text`, if any.
pub fn parse_cooldown(text: &str) -> Option<u64> {
    let caps = COOLDOWN_RE.captures(text)?;
    let amount: u64 = caps[1].parse().ok()?;
    let unit = caps[2].to_ascii_lowercase();
    let per_unit = if unit.starts_with("minute") { 60_000 } else { 1_000 };
    Some(amount.saturating_mul(per_unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> EventSegmenter {
        EventSegmenter::new(Markers {
            inventory_header: "Inventory for deltadax".into(),
            ..Markers::default()
        })
    }

    #[test]
    fn cooldown_seconds_scenario() {
        let mut seg = segmenter();
        let out = seg.feed("Please wait 45 seconds before fishing again");
        assert_eq!(out.events, vec![SessionEvent::CooldownAnnounced { millis: 45_000 }]);
    }

    #[test]
    fn cooldown_units_and_case() {
        assert_eq!(parse_cooldown("Cooldown activated: 2 minutes"), Some(120_000));
        assert_eq!(parse_cooldown("COOLDOWN 1 minute left"), Some(60_000));
        assert_eq!(parse_cooldown("please WAIT 1 second"), Some(1_000));
        assert_eq!(parse_cooldown("wait for it... 30seconds"), Some(30_000));
        assert_eq!(parse_cooldown("You caught 3 fish in 10 seconds"), None);
        assert_eq!(parse_cooldown("wait a moment"), None);
        assert_eq!(
            parse_cooldown("Please wait 999999999999999 minutes"),
            Some(u64::MAX)
        );
        assert_eq!(parse_cooldown("wait 99999999999999999999 seconds"), None);
    }

    #[test]
    fn credential_prompt_short_circuits() {
        let mut seg = segmenter();
        let out = seg.feed(
            "Press any key now to skip animations\nEnter your Operative ID (invite code): ",
        );
        assert_eq!(out.events, vec![SessionEvent::CredentialRequested]);
    }

    #[test]
    fn one_chunk_can_raise_several_events() {
        let mut seg = segmenter();
        let chunk = "Please wait 10 seconds\n🛒 MARKET ITEMS\n[1] Bait - lure - 5 gold\n";
        let out = seg.feed(chunk);
        assert_eq!(
            out.events,
            vec![
                SessionEvent::CooldownAnnounced { millis: 10_000 },
                SessionEvent::MarketReportComplete {
                    text: chunk.to_string()
                },
            ]
        );
    }

    #[test]
    fn skip_probe_fires_on_marker() {
        let mut seg = segmenter();
        let out = seg.feed("Loading...\nPress any key now to skip animations\n");
        assert_eq!(out.events, vec![SessionEvent::SkipProbe]);
    }

    #[test]
    fn inventory_is_reassembled_across_chunks() {
        let mut seg = segmenter();
        assert!(seg.feed("You caught a carp\n").events.is_empty());
        let out = seg.feed("📦 Inventory for deltadax\nGold: 10\n");
        let Some(SessionEvent::InventoryReportComplete { text }) = out.events.last() else {
            panic!("expected inventory event, got {:?}", out.events);
        };
        assert_eq!(text, "You caught a carp\n📦 Inventory for deltadax\nGold: 10\n");
        assert!(seg.buffer().is_empty());
    }

    #[test]
    fn inventory_header_split_across_chunks() {
        let mut seg = segmenter();
        assert!(seg.feed("📦 Inventory fo").events.is_empty());
        let out = seg.feed("r deltadax\n");
        assert!(matches!(
            out.events.as_slice(),
            [SessionEvent::InventoryReportComplete { .. }]
        ));
    }

    #[test]
    fn unmatched_chunk_is_inert() {
        let mut seg = segmenter();
        let out = seg.feed("The sea is calm today.\n");
        assert!(out.events.is_empty());
        assert_eq!(out.lines, vec!["The sea is calm today."]);
    }

    #[test]
    fn partial_lines_carry_over() {
        let mut seg = segmenter();
        assert!(seg.feed("You caught ").lines.is_empty());
        let out = seg.feed("a carp\r\nand a ");
        assert_eq!(out.lines, vec!["You caught a carp"]);
        let out = seg.feed("boot\n");
        assert_eq!(out.lines, vec!["and a boot"]);
    }

    #[test]
    fn reset_and_clear() {
        let mut seg = segmenter();
        seg.feed("half a line");
        seg.clear_buffer();
        assert!(seg.buffer().is_empty());
        seg.feed("more");
        seg.reset();
        assert!(seg.buffer().is_empty());
        assert!(seg.feed("fresh\n").lines == vec!["fresh"]);
    }

    #[test]
    fn buffer_is_bounded() {
        let mut seg = segmenter();
        let big = "🐟".repeat(MAX_BUFFER_LEN / 4 + 10);
        seg.feed(&big);
        assert!(seg.buffer().len() <= MAX_BUFFER_LEN);
    }
}
