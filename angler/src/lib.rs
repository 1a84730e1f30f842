//! # angler: unattended fishing client
//!
//! Connects to the game server, answers the login prompt, keeps the
//! fishing loop running and reconnects after every drop.
//!
//! Follow-up actions (eating, selling, buying, poisoning) come from a
//! rule-based advisor fed by inventory and market reports and, for
//! poisoning, the public leaderboard.

pub mod config;
pub mod console;
pub mod leaderboard;
pub mod rules;
pub mod service;
