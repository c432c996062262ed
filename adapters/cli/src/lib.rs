#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that plays seeded civsim games from a TOML rule set.

pub mod game;
pub mod ruleset;

pub use game::{CivReport, Game, GameConfig, MessageLine};
pub use ruleset::{load_ruleset, parse_ruleset, Nation, Ruleset, DEFAULT_RULESET};
