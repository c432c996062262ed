use civsim_cli::{parse_ruleset, Game, GameConfig, DEFAULT_RULESET};
use civsim_core::CivId;

fn config(seed: u64, civs: usize) -> GameConfig {
    GameConfig {
        width: 48,
        height: 32,
        seed,
        civs,
        debug_civ: Some(CivId::new(1)),
    }
}

fn play(seed: u64, rounds: u32) -> Game {
    let ruleset = parse_ruleset(DEFAULT_RULESET).expect("default rule set is valid");
    let mut game = Game::new(&config(seed, 3), ruleset).expect("game starts");
    while game.round_number() <= rounds {
        if game.play_turn().is_none() {
            break;
        }
        let _ = game.drain_messages();
    }
    game
}

#[test]
fn every_nation_starts_with_settlers_and_an_escort() {
    let ruleset = parse_ruleset(DEFAULT_RULESET).expect("default rule set is valid");
    let game = Game::new(&config(5, 3), ruleset).expect("game starts");

    let report = game.report();

    assert_eq!(report.len(), 3);
    for civ in &report {
        let settlers = civ.built.get("Settlers");
        let warriors = civ.built.get("Warriors");
        assert_eq!(settlers, Some(&1), "{} lacks settlers", civ.name);
        assert_eq!(warriors, Some(&1), "{} lacks warriors", civ.name);
        assert_eq!(civ.points, 0);
    }
}

#[test]
fn games_are_reproducible_per_seed() {
    let first = play(11, 15);
    let second = play(11, 15);

    assert_eq!(first.report(), second.report());
    assert!(first.round_number() > 15);
}

#[test]
fn settlers_found_cities_that_score_points() {
    let game = play(2, 10);

    let standings = game.report();
    assert!(standings
        .iter()
        .any(|civ| civ.cities > 0 && civ.points > 0));
}

#[test]
fn more_nations_than_listed_are_rejected() {
    let ruleset = parse_ruleset(DEFAULT_RULESET).expect("default rule set is valid");
    let error = Game::new(&config(1, 9), ruleset).expect_err("only five nations exist");

    assert!(error.to_string().contains("requested 9 civilizations"));
}
