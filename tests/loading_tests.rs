use pokemon_battle_engine::batch::simulate_many;
use pokemon_battle_engine::config::BattleConfig;
use pokemon_battle_engine::sim::ai::RandomSelector;
use pokemon_battle_engine::sim::effects::{AbilityKind, ItemKind};
use pokemon_battle_engine::sim::rng::SeededRng;
use pokemon_battle_engine::types::Type;
use pokemon_battle_engine::{load_battle, Battle};
use std::path::PathBuf;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/battle.json")
}

#[test]
fn demo_battle_file_loads() {
    let loaded = load_battle(&demo_path()).unwrap();
    assert_eq!(loaded.side_a.name, "Charizard");
    assert_eq!(loaded.side_a.types, vec![Type::Fire, Type::Flying]);
    assert_eq!(loaded.side_a.ability, AbilityKind::Blaze);
    assert_eq!(loaded.side_b.item_kind(), Some(ItemKind::Leftovers));
    assert_eq!(loaded.side_a.moves.len(), 4);
    assert_eq!(loaded.config.max_turns, 200);
    assert_eq!(loaded.config.seed, 42);
    assert!(loaded.side_a.current_hp == loaded.side_a.max_hp());
}

#[test]
fn seeded_battle_replays_exactly() {
    let loaded = load_battle(&demo_path()).unwrap();
    let play = |seed: u64| {
        let mut battle = Battle::new(
            loaded.side_a.clone(),
            loaded.side_b.clone(),
            &loaded.chart,
            loaded.config.clone(),
        )
        .unwrap();
        let mut rng = SeededRng::new(seed);
        let mut a = RandomSelector::new(seed ^ 0xA);
        let mut b = RandomSelector::new(seed ^ 0xB);
        let outcome = battle.run(&mut a, &mut b, &mut rng).unwrap();
        (outcome, battle.log().render_lines())
    };
    let first = play(9);
    let second = play(9);
    assert_eq!(first, second);
    assert!(first.1.iter().any(|line| line.starts_with("|turn|1")));
}

#[test]
fn parallel_batch_counts_every_battle() {
    let loaded = load_battle(&demo_path()).unwrap();
    let tally =
        simulate_many(&loaded.side_a, &loaded.side_b, &loaded.chart, &loaded.config, 24).unwrap();
    assert_eq!(tally.total(), 24);
    assert!((0.0..=1.0).contains(&tally.win_rate()));
}

/// Loads the demo file with one substitution applied, returning the error text.
fn load_error(tag: &str, from: &str, to: &str) -> String {
    let dir = std::env::temp_dir().join(format!("battle-engine-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bad.json");
    let raw = std::fs::read_to_string(demo_path()).unwrap();
    assert!(raw.contains(from));
    std::fs::write(&path, raw.replacen(from, to, 1)).unwrap();
    let err = load_battle(&path).unwrap_err();
    let _ = std::fs::remove_dir_all(&dir);
    format!("{err:#}")
}

#[test]
fn malformed_battle_file_is_rejected() {
    let err = load_error("level", "\"level\": 50", "\"level\": 0");
    assert!(err.contains("level"));
}

#[test]
fn out_of_range_iv_is_rejected() {
    let err = load_error("iv", "\"ivs\": { \"hp\": 31", "\"ivs\": { \"hp\": 5000");
    assert!(err.contains("iv hp 5000 outside 0..=31"), "{err}");
}

#[test]
fn oversized_base_stat_is_rejected_without_overflow() {
    let err = load_error("base", "\"base\": { \"hp\": 78", "\"base\": { \"hp\": 3000000000");
    assert!(err.contains("base hp 3000000000 outside 1..=255"), "{err}");
}

#[test]
fn ev_total_is_capped() {
    let err = load_error("evs", "\"evs\": { \"hp\": 4,", "\"evs\": { \"hp\": 252,");
    assert!(err.contains("ev total 756 above 510"), "{err}");
}

#[test]
fn config_file_overrides_defaults() {
    let dir = std::env::temp_dir().join(format!("battle-engine-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{ "max_turns": 12, "seed": 7 }"#).unwrap();
    let config = BattleConfig::from_path(&path).unwrap();
    assert_eq!(config.max_turns, 12);
    assert_eq!(config.seed, 7);
    assert_eq!(config.max_selection_attempts, 3);

    std::fs::write(&path, r#"{ "max_turns": "many" }"#).unwrap();
    let err = BattleConfig::from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"));
    let _ = std::fs::remove_dir_all(&dir);
}
