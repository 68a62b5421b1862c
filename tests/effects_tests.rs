use pokemon_battle_engine::battle_log::{DamageCause, LogKind};
use pokemon_battle_engine::config::BattleConfig;
use pokemon_battle_engine::sim::ai::{Choice, FirstUsable, ScriptedSelector};
use pokemon_battle_engine::sim::battle::Battle;
use pokemon_battle_engine::sim::combatant::Combatant;
use pokemon_battle_engine::sim::field::Weather;
use pokemon_battle_engine::sim::moves::{Move, MoveCategory};
use pokemon_battle_engine::sim::rng::ScriptedRng;
use pokemon_battle_engine::sim::stats::{StageStat, StatBlock};
use pokemon_battle_engine::sim::status::{NonVolatile, Prevented};
use pokemon_battle_engine::sim::Side;
use pokemon_battle_engine::types::{Type, TypeChart};

fn stats(hp: u32, speed: u32) -> StatBlock {
    StatBlock {
        hp,
        attack: 100,
        defense: 100,
        sp_attack: 100,
        sp_defense: 100,
        speed,
    }
}

fn make_mon(name: &str, types: &[Type], stats: StatBlock, moves: Vec<Move>) -> Combatant {
    Combatant::new(name, types.to_vec(), 50, stats, moves).unwrap()
}

fn tackle() -> Move {
    Move::new("Tackle", Type::Normal, MoveCategory::Physical, 40)
}

fn splash() -> Move {
    Move::new("Splash", Type::Normal, MoveCategory::Status, 0)
}

fn status_move(name: &str, move_type: Type) -> Move {
    Move::new(name, move_type, MoveCategory::Status, 0)
}

#[test]
fn sandstorm_chips_non_immune_types() {
    let chart = TypeChart::standard();
    let a = make_mon(
        "Rocky",
        &[Type::Rock],
        stats(160, 100),
        vec![status_move("Sandstorm", Type::Rock)],
    );
    let b = make_mon("Soft", &[Type::Normal], stats(160, 50), vec![splash()]);
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut rng = ScriptedRng::repeating(100);
    battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(battle.field().weather, Weather::Sandstorm);
    assert_eq!(battle.field().weather_turns, 4);
    assert_eq!(battle.combatant(Side::A).current_hp, 160);
    assert_eq!(battle.combatant(Side::B).current_hp, 150);
}

#[test]
fn swords_dance_stacks_to_the_cap() {
    let chart = TypeChart::standard();
    let a = make_mon(
        "Dancer",
        &[Type::Normal],
        stats(300, 100),
        vec![status_move("Swords Dance", Type::Normal)],
    );
    let b = make_mon("Watcher", &[Type::Normal], stats(300, 50), vec![splash()]);
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut rng = ScriptedRng::repeating(100);
    for _ in 0..4 {
        battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    }
    assert_eq!(battle.combatant(Side::A).stage(StageStat::Attack), 6);
    let unchanged = battle
        .log()
        .entries()
        .iter()
        .filter(|e| {
            matches!(e.kind, LogKind::StageUnchanged { stat: StageStat::Attack, rising: true })
        })
        .count();
    assert_eq!(unchanged, 1);
}

#[test]
fn reflect_halves_physical_damage() {
    let chart = TypeChart::standard();
    let a = make_mon(
        "Wall",
        &[Type::Psychic],
        stats(200, 100),
        vec![status_move("Reflect", Type::Psychic)],
    );
    let b = make_mon("Hitter", &[Type::Normal], stats(200, 50), vec![tackle()]);
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut rng = ScriptedRng::repeating(100);
    battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    // 19 base, STAB 1.5, screen 0.5
    assert_eq!(battle.combatant(Side::A).current_hp, 200 - 14);
}

#[test]
fn trick_room_lets_the_slower_side_move_first() {
    let chart = TypeChart::standard();
    let a = make_mon(
        "Slow",
        &[Type::Psychic],
        stats(300, 20),
        vec![status_move("Trick Room", Type::Psychic), tackle()],
    );
    let b = make_mon("Quick", &[Type::Normal], stats(300, 150), vec![tackle()]);
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut rng = ScriptedRng::repeating(100);
    let mut select_a = ScriptedSelector::new([Choice::Move(0), Choice::Move(1)]);
    let first = battle.play_round(&mut select_a, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(first.order, [Side::B, Side::A]);
    assert!(battle.field().trick_room());
    let second = battle.play_round(&mut select_a, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(second.order, [Side::A, Side::B]);
}

#[test]
fn sleep_powder_puts_the_target_to_sleep() {
    let chart = TypeChart::standard();
    let powder = status_move("Sleep Powder", Type::Grass).with_accuracy(75);
    let a = make_mon("Sleeper", &[Type::Grass], stats(200, 100), vec![powder]);
    let b = make_mon("Target", &[Type::Normal], stats(200, 50), vec![tackle()]);
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    // accuracy roll, then the sleep counter
    let mut rng = ScriptedRng::new([1, 2]).then_repeat(100);
    battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(battle.combatant(Side::B).status, NonVolatile::Asleep { counter: 1 });
    assert_eq!(battle.combatant(Side::A).current_hp, 200);
    assert!(battle
        .log()
        .entries()
        .iter()
        .any(|e| e.actor == Some(Side::B) && e.kind == LogKind::Prevented(Prevented::Asleep)));
}

#[test]
fn static_can_paralyze_a_contact_attacker() {
    let chart = TypeChart::standard();
    let a = make_mon("Puncher", &[Type::Fighting], stats(200, 100), vec![tackle()]);
    let b = make_mon(
        "Sparky",
        &[Type::Electric],
        stats(200, 50),
        vec![splash()],
    )
    .with_ability("Static");
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    // accuracy, spread, crit, then the 30% contact roll
    let mut rng = ScriptedRng::new([100, 100, 16, 1]).then_repeat(100);
    battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(battle.combatant(Side::A).status, NonVolatile::Paralyzed);
}

#[test]
fn life_orb_boosts_damage_and_costs_hp() {
    let chart = TypeChart::standard();
    let a = make_mon(
        "Glass",
        &[Type::Normal],
        stats(200, 100),
        vec![tackle()],
    )
    .with_item("Life Orb");
    let b = make_mon("Target", &[Type::Normal], stats(300, 50), vec![splash()]);
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut rng = ScriptedRng::repeating(100);
    battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(battle.combatant(Side::B).current_hp, 300 - 37);
    assert_eq!(battle.combatant(Side::A).current_hp, 180);
    assert!(battle.log().entries().iter().any(|e| matches!(
        &e.kind,
        LogKind::Damage { cause: DamageCause::Effect(name), .. } if name == "Life Orb"
    )));
}

#[test]
fn weakness_policy_triggers_on_super_effective_hits() {
    let chart = TypeChart::standard();
    let karate_chop = Move::new("Karate Chop", Type::Fighting, MoveCategory::Physical, 50);
    let a = make_mon("Chopper", &[Type::Fighting], stats(300, 100), vec![karate_chop]);
    let b = make_mon(
        "Policy",
        &[Type::Normal],
        stats(300, 50),
        vec![splash()],
    )
    .with_item("Weakness Policy");
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut rng = ScriptedRng::repeating(100);
    battle.play_round(&mut FirstUsable, &mut FirstUsable, &mut rng).unwrap();
    let holder = battle.combatant(Side::B);
    assert_eq!(holder.stage(StageStat::Attack), 2);
    assert_eq!(holder.stage(StageStat::SpAttack), 2);
    assert!(holder.item.is_none());
}

#[test]
fn static_reaches_an_attacker_behind_its_substitute() {
    let chart = TypeChart::standard();
    let a = make_mon(
        "Decoy",
        &[Type::Normal],
        stats(200, 100),
        vec![status_move("Substitute", Type::Normal), tackle()],
    );
    let b = make_mon(
        "Sparky",
        &[Type::Electric],
        stats(200, 50),
        vec![splash()],
    )
    .with_ability("Static");
    let mut battle = Battle::new(a, b, &chart, BattleConfig::default()).unwrap();
    let mut select_a = ScriptedSelector::new([Choice::Move(0), Choice::Move(1)]);
    battle
        .play_round(&mut select_a, &mut FirstUsable, &mut ScriptedRng::repeating(100))
        .unwrap();
    assert_eq!(battle.combatant(Side::A).current_hp, 150);

    // accuracy, spread, crit, then the 30% contact roll
    let mut rng = ScriptedRng::new([100, 100, 16, 1]).then_repeat(100);
    battle.play_round(&mut select_a, &mut FirstUsable, &mut rng).unwrap();
    assert_eq!(battle.combatant(Side::A).status, NonVolatile::Paralyzed);
}
