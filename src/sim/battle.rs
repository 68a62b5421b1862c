use crate::battle_log::{BattleLog, DamageCause, LogKind};
use crate::config::BattleConfig;
use crate::error::{BattleError, Result};
use crate::sim::ai::{ActionSelector, Choice};
use crate::sim::combatant::Combatant;
use crate::sim::damage::{self, DamageInput, DamageOutcome};
use crate::sim::effects::items::{self, EndOfTurnItem};
use crate::sim::effects::{
    Command, Condition, Dispatch, Duration, Effect, EffectBus, EventContext, EventKind, Infliction,
    Issued, Owner,
};
use crate::sim::field::{hurt_by_weather, Field, Weather, SCREEN_TURNS, WEATHER_TURNS};
use crate::sim::mega;
use crate::sim::moves::{EffectTarget, Move, MoveCategory, MoveEffect, SecondaryPayload, STRUGGLE};
use crate::sim::rng::BattleRng;
use crate::sim::stats::{turn_order_speed, StageStat};
use crate::sim::status::{
    self, GateNote, InflictOutcome, Prevented, ResidualSource, StatusKind, Volatile,
};
use crate::sim::Side;
use crate::types::TypeChart;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Sort key for a side that does nothing this round.
pub const IDLE_PRIORITY: i8 = -7;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "result", content = "side", rename_all = "snake_case")]
pub enum BattleOutcome {
    Winner(Side),
    Draw,
}

/// Everything one battle owns.
#[derive(Clone, Debug)]
pub struct BattleContext {
    pub(crate) combatants: [Combatant; 2],
    pub(crate) field: Field,
    pub(crate) bus: EffectBus,
    pub(crate) turn: u32,
    pub(crate) log: BattleLog,
    pub(crate) outcome: Option<BattleOutcome>,
}

impl BattleContext {
    pub fn new(a: Combatant, b: Combatant) -> Self {
        let log = BattleLog::new(&a.name, &b.name);
        Self {
            combatants: [a, b],
            field: Field::default(),
            bus: EffectBus::new(),
            turn: 0,
            log,
            outcome: None,
        }
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        &self.combatants[side.index()]
    }

    pub fn combatants(&self) -> &[Combatant; 2] {
        &self.combatants
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn bus(&self) -> &EffectBus {
        &self.bus
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        &mut self.combatants[side.index()]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Move(usize),
    Struggle,
    Idle,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlannedAction {
    pub side: Side,
    pub action: Action,
    pub priority: i8,
    pub speed: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundReport {
    pub turn: u32,
    pub order: [Side; 2],
    /// Sides whose action actually ran, in order.
    pub executed: Vec<Side>,
    pub end_of_turn: bool,
    pub outcome: Option<BattleOutcome>,
}

/// Checks a selector's choice against the combatant's move slots and mega stone.
pub fn validate_choice(combatant: &Combatant, choice: Choice) -> Result<Action> {
    match choice {
        Choice::Pass => Ok(Action::Idle),
        Choice::Mega(idx) => {
            if !mega::can_mega_evolve(combatant) {
                return Err(BattleError::IllegalAction(format!(
                    "{} cannot mega evolve",
                    combatant.name
                )));
            }
            validate_choice(combatant, Choice::Move(idx))
        }
        Choice::Move(idx) => {
            let slot = combatant.moves.get(idx).ok_or_else(|| {
                BattleError::IllegalAction(format!("{} has no move in slot {idx}", combatant.name))
            })?;
            if !slot.usable() {
                return Err(BattleError::IllegalAction(format!(
                    "{} has no PP left for {}",
                    combatant.name, slot.template.name
                )));
            }
            Ok(Action::Move(idx))
        }
    }
}

fn plan(combatant: &Combatant, side: Side, action: Action) -> PlannedAction {
    let priority = match action {
        Action::Move(idx) => combatant.moves.get(idx).map_or(0, |slot| slot.template.priority),
        Action::Struggle => 0,
        Action::Idle => IDLE_PRIORITY,
    };
    PlannedAction {
        side,
        action,
        priority,
        speed: turn_order_speed(combatant),
    }
}

/// Orders both actions: priority, then speed (reversed under trick room), then a coin flip.
pub fn determine_order(
    combatants: &[Combatant; 2],
    field: &Field,
    actions: [Action; 2],
    rng: &mut dyn BattleRng,
) -> Result<[PlannedAction; 2]> {
    let a = plan(&combatants[0], Side::A, actions[0]);
    let b = plan(&combatants[1], Side::B, actions[1]);
    let a_first = if a.priority != b.priority {
        a.priority > b.priority
    } else if a.speed != b.speed {
        (a.speed > b.speed) != field.trick_room()
    } else {
        rng.range(1, 2)? == 1
    };
    Ok(if a_first { [a, b] } else { [b, a] })
}

fn pair_mut(combatants: &mut [Combatant; 2], first: Side) -> (&mut Combatant, &mut Combatant) {
    let (left, right) = combatants.split_at_mut(1);
    match first {
        Side::A => (&mut left[0], &mut right[0]),
        Side::B => (&mut right[0], &mut left[0]),
    }
}

/// One side's validated choice for the round.
#[derive(Clone, Debug)]
struct Intake {
    action: Action,
    notice: Option<LogKind>,
    mega: bool,
}

impl Intake {
    fn forced(action: Action) -> Self {
        Self {
            action,
            notice: None,
            mega: false,
        }
    }
}

pub struct Battle<'c> {
    ctx: BattleContext,
    chart: &'c TypeChart,
    config: BattleConfig,
    started: bool,
    aborted: bool,
}

impl<'c> Battle<'c> {
    pub fn new(
        a: Combatant,
        b: Combatant,
        chart: &'c TypeChart,
        config: BattleConfig,
    ) -> Result<Self> {
        a.validate()?;
        b.validate()?;
        Ok(Self {
            ctx: BattleContext::new(a, b),
            chart,
            config,
            started: false,
            aborted: false,
        })
    }

    pub fn context(&self) -> &BattleContext {
        &self.ctx
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        self.ctx.combatant(side)
    }

    pub fn field(&self) -> &Field {
        &self.ctx.field
    }

    pub fn log(&self) -> &BattleLog {
        &self.ctx.log
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.ctx.outcome
    }

    pub fn turn(&self) -> u32 {
        self.ctx.turn
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Registers ability and item handlers, then fires switch-in for A then B.
    pub fn start(&mut self, rng: &mut dyn BattleRng) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        for side in Side::BOTH {
            let combatant = self.ctx.combatant(side);
            let ability = combatant.ability;
            let item = combatant.item_kind();
            if ability.has_hooks() {
                let owner = Owner::Combatant(side);
                self.ctx.bus.register(Effect::Ability(ability), owner, Duration::Unbounded);
            }
            if let Some(item) = item.filter(|item| item.has_hooks()) {
                self.ctx
                    .bus
                    .register(Effect::Item(item), Owner::Combatant(side), Duration::Unbounded);
            }
        }
        self.record(None, LogKind::BattleStarted);
        for side in Side::BOTH {
            let dispatch = {
                let ctx = &mut self.ctx;
                let event = EventContext::new(
                    EventKind::SwitchIn,
                    side,
                    side.opponent(),
                    &ctx.combatants,
                    &ctx.field,
                );
                ctx.bus.dispatch(&event)
            };
            if let Err(err) = self.apply_dispatch(dispatch, rng) {
                self.aborted = true;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Plays one round. A fatal error aborts the battle; later calls return `BattleOver`.
    pub fn play_round(
        &mut self,
        a: &mut dyn ActionSelector,
        b: &mut dyn ActionSelector,
        rng: &mut dyn BattleRng,
    ) -> Result<RoundReport> {
        if self.aborted || self.ctx.outcome.is_some() {
            return Err(BattleError::BattleOver);
        }
        self.start(rng)?;
        let result = self.round(a, b, rng);
        if let Err(err) = &result {
            if err.is_fatal() {
                warn!(turn = self.ctx.turn, error = %err, "battle aborted");
                self.aborted = true;
            }
        }
        result
    }

    /// Plays rounds until the battle ends.
    pub fn run(
        &mut self,
        a: &mut dyn ActionSelector,
        b: &mut dyn ActionSelector,
        rng: &mut dyn BattleRng,
    ) -> Result<BattleOutcome> {
        loop {
            if let Some(outcome) = self.play_round(a, b, rng)?.outcome {
                return Ok(outcome);
            }
        }
    }

    fn round(
        &mut self,
        a: &mut dyn ActionSelector,
        b: &mut dyn ActionSelector,
        rng: &mut dyn BattleRng,
    ) -> Result<RoundReport> {
        let intake_a = self.intake(Side::A, a)?;
        let intake_b = self.intake(Side::B, b)?;

        self.ctx.turn += 1;
        let turn = self.ctx.turn;
        self.record(None, LogKind::TurnStarted);
        for (side, intake) in [(Side::A, &intake_a), (Side::B, &intake_b)] {
            if let Some(kind) = intake.notice.clone() {
                self.record(Some(side), kind);
            }
        }
        for (side, intake) in [(Side::A, &intake_a), (Side::B, &intake_b)] {
            if intake.mega {
                self.mega_evolve(side, rng)?;
            }
        }
        let (action_a, action_b) = (intake_a.action, intake_b.action);

        let order = determine_order(
            &self.ctx.combatants,
            &self.ctx.field,
            [action_a, action_b],
            rng,
        )?;
        debug!(turn, first = ?order[0].side, ?order, "round order");

        let mut report = RoundReport {
            turn,
            order: [order[0].side, order[1].side],
            executed: Vec::new(),
            end_of_turn: false,
            outcome: None,
        };
        for planned in order {
            self.execute(planned, rng)?;
            report.executed.push(planned.side);
            if let Some(outcome) = self.settle() {
                report.outcome = Some(outcome);
                return Ok(report);
            }
        }

        self.end_of_turn(rng)?;
        report.end_of_turn = true;
        report.outcome = self.settle();
        if report.outcome.is_none() && turn >= self.config.max_turns {
            debug!(turn, "turn limit reached");
            report.outcome = Some(self.finish(BattleOutcome::Draw));
        }
        Ok(report)
    }

    fn intake(&self, side: Side, selector: &mut dyn ActionSelector) -> Result<Intake> {
        let combatant = self.ctx.combatant(side);
        if let Some(locked) = combatant.locked_move {
            return match combatant.moves.get(locked) {
                Some(slot) if slot.usable() => {
                    let choice = selector.choose(&self.ctx, side);
                    let notice = (choice.slot() != Some(locked)).then(|| LogKind::LockedInto {
                        name: slot.template.name.clone(),
                    });
                    let mega =
                        matches!(choice, Choice::Mega(_)) && mega::can_mega_evolve(combatant);
                    Ok(Intake {
                        action: Action::Move(locked),
                        notice,
                        mega,
                    })
                }
                _ => Ok(Intake::forced(Action::Struggle)),
            };
        }
        if !combatant.has_usable_move() {
            return Ok(Intake::forced(Action::Struggle));
        }

        let attempts = self.config.max_selection_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            let choice = selector.choose(&self.ctx, side);
            match validate_choice(combatant, choice) {
                Ok(action) => {
                    return Ok(Intake {
                        action,
                        notice: None,
                        mega: matches!(choice, Choice::Mega(_)),
                    });
                }
                Err(err) => {
                    warn!(?side, attempt, ?choice, error = %err, "illegal choice");
                    selector.rejected(choice, &err);
                    last_error = Some(err);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| BattleError::IllegalAction(format!("{side:?} made no choice"))))
    }

    /// Swaps the combatant into its mega forme and re-registers its ability.
    fn mega_evolve(&mut self, side: Side, rng: &mut dyn BattleRng) -> Result<()> {
        let Some(forme) = mega::mega_evolve(self.ctx.combatant_mut(side)) else {
            return Ok(());
        };
        debug!(?side, forme = forme.forme, "mega evolved");
        let owner = Owner::Combatant(side);
        self.ctx
            .bus
            .remove_where(|h| h.owner == owner && matches!(h.effect, Effect::Ability(_)));
        let ability = self.ctx.combatant(side).ability;
        if ability.has_hooks() {
            self.ctx.bus.register(Effect::Ability(ability), owner, Duration::Unbounded);
        }
        self.record(
            Some(side),
            LogKind::MegaEvolved {
                forme: forme.forme.to_string(),
            },
        );
        let dispatch = {
            let ctx = &mut self.ctx;
            let event = EventContext::new(
                EventKind::SwitchIn,
                side,
                side.opponent(),
                &ctx.combatants,
                &ctx.field,
            );
            ctx.bus.dispatch(&event)
        };
        self.apply_dispatch(dispatch, rng)
    }

    fn execute(&mut self, planned: PlannedAction, rng: &mut dyn BattleRng) -> Result<()> {
        let side = planned.side;
        if planned.action == Action::Idle {
            self.record(Some(side), LogKind::Idle);
            return Ok(());
        }
        let gate = status::before_action(self.ctx.combatant_mut(side), rng)?;
        for note in &gate.notes {
            let kind = match note {
                GateNote::WokeUp => LogKind::WokeUp,
                GateNote::Thawed => LogKind::Thawed,
                GateNote::SnappedOutOfConfusion => LogKind::SnappedOutOfConfusion,
            };
            self.record(Some(side), kind);
        }
        if let Some(reason) = gate.prevented {
            trace!(?side, ?reason, "action prevented");
            self.record(Some(side), LogKind::Prevented(reason));
            if let Prevented::Confusion { self_damage } = reason {
                self.log_damage(side, self_damage, DamageCause::Confusion);
            }
            return Ok(());
        }
        match planned.action {
            Action::Move(slot) => self.use_move(side, slot, rng),
            Action::Struggle => {
                self.struggle(side);
                Ok(())
            }
            Action::Idle => Ok(()),
        }
    }

    fn use_move(&mut self, side: Side, slot: usize, rng: &mut dyn BattleRng) -> Result<()> {
        let user = self.ctx.combatant_mut(side);
        let Some(move_slot) = user.moves.get_mut(slot) else {
            return Err(BattleError::InvariantViolation(format!(
                "{} has no move slot {slot}",
                user.name
            )));
        };
        if move_slot.pp == 0 {
            return Err(BattleError::InvariantViolation(format!(
                "{} executed {} with no PP",
                user.name, move_slot.template.name
            )));
        }
        let mv = move_slot.template.clone();
        if mv.category == MoveCategory::Status && user.volatiles.has(Volatile::Taunted) {
            self.record(Some(side), LogKind::Prevented(Prevented::Taunted));
            return Ok(());
        }
        move_slot.pp -= 1;
        if user.holds_choice_item() && user.locked_move.is_none() {
            user.locked_move = Some(slot);
        }
        self.record(Some(side), LogKind::MoveUsed { name: mv.name.clone() });

        let dispatch = {
            let ctx = &mut self.ctx;
            let event = EventContext::new(
                EventKind::BeforeMove,
                side,
                side.opponent(),
                &ctx.combatants,
                &ctx.field,
            )
            .with_move(&mv);
            ctx.bus.dispatch(&event)
        };
        let blocked = dispatch.blocked;
        self.apply_dispatch(dispatch, rng)?;
        if blocked {
            self.record(Some(side), LogKind::MoveFailed);
            return Ok(());
        }

        if mv.is_damaging() {
            self.damaging_move(side, &mv, rng)
        } else {
            self.status_move(side, &mv, rng)
        }
    }

    fn damaging_move(&mut self, side: Side, mv: &Move, rng: &mut dyn BattleRng) -> Result<()> {
        let target = side.opponent();
        let calc = {
            let input = DamageInput {
                attacker: side,
                mv,
                combatants: &self.ctx.combatants,
                field: &self.ctx.field,
                chart: self.chart,
            };
            damage::calculate(&input, &mut self.ctx.bus, rng)?
        };
        self.log_messages(calc.messages);
        let hit = match calc.outcome {
            DamageOutcome::NoDamage => return Ok(()),
            DamageOutcome::Missed => {
                self.record(Some(side), LogKind::Missed);
                return Ok(());
            }
            DamageOutcome::Hit(hit) if hit.effectiveness == 0.0 => {
                self.record(Some(target), LogKind::NoEffect);
                return Ok(());
            }
            DamageOutcome::Hit(hit) => hit,
        };

        let taken = {
            let ctx = &mut self.ctx;
            let event = EventContext::new(
                EventKind::DamageTaken,
                side,
                target,
                &ctx.combatants,
                &ctx.field,
            )
            .with_move(mv)
            .with_value(f64::from(hit.damage))
            .with_hit(hit.effectiveness, hit.critical);
            ctx.bus.dispatch(&event)
        };
        let amount = match taken.damage_adjustment() {
            (_, Some(value)) => value.max(0.0).floor() as u32,
            (multiplier, None) => (f64::from(hit.damage) * multiplier).floor() as u32,
        };
        let Dispatch { messages, commands, .. } = taken;
        self.log_messages(messages);
        let dealt = self.ctx.combatant_mut(target).take_damage(amount);
        if dealt > 0 {
            self.log_damage(target, dealt, DamageCause::Move);
        }
        if hit.critical {
            self.record(Some(target), LogKind::Critical);
        }
        if hit.effectiveness != 1.0 {
            self.record(
                Some(target),
                LogKind::Effectiveness {
                    multiplier: hit.effectiveness,
                },
            );
        }
        self.apply_commands(commands, rng)?;

        if !self.ctx.combatant(target).is_fainted() {
            for secondary in &mv.secondary {
                let recipient = match secondary.target {
                    EffectTarget::User => side,
                    EffectTarget::Opponent => target,
                };
                let unhit = recipient == target && dealt == 0;
                if self.ctx.combatant(recipient).is_fainted() || unhit {
                    continue;
                }
                if !rng.percent(secondary.chance)? {
                    continue;
                }
                match &secondary.effect {
                    SecondaryPayload::Status(kind) => {
                        self.inflict_status(recipient, *kind, side, Some(mv), rng)?
                    },
                    SecondaryPayload::StatChanges(changes) => {
                        for change in changes {
                            self.change_stage(recipient, change.stat, change.delta);
                        }
                    }
                    SecondaryPayload::Flinch => {
                        self.inflict_volatile(recipient, Volatile::Flinched, side, Some(mv), rng)?
                    },
                    SecondaryPayload::Volatile(kind) => {
                        self.inflict_volatile(recipient, *kind, side, Some(mv), rng)?
                    },
                }
            }
        }

        let after = {
            let ctx = &mut self.ctx;
            let event = EventContext::new(
                EventKind::AfterMove,
                side,
                target,
                &ctx.combatants,
                &ctx.field,
            )
            .with_move(mv)
            .with_value(f64::from(dealt))
            .with_hit(hit.effectiveness, hit.critical);
            ctx.bus.dispatch(&event)
        };
        self.apply_dispatch(after, rng)
    }

    fn struggle(&mut self, side: Side) {
        let target = side.opponent();
        self.record(Some(side), LogKind::MoveUsed { name: STRUGGLE.to_string() });
        let amount = (self.ctx.combatant(side).max_hp() / 4).max(1);
        let dealt = self.ctx.combatant_mut(target).take_damage(amount);
        self.log_damage(target, dealt, DamageCause::Struggle);
        let recoil = self.ctx.combatant_mut(side).take_damage(amount);
        self.log_damage(side, recoil, DamageCause::Recoil);
    }

    fn status_move(&mut self, side: Side, mv: &Move, rng: &mut dyn BattleRng) -> Result<()> {
        let target = side.opponent();
        let Some(effect) = mv.effect else {
            self.record(Some(side), LogKind::Effect {
                text: "But nothing happened!".to_string(),
            });
            return Ok(());
        };
        if effect.targets_opponent() && mv.accuracy > 0 {
            let mut messages = Vec::new();
            let hit = {
                let input = DamageInput {
                    attacker: side,
                    mv,
                    combatants: &self.ctx.combatants,
                    field: &self.ctx.field,
                    chart: self.chart,
                };
                damage::roll_accuracy(&input, &mut self.ctx.bus, rng, &mut messages)?
            };
            self.log_messages(messages);
            if !hit {
                self.record(Some(side), LogKind::Missed);
                return Ok(());
            }
        }

        match effect {
            MoveEffect::Weather(weather) => {
                if self.ctx.field.set_weather(weather, WEATHER_TURNS) {
                    self.record(None, LogKind::WeatherStarted { weather });
                } else {
                    self.record(Some(side), LogKind::MoveFailed);
                }
            }
            MoveEffect::Heal { num, den } => {
                let amount = self.ctx.combatant(side).max_hp() * num / den;
                self.heal_from_move(side, amount, mv);
            }
            MoveEffect::Synthesis => {
                let max_hp = self.ctx.combatant(side).max_hp();
                let amount = match self.ctx.field.weather {
                    Weather::Clear => max_hp / 2,
                    Weather::HarshSunlight => max_hp * 2 / 3,
                    Weather::Rain | Weather::Sandstorm | Weather::Hail => max_hp / 4,
                };
                self.heal_from_move(side, amount, mv);
            }
            MoveEffect::Boost(changes) => {
                for (stat, delta) in changes {
                    self.change_stage(side, *stat, *delta);
                }
            }
            MoveEffect::Lower(changes) => {
                for (stat, delta) in changes {
                    self.change_stage(target, *stat, *delta);
                }
            }
            MoveEffect::Inflict(kind) => self.inflict_status(target, kind, side, Some(mv), rng)?,
            MoveEffect::Confuse => {
                self.inflict_volatile(target, Volatile::Confused, side, Some(mv), rng)?
            },
            MoveEffect::LeechSeed => {
                self.inflict_volatile(target, Volatile::LeechSeeded, side, Some(mv), rng)?
            },
            MoveEffect::Hazard(condition) => {
                if self.ctx.field.add_condition(target, condition, None) {
                    self.record(Some(target), LogKind::SideConditionStarted { condition });
                } else {
                    self.record(Some(side), LogKind::MoveFailed);
                }
            }
            MoveEffect::Screen(condition) => {
                if self.ctx.field.add_condition(side, condition, Some(SCREEN_TURNS)) {
                    self.ctx.bus.register(
                        Effect::Condition(Condition::Screen(condition)),
                        Owner::FieldSide(side),
                        Duration::Turns(SCREEN_TURNS),
                    );
                    self.record(Some(side), LogKind::SideConditionStarted { condition });
                } else {
                    self.record(Some(side), LogKind::MoveFailed);
                }
            }
            MoveEffect::Substitute => self.create_substitute(side),
            MoveEffect::TrickRoom => {
                let kind = if self.ctx.field.toggle_trick_room() {
                    LogKind::TrickRoomStarted
                } else {
                    LogKind::TrickRoomEnded
                };
                self.record(None, kind);
            }
        }
        Ok(())
    }

    fn heal_from_move(&mut self, side: Side, amount: u32, mv: &Move) {
        let healed = self.ctx.combatant_mut(side).heal(amount);
        if healed == 0 {
            self.record(Some(side), LogKind::MoveFailed);
        } else {
            self.log_heal(side, healed, &mv.name);
        }
    }

    fn create_substitute(&mut self, side: Side) {
        let owner = Owner::Combatant(side);
        let exists = self
            .ctx
            .bus
            .handlers()
            .iter()
            .any(|h| {
                h.owner == owner
                    && matches!(h.effect, Effect::Condition(Condition::Substitute { .. }))
            });
        let user = self.ctx.combatant(side);
        let cost = user.max_hp() / 4;
        if exists || cost == 0 || user.current_hp <= cost {
            self.record(Some(side), LogKind::MoveFailed);
            return;
        }
        let paid = self.ctx.combatant_mut(side).take_damage(cost);
        self.ctx.bus.register(
            Effect::Condition(Condition::Substitute { hp: paid }),
            owner,
            Duration::Unbounded,
        );
        self.record(Some(side), LogKind::SubstituteCreated);
        self.log_damage(side, paid, DamageCause::Substitute);
    }

    /// Runs the status-inflict event, then applies the status unless an effect blocked it.
    fn inflict_status(
        &mut self,
        target: Side,
        kind: StatusKind,
        source: Side,
        origin: Option<&Move>,
        rng: &mut dyn BattleRng,
    ) -> Result<()> {
        if self.inflict_blocked(target, Infliction::Status(kind), source, origin, rng)? {
            return Ok(());
        }
        match status::inflict(self.ctx.combatant_mut(target), kind, rng)? {
            InflictOutcome::Inflicted => {
                self.record(Some(target), LogKind::StatusInflicted { status: kind })
            }
            result => self.record(Some(target), LogKind::StatusFailed { status: kind, result }),
        }
        Ok(())
    }

    fn inflict_volatile(
        &mut self,
        target: Side,
        kind: Volatile,
        source: Side,
        origin: Option<&Move>,
        rng: &mut dyn BattleRng,
    ) -> Result<()> {
        if self.inflict_blocked(target, Infliction::Volatile(kind), source, origin, rng)? {
            return Ok(());
        }
        match status::inflict_volatile(self.ctx.combatant_mut(target), kind, rng)? {
            InflictOutcome::Inflicted if kind == Volatile::Flinched => {}
            InflictOutcome::Inflicted => {
                self.record(Some(target), LogKind::VolatileStarted { volatile: kind })
            }
            result => self.record(Some(target), LogKind::VolatileFailed { volatile: kind, result }),
        }
        Ok(())
    }

    fn inflict_blocked(
        &mut self,
        target: Side,
        infliction: Infliction,
        source: Side,
        origin: Option<&Move>,
        rng: &mut dyn BattleRng,
    ) -> Result<bool> {
        let dispatch = {
            let ctx = &mut self.ctx;
            let mut event = EventContext::new(
                EventKind::StatusInflict,
                source,
                target,
                &ctx.combatants,
                &ctx.field,
            )
            .with_infliction(infliction);
            if let Some(mv) = origin {
                event = event.with_move(mv);
            }
            ctx.bus.dispatch(&event)
        };
        let blocked = dispatch.blocked;
        self.apply_dispatch(dispatch, rng)?;
        if blocked {
            trace!(?target, ?infliction, "infliction blocked");
            self.record(Some(target), LogKind::Blocked);
        }
        Ok(blocked)
    }

    fn change_stage(&mut self, side: Side, stat: StageStat, delta: i8) {
        let combatant = self.ctx.combatant_mut(side);
        if combatant.is_fainted() {
            return;
        }
        let applied = combatant.stages.apply(stat, delta);
        let stage = combatant.stage(stat);
        let kind = if applied == 0 {
            LogKind::StageUnchanged { stat, rising: delta > 0 }
        } else {
            LogKind::StageChanged {
                stat,
                delta: applied,
                stage,
            }
        };
        self.record(Some(side), kind);
    }

    fn consume_item(&mut self, side: Side) {
        let combatant = self.ctx.combatant_mut(side);
        let Some(item) = combatant.consume_item() else {
            return;
        };
        combatant.locked_move = None;
        let owner = Owner::Combatant(side);
        self.ctx
            .bus
            .remove_where(|h| h.owner == owner && matches!(h.effect, Effect::Item(_)));
        self.record(Some(side), LogKind::ItemConsumed { item: item.name });
    }

    fn apply_dispatch(&mut self, dispatch: Dispatch, rng: &mut dyn BattleRng) -> Result<()> {
        self.log_messages(dispatch.messages);
        self.apply_commands(dispatch.commands, rng)
    }

    fn apply_commands(&mut self, commands: Vec<Issued>, rng: &mut dyn BattleRng) -> Result<()> {
        for issued in commands {
            trace!(cause = issued.cause, command = ?issued.command, "apply command");
            match issued.command {
                Command::Stage { side, stat, delta } => self.change_stage(side, stat, delta),
                Command::Damage { side, amount } => {
                    if self.ctx.combatant(side).is_fainted() {
                        continue;
                    }
                    let dealt = self.ctx.combatant_mut(side).take_damage(amount);
                    self.log_damage(side, dealt, DamageCause::Effect(issued.cause.to_string()));
                }
                Command::Heal { side, amount } => {
                    let healed = self.ctx.combatant_mut(side).heal(amount);
                    if healed > 0 {
                        self.log_heal(side, healed, issued.cause);
                    }
                }
                Command::Inflict { side, status, chance } => {
                    if self.ctx.combatant(side).is_fainted() || !rng.percent(chance)? {
                        continue;
                    }
                    self.inflict_status(side, status, issued.owner.side(), None, rng)?;
                }
                Command::SetWeather { weather, turns } => {
                    if self.ctx.field.set_weather(weather, turns) {
                        self.record(Some(issued.owner.side()), LogKind::WeatherStarted { weather });
                    }
                }
                Command::ConsumeItem { side } => self.consume_item(side),
            }
        }
        Ok(())
    }

    fn end_of_turn(&mut self, rng: &mut dyn BattleRng) -> Result<()> {
        if let Some(weather) = self.ctx.field.tick_weather() {
            self.record(None, LogKind::WeatherEnded { weather });
        }

        let weather = self.ctx.field.weather;
        for side in Side::BOTH {
            let combatant = self.ctx.combatant(side);
            if combatant.is_fainted() || !hurt_by_weather(weather, &combatant.types) {
                continue;
            }
            let amount = (combatant.max_hp() / 16).max(1);
            let dealt = self.ctx.combatant_mut(side).take_damage(amount);
            self.log_damage(side, dealt, DamageCause::Weather(weather));
        }

        for side in Side::BOTH {
            if self.ctx.combatant(side).is_fainted() {
                continue;
            }
            for (source, amount) in status::residual(self.ctx.combatant_mut(side)) {
                if amount == 0 {
                    continue;
                }
                let cause = match source {
                    ResidualSource::Poison => DamageCause::Status(StatusKind::Poison),
                    ResidualSource::BadPoison => DamageCause::Status(StatusKind::BadPoison),
                    ResidualSource::Burn => DamageCause::Status(StatusKind::Burn),
                    ResidualSource::Curse => DamageCause::Curse,
                };
                self.log_damage(side, amount, cause);
            }
        }

        for side in Side::BOTH {
            let holder = self.ctx.combatant(side);
            if holder.is_fainted() {
                continue;
            }
            let item_name = holder.item_display_name().unwrap_or_default().to_string();
            match items::end_of_turn_effect(holder) {
                Some(EndOfTurnItem::Heal { amount, consume }) => {
                    let healed = self.ctx.combatant_mut(side).heal(amount);
                    if healed > 0 {
                        self.log_heal(side, healed, &item_name);
                    }
                    if consume {
                        self.consume_item(side);
                    }
                }
                Some(EndOfTurnItem::Cure) => {
                    if let Some(cured) = status::cure(self.ctx.combatant_mut(side)) {
                        self.record(Some(side), LogKind::StatusCured { status: cured });
                    }
                    self.consume_item(side);
                }
                Some(EndOfTurnItem::Inflict(kind)) => {
                    self.inflict_status(side, kind, side, None, rng)?
                }
                None => {}
            }
        }

        for side in Side::BOTH {
            let (seeded, receiver) = pair_mut(&mut self.ctx.combatants, side);
            if let Some((drained, healed)) = status::leech_seed(seeded, receiver) {
                if drained > 0 {
                    self.log_damage(side, drained, DamageCause::LeechSeed);
                }
                if healed > 0 {
                    self.log_heal(side.opponent(), healed, "Leech Seed");
                }
            }
        }

        for side in Side::BOTH {
            for volatile in status::end_of_turn_volatiles(self.ctx.combatant_mut(side)) {
                if volatile != Volatile::Flinched {
                    self.record(Some(side), LogKind::VolatileEnded { volatile });
                }
            }
        }

        for side in Side::BOTH {
            if self.ctx.combatant(side).is_fainted() {
                continue;
            }
            let dispatch = {
                let ctx = &mut self.ctx;
                let event = EventContext::new(
                    EventKind::EndOfTurn,
                    side,
                    side.opponent(),
                    &ctx.combatants,
                    &ctx.field,
                );
                ctx.bus.dispatch(&event)
            };
            self.apply_dispatch(dispatch, rng)?;
        }

        for handler in self.ctx.bus.end_of_turn() {
            trace!(id = handler.id, name = handler.effect.name(), "handler expired");
            self.record(
                Some(handler.owner.side()),
                LogKind::HandlerExpired {
                    name: handler.effect.name().to_string(),
                },
            );
        }

        let (ended, trick_room_ended) = self.ctx.field.tick_conditions();
        for (side, condition) in ended {
            self.record(Some(side), LogKind::SideConditionEnded { condition });
        }
        if trick_room_ended {
            self.record(None, LogKind::TrickRoomEnded);
        }
        Ok(())
    }

    /// Records faints and the outcome once either combatant is down.
    fn settle(&mut self) -> Option<BattleOutcome> {
        let fainted: Vec<Side> = Side::BOTH
            .into_iter()
            .filter(|side| self.ctx.combatant(*side).is_fainted())
            .collect();
        let outcome = match fainted.as_slice() {
            [] => return None,
            [side] => BattleOutcome::Winner(side.opponent()),
            _ => BattleOutcome::Draw,
        };
        for side in fainted {
            self.record(Some(side), LogKind::Fainted);
        }
        Some(self.finish(outcome))
    }

    fn finish(&mut self, outcome: BattleOutcome) -> BattleOutcome {
        debug!(turn = self.ctx.turn, ?outcome, "battle finished");
        self.ctx.outcome = Some(outcome);
        self.record(None, LogKind::BattleEnded { outcome });
        outcome
    }

    fn record(&mut self, actor: Option<Side>, kind: LogKind) {
        let turn = self.ctx.turn;
        self.ctx.log.push(turn, actor, kind);
    }

    fn log_messages(&mut self, messages: Vec<(Owner, String)>) {
        for (owner, text) in messages {
            self.record(Some(owner.side()), LogKind::Effect { text });
        }
    }

    fn log_damage(&mut self, side: Side, amount: u32, cause: DamageCause) {
        let combatant = self.ctx.combatant(side);
        let kind = LogKind::Damage {
            amount,
            hp: combatant.current_hp,
            max_hp: combatant.max_hp(),
            cause,
        };
        self.record(Some(side), kind);
    }

    fn log_heal(&mut self, side: Side, amount: u32, cause: &str) {
        let combatant = self.ctx.combatant(side);
        let kind = LogKind::Heal {
            amount,
            hp: combatant.current_hp,
            max_hp: combatant.max_hp(),
            cause: cause.to_string(),
        };
        self.record(Some(side), kind);
    }
}
