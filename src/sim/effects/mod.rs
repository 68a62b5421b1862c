pub mod abilities;
pub mod conditions;
pub mod items;

pub use abilities::AbilityKind;
pub use conditions::Condition;
pub use items::ItemKind;

use crate::sim::combatant::Combatant;
use crate::sim::field::{Field, Weather};
use crate::sim::moves::Move;
use crate::sim::stats::StageStat;
use crate::sim::status::{StatusKind, Volatile};
use crate::sim::Side;
use serde::Serialize;
use tracing::trace;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SwitchIn,
    BeforeMove,
    AfterMove,
    ModifyBasePower,
    ModifyAccuracy,
    ModifyDamage,
    DamageTaken,
    StatusInflict,
    EndOfTurn,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Infliction {
    Status(StatusKind),
    Volatile(Volatile),
}

/// Read-only view handed to every handler for one event.
#[derive(Clone, Copy)]
pub struct EventContext<'a> {
    pub kind: EventKind,
    /// The acting side: the attacker, or the side whose turn phase this is.
    pub user: Side,
    pub target: Side,
    pub combatants: &'a [Combatant; 2],
    pub field: &'a Field,
    pub mv: Option<&'a Move>,
    /// The number being modified: power, accuracy, or damage.
    pub value: f64,
    pub effectiveness: f64,
    pub critical: bool,
    pub infliction: Option<Infliction>,
}

impl<'a> EventContext<'a> {
    pub fn new(
        kind: EventKind,
        user: Side,
        target: Side,
        combatants: &'a [Combatant; 2],
        field: &'a Field,
    ) -> Self {
        Self {
            kind,
            user,
            target,
            combatants,
            field,
            mv: None,
            value: 0.0,
            effectiveness: 1.0,
            critical: false,
            infliction: None,
        }
    }

    pub fn with_move(mut self, mv: &'a Move) -> Self {
        self.mv = Some(mv);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_hit(mut self, effectiveness: f64, critical: bool) -> Self {
        self.effectiveness = effectiveness;
        self.critical = critical;
        self
    }

    pub fn with_infliction(mut self, infliction: Infliction) -> Self {
        self.infliction = Some(infliction);
        self
    }

    pub fn combatant(&self, side: Side) -> &'a Combatant {
        &self.combatants[side.index()]
    }

    pub fn contact(&self) -> bool {
        self.mv.map_or(false, |m| m.contact)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Modifier {
    Replace(f64),
    Multiply(f64),
}

/// State changes a handler asks for; the orchestrator applies them.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Stage { side: Side, stat: StageStat, delta: i8 },
    Damage { side: Side, amount: u32 },
    Heal { side: Side, amount: u32 },
    Inflict { side: Side, status: StatusKind, chance: u8 },
    SetWeather { weather: Weather, turns: u8 },
    ConsumeItem { side: Side },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reaction {
    pub modifier: Option<Modifier>,
    pub message: Option<String>,
    pub commands: Vec<Command>,
    pub block: bool,
}

impl Reaction {
    pub fn multiply(factor: f64) -> Self {
        Self {
            modifier: Some(Modifier::Multiply(factor)),
            ..Self::default()
        }
    }

    pub fn replace(value: f64) -> Self {
        Self {
            modifier: Some(Modifier::Replace(value)),
            ..Self::default()
        }
    }

    pub fn command(command: Command) -> Self {
        Self {
            commands: vec![command],
            ..Self::default()
        }
    }

    pub fn block() -> Self {
        Self {
            block: true,
            ..Self::default()
        }
    }

    pub fn and(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(text.into());
        self
    }
}

/// Capability set shared by abilities, items and field conditions.
pub trait EffectHook {
    fn name(&self) -> &'static str;
    fn reacts_to(&self, kind: EventKind) -> bool;
    fn react(&mut self, owner: Side, ctx: &EventContext<'_>) -> Option<Reaction>;

    fn priority(&self) -> i32 {
        0
    }

    /// Exhausted handlers are dropped right after the dispatch that spent them.
    fn exhausted(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Ability(AbilityKind),
    Item(ItemKind),
    Condition(Condition),
}

impl Effect {
    fn hook(&self) -> &dyn EffectHook {
        match self {
            Effect::Ability(a) => a,
            Effect::Item(i) => i,
            Effect::Condition(c) => c,
        }
    }

    fn hook_mut(&mut self) -> &mut dyn EffectHook {
        match self {
            Effect::Ability(a) => a,
            Effect::Item(i) => i,
            Effect::Condition(c) => c,
        }
    }

    pub fn name(&self) -> &'static str {
        self.hook().name()
    }

    pub fn reacts_to(&self, kind: EventKind) -> bool {
        self.hook().reacts_to(kind)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Owner {
    Combatant(Side),
    FieldSide(Side),
}

impl Owner {
    pub fn side(self) -> Side {
        match self {
            Owner::Combatant(side) | Owner::FieldSide(side) => side,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Duration {
    Turns(u8),
    Unbounded,
}

pub type HandlerId = u64;

#[derive(Clone, Debug, PartialEq)]
pub struct EffectHandler {
    pub id: HandlerId,
    pub effect: Effect,
    pub owner: Owner,
    pub priority: i32,
    pub duration: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Issued {
    pub cause: &'static str,
    pub owner: Owner,
    pub command: Command,
}

/// Combined result of one dispatch, in handler order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dispatch {
    pub modifiers: Vec<Modifier>,
    pub messages: Vec<(Owner, String)>,
    pub commands: Vec<Issued>,
    pub blocked: bool,
}

impl Dispatch {
    /// First handler yielding a value wins.
    pub fn first_value(&self, base: f64) -> f64 {
        match self.modifiers.first() {
            Some(Modifier::Replace(v)) => *v,
            Some(Modifier::Multiply(m)) => base * m,
            None => base,
        }
    }

    /// Multipliers chain in order; the first override ends the chain.
    pub fn damage_adjustment(&self) -> (f64, Option<f64>) {
        let mut multiplier = 1.0;
        for modifier in &self.modifiers {
            match modifier {
                Modifier::Multiply(m) => multiplier *= m,
                Modifier::Replace(v) => return (multiplier, Some(*v)),
            }
        }
        (multiplier, None)
    }
}

/// Ordered registry of active handlers: priority desc, then registration order.
#[derive(Clone, Debug, Default)]
pub struct EffectBus {
    handlers: Vec<EffectHandler>,
    next_id: HandlerId,
}

impl EffectBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, effect: Effect, owner: Owner, duration: Duration) -> HandlerId {
        let priority = effect.hook().priority();
        self.register_with_priority(effect, owner, duration, priority)
    }

    pub fn register_with_priority(
        &mut self,
        effect: Effect,
        owner: Owner,
        duration: Duration,
        priority: i32,
    ) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        trace!(id, name = effect.name(), ?owner, priority, "register handler");
        let handler = EffectHandler {
            id,
            effect,
            owner,
            priority,
            duration,
        };
        // after every handler of equal or higher priority
        let at = self
            .handlers
            .iter()
            .position(|h| h.priority < priority)
            .unwrap_or(self.handlers.len());
        self.handlers.insert(at, handler);
        id
    }

    pub fn remove_where(
        &mut self,
        mut pred: impl FnMut(&EffectHandler) -> bool,
    ) -> Vec<EffectHandler> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.handlers)
            .into_iter()
            .partition(|h| pred(h));
        self.handlers = kept;
        removed
    }

    pub fn handlers(&self) -> &[EffectHandler] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every matching handler in order.
    ///
    /// For `DamageTaken` each handler sees the damage as adjusted by the handlers before
    /// it, and the value stops moving once one of them overrides it.
    pub fn dispatch(&mut self, ctx: &EventContext<'_>) -> Dispatch {
        let mut out = Dispatch::default();
        let mut view = *ctx;
        let mut settled = false;
        for handler in self.handlers.iter_mut() {
            if !handler.effect.reacts_to(ctx.kind) {
                continue;
            }
            let side = handler.owner.side();
            let cause = handler.effect.name();
            let Some(reaction) = handler.effect.hook_mut().react(side, &view) else {
                continue;
            };
            trace!(handler = cause, kind = ?ctx.kind, ?reaction, "handler reacted");
            if let Some(modifier) = reaction.modifier {
                if ctx.kind == EventKind::DamageTaken && !settled {
                    match modifier {
                        Modifier::Multiply(m) => view.value *= m,
                        Modifier::Replace(v) => {
                            view.value = v;
                            settled = true;
                        }
                    }
                }
                out.modifiers.push(modifier);
            }
            if let Some(text) = reaction.message {
                out.messages.push((handler.owner, text));
            }
            out.blocked |= reaction.block;
            out.commands.extend(reaction.commands.into_iter().map(|command| Issued {
                cause,
                owner: handler.owner,
                command,
            }));
        }
        self.handlers.retain(|h| !h.effect.hook().exhausted());
        out
    }

    /// Ticks finite durations and removes handlers that reach zero.
    pub fn end_of_turn(&mut self) -> Vec<EffectHandler> {
        let snapshot = std::mem::take(&mut self.handlers);
        let mut expired = Vec::new();
        for mut handler in snapshot {
            if let Duration::Turns(turns) = handler.duration {
                let left = turns.saturating_sub(1);
                handler.duration = Duration::Turns(left);
                if left == 0 {
                    expired.push(handler);
                    continue;
                }
            }
            self.handlers.push(handler);
        }
        expired
    }
}
