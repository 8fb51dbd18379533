//! Per-tick state classification.
//!
//! The rules are checked in a fixed order and the first match wins. The
//! conditions overlap (a moving player is usually also animating), so the
//! order is part of the behaviour:
//!
//! 1. outstanding timeout      -> `Idling`
//! 2. position changed         -> `Moving`
//! 3. animation playing        -> `Animating`
//! 4. not on a casting style   -> `SpellUnavailable`
//! 5. target search            -> `TargetFound` / `NpcNotFound`

use std::fmt;

use crate::controller::ControllerState;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Idling,
    Moving,
    Animating,
    SpellUnavailable,
    NpcNotFound,
    TargetFound(NpcHandle),
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Idling => write!(f, "IDLING"),
            BotState::Moving => write!(f, "MOVING"),
            BotState::Animating => write!(f, "ANIMATING"),
            BotState::SpellUnavailable => write!(f, "SPELL_UNAVAILABLE"),
            BotState::NpcNotFound => write!(f, "NPC_NOT_FOUND"),
            BotState::TargetFound(h) => write!(f, "FIND_NPC({})", h.0),
        }
    }
}

type Rule = fn(&Observation, &ControllerState) -> Option<BotState>;

fn idle_rule(_: &Observation, state: &ControllerState) -> Option<BotState> {
    (state.timeout_ticks > 0).then_some(BotState::Idling)
}

fn moving_rule(obs: &Observation, _: &ControllerState) -> Option<BotState> {
    obs.moving.then_some(BotState::Moving)
}

fn animating_rule(obs: &Observation, _: &ControllerState) -> Option<BotState> {
    (obs.animation != IDLE_ANIMATION).then_some(BotState::Animating)
}

fn spell_rule(obs: &Observation, _: &ControllerState) -> Option<BotState> {
    (!obs.spell_castable).then_some(BotState::SpellUnavailable)
}

fn target_rule(obs: &Observation, _: &ControllerState) -> Option<BotState> {
    Some(match obs.target {
        Some(h) => BotState::TargetFound(h),
        None => BotState::NpcNotFound,
    })
}

const RULES: [(&str, Rule); 5] = [
    ("timeout", idle_rule),
    ("moving", moving_rule),
    ("animating", animating_rule),
    ("spell", spell_rule),
    ("target", target_rule),
];

/// Pure: looks only at the snapshot and the state it is handed.
pub fn classify(obs: &Observation, state: &ControllerState) -> BotState {
    RULES
        .iter()
        .find_map(|(_, rule)| rule(obs, state))
        .unwrap_or(BotState::NpcNotFound)
}

/// Name of the rule that decided, for debug logging.
pub fn deciding_rule(obs: &Observation, state: &ControllerState) -> &'static str {
    RULES
        .iter()
        .find(|(_, rule)| rule(obs, state).is_some())
        .map(|(name, _)| *name)
        .unwrap_or("target")
}

pub fn is_casting_style(attack_style: i32) -> bool {
    CASTING_STYLES.contains(&attack_style)
}
