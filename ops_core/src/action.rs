//! Action definitions: the configurable templates behind every contract,
//! operation and black op an agent can attempt.

use std::fmt;

use bitflags::bitflags;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::resolver::ResolveError;
use crate::reviver::{decode_data, encode_data, Persist, Reviver, ReviverError};
use crate::stats::{add_offset, Stat, StatTable};

/// Percentage by which a configured base difficulty is randomly shifted.
const BASE_DIFFICULTY_OFFSET_PERCENT: f64 = 10.0;

/// Subtype of an action. Selects which overridable hooks apply when the
/// resolver computes bonuses, penalties and time costs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    General,
    Contract,
    Operation,
    BlackOp,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::General,
        ActionKind::Contract,
        ActionKind::Operation,
        ActionKind::BlackOp,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ActionKind::General => "general",
            ActionKind::Contract => "contract",
            ActionKind::Operation => "operation",
            ActionKind::BlackOp => "black_op",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Whether this kind uses an assigned team.
    pub fn uses_team(self) -> bool {
        matches!(self, ActionKind::Operation | ActionKind::BlackOp)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

bitflags! {
    /// Categories that select extra global success multipliers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionFlags: u8 {
        const STEALTH = 1 << 0;
        const KILL = 1 << 1;
    }
}

/// Construction parameters. Only fields that are `Some` override the
/// defaults of a fresh definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionParams {
    pub name: Option<String>,
    pub level: Option<u32>,
    pub max_level: Option<u32>,
    pub auto_level: Option<bool>,
    pub base_difficulty: Option<f64>,
    pub difficulty_fac: Option<f64>,
    pub reward_fac: Option<f64>,
    pub successes: Option<u64>,
    pub failures: Option<u64>,
    pub rank_gain: Option<f64>,
    pub rank_loss: Option<f64>,
    pub hp_loss: Option<f64>,
    pub hp_lost: Option<f64>,
    pub is_stealth: Option<bool>,
    pub is_kill: Option<bool>,
    pub count: Option<u64>,
    pub team_count: Option<u64>,
    pub weights: Option<StatTable<f64>>,
    pub decays: Option<StatTable<f64>>,
}

impl ActionParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ActionDefinitionError {
    #[error("invalid weights for action '{name}': weights must sum to 1, they sum to {sum}")]
    InvalidWeights { name: String, sum: f64 },
    #[error("invalid decay for action '{name}': {stat} decay {value} must be at most 1")]
    InvalidDecay { name: String, stat: Stat, value: f64 },
}

/// A repeatable probabilistic task.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDefinition {
    pub name: String,
    pub kind: ActionKind,

    // Difficulty scales with level, see `difficulty`.
    pub level: u32,
    pub max_level: u32,
    pub auto_level: bool,
    pub base_difficulty: f64,
    pub difficulty_fac: f64,

    pub reward_fac: f64,

    pub successes: u64,
    pub failures: u64,

    pub rank_gain: f64,
    pub rank_loss: f64,
    pub hp_loss: f64,
    pub hp_lost: f64,

    pub flags: ActionFlags,

    /// Remaining instances of this action.
    pub count: u64,
    pub team_count: u64,

    pub weights: StatTable<f64>,
    /// Diminishing-returns exponents, each at most 1.
    pub decays: StatTable<f64>,
}

impl ActionDefinition {
    /// Build a definition from `params`, validating the stat weighting.
    ///
    /// A provided `base_difficulty` is shifted by up to 10% in either
    /// direction, and a missing `count` is drawn from 1000..=25000, both
    /// using `rng`.
    pub fn new<R: Rng + ?Sized>(
        kind: ActionKind,
        params: ActionParams,
        rng: &mut R,
    ) -> Result<Self, ActionDefinitionError> {
        let mut action = Self::blank(kind);

        if let Some(name) = params.name {
            action.name = name;
        }
        if let Some(level) = params.level {
            action.level = level;
        }
        if let Some(max_level) = params.max_level {
            action.max_level = max_level;
        }
        if let Some(auto_level) = params.auto_level {
            action.auto_level = auto_level;
        }
        // Zero means unset; the default difficulty stands.
        if let Some(base_difficulty) = params.base_difficulty.filter(|value| *value != 0.0) {
            action.base_difficulty =
                add_offset(base_difficulty, BASE_DIFFICULTY_OFFSET_PERCENT, rng);
        }
        if let Some(difficulty_fac) = params.difficulty_fac {
            action.difficulty_fac = difficulty_fac;
        }
        if let Some(reward_fac) = params.reward_fac {
            action.reward_fac = reward_fac;
        }
        if let Some(successes) = params.successes {
            action.successes = successes;
        }
        if let Some(failures) = params.failures {
            action.failures = failures;
        }
        if let Some(rank_gain) = params.rank_gain {
            action.rank_gain = rank_gain;
        }
        if let Some(rank_loss) = params.rank_loss {
            action.rank_loss = rank_loss;
        }
        if let Some(hp_loss) = params.hp_loss {
            action.hp_loss = hp_loss;
        }
        if let Some(hp_lost) = params.hp_lost {
            action.hp_lost = hp_lost;
        }
        if let Some(is_stealth) = params.is_stealth {
            action.flags.set(ActionFlags::STEALTH, is_stealth);
        }
        if let Some(is_kill) = params.is_kill {
            action.flags.set(ActionFlags::KILL, is_kill);
        }
        action.count = match params.count {
            Some(count) => count,
            None => rng.gen_range(1_000..=25_000),
        };
        if let Some(team_count) = params.team_count {
            action.team_count = team_count;
        }
        if let Some(weights) = params.weights {
            action.weights = weights;
        }
        if let Some(decays) = params.decays {
            action.decays = decays;
        }

        action.validate()?;
        Ok(action)
    }

    /// Deterministic defaults with an empty name and zero count. Used as the
    /// fallback for fields missing from a saved payload.
    pub fn blank(kind: ActionKind) -> Self {
        Self {
            name: String::new(),
            kind,
            level: 1,
            max_level: 1,
            auto_level: true,
            base_difficulty: 100.0,
            difficulty_fac: 1.01,
            reward_fac: 1.02,
            successes: 0,
            failures: 0,
            rank_gain: 0.0,
            rank_loss: 0.0,
            hp_loss: 0.0,
            hp_lost: 0.0,
            flags: ActionFlags::empty(),
            count: 0,
            team_count: 0,
            weights: StatTable::uniform(1.0 / 7.0),
            decays: StatTable::uniform(0.9),
        }
    }

    fn validate(&self) -> Result<(), ActionDefinitionError> {
        let sum = self.weights.sum();
        if sum.is_nan() || (sum - 1.0).abs() >= 10.0 * f64::EPSILON {
            return Err(ActionDefinitionError::InvalidWeights {
                name: self.name.clone(),
                sum,
            });
        }
        if let Some((stat, value)) = self
            .decays
            .iter()
            .find(|(_, decay)| decay.is_nan() || *decay > 1.0)
        {
            return Err(ActionDefinitionError::InvalidDecay {
                name: self.name.clone(),
                stat,
                value,
            });
        }
        Ok(())
    }

    pub fn is_stealth(&self) -> bool {
        self.flags.contains(ActionFlags::STEALTH)
    }

    pub fn is_kill(&self) -> bool {
        self.flags.contains(ActionFlags::KILL)
    }

    pub fn difficulty(&self) -> Result<f64, ResolveError> {
        let difficulty = self.base_difficulty * self.difficulty_fac.powf(self.level as f64 - 1.0);
        if difficulty.is_nan() {
            return Err(ResolveError::NanDifficulty {
                action: self.name.clone(),
            });
        }
        Ok(difficulty)
    }

    /// Scaling applied to rank rewards and losses at the current level.
    pub fn reward_multiplier(&self) -> f64 {
        self.reward_fac.powf(self.level as f64 - 1.0)
    }

    pub fn successes_needed_for_next_level(&self, base_successes_per_level: f64) -> u64 {
        let max_level = self.max_level as f64;
        (0.5 * max_level * (2.0 * base_successes_per_level + (max_level - 1.0))).ceil() as u64
    }

    /// Raise `max_level` by one if enough successes have accumulated.
    /// Climbing several levels takes several calls.
    pub fn set_max_level(&mut self, base_successes_per_level: f64) -> bool {
        if self.successes >= self.successes_needed_for_next_level(base_successes_per_level) {
            self.max_level += 1;
            true
        } else {
            false
        }
    }

    pub fn record_outcome(&mut self, success: bool) {
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    pub fn attempts(&self) -> u64 {
        self.successes + self.failures
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ActionData {
    name: String,
    kind: ActionKind,
    level: u32,
    max_level: u32,
    auto_level: bool,
    base_difficulty: f64,
    difficulty_fac: f64,
    reward_fac: f64,
    successes: u64,
    failures: u64,
    rank_gain: f64,
    rank_loss: f64,
    hp_loss: f64,
    hp_lost: f64,
    is_stealth: bool,
    is_kill: bool,
    count: u64,
    team_count: u64,
    weights: StatTable<f64>,
    decays: StatTable<f64>,
}

impl Default for ActionData {
    fn default() -> Self {
        ActionData::from(&ActionDefinition::blank(ActionKind::default()))
    }
}

impl From<&ActionDefinition> for ActionData {
    fn from(action: &ActionDefinition) -> Self {
        Self {
            name: action.name.clone(),
            kind: action.kind,
            level: action.level,
            max_level: action.max_level,
            auto_level: action.auto_level,
            base_difficulty: action.base_difficulty,
            difficulty_fac: action.difficulty_fac,
            reward_fac: action.reward_fac,
            successes: action.successes,
            failures: action.failures,
            rank_gain: action.rank_gain,
            rank_loss: action.rank_loss,
            hp_loss: action.hp_loss,
            hp_lost: action.hp_lost,
            is_stealth: action.is_stealth(),
            is_kill: action.is_kill(),
            count: action.count,
            team_count: action.team_count,
            weights: action.weights.clone(),
            decays: action.decays.clone(),
        }
    }
}

impl From<ActionData> for ActionDefinition {
    fn from(data: ActionData) -> Self {
        let mut flags = ActionFlags::empty();
        flags.set(ActionFlags::STEALTH, data.is_stealth);
        flags.set(ActionFlags::KILL, data.is_kill);
        Self {
            name: data.name,
            kind: data.kind,
            level: data.level,
            max_level: data.max_level,
            auto_level: data.auto_level,
            base_difficulty: data.base_difficulty,
            difficulty_fac: data.difficulty_fac,
            reward_fac: data.reward_fac,
            successes: data.successes,
            failures: data.failures,
            rank_gain: data.rank_gain,
            rank_loss: data.rank_loss,
            hp_loss: data.hp_loss,
            hp_lost: data.hp_lost,
            flags,
            count: data.count,
            team_count: data.team_count,
            weights: data.weights,
            decays: data.decays,
        }
    }
}

impl Persist for ActionDefinition {
    const TYPE_TAG: &'static str = "Action";

    fn to_data(&self) -> Result<Value, ReviverError> {
        encode_data(Self::TYPE_TAG, &ActionData::from(self))
    }

    fn from_data(data: Value, _reviver: &Reviver) -> Result<Self, ReviverError> {
        decode_data::<ActionData>(Self::TYPE_TAG, data).map(ActionDefinition::from)
    }
}
