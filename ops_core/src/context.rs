//! What the resolver reads from the running game: desk-wide multipliers and
//! location state ([`OperationsContext`]) and the agent carrying out the
//! action ([`Operative`]).
//!
//! The traits keep the resolver independent of how game state is stored.
//! [`DeskSnapshot`] and [`AgentProfile`] are plain serde-backed
//! implementations used by tools and tests.

use serde::{Deserialize, Serialize};

use crate::stats::{Stat, StatTable};

/// Multipliers granted by desk-wide skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillMultipliers {
    /// Per-stat efficiency. A stat without an entry is treated as 1 by the
    /// resolver, with a warning.
    pub efficiency: StatTable<f64>,
    pub success_chance_all: f64,
    pub success_chance_stealth: f64,
    pub success_chance_kill: f64,
    pub success_chance_contract: f64,
    pub success_chance_operation: f64,
    /// Scales action duration. Normally below 1.
    pub action_time: f64,
}

impl Default for SkillMultipliers {
    fn default() -> Self {
        Self {
            efficiency: StatTable::uniform(1.0),
            success_chance_all: 1.0,
            success_chance_stealth: 1.0,
            success_chance_kill: 1.0,
            success_chance_contract: 1.0,
            success_chance_operation: 1.0,
            action_time: 1.0,
        }
    }
}

/// State of the location the desk is operating in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityState {
    pub pop: f64,
    pub pop_est: f64,
    pub chaos: f64,
    pub comms: f64,
}

impl Default for CityState {
    fn default() -> Self {
        Self {
            pop: 1e9,
            pop_est: 1e9,
            chaos: 0.0,
            comms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaState {
    pub current: f64,
    pub max: f64,
}

impl Default for StaminaState {
    fn default() -> Self {
        Self {
            current: 1.0,
            max: 1.0,
        }
    }
}

impl StaminaState {
    /// Competence factor: 1 while at least half the maximum stamina remains,
    /// falling linearly to 0 below that.
    pub fn penalty(&self) -> f64 {
        (self.current / (0.5 * self.max)).min(1.0)
    }
}

pub trait OperationsContext {
    fn multipliers(&self) -> &SkillMultipliers;

    fn current_city(&self) -> &CityState;

    fn stamina_penalty(&self) -> f64;

    /// Members available for team actions.
    fn team_size(&self) -> u64;
}

pub trait Operative {
    fn stat_level(&self, stat: Stat) -> f64;

    fn intelligence(&self) -> f64 {
        self.stat_level(Stat::Intelligence)
    }

    /// Agent-specific success chance multiplier, e.g. from augmentations.
    fn success_chance_mult(&self) -> f64;
}

/// Serializable snapshot of an operations desk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskSnapshot {
    pub multipliers: SkillMultipliers,
    pub city: CityState,
    pub stamina: StaminaState,
    pub team_size: u64,
}

impl DeskSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl OperationsContext for DeskSnapshot {
    fn multipliers(&self) -> &SkillMultipliers {
        &self.multipliers
    }

    fn current_city(&self) -> &CityState {
        &self.city
    }

    fn stamina_penalty(&self) -> f64 {
        self.stamina.penalty()
    }

    fn team_size(&self) -> u64 {
        self.team_size
    }
}

/// Serializable agent. Stats without an entry have level 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub stats: StatTable<f64>,
    pub success_chance_mult: f64,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            stats: StatTable::default(),
            success_chance_mult: 1.0,
        }
    }
}

impl AgentProfile {
    pub fn with_stats(stats: impl IntoIterator<Item = (Stat, f64)>) -> Self {
        Self {
            stats: stats.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Operative for AgentProfile {
    fn stat_level(&self, stat: Stat) -> f64 {
        self.stats.get(stat).unwrap_or(0.0)
    }

    fn success_chance_mult(&self) -> f64 {
        self.success_chance_mult
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamina_penalty_saturates_at_half_max() {
        let full = StaminaState {
            current: 80.0,
            max: 100.0,
        };
        assert_eq!(full.penalty(), 1.0);

        let low = StaminaState {
            current: 25.0,
            max: 100.0,
        };
        assert_eq!(low.penalty(), 0.5);
    }

    #[test]
    fn desk_snapshot_fills_missing_sections() {
        let desk = DeskSnapshot::from_json_str(
            r#"{ "city": { "chaos": 75.0 }, "team_size": 12 }"#,
        )
        .unwrap();
        assert_eq!(desk.city.chaos, 75.0);
        assert_eq!(desk.city.pop, 1e9);
        assert_eq!(desk.team_size, 12);
        assert_eq!(desk.multipliers.efficiency.get(Stat::Agility), Some(1.0));
        assert_eq!(desk.stamina_penalty(), 1.0);
    }

    #[test]
    fn sparse_efficiency_table_is_kept_sparse() {
        let desk = DeskSnapshot::from_json_str(
            r#"{ "multipliers": { "efficiency": { "hack": 1.5 } } }"#,
        )
        .unwrap();
        assert_eq!(desk.multipliers.efficiency.get(Stat::Hacking), Some(1.5));
        assert_eq!(desk.multipliers.efficiency.get(Stat::Strength), None);
        assert_eq!(desk.multipliers.success_chance_all, 1.0);
    }

    #[test]
    fn agent_defaults_missing_stats_to_zero() {
        let agent = AgentProfile::from_json_str(r#"{ "stats": { "int": 250.0 } }"#).unwrap();
        assert_eq!(agent.intelligence(), 250.0);
        assert_eq!(agent.stat_level(Stat::Charisma), 0.0);
        assert_eq!(agent.success_chance_mult(), 1.0);
    }
}
