//! Stat identifiers and the weighted, decayed competence model.
//!
//! Every action weighs the acting agent's stats differently. A stat's
//! contribution is `weight * (efficiency * level) ^ decay`, where the decay
//! exponent (at most 1) gives diminishing returns on very high levels.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Agent attribute used by action weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    #[serde(rename = "hack")]
    Hacking,
    #[serde(rename = "str")]
    Strength,
    #[serde(rename = "def")]
    Defense,
    #[serde(rename = "dex")]
    Dexterity,
    #[serde(rename = "agi")]
    Agility,
    #[serde(rename = "cha")]
    Charisma,
    #[serde(rename = "int")]
    Intelligence,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Hacking,
        Stat::Strength,
        Stat::Defense,
        Stat::Dexterity,
        Stat::Agility,
        Stat::Charisma,
        Stat::Intelligence,
    ];

    /// Short key used in catalogs and save payloads.
    pub fn key(self) -> &'static str {
        match self {
            Stat::Hacking => "hack",
            Stat::Strength => "str",
            Stat::Defense => "def",
            Stat::Dexterity => "dex",
            Stat::Agility => "agi",
            Stat::Charisma => "cha",
            Stat::Intelligence => "int",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mapping from [`Stat`] to a value. Absent stats are simply not present;
/// callers decide what an absent entry means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatTable<T>(BTreeMap<Stat, T>);

impl<T> Default for StatTable<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: Copy> StatTable<T> {
    /// Table with every stat set to `value`.
    pub fn uniform(value: T) -> Self {
        Stat::ALL.iter().map(|stat| (*stat, value)).collect()
    }

    pub fn get(&self, stat: Stat) -> Option<T> {
        self.0.get(&stat).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, T)> + '_ {
        self.0.iter().map(|(stat, value)| (*stat, *value))
    }
}

impl<T> StatTable<T> {
    pub fn insert(&mut self, stat: Stat, value: T) -> Option<T> {
        self.0.insert(stat, value)
    }

    pub fn contains(&self, stat: Stat) -> bool {
        self.0.contains_key(&stat)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.values()
    }

    pub fn stats(&self) -> impl Iterator<Item = Stat> + '_ {
        self.0.keys().copied()
    }
}

impl<T> FromIterator<(Stat, T)> for StatTable<T> {
    fn from_iter<I: IntoIterator<Item = (Stat, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl StatTable<f64> {
    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }
}

/// Weighted, decayed combination of stat levels.
///
/// Only stats present in `weights` contribute. A stat with a weight but no
/// decay entry contributes linearly. `efficiency` and `level` are looked up
/// per weighted stat.
pub fn weighted_competence(
    weights: &StatTable<f64>,
    decays: &StatTable<f64>,
    mut efficiency: impl FnMut(Stat) -> f64,
    mut level: impl FnMut(Stat) -> f64,
) -> f64 {
    weights
        .iter()
        .map(|(stat, weight)| {
            let decay = decays.get(stat).unwrap_or(1.0);
            weight * (efficiency(stat) * level(stat)).powf(decay)
        })
        .sum()
}

/// Multiplicative bonus granted by the intelligence attribute.
///
/// Zero intelligence yields exactly 1.
pub fn intelligence_bonus(intelligence: f64, weight: f64) -> f64 {
    1.0 + (weight * intelligence.max(0.0).powf(0.8)) / 600.0
}

/// Shift `midpoint` by a uniform offset of up to `percentage` percent in
/// either direction. Percentages outside 0..=100 leave the midpoint as is.
pub fn add_offset<R: Rng + ?Sized>(midpoint: f64, percentage: f64, rng: &mut R) -> f64 {
    if !(0.0..=100.0).contains(&percentage) {
        return midpoint;
    }
    let offset = midpoint * (percentage / 100.0);
    midpoint + (rng.gen::<f64>() * (2.0 * offset) - offset)
}
