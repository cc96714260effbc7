//! Keyed registries of long-lived named entities.
//!
//! A registry is rebuilt from static metadata whenever the game starts over.
//! Some state (an organization's favor, for instance) has to survive that
//! rebuild, so each entry type exposes one carried value that is copied from
//! the previous entry with the same key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reviver::{
    decode_data, encode_data, null_as_nan, serialize_map, Persist, Reviver, ReviverError,
};

/// An entry that can live in an [`EntityRegistry`].
pub trait RegistryEntry {
    type Metadata;

    fn from_metadata(metadata: Self::Metadata) -> Self;

    fn key(&self) -> &str;

    /// Restore the key of an entry revived from a payload that omitted it.
    fn set_key(&mut self, key: &str);

    /// Value preserved across a full rebuild.
    fn carried_state(&self) -> f64;

    fn set_carried_state(&mut self, value: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRegistry<E> {
    entries: BTreeMap<String, E>,
}

impl<E> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E: RegistryEntry> EntityRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with one built from `metadata`, carrying state over
    /// from the previous entry of the same key. New keys start at 0, as do
    /// carried values that are NaN.
    pub fn rebuild_all<I>(&mut self, metadata: I)
    where
        I: IntoIterator<Item = E::Metadata>,
    {
        let previous = std::mem::take(&mut self.entries);

        for record in metadata {
            let entry = E::from_metadata(record);
            let key = entry.key().to_string();
            if self.entries.contains_key(&key) {
                tracing::warn!(
                    target: "ops::registry",
                    key = %key,
                    "registry.duplicate_key"
                );
            }
            self.entries.insert(key, entry);
        }

        for (key, entry) in self.entries.iter_mut() {
            let carried = match previous.get(key) {
                Some(old) => {
                    let value = old.carried_state();
                    if value.is_nan() {
                        0.0
                    } else {
                        value
                    }
                }
                None => 0.0,
            };
            entry.set_carried_state(carried);
        }

        tracing::debug!(
            target: "ops::registry",
            entries = self.entries.len(),
            carried = previous.len(),
            "registry.rebuilt"
        );
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut E> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }
}

impl<E: RegistryEntry + Persist> EntityRegistry<E> {
    /// Replace the mapping with the key → entity object revived from
    /// `payload`. On error the current mapping is left untouched. Entries
    /// whose payload lacks a key take the one they are stored under.
    pub fn load_from_serialized(
        &mut self,
        payload: &str,
        reviver: &Reviver,
    ) -> Result<(), ReviverError> {
        let mut entries: BTreeMap<String, E> = reviver.revive_map(payload)?;
        for (key, entry) in entries.iter_mut() {
            if entry.key().is_empty() {
                entry.set_key(key);
            }
        }
        self.entries = entries;
        Ok(())
    }

    pub fn to_serialized(&self) -> Result<String, ReviverError> {
        serialize_map(self.entries.iter())
    }
}

/// Static description of an organization.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationMetadata {
    pub name: String,
    #[serde(default)]
    pub info: String,
    #[serde(default = "default_multiplier")]
    pub exp_multiplier: f64,
    #[serde(default = "default_multiplier")]
    pub salary_multiplier: f64,
    #[serde(default)]
    pub job_stat_req_offset: f64,
}

impl OrganizationMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: String::new(),
            exp_multiplier: 1.0,
            salary_multiplier: 1.0,
            job_stat_req_offset: 0.0,
        }
    }

    /// Parse a JSON array of metadata records.
    pub fn list_from_json_str(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn default_multiplier() -> f64 {
    1.0
}

/// A company-like organization whose favor persists across resets.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub name: String,
    pub info: String,
    pub exp_multiplier: f64,
    pub salary_multiplier: f64,
    pub job_stat_req_offset: f64,
    pub favor: f64,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_metadata(OrganizationMetadata::named(name))
    }
}

impl RegistryEntry for Organization {
    type Metadata = OrganizationMetadata;

    fn from_metadata(metadata: OrganizationMetadata) -> Self {
        Self {
            name: metadata.name,
            info: metadata.info,
            exp_multiplier: metadata.exp_multiplier,
            salary_multiplier: metadata.salary_multiplier,
            job_stat_req_offset: metadata.job_stat_req_offset,
            favor: 0.0,
        }
    }

    fn key(&self) -> &str {
        &self.name
    }

    fn set_key(&mut self, key: &str) {
        self.name = key.to_string();
    }

    fn carried_state(&self) -> f64 {
        self.favor
    }

    fn set_carried_state(&mut self, value: f64) {
        self.favor = value;
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct OrganizationData {
    name: String,
    info: String,
    exp_multiplier: f64,
    salary_multiplier: f64,
    job_stat_req_offset: f64,
    #[serde(deserialize_with = "null_as_nan")]
    favor: f64,
}

impl Default for OrganizationData {
    fn default() -> Self {
        Self {
            name: String::new(),
            info: String::new(),
            exp_multiplier: 1.0,
            salary_multiplier: 1.0,
            job_stat_req_offset: 0.0,
            favor: 0.0,
        }
    }
}

impl Persist for Organization {
    const TYPE_TAG: &'static str = "Organization";

    fn to_data(&self) -> Result<Value, ReviverError> {
        encode_data(
            Self::TYPE_TAG,
            &OrganizationData {
                name: self.name.clone(),
                info: self.info.clone(),
                exp_multiplier: self.exp_multiplier,
                salary_multiplier: self.salary_multiplier,
                job_stat_req_offset: self.job_stat_req_offset,
                favor: self.favor,
            },
        )
    }

    fn from_data(data: Value, _reviver: &Reviver) -> Result<Self, ReviverError> {
        let data: OrganizationData = decode_data(Self::TYPE_TAG, data)?;
        Ok(Self {
            name: data.name,
            info: data.info,
            exp_multiplier: data.exp_multiplier,
            salary_multiplier: data.salary_multiplier,
            job_stat_req_offset: data.job_stat_req_offset,
            favor: data.favor,
        })
    }
}
