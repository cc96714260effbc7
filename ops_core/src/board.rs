//! The action board: every action the desk can run, built from a seeded
//! catalog and persisted as nested action envelopes.

use std::collections::BTreeMap;

use ops_schema::Envelope;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::action::{ActionDefinition, ActionDefinitionError, ActionKind, ActionParams};
use crate::hashing::hash_identifier;
use crate::reviver::{decode_data, encode_data, serialize, Persist, Reviver, ReviverError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse action catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog entry {index} ({kind}) has no name")]
    MissingName { kind: ActionKind, index: usize },
    #[error("duplicate {kind} action '{name}'")]
    Duplicate { kind: ActionKind, name: String },
    #[error(transparent)]
    Invalid(#[from] ActionDefinitionError),
}

#[derive(Debug, Deserialize)]
struct ActionCatalog {
    #[serde(default)]
    actions: Vec<ActionCatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct ActionCatalogEntry {
    #[serde(default)]
    kind: ActionKind,
    #[serde(flatten)]
    params: ActionParams,
}

/// Every action available to the desk, grouped by kind and keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionBoard {
    actions: BTreeMap<ActionKind, BTreeMap<String, ActionDefinition>>,
}

impl ActionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from a JSON catalog of the form
    /// `{ "actions": [ { "kind": "contract", "name": "Tracking", ... } ] }`.
    ///
    /// Each entry draws its random perturbations from its own generator,
    /// seeded from `seed` and the entry's kind and name, so reordering the
    /// catalog does not change any definition.
    pub fn from_catalog_str(json: &str, seed: u64) -> Result<Self, CatalogError> {
        let catalog: ActionCatalog = serde_json::from_str(json)?;
        let mut board = Self::new();

        for (index, entry) in catalog.actions.into_iter().enumerate() {
            let kind = entry.kind;
            let name = match entry.params.name.clone() {
                Some(name) if !name.is_empty() => name,
                _ => return Err(CatalogError::MissingName { kind, index }),
            };
            if board.get(kind, &name).is_some() {
                return Err(CatalogError::Duplicate { kind, name });
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ hash_identifier(&[kind.key(), &name]));
            let action = ActionDefinition::new(kind, entry.params, &mut rng)?;
            board.insert(action);
        }

        tracing::info!(
            target: "ops::board",
            actions = board.len(),
            seed,
            "catalog.loaded"
        );
        Ok(board)
    }

    pub fn get(&self, kind: ActionKind, name: &str) -> Option<&ActionDefinition> {
        self.actions.get(&kind)?.get(name)
    }

    pub fn get_mut(&mut self, kind: ActionKind, name: &str) -> Option<&mut ActionDefinition> {
        self.actions.get_mut(&kind)?.get_mut(name)
    }

    /// Insert `action` under its kind and name, returning any definition it
    /// replaced.
    pub fn insert(&mut self, action: ActionDefinition) -> Option<ActionDefinition> {
        self.actions
            .entry(action.kind)
            .or_default()
            .insert(action.name.clone(), action)
    }

    /// All definitions, ordered by kind and then name.
    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values().flat_map(|by_name| by_name.values())
    }

    pub fn iter_kind(&self, kind: ActionKind) -> impl Iterator<Item = &ActionDefinition> {
        self.actions
            .get(&kind)
            .into_iter()
            .flat_map(|by_name| by_name.values())
    }

    pub fn len(&self) -> usize {
        self.actions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Nested action envelopes keyed by kind key, then by action name.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct ActionBoardData {
    actions: BTreeMap<String, BTreeMap<String, Envelope>>,
}

impl Persist for ActionBoard {
    const TYPE_TAG: &'static str = "ActionBoard";

    fn to_data(&self) -> Result<Value, ReviverError> {
        let mut data = ActionBoardData::default();
        for (kind, by_name) in &self.actions {
            let bucket = data.actions.entry(kind.key().to_string()).or_default();
            for (name, action) in by_name {
                bucket.insert(name.clone(), serialize(action)?);
            }
        }
        encode_data(Self::TYPE_TAG, &data)
    }

    fn from_data(data: Value, reviver: &Reviver) -> Result<Self, ReviverError> {
        let data: ActionBoardData = decode_data(Self::TYPE_TAG, data)?;
        let mut board = Self::new();
        for (kind_key, by_name) in data.actions {
            let kind = ActionKind::from_key(&kind_key).ok_or_else(|| ReviverError::Invalid {
                tag: Self::TYPE_TAG.to_string(),
                reason: format!("unknown action kind '{kind_key}'"),
            })?;
            for (name, envelope) in by_name {
                let mut action: ActionDefinition = reviver.revive(envelope)?;
                // The bucket is authoritative for identity; fill in what a
                // partial payload left out.
                action.kind = kind;
                if action.name.is_empty() {
                    action.name = name;
                } else if action.name != name {
                    return Err(ReviverError::Invalid {
                        tag: Self::TYPE_TAG.to_string(),
                        reason: format!(
                            "action '{}' stored under key '{name}'",
                            action.name
                        ),
                    });
                }
                board.insert(action);
            }
        }
        Ok(board)
    }
}
