//! The persistence boundary. A [`SaveGame`] bundles every persisted
//! subsystem and converts to and from the sectioned save string.

use ops_schema::{Envelope, SaveSections, SAVE_FORMAT_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::action::ActionKind;
use crate::board::ActionBoard;
use crate::registry::{EntityRegistry, Organization};
use crate::reviver::{decode_data, encode_data, serialize, Persist, Reviver, ReviverError};

/// An action in progress. Timing is advisory; the scheduler that owns the
/// task decides what to do when it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningTask {
    pub kind: ActionKind,
    pub name: String,
    pub elapsed_ticks: u64,
    pub duration_ticks: u64,
    /// Scratch tasks (previews, simulations) that must never be saved.
    pub temporary: bool,
}

impl RunningTask {
    pub fn new(kind: ActionKind, name: impl Into<String>, duration_ticks: u64) -> Self {
        Self {
            kind,
            name: name.into(),
            elapsed_ticks: 0,
            duration_ticks,
            temporary: false,
        }
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Advance by `ticks`, saturating at the duration. Returns whether the
    /// task is complete.
    pub fn advance(&mut self, ticks: u64) -> bool {
        self.elapsed_ticks = self
            .elapsed_ticks
            .saturating_add(ticks)
            .min(self.duration_ticks);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_ticks >= self.duration_ticks
    }

    pub fn remaining_ticks(&self) -> u64 {
        self.duration_ticks.saturating_sub(self.elapsed_ticks)
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct RunningTaskData {
    kind: ActionKind,
    name: String,
    elapsed_ticks: u64,
    duration_ticks: u64,
}

impl Persist for RunningTask {
    const TYPE_TAG: &'static str = "RunningTask";

    fn to_data(&self) -> Result<Value, ReviverError> {
        encode_data(
            Self::TYPE_TAG,
            &RunningTaskData {
                kind: self.kind,
                name: self.name.clone(),
                elapsed_ticks: self.elapsed_ticks,
                duration_ticks: self.duration_ticks,
            },
        )
    }

    fn from_data(data: Value, _reviver: &Reviver) -> Result<Self, ReviverError> {
        let data: RunningTaskData = decode_data(Self::TYPE_TAG, data)?;
        Ok(Self {
            kind: data.kind,
            name: data.name,
            elapsed_ticks: data.elapsed_ticks,
            duration_ticks: data.duration_ticks,
            temporary: false,
        })
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unsupported save format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("failed to parse save: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to restore save section '{section}': {source}")]
    Section {
        section: &'static str,
        #[source]
        source: ReviverError,
    },
}

impl SaveError {
    fn section(section: &'static str) -> impl FnOnce(ReviverError) -> Self {
        move |source| SaveError::Section { section, source }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveGame {
    pub board: ActionBoard,
    pub organizations: EntityRegistry<Organization>,
    pub tasks: Vec<RunningTask>,
}

impl SaveGame {
    pub fn to_save_string(&self) -> Result<String, SaveError> {
        let action_board = serialize(&self.board)
            .and_then(|envelope| Ok(envelope.to_json_string()?))
            .map_err(SaveError::section("action_board"))?;
        let organizations = self
            .organizations
            .to_serialized()
            .map_err(SaveError::section("organizations"))?;

        let persisted: Vec<&RunningTask> =
            self.tasks.iter().filter(|task| !task.temporary).collect();
        let tasks = persisted
            .iter()
            .map(|task| serialize(*task))
            .collect::<Result<Vec<Envelope>, _>>()
            .and_then(|envelopes| Ok(serde_json::to_string(&envelopes)?))
            .map_err(SaveError::section("tasks"))?;

        tracing::debug!(
            target: "ops::save",
            actions = self.board.len(),
            organizations = self.organizations.len(),
            tasks = persisted.len(),
            skipped_tasks = self.tasks.len() - persisted.len(),
            "save.written"
        );

        Ok(SaveSections::new(action_board, organizations, tasks).to_json_string()?)
    }

    pub fn load(save: &str, reviver: &Reviver) -> Result<Self, SaveError> {
        let sections = SaveSections::from_json_str(save)?;
        if sections.version != SAVE_FORMAT_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: sections.version,
                expected: SAVE_FORMAT_VERSION,
            });
        }

        let board = reviver
            .revive_str::<ActionBoard>(&sections.action_board)
            .map_err(SaveError::section("action_board"))?;

        let mut organizations = EntityRegistry::new();
        organizations
            .load_from_serialized(&sections.organizations, reviver)
            .map_err(SaveError::section("organizations"))?;

        let tasks: Vec<RunningTask> = if sections.tasks.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str::<Vec<Envelope>>(&sections.tasks)
                .map_err(ReviverError::from)
                .and_then(|envelopes| {
                    envelopes
                        .into_iter()
                        .map(|envelope| reviver.revive::<RunningTask>(envelope))
                        .collect()
                })
                .map_err(SaveError::section("tasks"))?
        };

        tracing::debug!(
            target: "ops::save",
            actions = board.len(),
            organizations = organizations.len(),
            tasks = tasks.len(),
            "save.loaded"
        );

        Ok(Self {
            board,
            organizations,
            tasks,
        })
    }
}
