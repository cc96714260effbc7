//! Core engine of the Operations Desk.
//!
//! Resolves probabilistic actions against an agent's stats and the state of
//! the desk ([`ActionResolver`]), keeps long-lived registries
//! ([`EntityRegistry`]) and persists everything through type-tagged envelopes
//! revived by a [`Reviver`].
//!
//! Nothing here performs I/O except the constants loader in [`config`];
//! saving produces a string and loading consumes one.

pub mod action;
pub mod board;
pub mod config;
pub mod context;
pub mod hashing;
pub mod registry;
pub mod resolver;
pub mod reviver;
pub mod save;
pub mod stats;

pub use action::{ActionDefinition, ActionDefinitionError, ActionFlags, ActionKind, ActionParams};
pub use board::{ActionBoard, CatalogError};
pub use config::{
    load_resolver_constants_from_env, ConfigError, ResolverConstants, ResolverConstantsMetadata,
    BUILTIN_RESOLVER_CONSTANTS, RESOLVER_CONSTANTS_ENV,
};
pub use context::{
    AgentProfile, CityState, DeskSnapshot, OperationsContext, Operative, SkillMultipliers,
    StaminaState,
};
pub use hashing::{hash_identifier, FnvHasher};
pub use registry::{EntityRegistry, Organization, OrganizationMetadata, RegistryEntry};
pub use resolver::{ActionResolver, AttemptOutcome, ChanceMode, ResolveError};
pub use reviver::{serialize, serialize_map, Persist, Reviver, ReviverBuilder, ReviverError};
pub use save::{RunningTask, SaveError, SaveGame};
pub use stats::{add_offset, intelligence_bonus, weighted_competence, Stat, StatTable};

pub use ops_schema::{Envelope, SaveSections, SAVE_FORMAT_VERSION};
