//! Type-tagged serialization and the reviver that reconstructs tagged
//! payloads.
//!
//! Each persistable type implements [`Persist`]: it names a unique type tag
//! and converts itself to and from a JSON payload through an explicit data
//! struct. A [`Reviver`] maps tags to constructors. It is produced once by a
//! [`ReviverBuilder`] and is immutable afterwards, so every tag is known
//! before the first deserialization.
//!
//! Payload structs use `#[serde(default)]`, so a payload that is missing
//! fields revives with defaults for those fields.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use ops_schema::Envelope;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

use crate::action::ActionDefinition;
use crate::board::ActionBoard;
use crate::registry::Organization;
use crate::save::RunningTask;

/// A type that can be written as an [`Envelope`] and revived from one.
pub trait Persist: Sized + 'static {
    /// Tag written into the envelope. Must be unique within a reviver.
    const TYPE_TAG: &'static str;

    fn to_data(&self) -> Result<Value, ReviverError>;

    /// Rebuild an instance from its payload. Nested envelopes are revived
    /// through `reviver`.
    fn from_data(data: Value, reviver: &Reviver) -> Result<Self, ReviverError>;
}

#[derive(Debug, Error)]
pub enum ReviverError {
    #[error("no constructor registered for type tag '{0}'")]
    UnregisteredTag(String),
    #[error("type tag '{0}' is already registered")]
    DuplicateRegistration(String),
    #[error("expected type tag '{expected}', found '{found}'")]
    TagMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("malformed '{tag}' payload: {source}")]
    Malformed {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid '{tag}' payload: {reason}")]
    Invalid { tag: String, reason: String },
    #[error("expected a JSON object mapping keys to envelopes")]
    ExpectedObject,
    #[error("failed to parse serialized data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Wrap `instance` in its type-tagged envelope.
pub fn serialize<T: Persist>(instance: &T) -> Result<Envelope, ReviverError> {
    Ok(Envelope::new(T::TYPE_TAG, instance.to_data()?))
}

/// Serialize a keyed collection as a JSON object of key → envelope.
pub fn serialize_map<'a, T, I>(entries: I) -> Result<String, ReviverError>
where
    T: Persist + 'a,
    I: IntoIterator<Item = (&'a String, &'a T)>,
{
    let mut object = JsonMap::new();
    for (key, value) in entries {
        object.insert(key.clone(), serde_json::to_value(serialize(value)?)?);
    }
    Ok(serde_json::to_string(&Value::Object(object))?)
}

pub(crate) fn encode_data<D: Serialize>(tag: &str, data: &D) -> Result<Value, ReviverError> {
    serde_json::to_value(data).map_err(|source| ReviverError::Malformed {
        tag: tag.to_string(),
        source,
    })
}

pub(crate) fn decode_data<D: DeserializeOwned>(tag: &str, data: Value) -> Result<D, ReviverError> {
    serde_json::from_value(data).map_err(|source| ReviverError::Malformed {
        tag: tag.to_string(),
        source,
    })
}

/// JSON has no NaN; serde_json writes it as `null`. Read `null` back as NaN
/// so callers can apply their own NaN handling.
pub(crate) fn null_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

type Constructor = fn(Value, &Reviver) -> Result<Box<dyn Any>, ReviverError>;

fn construct<T: Persist>(data: Value, reviver: &Reviver) -> Result<Box<dyn Any>, ReviverError> {
    T::from_data(data, reviver).map(|value| Box::new(value) as Box<dyn Any>)
}

/// Collects constructors before a [`Reviver`] is built.
#[derive(Default)]
pub struct ReviverBuilder {
    constructors: HashMap<&'static str, Constructor>,
}

impl ReviverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Persist>(mut self) -> Result<Self, ReviverError> {
        if self.constructors.contains_key(T::TYPE_TAG) {
            return Err(ReviverError::DuplicateRegistration(T::TYPE_TAG.to_string()));
        }
        self.constructors.insert(T::TYPE_TAG, construct::<T>);
        tracing::debug!(target: "ops::reviver", tag = T::TYPE_TAG, "reviver.registered");
        Ok(self)
    }

    pub fn build(self) -> Reviver {
        Reviver {
            constructors: self.constructors,
        }
    }
}

/// Immutable tag → constructor table.
pub struct Reviver {
    constructors: HashMap<&'static str, Constructor>,
}

impl Reviver {
    /// Reviver with every persistable type of this crate registered.
    pub fn builtin() -> Self {
        Self::register_builtin(ReviverBuilder::new())
            .expect("builtin type tags should be unique")
            .build()
    }

    /// Register this crate's types on `builder`, for callers that add their
    /// own types to the same reviver.
    pub fn register_builtin(builder: ReviverBuilder) -> Result<ReviverBuilder, ReviverError> {
        builder
            .register::<ActionDefinition>()?
            .register::<ActionBoard>()?
            .register::<Organization>()?
            .register::<RunningTask>()
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.constructors.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Construct whatever type `tag` names.
    pub fn deserialize_any(&self, tag: &str, data: Value) -> Result<Box<dyn Any>, ReviverError> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| ReviverError::UnregisteredTag(tag.to_string()))?;
        constructor(data, self)
    }

    /// Construct a `T` from a payload tagged `tag`.
    pub fn deserialize<T: Persist>(&self, tag: &str, data: Value) -> Result<T, ReviverError> {
        if !self.is_registered(tag) {
            return Err(ReviverError::UnregisteredTag(tag.to_string()));
        }
        if tag != T::TYPE_TAG {
            return Err(ReviverError::TagMismatch {
                expected: T::TYPE_TAG,
                found: tag.to_string(),
            });
        }
        self.deserialize_any(tag, data)?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| ReviverError::TagMismatch {
                expected: T::TYPE_TAG,
                found: tag.to_string(),
            })
    }

    pub fn revive<T: Persist>(&self, envelope: Envelope) -> Result<T, ReviverError> {
        self.deserialize(&envelope.type_tag, envelope.data)
    }

    pub fn revive_value<T: Persist>(&self, value: Value) -> Result<T, ReviverError> {
        let envelope: Envelope = serde_json::from_value(value)?;
        self.revive(envelope)
    }

    pub fn revive_str<T: Persist>(&self, json: &str) -> Result<T, ReviverError> {
        self.revive(Envelope::from_json_str(json)?)
    }

    /// Revive a JSON object of key → envelope. When the source repeats a
    /// key, the last occurrence wins.
    pub fn revive_map<T: Persist>(&self, json: &str) -> Result<BTreeMap<String, T>, ReviverError> {
        let entries = match serde_json::from_str::<KeyedEntries>(json) {
            Ok(KeyedEntries(entries)) => entries,
            Err(err) if err.is_data() => return Err(ReviverError::ExpectedObject),
            Err(err) => return Err(err.into()),
        };

        let mut latest = BTreeMap::new();
        for (key, value) in entries {
            if latest.insert(key.clone(), value).is_some() {
                tracing::warn!(
                    target: "ops::reviver",
                    key = %key,
                    tag = T::TYPE_TAG,
                    "revive_map.duplicate_key"
                );
            }
        }

        latest
            .into_iter()
            .map(|(key, value)| Ok((key, self.revive_value(value)?)))
            .collect()
    }
}

/// Entries of a JSON object in source order, repeated keys included.
struct KeyedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for KeyedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = KeyedEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object mapping keys to envelopes")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(KeyedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
