//! Effect trait - pluggable scoring module interface
//!
//! Effects subscribe to lifecycle/snapshot events and accumulate bonus
//! credit into the match context. Each effect owns its accumulation state.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::{ContractError, MatchContext, MatchEvent};

/// Pluggable scoring effect.
///
/// Instances are created at match setup, `load`ed (which may request sensor
/// sources and may fail, aborting match start), then receive every
/// `MatchEvent` synchronously in registration order.
pub trait Effect: Send {
    /// Identifier used for bonus records, logging and metrics.
    fn id(&self) -> EffectId;

    /// Prepare the effect for a match.
    ///
    /// # Errors
    /// Returns an effect-load error when a required capability (e.g. a
    /// compatible sensor) is unavailable; fatal to starting that match.
    fn load(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Handle one match event.
    fn on_event(&mut self, event: &MatchEvent, ctx: &mut MatchContext);
}

/// Effect identifier with cheap cloning.
///
/// Internally uses `Arc<str>` so cloning only increments a reference count.
/// Identifiers are created once at configuration time and cloned on every
/// bonus record.
#[derive(Clone, Default)]
pub struct EffectId(Arc<str>);

impl EffectId {
    /// Create a new EffectId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for EffectId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for EffectId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EffectId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for EffectId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectId({:?})", self.0)
    }
}

impl PartialEq for EffectId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for EffectId {}

impl PartialEq<str> for EffectId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for EffectId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Hash for EffectId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for EffectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EffectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
