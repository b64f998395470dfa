//! Process-wide string interning.
//!
//! Every name in the feature model (sequence names, feature-set names,
//! feature identifiers, style names) is stored as a [`Quark`]: a small
//! integer handle that is stable for the lifetime of the process. The same
//! string always interns to the same quark, so hash lookups and identity
//! comparisons never touch the string itself.
//!
//! Quark `0` is reserved and means "no value" ([`Quark::NULL`]).
use std::fmt;
use std::sync::RwLock;

use arcstr::ArcStr;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

static INTERNER: Lazy<RwLock<Interner>> =
    Lazy::new(|| RwLock::new(Interner::new()));

/// Interned string handle.
#[derive(Eq, Hash, PartialEq, Copy, Clone, PartialOrd, Ord, Default)]
pub struct Quark(u32);

impl Quark {
    /// The reserved "no value" quark.
    pub const NULL: Quark = Quark(0);

    /// Interns `s`, returning its stable handle. The empty string maps to
    /// [`Quark::NULL`].
    pub fn intern(s: &str) -> Quark {
        if s.is_empty() {
            return Quark::NULL;
        }
        if let Some(q) = INTERNER
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .lookup(s)
        {
            return q;
        }
        INTERNER
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(s)
    }

    /// Returns the quark for `s` only if it has been interned before.
    pub fn try_from_str(s: &str) -> Option<Quark> {
        if s.is_empty() {
            return Some(Quark::NULL);
        }
        INTERNER
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .lookup(s)
    }

    /// Resolves the handle back to its string. [`Quark::NULL`] resolves to
    /// the empty string.
    pub fn as_str(&self) -> ArcStr {
        INTERNER
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .resolve(*self)
    }

    pub fn is_null(&self) -> bool { self.0 == 0 }

    pub fn raw(&self) -> u32 { self.0 }
}

impl From<&str> for Quark {
    fn from(value: &str) -> Self { Quark::intern(value) }
}

impl From<String> for Quark {
    fn from(value: String) -> Self { Quark::intern(&value) }
}

impl fmt::Display for Quark {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Quark {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.is_null() {
            write!(f, "Quark(null)")
        }
        else {
            write!(f, "Quark({}:{:?})", self.0, self.as_str().as_str())
        }
    }
}

impl Serialize for Quark {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer, {
        serializer.serialize_str(self.as_str().as_str())
    }
}

impl<'de> Deserialize<'de> for Quark {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>, {
        let s = String::deserialize(deserializer)?;
        Ok(Quark::intern(&s))
    }
}

struct Interner {
    ids:     HashMap<ArcStr, Quark>,
    strings: Vec<ArcStr>,
}

impl Interner {
    fn new() -> Self {
        Self {
            ids:     HashMap::new(),
            // slot 0 backs Quark::NULL
            strings: vec![ArcStr::new()],
        }
    }

    fn lookup(
        &self,
        s: &str,
    ) -> Option<Quark> {
        self.ids.get(s).copied()
    }

    fn insert(
        &mut self,
        s: &str,
    ) -> Quark {
        // Another writer may have won the race between read and write lock.
        if let Some(q) = self.ids.get(s) {
            return *q;
        }
        let q = Quark(self.strings.len() as u32);
        let stored = ArcStr::from(s);
        self.strings.push(stored.clone());
        self.ids.insert(stored, q);
        q
    }

    fn resolve(
        &self,
        q: Quark,
    ) -> ArcStr {
        self.strings
            .get(q.0 as usize)
            .cloned()
            .unwrap_or_default()
    }
}
