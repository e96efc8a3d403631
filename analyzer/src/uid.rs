//! Opaque interned identifiers shared with the native analyzer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};

/// An interned identifier. Equality and hashing only; the spelling is
/// exposed for translation tables, never parsed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(Arc<str>);

fn interner() -> &'static Mutex<HashSet<Arc<str>>> {
    static INTERNER: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();
    INTERNER.get_or_init(|| Mutex::new(HashSet::new()))
}

impl Uid {
    /// Intern `spelling`, returning a handle sharing storage with every
    /// other `Uid` of the same spelling.
    #[must_use]
    pub fn intern(spelling: &str) -> Self {
        let mut set = interner().lock().expect("uid interner poisoned");
        if let Some(existing) = set.get(spelling) {
            return Self(existing.clone());
        }
        let stored: Arc<str> = Arc::from(spelling);
        set.insert(stored.clone());
        Self(stored)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
