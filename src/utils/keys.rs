//! API key pool with pure rotation.
//!
//! The generation collaborator rotates across several hosted-API keys when a
//! call is throttled. The pool is an explicit value passed into the call
//! site; rotation is a pure function of the attempt index, with no hidden
//! shared state.

/// An ordered pool of API keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    /// Build a pool, discarding empty entries.
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .filter(|k| !k.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Key to use for the given 0-based attempt, rotating modulo pool size.
    pub fn key_for_attempt(&self, attempt: usize) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        Some(self.keys[attempt % self.keys.len()].as_str())
    }
}
