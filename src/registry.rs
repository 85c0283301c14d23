//! Turtle registry
//!
//! Owns every turtle entity, keyed by agent id. Entities are created
//! lazily on first reference (`get_or_create`) — the registry is the only
//! component that constructs or destroys a `Turtle`. All map-level
//! mutation and iteration is mutually exclusive; per-entity update
//! serialization is handled inside `Turtle` itself.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{Result, StatusError};
use crate::turtle::Turtle;

/// The owning collection of all turtles, id → entity.
///
/// Constructed once at process start and shared behind an `Arc`;
/// collaborators receive entity references only through it.
#[derive(Debug, Default)]
pub struct TurtleRegistry {
    turtles: RwLock<HashMap<String, Arc<Turtle>>>,
}

impl TurtleRegistry {
    pub fn new() -> Self {
        Self {
            turtles: RwLock::new(HashMap::new()),
        }
    }

    /// Get the turtle for `id`, creating one in the default offline,
    /// uninitialised state if none exists yet.
    ///
    /// Fails with `InvalidArgument` for an empty (or whitespace-only) id —
    /// that indicates a collaborator bug, not bad external input.
    pub fn get_or_create(&self, id: &str) -> Result<Arc<Turtle>> {
        if id.trim().is_empty() {
            return Err(StatusError::invalid_argument("turtle id must not be empty"));
        }

        if let Some(turtle) = self.turtles.read().expect("registry lock poisoned").get(id) {
            return Ok(Arc::clone(turtle));
        }

        let mut turtles = self.turtles.write().expect("registry lock poisoned");
        // A racing creator may have inserted between the read and the
        // write lock; the first insert wins and both callers get it.
        let turtle = turtles
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(turtle_id = %id, "creating a new turtle entry");
                Arc::new(Turtle::new(id))
            });
        Ok(Arc::clone(turtle))
    }

    /// Remove the entry for `id`. Returns whether an entry existed;
    /// deleting an unknown id is a no-op, not an error.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self
            .turtles
            .write()
            .expect("registry lock poisoned")
            .remove(id)
            .is_some();
        if removed {
            debug!(turtle_id = %id, "removed turtle entry");
        }
        removed
    }

    /// Whether a turtle with the given id is registered. Pure lookup.
    pub fn exists(&self, id: &str) -> bool {
        self.turtles
            .read()
            .expect("registry lock poisoned")
            .contains_key(id)
    }

    /// Point-in-time snapshot of all registered turtles.
    ///
    /// The returned sequence is copied out under the read lock and is not
    /// invalidated by later registry mutations.
    pub fn list(&self) -> Vec<Arc<Turtle>> {
        self.turtles
            .read()
            .expect("registry lock poisoned")
            .values()
            .map(Arc::clone)
            .collect()
    }

    /// Number of registered turtles
    pub fn len(&self) -> usize {
        self.turtles.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = TurtleRegistry::new();
        let first = registry.get_or_create("42").unwrap();
        let second = registry.get_or_create("42").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_rejects_empty_id() {
        let registry = TurtleRegistry::new();
        for id in ["", "   "] {
            let err = registry.get_or_create(id).unwrap_err();
            assert!(matches!(err, StatusError::InvalidArgument(_)));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_new_turtle_starts_offline_and_uninitialised() {
        let registry = TurtleRegistry::new();
        let snapshot = registry.get_or_create("7").unwrap().snapshot();
        assert!(!snapshot.online);
        assert!(!snapshot.initialised);
    }

    #[test]
    fn test_exists_is_side_effect_free() {
        let registry = TurtleRegistry::new();
        assert!(!registry.exists("7"));
        assert!(registry.is_empty());

        registry.get_or_create("7").unwrap();
        assert!(registry.exists("7"));
    }

    #[test]
    fn test_delete_removes_and_is_noop_when_absent() {
        let registry = TurtleRegistry::new();
        registry.get_or_create("7").unwrap();

        assert!(registry.delete("7"));
        assert!(!registry.exists("7"));
        assert!(!registry.delete("7"));
    }

    #[test]
    fn test_delete_then_get_or_create_yields_a_fresh_entity() {
        let registry = TurtleRegistry::new();
        let first = registry.get_or_create("7").unwrap();
        registry.delete("7");
        let second = registry.get_or_create("7").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!second.snapshot().initialised);
    }

    #[test]
    fn test_list_is_a_point_in_time_snapshot() {
        let registry = TurtleRegistry::new();
        registry.get_or_create("a").unwrap();
        registry.get_or_create("b").unwrap();

        let listed = registry.list();
        assert_eq!(listed.len(), 2);

        // Later mutations do not invalidate the snapshot.
        registry.delete("a");
        registry.get_or_create("c").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_get_or_create_resolves_to_one_entity() {
        let registry = Arc::new(TurtleRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_create("X").unwrap())
            })
            .collect();

        let turtles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.len(), 1);
        for turtle in &turtles[1..] {
            assert!(Arc::ptr_eq(&turtles[0], turtle));
        }
    }
}
