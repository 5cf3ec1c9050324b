//! Object Registry
//!
//! Owns every live `GameObject`, keyed by identifier. Objects sit in slots
//! kept in insertion order so iteration (and render-layer tie breaking) is
//! stable.
//!
//! While the scheduler runs a hook it moves the object out of its slot and
//! leaves a `Borrowed` marker behind. Removing an object that is currently
//! borrowed only tombstones the marker; the object is dropped when the
//! scheduler hands it back.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tracing::{debug, warn};

use super::camera::Camera;
use super::object::{Behavior, Flags, GameObject, ObjectSpec};

/// Registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("an object with identifier `{0}` already exists")]
    DuplicateIdentifier(String),
    #[error("invalid descriptor `{identifier}`: {reason}")]
    InvalidDescriptor { identifier: String, reason: String },
    #[error("no object with identifier `{0}`")]
    NotFound(String),
}

/// Where an object is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Imported, `init` not yet run
    PendingInit,
    /// Initialized, eligible for ticks
    Active,
    /// A hook failed; excluded from all further ticks
    Failed,
}

enum Slot {
    Vacant,
    Occupied {
        object: GameObject,
        lifecycle: Lifecycle,
    },
    /// Object is out for dispatch
    Borrowed {
        lifecycle: Lifecycle,
        removed: bool,
    },
}

/// Outcome of a batch import
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub rejected: Vec<RegistryError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

pub struct Registry {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    /// Slots whose `init` has not run yet, in import order
    pending_init: VecDeque<usize>,
    /// First slot holding an `IS_PLAYER` object
    player: Option<usize>,
    vacant: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            pending_init: VecDeque::new(),
            player: None,
            vacant: 0,
        }
    }

    /// Number of registered objects (including failed and borrowed ones)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Validate and register one object. The object is queued for `init`.
    pub fn insert(&mut self, spec: ObjectSpec) -> Result<(), RegistryError> {
        if let Err(reason) = spec.validate() {
            return Err(RegistryError::InvalidDescriptor {
                identifier: spec.identifier().to_string(),
                reason,
            });
        }
        if self.index.contains_key(spec.identifier()) {
            return Err(RegistryError::DuplicateIdentifier(spec.identifier().to_string()));
        }

        let object = spec.materialize();
        let slot = self.slots.len();
        if object.has_flag(Flags::IS_PLAYER) && self.player.is_none() {
            self.player = Some(slot);
        }
        self.index.insert(object.identifier().to_string(), slot);
        self.slots.push(Slot::Occupied {
            object,
            lifecycle: Lifecycle::PendingInit,
        });
        self.pending_init.push_back(slot);
        Ok(())
    }

    /// Register a batch. Offending items are rejected and logged; the rest
    /// of the batch proceeds.
    pub fn import_objects(&mut self, specs: impl IntoIterator<Item = ObjectSpec>) -> ImportReport {
        let mut report = ImportReport::default();
        for spec in specs {
            let identifier = spec.identifier().to_string();
            match self.insert(spec) {
                Ok(()) => report.imported.push(identifier),
                Err(err) => {
                    warn!(identifier = %identifier, error = %err, "rejected object descriptor");
                    report.rejected.push(err);
                }
            }
        }
        debug!(
            imported = report.imported.len(),
            rejected = report.rejected.len(),
            "import batch"
        );
        report
    }

    /// Nullable lookup. Objects currently running a hook are not visible.
    pub fn get(&self, identifier: &str) -> Option<&GameObject> {
        match self.slots.get(*self.index.get(identifier)?)? {
            Slot::Occupied { object, .. } => Some(object),
            Slot::Borrowed { .. } => {
                debug!(identifier, "lookup of an object that is running a hook");
                None
            }
            Slot::Vacant => None,
        }
    }

    /// Lookup for callers that want `?`
    pub fn lookup(&self, identifier: &str) -> Result<&GameObject, RegistryError> {
        self.get(identifier)
            .ok_or_else(|| RegistryError::NotFound(identifier.to_string()))
    }

    pub fn lifecycle(&self, identifier: &str) -> Option<Lifecycle> {
        match self.slots.get(*self.index.get(identifier)?)? {
            Slot::Occupied { lifecycle, .. } | Slot::Borrowed { lifecycle, .. } => Some(*lifecycle),
            Slot::Vacant => None,
        }
    }

    /// Mutable access to another object's behavior state
    pub(crate) fn behavior_mut<B: Behavior>(&mut self, identifier: &str) -> Option<&mut B> {
        let slot = *self.index.get(identifier)?;
        match self.slots.get_mut(slot)? {
            Slot::Occupied { object, .. } => object.behavior_mut::<B>(),
            _ => None,
        }
    }

    /// Deregister. Returns false if nothing was registered under `identifier`.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let Some(slot) = self.index.remove(identifier) else {
            return false;
        };
        match &mut self.slots[slot] {
            Slot::Borrowed { removed, .. } => *removed = true,
            other => {
                *other = Slot::Vacant;
                self.vacant += 1;
            }
        }
        if self.player == Some(slot) {
            self.player = self.find_player();
        }
        true
    }

    /// Objects in insertion order. Borrowed objects are skipped.
    pub fn all(&self) -> impl Iterator<Item = &GameObject> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { object, .. } => Some(object),
            _ => None,
        })
    }

    /// The object the camera follows
    pub fn player(&self) -> Option<&GameObject> {
        match self.slots.get(self.player?)? {
            Slot::Occupied { object, .. } => Some(object),
            _ => None,
        }
    }

    fn find_player(&self) -> Option<usize> {
        self.slots.iter().position(|slot| match slot {
            Slot::Occupied { object, .. } => object.has_flag(Flags::IS_PLAYER),
            // Flags are not visible while borrowed; restore() re-checks
            _ => false,
        })
    }

    // =========================================================================
    // Scheduler plumbing
    // =========================================================================

    pub(crate) fn next_pending_init(&mut self) -> Option<usize> {
        self.pending_init.pop_front()
    }

    /// Move an object out for dispatch
    pub(crate) fn take(&mut self, slot: usize) -> Option<(GameObject, Lifecycle)> {
        let entry = self.slots.get_mut(slot)?;
        let lifecycle = match entry {
            Slot::Occupied { lifecycle, .. } => *lifecycle,
            _ => return None,
        };
        match std::mem::replace(entry, Slot::Borrowed { lifecycle, removed: false }) {
            Slot::Occupied { object, .. } => Some((object, lifecycle)),
            _ => None,
        }
    }

    /// Hand an object back after dispatch, with its new lifecycle.
    /// Objects removed while borrowed are dropped here.
    pub(crate) fn restore(&mut self, slot: usize, object: GameObject, lifecycle: Lifecycle) {
        let Some(entry) = self.slots.get_mut(slot) else {
            return;
        };
        if let Slot::Borrowed { removed: true, .. } = entry {
            debug!(identifier = object.identifier(), "dropping object removed during its own hook");
            *entry = Slot::Vacant;
            self.vacant += 1;
            return;
        }
        let is_player = object.has_flag(Flags::IS_PLAYER);
        *entry = Slot::Occupied { object, lifecycle };
        if is_player && self.player.map_or(true, |p| p > slot) {
            self.player = Some(slot);
        } else if !is_player && self.player == Some(slot) {
            self.player = self.find_player();
        }
    }

    /// Active objects that carry `always` or are visible to `camera`,
    /// in insertion order
    pub(crate) fn eligible(&self, always: Flags, camera: &Camera) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                Slot::Occupied {
                    object,
                    lifecycle: Lifecycle::Active,
                } if object.flags.contains(always)
                    || camera.is_visible(object.global_position, object.bounding_box) =>
                {
                    Some(idx)
                }
                _ => None,
            })
            .collect()
    }

    pub(crate) fn render_layer(&self, slot: usize) -> i32 {
        match self.slots.get(slot) {
            Some(Slot::Occupied { object, .. }) => object.render_layer,
            _ => 0,
        }
    }

    pub(crate) fn tombstones(&self) -> usize {
        self.vacant
    }

    /// Squeeze out vacant slots, preserving order. Must not run while any
    /// object is borrowed.
    pub(crate) fn compact(&mut self) {
        if self.vacant == 0 {
            return;
        }
        let mut remap = vec![usize::MAX; self.slots.len()];
        let old = std::mem::take(&mut self.slots);
        for (old_idx, slot) in old.into_iter().enumerate() {
            if matches!(slot, Slot::Vacant) {
                continue;
            }
            remap[old_idx] = self.slots.len();
            self.slots.push(slot);
        }
        for slot in self.index.values_mut() {
            *slot = remap[*slot];
        }
        self.pending_init = self
            .pending_init
            .iter()
            .map(|&slot| remap[slot])
            .filter(|&slot| slot != usize::MAX)
            .collect();
        self.player = self.player.map(|slot| remap[slot]).filter(|&slot| slot != usize::MAX);
        debug!(removed = self.vacant, live = self.slots.len(), "compacted registry");
        self.vacant = 0;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Registry {
    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// Number of objects waiting for their `init`
    pub fn pending_init_count(&self) -> usize {
        self.pending_init.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rect::Rect;
    use macroquad::math::Vec2;

    fn camera_at_origin() -> Camera {
        Camera::new(Some(Vec2::ZERO), Vec2::new(800.0, 600.0), 0.0)
    }

    fn activate_all(registry: &mut Registry) {
        while let Some(slot) = registry.next_pending_init() {
            if let Some((object, _)) = registry.take(slot) {
                registry.restore(slot, object, Lifecycle::Active);
            }
        }
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut registry = Registry::new();
        registry.insert(ObjectSpec::new("ship").position(1.0, 2.0)).unwrap();

        let err = registry.insert(ObjectSpec::new("ship").position(99.0, 99.0)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateIdentifier("ship".to_string()));

        // Original untouched
        let ship = registry.get("ship").unwrap();
        assert_eq!(ship.global_position, Vec2::new(1.0, 2.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_import_batch_rejects_only_offenders() {
        let mut registry = Registry::new();
        let report = registry.import_objects(vec![
            ObjectSpec::new("a"),
            ObjectSpec::new("a"),
            ObjectSpec::new(""),
            ObjectSpec::new("b"),
        ]);
        assert_eq!(report.imported, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(report.rejected[0], RegistryError::DuplicateIdentifier(_)));
        assert!(matches!(report.rejected[1], RegistryError::InvalidDescriptor { .. }));
        assert_eq!(registry.pending_init_count(), 2);
    }

    #[test]
    fn test_lookup_and_remove() {
        let mut registry = Registry::new();
        registry.insert(ObjectSpec::new("rock")).unwrap();

        assert!(registry.lookup("rock").is_ok());
        assert_eq!(
            registry.lookup("comet").unwrap_err(),
            RegistryError::NotFound("comet".to_string())
        );

        assert!(registry.remove("rock"));
        assert!(!registry.remove("rock"));
        assert!(registry.get("rock").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_borrowed_object_hidden_from_lookup() {
        let mut registry = Registry::new();
        registry.insert(ObjectSpec::new("busy")).unwrap();
        let slot = registry.next_pending_init().unwrap();
        let (object, lifecycle) = registry.take(slot).unwrap();

        assert!(registry.get("busy").is_none());
        assert_eq!(
            registry.lookup("busy").unwrap_err(),
            RegistryError::NotFound("busy".to_string())
        );
        // Still registered, just out for dispatch
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lifecycle("busy"), Some(Lifecycle::PendingInit));

        registry.restore(slot, object, lifecycle);
        assert!(registry.get("busy").is_some());
    }

    #[test]
    fn test_all_iterates_in_insertion_order() {
        let mut registry = Registry::new();
        for id in ["c", "a", "b"] {
            registry.insert(ObjectSpec::new(id)).unwrap();
        }
        registry.remove("a");
        let ids: Vec<_> = registry.all().map(|o| o.identifier().to_string()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_remove_while_borrowed_tombstones() {
        let mut registry = Registry::new();
        registry.insert(ObjectSpec::new("ghost")).unwrap();
        let slot = registry.next_pending_init().unwrap();
        let (object, _) = registry.take(slot).unwrap();

        assert!(registry.remove("ghost"));
        // Identifier is free again while the old object is still out
        registry.insert(ObjectSpec::new("ghost")).unwrap();

        registry.restore(slot, object, Lifecycle::Active);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lifecycle("ghost"), Some(Lifecycle::PendingInit));
    }

    #[test]
    fn test_player_tracking() {
        let mut registry = Registry::new();
        registry.insert(ObjectSpec::new("rock")).unwrap();
        registry
            .insert(ObjectSpec::new("player").flags(Flags::IS_PLAYER).position(5.0, 5.0))
            .unwrap();
        assert_eq!(registry.player().map(|p| p.identifier()), Some("player"));

        registry.remove("player");
        assert!(registry.player().is_none());

        registry.insert(ObjectSpec::new("player2").flags(Flags::IS_PLAYER)).unwrap();
        assert_eq!(registry.player().map(|p| p.identifier()), Some("player2"));
    }

    #[test]
    fn test_eligibility() {
        let mut registry = Registry::new();
        registry
            .insert(ObjectSpec::new("far_flagged").flags(Flags::ALWAYS_UPDATE).position(1e6, 1e6))
            .unwrap();
        registry
            .insert(
                ObjectSpec::new("near")
                    .position(10.0, 10.0)
                    .bounding_box(Rect::new(0.0, 0.0, 20.0, 20.0)),
            )
            .unwrap();
        registry
            .insert(
                ObjectSpec::new("far")
                    .position(1e6, 1e6)
                    .bounding_box(Rect::new(0.0, 0.0, 20.0, 20.0)),
            )
            .unwrap();
        registry.insert(ObjectSpec::new("pending").flags(Flags::ALWAYS_UPDATE)).unwrap();

        // Only the first three get initialized
        for _ in 0..3 {
            let slot = registry.next_pending_init().unwrap();
            let (object, _) = registry.take(slot).unwrap();
            registry.restore(slot, object, Lifecycle::Active);
        }

        let camera = camera_at_origin();
        let update = registry.eligible(Flags::ALWAYS_UPDATE, &camera);
        assert_eq!(update, vec![0, 1]);
        let render = registry.eligible(Flags::ALWAYS_RENDER, &camera);
        assert_eq!(render, vec![1]);
    }

    #[test]
    fn test_failed_objects_are_ineligible() {
        let mut registry = Registry::new();
        registry.insert(ObjectSpec::new("broken").flags(Flags::ALWAYS_UPDATE)).unwrap();
        let slot = registry.next_pending_init().unwrap();
        let (object, _) = registry.take(slot).unwrap();
        registry.restore(slot, object, Lifecycle::Failed);

        assert!(registry.eligible(Flags::ALWAYS_UPDATE, &camera_at_origin()).is_empty());
        assert!(registry.get("broken").is_some());
        assert_eq!(registry.lifecycle("broken"), Some(Lifecycle::Failed));
    }

    #[test]
    fn test_compact_preserves_order_and_index() {
        let mut registry = Registry::new();
        for i in 0..10 {
            let flags = if i == 7 { Flags::IS_PLAYER } else { Flags::empty() };
            registry.insert(ObjectSpec::new(format!("obj_{}", i)).flags(flags)).unwrap();
        }
        activate_all(&mut registry);
        for i in (0..10).step_by(2) {
            registry.remove(&format!("obj_{}", i));
        }
        assert_eq!(registry.tombstones(), 5);

        registry.compact();
        assert_eq!(registry.tombstones(), 0);
        let ids: Vec<_> = registry.all().map(|o| o.identifier().to_string()).collect();
        assert_eq!(ids, vec!["obj_1", "obj_3", "obj_5", "obj_7", "obj_9"]);
        assert!(registry.get("obj_9").is_some());
        assert_eq!(registry.player().map(|p| p.identifier()), Some("obj_7"));
    }
}
