use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use framecore_common::EntityId;

use crate::behavior::{Behavior, BehaviorContext};
use crate::error::BehaviorError;

struct Slot {
    behavior: Box<dyn Behavior>,
    type_id: TypeId,
    enabled: bool,
}

/// The ordered behaviors bound to one entity.
#[derive(Default)]
pub struct BehaviorBinding {
    slots: Vec<Slot>,
}

impl BehaviorBinding {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Behavior names in binding order.
    pub fn names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.behavior.name()).collect()
    }

    pub fn is_enabled(&self, index: usize) -> Option<bool> {
        self.slots.get(index).map(|s| s.enabled)
    }
}

impl fmt::Debug for BehaviorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| (s.behavior.name(), s.enabled)))
            .finish()
    }
}

/// Stable reference to a bound behavior of type `T`.
///
/// Stays valid until the entity's bindings are removed.
pub struct BehaviorHandle<T> {
    entity: EntityId,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BehaviorHandle<T> {
    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

impl<T> Clone for BehaviorHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BehaviorHandle<T> {}

impl<T> PartialEq for BehaviorHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.index == other.index
    }
}

impl<T> fmt::Debug for BehaviorHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorHandle")
            .field("entity", &self.entity)
            .field("index", &self.index)
            .finish()
    }
}

/// Owns every behavior, keyed by entity.
///
/// Entities update in id order (BTreeMap); behaviors within an entity in
/// binding order.
#[derive(Debug, Default)]
pub struct BehaviorRegistry {
    bindings: BTreeMap<EntityId, BehaviorBinding>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `behavior` to `entity`'s binding, enabled.
    pub fn bind<T: Behavior>(&mut self, entity: EntityId, behavior: T) -> BehaviorHandle<T> {
        let binding = self.bindings.entry(entity).or_default();
        tracing::trace!(entity = %entity, behavior = behavior.name(), "behavior bound");
        binding.slots.push(Slot {
            behavior: Box::new(behavior),
            type_id: TypeId::of::<T>(),
            enabled: true,
        });
        BehaviorHandle {
            entity,
            index: binding.slots.len() - 1,
            _marker: PhantomData,
        }
    }

    /// First behavior of type `T` bound to `entity`.
    pub fn get<T: Behavior>(&self, entity: EntityId) -> Option<BehaviorHandle<T>> {
        let binding = self.bindings.get(&entity)?;
        let index = binding
            .slots
            .iter()
            .position(|s| s.type_id == TypeId::of::<T>())?;
        Some(BehaviorHandle {
            entity,
            index,
            _marker: PhantomData,
        })
    }

    fn slot(&self, entity: EntityId, index: usize) -> Option<&Slot> {
        self.bindings.get(&entity)?.slots.get(index)
    }

    fn slot_mut(&mut self, entity: EntityId, index: usize) -> Option<&mut Slot> {
        self.bindings.get_mut(&entity)?.slots.get_mut(index)
    }

    pub fn behavior<T: Behavior>(&self, handle: BehaviorHandle<T>) -> Option<&T> {
        let slot = self.slot(handle.entity, handle.index)?;
        (*slot.behavior).as_any().downcast_ref::<T>()
    }

    pub fn behavior_mut<T: Behavior>(&mut self, handle: BehaviorHandle<T>) -> Option<&mut T> {
        let slot = self.slot_mut(handle.entity, handle.index)?;
        (*slot.behavior).as_any_mut().downcast_mut::<T>()
    }

    pub fn is_enabled<T>(&self, handle: BehaviorHandle<T>) -> Option<bool> {
        self.slot(handle.entity, handle.index).map(|s| s.enabled)
    }

    /// Returns false when the handle no longer resolves.
    pub fn set_enabled<T>(&mut self, handle: BehaviorHandle<T>, enabled: bool) -> bool {
        match self.slot_mut(handle.entity, handle.index) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn binding(&self, entity: EntityId) -> Option<&BehaviorBinding> {
        self.bindings.get(&entity)
    }

    pub fn each(&self, mut f: impl FnMut(EntityId, &BehaviorBinding)) {
        for (entity, binding) in &self.bindings {
            f(*entity, binding);
        }
    }

    pub fn entity_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn behavior_count(&self) -> usize {
        self.bindings.values().map(BehaviorBinding::len).sum()
    }

    /// Drop all behaviors of `entity`. Not for use inside a pass.
    pub fn remove_entity(&mut self, entity: EntityId) -> Option<BehaviorBinding> {
        self.bindings.remove(&entity)
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Run every enabled behavior once. Returns how many ran.
    pub fn update_all(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<usize, BehaviorError> {
        let mut ran = 0;
        for (entity, binding) in &mut self.bindings {
            for slot in binding.slots.iter_mut().filter(|s| s.enabled) {
                if let Err(err) = slot.behavior.update(*entity, ctx) {
                    tracing::error!(
                        entity = %entity,
                        behavior = slot.behavior.name(),
                        error = %err,
                        "behavior failed"
                    );
                    return Err(err);
                }
                ran += 1;
            }
        }
        Ok(ran)
    }
}
