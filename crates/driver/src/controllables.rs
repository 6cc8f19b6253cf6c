use framecore_behavior::{BehaviorRegistry, SimpleMove};
use framecore_common::EntityId;

/// Entities the user can drive with [`SimpleMove`], one at a time.
///
/// Only the selected entity's `SimpleMove` is enabled. Cycling wraps in both
/// directions; with nothing registered it does nothing.
#[derive(Debug, Clone, Default)]
pub struct Controllables {
    entities: Vec<EntityId>,
    selected: usize,
}

impl Controllables {
    pub fn new(entities: Vec<EntityId>) -> Self {
        Self {
            entities,
            selected: 0,
        }
    }

    pub fn push(&mut self, entity: EntityId) {
        self.entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.entities.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.entities.get(self.selected).copied()
    }

    pub fn next(&mut self) -> Option<EntityId> {
        if self.entities.is_empty() {
            return None;
        }
        self.selected = (self.selected + 1) % self.entities.len();
        self.selected()
    }

    pub fn previous(&mut self) -> Option<EntityId> {
        if self.entities.is_empty() {
            return None;
        }
        let last = self.entities.len() - 1;
        self.selected = self.selected.checked_sub(1).unwrap_or(last);
        self.selected()
    }

    /// Enable `SimpleMove` on the selected entity and disable it on the rest.
    pub fn sync(&self, registry: &mut BehaviorRegistry) {
        for (index, entity) in self.entities.iter().enumerate() {
            match registry.get::<SimpleMove>(*entity) {
                Some(handle) => {
                    registry.set_enabled(handle, index == self.selected);
                }
                None => {
                    tracing::warn!(entity = %entity, "controllable has no simple_move behavior")
                }
            }
        }
    }

    /// Flip relative movement on the selected entity. Returns the new mode.
    pub fn toggle_relative(&self, registry: &mut BehaviorRegistry) -> Option<bool> {
        let entity = self.selected()?;
        let Some(handle) = registry.get::<SimpleMove>(entity) else {
            tracing::warn!(entity = %entity, "controllable has no simple_move behavior");
            return None;
        };
        let mover = registry.behavior_mut(handle)?;
        mover.relative = !mover.relative;
        Some(mover.relative)
    }
}
