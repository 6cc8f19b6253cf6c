use std::collections::BTreeMap;

use framecore_common::{EntityId, Transform};
use framecore_render::{BatchEntry, MaterialRef, MeshRef, RenderBatch};
use glam::Mat4;

use crate::camera::Camera;
use crate::error::SceneError;

/// Local transform plus the world matrix cached by the last world pass.
#[derive(Debug, Clone)]
pub struct TransformNode {
    pub local: Transform,
    parent: Option<EntityId>,
    world: Mat4,
}

impl TransformNode {
    fn new(local: Transform) -> Self {
        Self {
            local,
            parent: None,
            world: local.matrix(),
        }
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }
}

/// A drawable: shared mesh and material.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub mesh: MeshRef,
    pub material: MaterialRef,
}

/// Entity factory and component storage.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct Scene {
    name: String,
    names: BTreeMap<EntityId, String>,
    transforms: BTreeMap<EntityId, TransformNode>,
    renderables: BTreeMap<EntityId, Renderable>,
    cameras: BTreeMap<EntityId, Camera>,
    active_camera: Option<EntityId>,
    /// Parents-first visiting order, rebuilt when the hierarchy changes.
    update_order: Vec<EntityId>,
    order_dirty: bool,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let id = EntityId::new();
        let name = name.into();
        tracing::trace!(entity = %id, name = %name, "entity created");
        self.names.insert(id, name);
        id
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.names.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.names.len()
    }

    pub fn entity_name(&self, entity: EntityId) -> Option<&str> {
        self.names.get(&entity).map(String::as_str)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.names.keys().copied()
    }

    /// Find the first entity (in id order) with the given name.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
    }

    fn check(&self, entity: EntityId) -> Result<(), SceneError> {
        if self.contains(entity) {
            Ok(())
        } else {
            Err(SceneError::UnknownEntity(entity))
        }
    }

    /// Remove an entity and all of its components. Children are detached and
    /// become roots.
    pub fn destroy(&mut self, entity: EntityId) -> bool {
        if self.names.remove(&entity).is_none() {
            return false;
        }
        if self.transforms.remove(&entity).is_some() {
            for node in self.transforms.values_mut() {
                if node.parent == Some(entity) {
                    node.parent = None;
                }
            }
            self.order_dirty = true;
        }
        self.renderables.remove(&entity);
        self.cameras.remove(&entity);
        if self.active_camera == Some(entity) {
            self.active_camera = self.cameras.keys().next().copied();
        }
        true
    }

    /// Drop every entity and the resource references they hold.
    pub fn clear(&mut self) {
        let count = self.names.len();
        self.names.clear();
        self.transforms.clear();
        self.renderables.clear();
        self.cameras.clear();
        self.active_camera = None;
        self.update_order.clear();
        self.order_dirty = false;
        tracing::debug!(scene = %self.name, entities = count, "scene cleared");
    }

    // --- Transform ---

    pub fn add_transform(&mut self, entity: EntityId, local: Transform) -> Result<(), SceneError> {
        self.check(entity)?;
        self.transforms.insert(entity, TransformNode::new(local));
        self.order_dirty = true;
        Ok(())
    }

    pub fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transforms.get(&entity).map(|n| &n.local)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms.get_mut(&entity).map(|n| &mut n.local)
    }

    pub fn node(&self, entity: EntityId) -> Option<&TransformNode> {
        self.transforms.get(&entity)
    }

    /// World matrix from the last [`Scene::update_world_matrices`] pass.
    pub fn world_matrix(&self, entity: EntityId) -> Option<Mat4> {
        self.transforms.get(&entity).map(|n| n.world)
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.transforms.get(&entity).and_then(|n| n.parent)
    }

    /// Attach `child` under `parent`, or detach it with `None`.
    ///
    /// Both entities must carry a transform. Rejects links that would make
    /// `child` its own ancestor.
    pub fn set_parent(
        &mut self,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        if !self.transforms.contains_key(&child) {
            self.check(child)?;
            return Err(SceneError::MissingComponent {
                entity: child,
                component: "transform",
            });
        }
        if let Some(parent) = parent {
            if !self.transforms.contains_key(&parent) {
                self.check(parent)?;
                return Err(SceneError::MissingComponent {
                    entity: parent,
                    component: "transform",
                });
            }
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(SceneError::ParentCycle { child, parent });
                }
                cursor = self.parent(ancestor);
            }
        }
        if let Some(node) = self.transforms.get_mut(&child) {
            node.parent = parent;
        }
        self.order_dirty = true;
        Ok(())
    }

    fn rebuild_order(&mut self) {
        let mut children: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
        let mut stack = Vec::new();
        for (id, node) in &self.transforms {
            match node.parent {
                Some(parent) => children.entry(parent).or_default().push(*id),
                None => stack.push(*id),
            }
        }
        // Pop in id order.
        stack.reverse();

        self.update_order.clear();
        while let Some(id) = stack.pop() {
            self.update_order.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        self.order_dirty = false;
    }

    /// Recompute every world matrix, parents before children. Returns the
    /// number of transforms updated.
    pub fn update_world_matrices(&mut self) -> usize {
        if self.order_dirty {
            self.rebuild_order();
        }
        for i in 0..self.update_order.len() {
            let id = self.update_order[i];
            let Some(node) = self.transforms.get(&id) else {
                continue;
            };
            let local = node.local.matrix();
            let world = match node.parent.and_then(|p| self.transforms.get(&p)) {
                Some(parent) => parent.world * local,
                None => local,
            };
            if let Some(node) = self.transforms.get_mut(&id) {
                node.world = world;
            }
        }
        self.update_order.len()
    }

    // --- Renderable ---

    pub fn add_renderable(
        &mut self,
        entity: EntityId,
        renderable: Renderable,
    ) -> Result<(), SceneError> {
        self.check(entity)?;
        self.renderables.insert(entity, renderable);
        Ok(())
    }

    pub fn renderable(&self, entity: EntityId) -> Option<&Renderable> {
        self.renderables.get(&entity)
    }

    /// Entities with both a renderable and a transform, in id order.
    pub fn drawables(&self) -> impl Iterator<Item = (EntityId, &Renderable, &TransformNode)> + '_ {
        self.renderables
            .iter()
            .filter_map(|(id, r)| self.transforms.get(id).map(|t| (*id, r, t)))
    }

    /// Refill `batch` with this frame's drawables using current world matrices.
    pub fn collect_batch(&self, batch: &mut RenderBatch) {
        batch.clear();
        for (entity, renderable, node) in self.drawables() {
            batch.push(BatchEntry {
                entity,
                mesh: renderable.mesh.clone(),
                material: renderable.material.clone(),
                world: node.world,
            });
        }
    }

    // --- Camera ---

    /// Attach a camera. The first camera added becomes active.
    pub fn add_camera(&mut self, entity: EntityId, camera: Camera) -> Result<(), SceneError> {
        self.check(entity)?;
        self.cameras.insert(entity, camera);
        if self.active_camera.is_none() {
            self.active_camera = Some(entity);
        }
        Ok(())
    }

    pub fn set_active_camera(&mut self, entity: EntityId) -> Result<(), SceneError> {
        if !self.cameras.contains_key(&entity) {
            self.check(entity)?;
            return Err(SceneError::MissingComponent {
                entity,
                component: "camera",
            });
        }
        self.active_camera = Some(entity);
        Ok(())
    }

    pub fn active_camera(&self) -> Option<EntityId> {
        self.active_camera
    }

    pub fn camera(&self, entity: EntityId) -> Option<&Camera> {
        self.cameras.get(&entity)
    }

    pub fn camera_mut(&mut self, entity: EntityId) -> Option<&mut Camera> {
        self.cameras.get_mut(&entity)
    }

    /// World matrix and projection of the active camera.
    pub fn camera_matrices(&self) -> Result<(Mat4, Mat4), SceneError> {
        let entity = self.active_camera.ok_or(SceneError::NoActiveCamera)?;
        let camera = self.cameras.get(&entity).ok_or(SceneError::NoActiveCamera)?;
        let world = self.world_matrix(entity).ok_or(SceneError::MissingComponent {
            entity,
            component: "transform",
        })?;
        Ok((world, camera.projection_matrix()))
    }
}
