use std::rc::Rc;

use framecore_common::EntityId;
use glam::Mat4;
use serde::Serialize;

use crate::material::{MaterialId, MaterialRef};
use crate::resource::{MeshRef, ResourceId, ShaderRef};

/// Draw order key: render layer, then shader, then material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SortKey {
    pub layer: i32,
    pub shader: ResourceId,
    pub material: MaterialId,
}

/// One drawable for this frame.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub entity: EntityId,
    pub mesh: MeshRef,
    pub material: MaterialRef,
    pub world: Mat4,
}

impl BatchEntry {
    pub fn sort_key(&self) -> SortKey {
        let material = self.material.borrow();
        SortKey {
            layer: material.render_layer(),
            shader: material.shader().id(),
            material: material.id(),
        }
    }

    pub fn shader(&self) -> ShaderRef {
        Rc::clone(self.material.borrow().shader())
    }
}

/// Drawables collected for one frame.
///
/// Entries are pushed in entity order by the scene, so a stable sort gives
/// equal keys the same relative order every frame.
#[derive(Debug, Default, Clone)]
pub struct RenderBatch {
    entries: Vec<BatchEntry>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: BatchEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stable sort by [`SortKey`]. Keys are read once per entry.
    pub fn sort(&mut self) {
        self.entries.sort_by_cached_key(BatchEntry::sort_key);
    }

    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].sort_key() <= w[1].sort_key())
    }

    pub fn order(&self) -> Vec<EntityId> {
        self.entries.iter().map(|e| e.entity).collect()
    }

    /// Number of maximal runs of equal shader in current order.
    pub fn shader_runs(&self) -> usize {
        let mut runs = 0;
        let mut current = None;
        for entry in &self.entries {
            let shader = entry.material.borrow().shader().id();
            if current != Some(shader) {
                runs += 1;
                current = Some(shader);
            }
        }
        runs
    }
}

impl FromIterator<BatchEntry> for RenderBatch {
    fn from_iter<I: IntoIterator<Item = BatchEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::resource::{ResourceTracker, ShaderBuilder, ShaderStageKind};

    fn shader(tracker: &ResourceTracker, label: &str) -> ShaderRef {
        ShaderBuilder::new(label)
            .stage(ShaderStageKind::Vertex, "v")
            .stage(ShaderStageKind::Fragment, "f")
            .link(tracker)
            .unwrap()
    }

    fn entry(mesh: &MeshRef, material: &MaterialRef) -> BatchEntry {
        BatchEntry {
            entity: EntityId::new(),
            mesh: Rc::clone(mesh),
            material: Rc::clone(material),
            world: Mat4::IDENTITY,
        }
    }

    #[test]
    fn sort_orders_by_layer_shader_material() {
        let tracker = ResourceTracker::new();
        let mesh = tracker.create_mesh("quad", 4, 6);
        let s1 = shader(&tracker, "s1");
        let s2 = shader(&tracker, "s2");
        let sky = Material::new("sky", s1.clone()).with_layer(100).shared();
        let b = Material::new("b", s2.clone()).shared();
        let a = Material::new("a", s1).shared();
        let c = Material::new("c", s2).shared();

        let mut batch: RenderBatch = [&sky, &c, &a, &b, &a]
            .into_iter()
            .map(|m| entry(&mesh, m))
            .collect();
        batch.sort();

        assert!(batch.is_sorted());
        let labels: Vec<String> = batch
            .entries()
            .iter()
            .map(|e| e.material.borrow().label().to_string())
            .collect();
        assert_eq!(labels, ["a", "a", "b", "c", "sky"]);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let tracker = ResourceTracker::new();
        let mesh = tracker.create_mesh("quad", 4, 6);
        let mat = Material::new("m", shader(&tracker, "s")).shared();
        let mut batch: RenderBatch = (0..5).map(|_| entry(&mesh, &mat)).collect();
        let before = batch.order();
        batch.sort();
        assert_eq!(batch.order(), before);
    }

    #[test]
    fn resorting_is_idempotent() {
        let tracker = ResourceTracker::new();
        let mesh = tracker.create_mesh("quad", 4, 6);
        let s = shader(&tracker, "s");
        let mats: Vec<MaterialRef> = (0..4)
            .map(|i| Material::new(format!("m{i}"), s.clone()))
            .zip((0..4).rev())
            .map(|(m, layer)| m.with_layer(layer).shared())
            .collect();
        let mut batch: RenderBatch = mats
            .iter()
            .cycle()
            .take(12)
            .map(|m| entry(&mesh, m))
            .collect();
        batch.sort();
        let first = batch.order();
        batch.sort();
        assert_eq!(batch.order(), first);
    }

    #[test]
    fn shader_runs_counts_transitions() {
        let tracker = ResourceTracker::new();
        let mesh = tracker.create_mesh("quad", 4, 6);
        let s1 = shader(&tracker, "s1");
        let s2 = shader(&tracker, "s2");
        let m1 = Material::new("m1", s1).shared();
        let m2 = Material::new("m2", s2).shared();
        let mut batch: RenderBatch = (0..10)
            .map(|i| entry(&mesh, if i % 2 == 0 { &m1 } else { &m2 }))
            .collect();
        assert_eq!(batch.shader_runs(), 10);
        batch.sort();
        assert_eq!(batch.shader_runs(), 2);
    }
}
