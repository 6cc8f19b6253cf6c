use framecore_common::EntityId;
use framecore_scene::Scene;
use serde::Serialize;

use crate::stats::FrameStats;

/// Read-only queries over the frame statistics and scene, for logging and
/// the debug overlay.
pub struct FrameInspector;

impl FrameInspector {
    pub fn summary(stats: &FrameStats, frames: u64) -> FrameSummary {
        FrameSummary {
            frames,
            samples: stats.len(),
            min_fps: stats.min().unwrap_or(0.0),
            max_fps: stats.max().unwrap_or(0.0),
            avg_fps: stats.average().unwrap_or(0.0),
        }
    }

    pub fn scene_summary(scene: &Scene) -> SceneSummary {
        SceneSummary {
            name: scene.name().to_string(),
            entity_count: scene.entity_count(),
            drawable_count: scene.drawables().count(),
            active_camera: scene.active_camera(),
        }
    }

    pub fn inspect_entity(scene: &Scene, id: EntityId) -> Option<EntityInfo> {
        let name = scene.entity_name(id)?.to_string();
        let transform = scene.transform(id).copied();
        Some(EntityInfo {
            id,
            name,
            position: transform.map(|t| t.position.to_array()),
            world_position: scene
                .world_matrix(id)
                .map(|m| m.w_axis.truncate().to_array()),
            parent: scene.parent(id),
            drawable: scene.renderable(id).is_some(),
        })
    }

    pub fn list_entities(scene: &Scene) -> Vec<EntityId> {
        scene.entities().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub frames: u64,
    pub samples: usize,
    pub min_fps: f32,
    pub max_fps: f32,
    pub avg_fps: f32,
}

impl std::fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} MIN: {:.2} MAX: {:.2} AVG: {:.2}",
            self.frames, self.min_fps, self.max_fps, self.avg_fps
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub name: String,
    pub entity_count: usize,
    pub drawable_count: usize,
    pub active_camera: Option<EntityId>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene '{}': entities={} drawables={}",
            self.name, self.entity_count, self.drawable_count
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub position: Option<[f32; 3]>,
    pub world_position: Option<[f32; 3]>,
    pub parent: Option<EntityId>,
    pub drawable: bool,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity [{}] '{}'", self.id, self.name)?;
        if let Some([x, y, z]) = self.world_position {
            write!(f, " world=({x:.2}, {y:.2}, {z:.2})")?;
        }
        if self.drawable {
            write!(f, " drawable")?;
        }
        Ok(())
    }
}
