use framecore_common::EntityId;
use framecore_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    #[error("behavior '{behavior}' on {entity} needs a transform")]
    MissingTransform {
        behavior: &'static str,
        entity: EntityId,
    },
    #[error("behavior '{behavior}' on {entity} failed: {reason}")]
    Fault {
        behavior: &'static str,
        entity: EntityId,
        reason: String,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
}
