use framecore_common::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },
    #[error("parenting {child} under {parent} would create a cycle")]
    ParentCycle { child: EntityId, parent: EntityId },
    #[error("scene has no active camera")]
    NoActiveCamera,
}
