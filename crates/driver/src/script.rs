use framecore_common::EntityId;
use framecore_scene::{Scene, SceneError};

/// Deterministic, non-behavior transform update applied early each frame.
pub trait SceneScript {
    fn name(&self) -> &'static str;

    fn apply(&mut self, scene: &mut Scene) -> Result<(), SceneError>;
}

/// One spinning entity: tilted by `tilt` degrees about X, turning about Z by
/// `rate` degrees per frame. Negative rates turn the other way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTarget {
    pub entity: EntityId,
    pub tilt: f32,
    pub rate: i32,
}

/// Rotating props keyed off a frame counter rather than elapsed time.
#[derive(Debug, Clone, Default)]
pub struct SpinAnimation {
    targets: Vec<SpinTarget>,
    counter: u64,
}

impl SpinAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: EntityId, tilt: f32, rate: i32) -> Self {
        self.targets.push(SpinTarget { entity, tilt, rate });
        self
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Z angle of `rate` at tick `counter`, kept inside (-360, 360).
    pub fn angle(rate: i32, counter: u64) -> f32 {
        let turned = (u64::from(rate.unsigned_abs()) * counter) % 360;
        turned as f32 * rate.signum() as f32
    }
}

impl SceneScript for SpinAnimation {
    fn name(&self) -> &'static str {
        "spin"
    }

    fn apply(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        for target in &self.targets {
            let transform = scene
                .transform_mut(target.entity)
                .ok_or(SceneError::MissingComponent {
                    entity: target.entity,
                    component: "transform",
                })?;
            let angle = Self::angle(target.rate, self.counter);
            transform.set_euler_degrees(target.tilt, 0.0, angle);
        }
        self.counter += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use framecore_common::Transform;
    use glam::Quat;

    use super::*;

    #[test]
    fn angle_wraps_and_keeps_sign() {
        assert_eq!(SpinAnimation::angle(1, 0), 0.0);
        assert_eq!(SpinAnimation::angle(1, 361), 1.0);
        assert_eq!(SpinAnimation::angle(-2, 100), -200.0);
        assert_eq!(SpinAnimation::angle(-2, 180), 0.0);
    }

    #[test]
    fn apply_sets_rotation_and_advances() {
        let mut scene = Scene::new("s");
        let prop = scene.create_entity("prop");
        scene.add_transform(prop, Transform::default()).unwrap();
        let mut spin = SpinAnimation::new().with(prop, 90.0, 1);

        for _ in 0..46 {
            spin.apply(&mut scene).unwrap();
        }
        assert_eq!(spin.counter(), 46);
        let expected = Transform::default().with_euler_degrees(90.0, 0.0, 45.0);
        let rotation: Quat = scene.transform(prop).unwrap().rotation;
        assert!(rotation.abs_diff_eq(expected.rotation, 1e-5));
    }

    #[test]
    fn missing_transform_is_an_error() {
        let mut scene = Scene::new("s");
        let prop = scene.create_entity("bare");
        let mut spin = SpinAnimation::new().with(prop, 90.0, 1);
        let err = spin.apply(&mut scene).unwrap_err();
        let SceneError::MissingComponent { component, .. } = err else {
            panic!("expected a missing component, got {err}");
        };
        assert_eq!(component, "transform");
    }
}
