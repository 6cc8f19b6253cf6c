//! Behaviors shipped with the pipeline.

use framecore_common::{EntityId, Transform};
use framecore_input::KeyCode;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::behavior::{Behavior, BehaviorContext};
use crate::error::BehaviorError;

/// Moves the owner through a looped list of points at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowPath {
    pub points: Vec<Vec3>,
    /// World units per second.
    pub speed: f32,
    target: usize,
}

impl FollowPath {
    pub fn new(points: Vec<Vec3>, speed: f32) -> Self {
        Self {
            points,
            speed,
            target: 0,
        }
    }

    /// Index of the point currently being approached.
    pub fn target(&self) -> usize {
        self.target
    }
}

impl Behavior for FollowPath {
    fn name(&self) -> &'static str {
        "follow_path"
    }

    fn update(
        &mut self,
        entity: EntityId,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<(), BehaviorError> {
        if self.points.is_empty() {
            return Ok(());
        }
        // `points` may have shrunk since the cursor last advanced.
        self.target %= self.points.len();
        let step = self.speed * ctx.time.delta;
        let transform = ctx.transform_mut(self.name(), entity)?;
        let goal = self.points[self.target];
        let to_goal = goal - transform.position;
        let distance = to_goal.length();
        if distance <= step {
            transform.position = goal;
            self.target = (self.target + 1) % self.points.len();
        } else {
            transform.position += to_goal / distance * step;
        }
        Ok(())
    }
}

/// Keyboard translate/rotate of the owner.
///
/// WASD moves along forward/right, Space and Left Control along up. Q/E yaw,
/// Left/Right roll, Up/Down pitch. With `relative` set, movement and rotation
/// use the owner's local axes; otherwise world axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleMove {
    pub relative: bool,
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per second.
    pub turn_speed: f32,
}

impl Default for SimpleMove {
    fn default() -> Self {
        Self {
            relative: false,
            move_speed: 2.0,
            turn_speed: 90.0,
        }
    }
}

fn axis(ctx: &BehaviorContext<'_>, positive: KeyCode, negative: KeyCode) -> f32 {
    let mut value = 0.0;
    if ctx.input.is_key_down(positive) {
        value += 1.0;
    }
    if ctx.input.is_key_down(negative) {
        value -= 1.0;
    }
    value
}

fn rotate(transform: &mut Transform, delta: Quat, local: bool) {
    transform.rotation = if local {
        transform.rotation * delta
    } else {
        delta * transform.rotation
    }
    .normalize();
}

impl Behavior for SimpleMove {
    fn name(&self) -> &'static str {
        "simple_move"
    }

    fn update(
        &mut self,
        entity: EntityId,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<(), BehaviorError> {
        let dt = ctx.time.delta;
        let forward = axis(ctx, KeyCode::W, KeyCode::S);
        let right = axis(ctx, KeyCode::D, KeyCode::A);
        let up = axis(ctx, KeyCode::Space, KeyCode::LeftControl);
        let yaw = axis(ctx, KeyCode::Q, KeyCode::E);
        let roll = axis(ctx, KeyCode::Right, KeyCode::Left);
        let pitch = axis(ctx, KeyCode::Up, KeyCode::Down);

        let relative = self.relative;
        let transform = ctx.transform_mut(self.name(), entity)?;
        let (f, r, u) = if relative {
            (transform.forward(), transform.right(), transform.up())
        } else {
            (Vec3::NEG_Z, Vec3::X, Vec3::Y)
        };
        transform.position += (f * forward + r * right + u * up) * self.move_speed * dt;

        let turn = self.turn_speed.to_radians() * dt;
        let delta = Quat::from_rotation_y(yaw * turn)
            * Quat::from_rotation_x(pitch * turn)
            * Quat::from_rotation_z(roll * turn);
        if delta != Quat::IDENTITY {
            rotate(transform, delta, relative);
        }
        Ok(())
    }
}

/// Fly control for a camera entity.
///
/// I/K move forward/back, J/L strafe, U/O descend/ascend, all along the
/// camera's own axes. Arrow keys are left to [`SimpleMove`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraControl {
    pub move_speed: f32,
}

impl Default for CameraControl {
    fn default() -> Self {
        Self { move_speed: 3.0 }
    }
}

impl Behavior for CameraControl {
    fn name(&self) -> &'static str {
        "camera_control"
    }

    fn update(
        &mut self,
        entity: EntityId,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<(), BehaviorError> {
        let forward = axis(ctx, KeyCode::I, KeyCode::K);
        let right = axis(ctx, KeyCode::L, KeyCode::J);
        let up = axis(ctx, KeyCode::O, KeyCode::U);
        if forward == 0.0 && right == 0.0 && up == 0.0 {
            return Ok(());
        }
        let step = self.move_speed * ctx.time.delta;
        let transform = ctx.transform_mut(self.name(), entity)?;
        let motion =
            transform.forward() * forward + transform.right() * right + transform.up() * up;
        transform.position += motion * step;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use framecore_input::{InputSource, ScriptedInput};
    use framecore_scene::Scene;

    use super::*;
    use crate::behavior::FrameTime;

    fn step(
        behavior: &mut dyn Behavior,
        scene: &mut Scene,
        entity: EntityId,
        input: &ScriptedInput,
        delta: f32,
    ) -> Result<(), BehaviorError> {
        let mut ctx = BehaviorContext {
            scene,
            input,
            time: FrameTime {
                delta,
                ..Default::default()
            },
        };
        behavior.update(entity, &mut ctx)
    }

    fn scene_with(position: Vec3) -> (Scene, EntityId) {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("mover");
        let transform = Transform::from_position(position);
        scene.add_transform(e, transform).unwrap();
        (scene, e)
    }

    fn position(scene: &Scene, e: EntityId) -> Vec3 {
        scene.transform(e).unwrap().position
    }

    #[test]
    fn follow_path_moves_toward_target() {
        let (mut scene, e) = scene_with(Vec3::ZERO);
        let mut path = FollowPath::new(vec![Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO], 2.0);
        let input = ScriptedInput::new(0.5);
        step(&mut path, &mut scene, e, &input, 0.5).unwrap();
        assert!(position(&scene, e).abs_diff_eq(Vec3::X, 1e-6));
        assert_eq!(path.target(), 0);
    }

    #[test]
    fn follow_path_snaps_and_loops() {
        let (mut scene, e) = scene_with(Vec3::new(0.0, 0.0, 5.0));
        let hover = vec![Vec3::new(0.0, 0.0, 5.5), Vec3::new(0.0, 0.0, 5.0)];
        let mut path = FollowPath::new(hover, 0.25);
        let input = ScriptedInput::new(1.0);
        // 0.25 per step: two steps reach 5.5, two more return to 5.0.
        for _ in 0..2 {
            step(&mut path, &mut scene, e, &input, 1.0).unwrap();
        }
        assert_eq!(scene.transform(e).unwrap().position.z, 5.5);
        assert_eq!(path.target(), 1);
        for _ in 0..2 {
            step(&mut path, &mut scene, e, &input, 1.0).unwrap();
        }
        assert_eq!(scene.transform(e).unwrap().position.z, 5.0);
        assert_eq!(path.target(), 0);
    }

    #[test]
    fn follow_path_survives_shrinking_points() {
        let (mut scene, e) = scene_with(Vec3::ZERO);
        let mut path = FollowPath::new(vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0], 10.0);
        let input = ScriptedInput::new(1.0);
        for _ in 0..2 {
            step(&mut path, &mut scene, e, &input, 1.0).unwrap();
        }
        assert_eq!(path.target(), 2);

        path.points.truncate(1);
        step(&mut path, &mut scene, e, &input, 1.0).unwrap();
        assert_eq!(scene.transform(e).unwrap().position, Vec3::ZERO);
        assert_eq!(path.target(), 0);
    }

    #[test]
    fn follow_path_empty_is_noop() {
        let mut scene = Scene::new("s");
        let e = scene.create_entity("no transform");
        let mut path = FollowPath::new(Vec::new(), 1.0);
        let input = ScriptedInput::new(1.0);
        assert!(step(&mut path, &mut scene, e, &input, 1.0).is_ok());
    }

    #[test]
    fn simple_move_world_axes() {
        let (mut scene, e) = scene_with(Vec3::ZERO);
        let yawed = scene.transform_mut(e).unwrap();
        yawed.set_euler_degrees(0.0, 90.0, 0.0);
        let mut input = ScriptedInput::new(1.0).hold(KeyCode::W, 0..1);
        input.poll_events();
        let mut mover = SimpleMove::default();
        step(&mut mover, &mut scene, e, &input, 0.5).unwrap();
        // World forward is -Z regardless of the owner's yaw.
        let expected = Vec3::new(0.0, 0.0, -1.0);
        assert!(position(&scene, e).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn simple_move_relative_axes() {
        let (mut scene, e) = scene_with(Vec3::ZERO);
        let yawed = scene.transform_mut(e).unwrap();
        yawed.set_euler_degrees(0.0, 90.0, 0.0);
        let mut input = ScriptedInput::new(1.0).hold(KeyCode::W, 0..1);
        input.poll_events();
        let mut mover = SimpleMove {
            relative: true,
            ..Default::default()
        };
        step(&mut mover, &mut scene, e, &input, 0.5).unwrap();
        // Yawed 90 degrees left, local forward is -X.
        let expected = Vec3::new(-1.0, 0.0, 0.0);
        assert!(position(&scene, e).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn simple_move_yaw() {
        let (mut scene, e) = scene_with(Vec3::ZERO);
        let mut input = ScriptedInput::new(1.0).hold(KeyCode::Q, 0..1);
        input.poll_events();
        let mut mover = SimpleMove::default();
        step(&mut mover, &mut scene, e, &input, 1.0).unwrap();
        let forward = scene.transform(e).unwrap().forward();
        assert!(forward.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn camera_control_idle_does_not_need_transform() {
        let mut scene = Scene::new("s");
        let e = scene.create_entity("camera");
        let input = ScriptedInput::new(1.0);
        let mut camera = CameraControl::default();
        assert!(step(&mut camera, &mut scene, e, &input, 1.0).is_ok());
    }

    #[test]
    fn camera_control_flies_along_view() {
        let (mut scene, e) = scene_with(Vec3::new(0.0, 7.0, 7.0));
        scene.transform_mut(e).unwrap().look_at(Vec3::ZERO, Vec3::Y);
        let mut input = ScriptedInput::new(1.0).hold(KeyCode::I, 0..1);
        input.poll_events();
        let mut camera = CameraControl { move_speed: 1.0 };
        step(&mut camera, &mut scene, e, &input, 1.0).unwrap();
        let p = scene.transform(e).unwrap().position;
        let expected = Vec3::new(0.0, 7.0, 7.0) + Vec3::new(0.0, -1.0, -1.0).normalize();
        assert!(p.abs_diff_eq(expected, 1e-4));
    }
}
