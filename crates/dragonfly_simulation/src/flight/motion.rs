//! Motion integrator: интерполяция агента к target pose
//!
//! Позиция: lerp с фактором lerp_rate·Δt.
//! Поворот: target heading = look rotation на target, slerp с фактором
//! lerp_rate·Δt/turn_time. Нулевое направление: heading не меняется.

use bevy::prelude::*;

use crate::components::FlightConfig;

/// Vector MoveTowards: шаг не больше max_step, без перелёта
pub fn move_towards(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let to_target = target - current;
    let distance = to_target.length();
    if distance <= max_step || distance == 0.0 {
        target
    } else {
        current + to_target / distance * max_step
    }
}

/// Горизонтальный wobble для прямолинейного полёта (добавляется к x)
pub fn wobble(elapsed: f32, amplitude: f32) -> f32 {
    elapsed.sin() * ((elapsed.cos() + 1.0) / 2.0 * amplitude)
}

/// Поворот, при котором forward (-Z) смотрит вдоль direction
pub fn look_rotation(direction: Vec3) -> Quat {
    Transform::IDENTITY.looking_to(direction, Vec3::Y).rotation
}

/// Один шаг интеграции агента.
///
/// `target_rotation` обновляется, если до target есть ненулевое направление.
pub fn integrate(
    pose: &mut Transform,
    target_position: Vec3,
    target_rotation: &mut Quat,
    delta: f32,
    config: &FlightConfig,
) {
    let to_target = target_position - pose.translation;
    if to_target != Vec3::ZERO {
        *target_rotation = look_rotation(to_target);
    }

    let turn = (config.lerp_rate * delta / config.turn_time).clamp(0.0, 1.0);
    let step = (config.lerp_rate * delta).clamp(0.0, 1.0);

    pose.rotation = pose.rotation.slerp(*target_rotation, turn).normalize();
    pose.translation = pose.translation.lerp(target_position, step);
}

/// Поворот модели: только yaw, pitch/roll обнулены (кроме посадки)
pub fn de_rolled(rotation: Quat, keep_tilt: bool) -> Quat {
    if keep_tilt {
        return rotation;
    }
    let (yaw, _pitch, _roll) = rotation.to_euler(EulerRot::YXZ);
    Quat::from_rotation_y(yaw)
}

/// Model pose из agent pose
pub fn model_pose(agent: &Transform, landed: bool) -> Transform {
    Transform {
        translation: agent.translation,
        rotation: de_rolled(agent.rotation, landed),
        scale: agent.scale,
    }
}

/// Поворот heading'а на (yaw, pitch) в градусах
pub fn perturb_heading(rotation: Quat, yaw_degrees: f32, pitch_degrees: f32) -> Quat {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Quat::from_euler(
        EulerRot::YXZ,
        yaw + yaw_degrees.to_radians(),
        pitch + pitch_degrees.to_radians(),
        roll,
    )
}

/// Ориентация на поверхности: up = normal, heading сохраняется
pub fn surface_rotation(normal: Vec3, current: Quat) -> Quat {
    let (yaw, _, _) = current.to_euler(EulerRot::YXZ);
    let Some(normal) = normal.try_normalize() else {
        return Quat::from_rotation_y(yaw);
    };
    Quat::from_rotation_arc(Vec3::Y, normal) * Quat::from_rotation_y(yaw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1.0e-4;

    #[test]
    fn test_move_towards_no_overshoot() {
        let from = Vec3::ZERO;
        let to = Vec3::new(3.0, 4.0, 0.0); // distance = 5

        let step = move_towards(from, to, 1.0);
        assert!((step.length() - 1.0).abs() < EPS);

        assert_eq!(move_towards(from, to, 10.0), to);
        assert_eq!(move_towards(to, to, 1.0), to);
    }

    #[test]
    fn test_wobble_bounds() {
        assert_eq!(wobble(0.0, 0.5), 0.0);
        for i in 0..200 {
            let t = i as f32 * 0.1;
            assert!(wobble(t, 0.5).abs() <= 0.5);
        }
    }

    #[test]
    fn test_look_rotation_forward() {
        let rotation = look_rotation(Vec3::X);
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn test_integrate_moves_fraction_and_turns() {
        let config = FlightConfig::default();
        let mut pose = Transform::from_translation(Vec3::ZERO);
        let mut target_rotation = Quat::IDENTITY;

        integrate(&mut pose, Vec3::new(10.0, 0.0, 0.0), &mut target_rotation, 0.1, &config);

        // lerp_rate 1 · Δt 0.1 → 10% пути
        assert!(pose.translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
        assert!((target_rotation * Vec3::NEG_Z).abs_diff_eq(Vec3::X, EPS));
        // turn factor 0.1/0.2 = 0.5: половина поворота
        assert!(pose.rotation.angle_between(target_rotation) > 0.1);
    }

    #[test]
    fn test_integrate_zero_direction_keeps_heading() {
        let config = FlightConfig::default();
        let start = Transform::from_translation(Vec3::ONE);
        let mut pose = start;
        let held = Quat::from_rotation_y(1.0);
        let mut target_rotation = held;

        integrate(&mut pose, Vec3::ONE, &mut target_rotation, 0.1, &config);

        assert_eq!(target_rotation, held);
        assert_eq!(pose.translation, Vec3::ONE);
    }

    #[test]
    fn test_de_rolled_keeps_only_yaw() {
        let tilted = Quat::from_euler(EulerRot::YXZ, 0.7, 0.3, -0.2);
        let flat = de_rolled(tilted, false);
        let (yaw, pitch, roll) = flat.to_euler(EulerRot::YXZ);

        assert!((yaw - 0.7).abs() < EPS);
        assert!(pitch.abs() < EPS);
        assert!(roll.abs() < EPS);
        assert_eq!(de_rolled(tilted, true), tilted);
    }

    #[test]
    fn test_surface_rotation_aligns_up() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let rotation = surface_rotation(normal, Quat::IDENTITY);
        assert!((rotation * Vec3::Y).abs_diff_eq(normal, EPS));
    }
}
