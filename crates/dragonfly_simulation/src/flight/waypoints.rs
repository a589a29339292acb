//! Target point generator: случайный waypoint в ограниченном радиусе

use bevy::prelude::*;
use rand::Rng;

use crate::components::TetherBounds;

/// Сколько кандидатов пробуем до fallback
pub const WAYPOINT_ATTEMPTS: usize = 5;

/// Сжатие вертикали у направления кандидата (полёт в основном горизонтальный)
const VERTICAL_SQUASH: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointOutcome {
    pub point: Vec3,
    /// false: все кандидаты отвергнуты, point = fallback
    pub found: bool,
}

/// Равномерная точка внутри единичного шара (rejection sampling)
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}

/// Waypoint вокруг center.
///
/// Кандидат принимается если он внутри tether и выше min_height.
/// Fallback: center с x/z пополам: вызывающий летит туда в любом случае.
pub fn generate_waypoint<R: Rng + ?Sized>(
    rng: &mut R,
    center: Vec3,
    radius: f32,
    tether: TetherBounds,
    min_height: f32,
) -> WaypointOutcome {
    for _ in 0..WAYPOINT_ATTEMPTS {
        let mut direction = random_in_unit_sphere(rng);
        direction.y *= VERTICAL_SQUASH;
        let range = radius * rng.gen_range(0.5..=1.0);

        let candidate = center + direction * range;
        if tether.contains(candidate) && candidate.y > min_height {
            return WaypointOutcome {
                point: candidate,
                found: true,
            };
        }
    }

    crate::log_warning(&format!(
        "Waypoint: no valid point around {:?} after {} tries, falling back",
        center, WAYPOINT_ATTEMPTS
    ));

    WaypointOutcome {
        point: Vec3::new(center.x * 0.5, center.y, center.z * 0.5),
        found: false,
    }
}
