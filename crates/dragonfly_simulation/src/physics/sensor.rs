//! Detection volume: Rapier sensor вокруг агента
//!
//! Rapier CollisionEvent::Started (что-то вошло в sensor) → Disturbance.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::FlightConfig;
use crate::flight::{Disturbance, Dragonfly};

/// Sensor collider для detection volume агента.
///
/// Только detection (Sensor), не физическое тело.
pub fn detection_sensor(config: &FlightConfig) -> impl Bundle {
    (
        Collider::ball(config.detect_radius),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(Group::ALL, Group::from_bits_truncate(config.detect_layers)),
    )
}

/// Система: Rapier collision events → Disturbance events
///
/// Позиция источника: Transform второго участника коллизии.
pub fn bridge_sensor_collisions(
    mut collisions: EventReader<CollisionEvent>,
    dragonflies: Query<(), With<Dragonfly>>,
    transforms: Query<&Transform>,
    mut disturbances: EventWriter<Disturbance>,
) {
    for event in collisions.read() {
        let CollisionEvent::Started(first, second, _) = event else {
            continue;
        };

        for (agent, other) in [(*first, *second), (*second, *first)] {
            if !dragonflies.contains(agent) {
                continue;
            }
            let Ok(other_transform) = transforms.get(other) else {
                crate::log_warning(&format!(
                    "Sensor: {:?} entered {:?} detection volume without Transform",
                    other, agent
                ));
                continue;
            };

            disturbances.write(Disturbance {
                agent,
                source: other_transform.translation,
            });
        }
    }
}
