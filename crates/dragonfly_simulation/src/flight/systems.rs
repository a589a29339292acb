//! Flight systems: тонкие ECS обёртки над Dragonfly
//!
//! Порядок (chain в FlightPlugin):
//! 1. bridge_sensor_collisions: Rapier sensor → Disturbance
//! 2. apply_flight_commands: FlightCommand → Dragonfly
//! 3. apply_disturbances: Disturbance → Dragonfly
//! 4. relay_steering_arrivals: SteeringArrived → steering rest
//! 5. advance_flight: тик FSM + интеграция pose
//! 6. publish_milestones: outbox → FlightMilestone
//! 7. sync_model_poses: агент → модель

use bevy::prelude::*;

use crate::components::{DragonflyModel, FlightConfig, ModelLink, SteeringArrived, TetherBounds, TetherSteering};
use crate::flight::{Disturbance, Dragonfly, FlightCommand, FlightContext, FlightMilestone};
use crate::physics::SurfaceProbe;
use crate::DeterministicRng;

/// Система: применяет FlightCommand к адресату
pub fn apply_flight_commands(
    mut commands_in: EventReader<FlightCommand>,
    mut agents: Query<(&mut Dragonfly, &FlightConfig, &Transform)>,
    mut rng: ResMut<DeterministicRng>,
) {
    for command in commands_in.read() {
        let Ok((mut dragonfly, config, transform)) = agents.get_mut(command.agent) else {
            crate::log_warning(&format!(
                "FlightCommand {:?}: {:?} is not a dragonfly",
                command.order, command.agent
            ));
            continue;
        };

        if let Err(err) = dragonfly.apply_order(command.order, transform, config, &mut rng.rng) {
            crate::log_warning(&format!(
                "FlightCommand {:?} for {:?} rejected: {}",
                command.order, command.agent, err
            ));
        }
    }
}

/// Система: Disturbance → scare_count / бегство
pub fn apply_disturbances(
    mut disturbances: EventReader<Disturbance>,
    mut agents: Query<(&mut Dragonfly, &FlightConfig, &Transform)>,
) {
    for disturbance in disturbances.read() {
        let Ok((mut dragonfly, config, transform)) = agents.get_mut(disturbance.agent) else {
            continue;
        };

        if dragonfly.disturb(transform, disturbance.source, config) {
            crate::log_info(&format!(
                "🦋 {:?} scared by {:?} (scare_count = {})",
                disturbance.agent,
                disturbance.source,
                dragonfly.scare_count()
            ));
        }
    }
}

/// Система: steering дошёл до точки → отдых и новый waypoint
pub fn relay_steering_arrivals(
    mut arrivals: EventReader<SteeringArrived>,
    mut agents: Query<(&mut Dragonfly, &FlightConfig)>,
    mut rng: ResMut<DeterministicRng>,
) {
    for arrival in arrivals.read() {
        let Ok((mut dragonfly, config)) = agents.get_mut(arrival.agent) else {
            continue;
        };
        dragonfly.on_steering_arrived(config, &mut rng.rng);
    }
}

/// Система: один тик FSM для каждой стрекозы (FixedUpdate)
pub fn advance_flight(
    mut agents: Query<(
        Entity,
        &mut Dragonfly,
        &FlightConfig,
        &mut Transform,
        Option<&mut TetherSteering>,
    )>,
    probe: Res<SurfaceProbe>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let elapsed = time.elapsed_secs();

    for (entity, mut dragonfly, config, mut transform, steering) in agents.iter_mut() {
        let tether = steering
            .as_deref()
            .map(TetherSteering::bounds)
            .unwrap_or_else(TetherBounds::unbounded);

        let mut ctx = FlightContext {
            delta,
            elapsed,
            rng: &mut rng.rng,
            probe: probe.probe(),
            tether,
        };
        dragonfly.tick(&mut transform, config, &mut ctx);

        if let Some(point) = dragonfly.take_steering_request() {
            match steering {
                Some(mut steering) => steering.steer_to(point),
                None => crate::log(&format!(
                    "{:?}: steering waypoint {:?} dropped (no TetherSteering)",
                    entity, point
                )),
            }
        }
    }
}

/// Система: outbox milestones → FlightMilestone events
pub fn publish_milestones(
    mut agents: Query<(Entity, &mut Dragonfly)>,
    mut milestones: EventWriter<FlightMilestone>,
) {
    for (agent, mut dragonfly) in agents.iter_mut() {
        if dragonfly.pending_milestones().is_empty() {
            continue;
        }
        for milestone in dragonfly.drain_milestones() {
            milestones.write(FlightMilestone { agent, milestone });
        }
    }
}

/// Система: копирует pose агента в модель (без pitch/roll в полёте)
pub fn sync_model_poses(
    agents: Query<(&Transform, &Dragonfly, &ModelLink)>,
    mut models: Query<&mut Transform, (With<DragonflyModel>, Without<Dragonfly>)>,
) {
    for (agent_transform, dragonfly, link) in agents.iter() {
        let Ok(mut model_transform) = models.get_mut(link.model) else {
            continue;
        };
        *model_transform = dragonfly.model_pose(agent_transform);
    }
}
