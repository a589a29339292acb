//! Flight module: FSM стрекозы (влёт, блуждание, посадка, испуг, улёт)
//!
//! Архитектура:
//! - state: FlightState / FlightScenario + таблица переходов
//! - controller: Dragonfly компонент (вся логика FSM)
//! - routines: отложенные шаги с отменой по поколению
//! - motion: интеграция pose, стабилизация модели
//! - waypoints: случайные точки для tether steering
//! - events / systems: ECS обвязка

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;

pub mod controller;
pub mod events;
pub mod motion;
pub mod routines;
pub mod state;
pub mod systems;
pub mod waypoints;


pub use controller::{random_descend_target, Dragonfly, FlightContext, LandTarget, Milestone};
pub use events::{Disturbance, FlightCommand, FlightMilestone, FlightOrder};
pub use routines::{CancelToken, RoutineKind, Routines, Wake};
pub use state::{FlightScenario, FlightState};
pub use systems::*;
pub use waypoints::{generate_waypoint, random_in_unit_sphere, WaypointOutcome};

use crate::components::{DragonflyModel, FlightConfig, ModelLink, SteeringArrived, TetherSteering};
use crate::physics::{bridge_sensor_collisions, detection_sensor, SurfaceProbe};
use crate::DeterministicRng;

/// Flight plugin (events + FixedUpdate системы)
pub struct FlightPlugin;

impl Plugin for FlightPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.add_event::<FlightCommand>()
            .add_event::<Disturbance>()
            .add_event::<FlightMilestone>()
            .add_event::<SteeringArrived>()
            // Без RapierPhysicsPlugin (headless) события просто не приходят
            .add_event::<CollisionEvent>()
            .init_resource::<SurfaceProbe>()
            .register_type::<FlightConfig>()
            .register_type::<TetherSteering>()
            .register_type::<ModelLink>()
            .register_type::<DragonflyModel>()
            .add_systems(
                FixedUpdate,
                (
                    bridge_sensor_collisions,
                    apply_flight_commands,
                    apply_disturbances,
                    relay_steering_arrivals,
                    advance_flight,
                    publish_milestones,
                    sync_model_poses,
                )
                    .chain(),
            );
    }
}

/// Entity ids заспавненной стрекозы
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragonflyHandles {
    /// Логический агент (Dragonfly + FlightConfig + sensor)
    pub agent: Entity,
    /// Видимая модель
    pub model: Entity,
}

/// Спавнит агента (с detection sensor) и его модель.
///
/// Motion выключен до первого SetMotion(true) / Launch.
pub fn spawn_dragonfly(
    commands: &mut Commands,
    position: Vec3,
    config: FlightConfig,
    scenario: FlightScenario,
) -> DragonflyHandles {
    let sensor = detection_sensor(&config);

    let agent = commands
        .spawn((
            Dragonfly::new(scenario),
            Transform::from_translation(position),
            sensor,
            config,
        ))
        .id();

    let model = commands
        .spawn((DragonflyModel { agent }, Transform::from_translation(position)))
        .id();

    commands.entity(agent).insert(ModelLink { model });

    crate::log(&format!(
        "🦋 Spawned dragonfly {:?} (model {:?}) at {:?}",
        agent, model, position
    ));

    DragonflyHandles { agent, model }
}
