//! Dragonfly Simulation Core
//!
//! Flight FSM стрекозы на Bevy 0.16 ECS (headless, FixedUpdate 60Hz)
//!
//! Архитектура:
//! - ECS = логика полёта (FSM, таймеры, счётчики испугов/посадок)
//! - Хост = физика/рендер: кладёт свой PhysicsProbe, читает Transform модели
//! - Rapier sensor → Disturbance events (detection volume)

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod components;
pub mod error;
pub mod flight;
pub mod logger;
pub mod physics;

// Re-exports для удобства
pub use components::*;
pub use error::{ConfigError, FlightError};
pub use flight::{
    spawn_dragonfly, Disturbance, Dragonfly, DragonflyHandles, FlightCommand, FlightMilestone,
    FlightOrder, FlightPlugin, FlightScenario, FlightState, Milestone,
};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel,
    LogPrinter,
};
pub use physics::{PhysicsProbe, ProbeHit, SurfaceField, SurfaceProbe};

/// Частота simulation tick
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ));

        // Seed из create_headless_app не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.add_plugins(FlightPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции.
///
/// Время шагает вручную: каждый `app.update()` = ровно один fixed tick
/// (первый update только инициализирует часы).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
