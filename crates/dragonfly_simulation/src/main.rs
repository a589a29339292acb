//! Headless симуляция стрекозы
//!
//! Запуск: `dragonfly_simulation [config.json]`
//! Земля + пара "цветов", стрекоза влетает, садится, улетает.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;
use dragonfly_simulation::{
    create_headless_app, log_error, log_info, spawn_dragonfly, Dragonfly, FlightCommand,
    FlightConfig, FlightMilestone, FlightOrder, FlightScenario, SimulationPlugin, SurfaceField,
    SurfaceProbe,
};

const MAX_TICKS: u32 = 60 * 300;

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);

    let config = match std::env::args().nth(1) {
        Some(path) => match FlightConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log_error(&format!("Config {}: {}", path, err));
                std::process::exit(1);
            }
        },
        None => FlightConfig::default(),
    };

    log_info(&format!("Starting dragonfly headless simulation (seed: {})", seed));

    let surfaces = SurfaceField::new()
        .with_ground(0.0, Group::GROUP_1)
        .with_sphere(Vec3::new(0.0, 0.5, -6.0), 0.4, Group::GROUP_1)
        .with_sphere(Vec3::new(3.0, 0.8, -4.0), 0.3, Group::GROUP_1);

    app.add_plugins(SimulationPlugin)
        .insert_resource(SurfaceProbe::new(surfaces))
        .add_systems(Update, report_milestones);

    let handles = {
        let mut commands = app.world_mut().commands();
        spawn_dragonfly(&mut commands, Vec3::new(0.0, 6.0, 20.0), config, FlightScenario::Land)
    };
    app.world_mut().flush();

    app.world_mut()
        .send_event(FlightCommand::new(handles.agent, FlightOrder::SetMotion(true)));

    for tick in 0..MAX_TICKS {
        app.update();

        let Some(dragonfly) = app.world().get::<Dragonfly>(handles.agent) else {
            break;
        };
        if dragonfly.has_departed() {
            log_info(&format!("Tick {}: dragonfly departed", tick));
            break;
        }
        if tick % 600 == 0 {
            log_info(&format!(
                "Tick {}: {:?} (landed {} times, scared {} times)",
                tick,
                dragonfly.state(),
                dragonfly.land_count(),
                dragonfly.scare_count()
            ));
        }
    }

    log_info("Simulation complete!");
}

fn report_milestones(mut milestones: EventReader<FlightMilestone>) {
    for event in milestones.read() {
        log_info(&format!("{:?}: {:?}", event.agent, event.milestone));
    }
}
