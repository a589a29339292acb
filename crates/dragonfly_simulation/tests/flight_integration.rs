//! Flight integration test
//!
//! Полный App (SimulationPlugin) headless, события хоста → FSM → milestones
//!
//! Проверяем:
//! - Влёт → Wandering / посадка через SurfaceProbe
//! - Rapier sensor collision → Disturbance → испуг
//! - Steering arrival → новая цель TetherSteering
//! - Модель следует за агентом

use bevy::prelude::*;
use bevy_rapier3d::prelude::{CollisionEvent, Group};
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;
use dragonfly_simulation::*;

/// Все milestones, опубликованные за прогон
#[derive(Resource, Default)]
struct MilestoneLog(Vec<FlightMilestone>);

fn record_milestones(mut events: EventReader<FlightMilestone>, mut log: ResMut<MilestoneLog>) {
    log.0.extend(events.read().copied());
}

/// Helper: App с SimulationPlugin и журналом milestones
fn create_flight_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin)
        .init_resource::<MilestoneLog>()
        .add_systems(Update, record_milestones);
    app
}

fn spawn(app: &mut App, position: Vec3, scenario: FlightScenario) -> DragonflyHandles {
    let handles = {
        let mut commands = app.world_mut().commands();
        spawn_dragonfly(&mut commands, position, FlightConfig::default(), scenario)
    };
    app.world_mut().flush();
    handles
}

fn command(app: &mut App, agent: Entity, order: FlightOrder) {
    app.world_mut().send_event(FlightCommand::new(agent, order));
}

fn state_of(app: &App, agent: Entity) -> FlightState {
    app.world().get::<Dragonfly>(agent).unwrap().state()
}

/// Тикает до условия (None: не дождались)
fn run_until(app: &mut App, max_updates: u32, done: impl Fn(&App) -> bool) -> Option<u32> {
    for update in 1..=max_updates {
        app.update();
        if done(app) {
            return Some(update);
        }
    }
    None
}

#[test]
fn test_launch_enters_and_starts_wandering() {
    let mut app = create_flight_app(42);
    let handles = spawn(&mut app, Vec3::new(4.0, 1.0, 0.0), FlightScenario::Wander);

    command(
        &mut app,
        handles.agent,
        FlightOrder::Launch {
            descend_target: Vec3::new(0.0, 1.0, 0.0),
        },
    );

    run_until(&mut app, 5000, |app| state_of(app, handles.agent) == FlightState::Wandering)
        .expect("dragonfly should finish entering");

    // Update после FixedUpdate: журнал уже содержит milestone
    let log = &app.world().resource::<MilestoneLog>().0;
    assert_eq!(
        log.as_slice(),
        &[FlightMilestone {
            agent: handles.agent,
            milestone: Milestone::EnterFinished
        }]
    );

    let agent = *app.world().get::<Transform>(handles.agent).unwrap();
    let model = *app.world().get::<Transform>(handles.model).unwrap();
    assert_eq!(model.translation, agent.translation);
    // В полёте модель без pitch/roll
    assert!((model.rotation * Vec3::Y).abs_diff_eq(Vec3::Y, 1.0e-3));
}

#[test]
fn test_lands_through_surface_probe() {
    let mut app = create_flight_app(7);
    app.insert_resource(SurfaceProbe::new(
        SurfaceField::new().with_sphere(Vec3::new(0.0, 3.0, 0.0), 0.5, Group::ALL),
    ));

    let start = Vec3::new(0.0, 3.0, 8.0);
    let handles = spawn(&mut app, start, FlightScenario::Land);
    command(&mut app, handles.agent, FlightOrder::Launch { descend_target: start });

    run_until(&mut app, 4000, |app| state_of(app, handles.agent) == FlightState::Landed)
        .expect("dragonfly should land on the flower");

    let dragonfly = app.world().get::<Dragonfly>(handles.agent).unwrap();
    assert_eq!(dragonfly.land_count(), 1);
    assert!(dragonfly.is_landed());

    let milestones: Vec<_> = app
        .world()
        .resource::<MilestoneLog>()
        .0
        .iter()
        .map(|event| event.milestone)
        .collect();
    assert_eq!(milestones, vec![Milestone::EnterFinished, Milestone::LandFinished]);

    // На поверхности модель сохраняет наклон агента
    let agent = *app.world().get::<Transform>(handles.agent).unwrap();
    let model = *app.world().get::<Transform>(handles.model).unwrap();
    assert_eq!(model.rotation, agent.rotation);
}

#[test]
fn test_sensor_collision_scares_entering_dragonfly() {
    let mut app = create_flight_app(42);
    let handles = spawn(&mut app, Vec3::new(0.0, 3.0, 10.0), FlightScenario::Wander);
    command(
        &mut app,
        handles.agent,
        FlightOrder::Launch {
            descend_target: Vec3::new(0.0, 1.0, 0.0),
        },
    );
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(state_of(&app, handles.agent), FlightState::Entering);

    let cat = app
        .world_mut()
        .spawn(Transform::from_translation(Vec3::new(1.0, 3.0, 10.0)))
        .id();
    app.world_mut().send_event(CollisionEvent::Started(
        cat,
        handles.agent,
        CollisionEventFlags::SENSOR,
    ));
    app.update();

    let dragonfly = app.world().get::<Dragonfly>(handles.agent).unwrap();
    assert_eq!(dragonfly.state(), FlightState::Scared);
    assert_eq!(dragonfly.scare_count(), 1);
    // Рывок в сторону кота (по +X)
    let agent = app.world().get::<Transform>(handles.agent).unwrap();
    assert!(dragonfly.target_position().x > agent.translation.x);
}

#[test]
fn test_collision_between_other_entities_is_ignored() {
    let mut app = create_flight_app(42);
    let handles = spawn(&mut app, Vec3::new(0.0, 3.0, 10.0), FlightScenario::Wander);
    command(
        &mut app,
        handles.agent,
        FlightOrder::Launch {
            descend_target: Vec3::new(0.0, 1.0, 0.0),
        },
    );
    app.update();
    app.update();

    let a = app.world_mut().spawn(Transform::default()).id();
    let b = app.world_mut().spawn(Transform::default()).id();
    app.world_mut()
        .send_event(CollisionEvent::Started(a, b, CollisionEventFlags::empty()));
    app.update();

    let dragonfly = app.world().get::<Dragonfly>(handles.agent).unwrap();
    assert_eq!(dragonfly.scare_count(), 0);
    assert_eq!(dragonfly.state(), FlightState::Entering);
}

#[test]
fn test_commands_route_to_their_agent() {
    let mut app = create_flight_app(42);
    let first = spawn(&mut app, Vec3::new(0.0, 3.0, 0.0), FlightScenario::Wander);
    let second = spawn(&mut app, Vec3::new(10.0, 3.0, 0.0), FlightScenario::Wander);

    command(&mut app, first.agent, FlightOrder::SetScenario(FlightScenario::Land));
    command(
        &mut app,
        first.agent,
        FlightOrder::Launch {
            descend_target: Vec3::new(0.0, 3.0, 0.0),
        },
    );
    // Не стрекоза: warning, без паники
    command(&mut app, first.model, FlightOrder::LandNow);
    // Отклонено: second ещё не запущена
    command(&mut app, second.agent, FlightOrder::LeaveNow);

    for _ in 0..3 {
        app.update();
    }

    assert_eq!(state_of(&app, first.agent), FlightState::Landing);
    let second_dragonfly = app.world().get::<Dragonfly>(second.agent).unwrap();
    assert_eq!(second_dragonfly.state(), FlightState::Entering);
    assert!(!second_dragonfly.is_motion_enabled());
}

#[test]
fn test_steering_arrival_sets_next_tether_target() {
    let mut app = create_flight_app(42);
    let start = Vec3::new(0.0, 3.0, 0.0);
    let handles = spawn(&mut app, start, FlightScenario::Wander);
    app.world_mut().entity_mut(handles.agent).insert(TetherSteering {
        anchor: start,
        max_distance: 5.0,
        ..Default::default()
    });

    command(&mut app, handles.agent, FlightOrder::Launch { descend_target: start });
    app.update();
    app.update();
    app.world_mut().send_event(SteeringArrived {
        agent: handles.agent,
    });

    // Отдых min..max pause (3..5s)
    run_until(&mut app, 400, |app| {
        app.world()
            .get::<TetherSteering>(handles.agent)
            .is_some_and(|steering| steering.enabled)
    })
    .expect("steering should get a new waypoint");

    let steering = app.world().get::<TetherSteering>(handles.agent).unwrap();
    let point = steering.target_point.expect("target point");
    assert!(steering.bounds().contains(point));
    assert!(point.y > FlightConfig::default().min_height);
}
