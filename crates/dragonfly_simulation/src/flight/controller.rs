//! Dragonfly: flight FSM компонент
//!
//! Логика живёт в методах компонента, системы только подают контекст.
//! Порядок внутри тика:
//! 1. per-state логика (Entering / Landed check / Leaving)
//! 2. проснувшиеся routines (wander, поиск посадки, chill, бегство)
//! 3. интеграция pose к свежему target
//!
//! Пока motion выключен, тик не трогает ни pose, ни таймеры.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;
use rand::{Rng, RngCore};

use crate::components::{FlightConfig, TetherBounds};
use crate::error::FlightError;
use crate::flight::events::FlightOrder;
use crate::flight::motion::{self, move_towards, perturb_heading, surface_rotation, wobble};
use crate::flight::routines::{RoutineKind, Routines, Wake};
use crate::flight::waypoints::{generate_waypoint, random_in_unit_sphere};
use crate::flight::{FlightScenario, FlightState};
use crate::physics::PhysicsProbe;

/// Радиус прибытия для Entering / Leaving
const ARRIVAL_DISTANCE: f32 = 1.0;
/// Пауза между попытками поиска посадки
const LAND_SEARCH_RETRY_TICKS: u32 = 3;
/// Максимальный поворот heading'а при промахе probe (градусы)
const LAND_SEARCH_HEADING_JITTER: f32 = 45.0;
/// Ограничение вертикали для wander смещения
const WANDER_VERTICAL_LIMIT: f32 = 0.5;

/// Внешние зависимости одного тика
pub struct FlightContext<'a> {
    pub delta: f32,
    /// Фаза wobble
    pub elapsed: f32,
    pub rng: &'a mut dyn RngCore,
    pub probe: &'a dyn PhysicsProbe,
    pub tether: TetherBounds,
}

/// Уведомления о завершении крупных этапов полёта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Milestone {
    EnterFinished,
    LandFinished,
    WanderFinished,
    LeaveFinished,
}

/// Состояние посадки
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandTarget {
    pub point: Option<Vec3>,
    pub landed: bool,
    pub normal: Vec3,
}

/// Flight FSM стрекозы.
///
/// Счётчики land_count / scare_count только растут (сброс: пересоздание).
#[derive(Component, Debug, Clone)]
pub struct Dragonfly {
    pub(crate) state: FlightState,
    pub(crate) scenario: FlightScenario,
    pub(crate) motion_enabled: bool,
    pub(crate) launched: bool,
    pub(crate) departed: bool,
    pub(crate) target_position: Vec3,
    pub(crate) target_rotation: Quat,
    pub(crate) descend_target: Vec3,
    pub(crate) leave_target: Vec3,
    pub(crate) land: LandTarget,
    pub(crate) land_count: u32,
    pub(crate) scare_count: u32,
    pub(crate) routines: Routines,
    milestones: Vec<Milestone>,
    steering_request: Option<Vec3>,
}

impl Default for Dragonfly {
    fn default() -> Self {
        Self::new(FlightScenario::default())
    }
}

impl Dragonfly {
    pub fn new(scenario: FlightScenario) -> Self {
        Self {
            state: FlightState::Entering,
            scenario,
            motion_enabled: false,
            launched: false,
            departed: false,
            target_position: Vec3::ZERO,
            target_rotation: Quat::IDENTITY,
            descend_target: Vec3::ZERO,
            leave_target: Vec3::ZERO,
            land: LandTarget::default(),
            land_count: 0,
            scare_count: 0,
            routines: Routines::default(),
            milestones: Vec::new(),
            steering_request: None,
        }
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn scenario(&self) -> FlightScenario {
        self.scenario
    }

    pub fn is_motion_enabled(&self) -> bool {
        self.motion_enabled
    }

    pub fn has_departed(&self) -> bool {
        self.departed
    }

    pub fn land_count(&self) -> u32 {
        self.land_count
    }

    pub fn scare_count(&self) -> u32 {
        self.scare_count
    }

    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    pub fn descend_target(&self) -> Vec3 {
        self.descend_target
    }

    pub fn leave_target(&self) -> Vec3 {
        self.leave_target
    }

    pub fn land_target(&self) -> Option<Vec3> {
        self.land.point
    }

    pub fn is_landed(&self) -> bool {
        self.land.landed
    }

    pub fn land_normal(&self) -> Vec3 {
        self.land.normal
    }

    pub fn routines(&self) -> &Routines {
        &self.routines
    }

    pub fn pending_milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn drain_milestones(&mut self) -> Vec<Milestone> {
        std::mem::take(&mut self.milestones)
    }

    /// Новая цель для внешнего steering (после rest)
    pub fn take_steering_request(&mut self) -> Option<Vec3> {
        self.steering_request.take()
    }

    /// Pose модели: копия позиции, поворот без pitch/roll (кроме посадки)
    pub fn model_pose(&self, agent: &Transform) -> Transform {
        motion::model_pose(agent, self.land.landed)
    }

    /// Переход FSM по таблице рёбер. Отменяет routines прошлого состояния.
    pub fn transition(&mut self, next: FlightState) -> Result<(), FlightError> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(FlightError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }

        crate::log(&format!("🦋 Dragonfly: {:?} → {:?}", self.state, next));
        self.state = next;
        self.routines.invalidate();
        Ok(())
    }

    /// Переход, который по построению легален; ошибка: баг, логируем
    fn enter(&mut self, next: FlightState) -> bool {
        match self.transition(next) {
            Ok(()) => true,
            Err(err) => {
                crate::log_error(&format!("Dragonfly: {}", err));
                false
            }
        }
    }

    fn notify(&mut self, milestone: Milestone) {
        crate::log_info(&format!("🦋 Dragonfly milestone: {:?}", milestone));
        self.milestones.push(milestone);
    }

    // ========================================================================
    // External control surface
    // ========================================================================

    pub fn apply_order<R: Rng + ?Sized>(
        &mut self,
        order: FlightOrder,
        pose: &Transform,
        config: &FlightConfig,
        rng: &mut R,
    ) -> Result<(), FlightError> {
        match order {
            FlightOrder::SetMotion(enabled) => self.enable_motion(enabled, pose, config, rng),
            FlightOrder::Launch { descend_target } => self.launch(descend_target, pose),
            FlightOrder::SetScenario(scenario) => {
                self.set_scenario(scenario);
                Ok(())
            }
            FlightOrder::SetLandTarget(point) => {
                self.set_land_target(point);
                Ok(())
            }
            FlightOrder::LandNow => self.land_now(),
            FlightOrder::LeaveNow => self.leave_now(),
        }
    }

    /// Первый enable стартует влёт со случайной точкой спуска, следующие делают resume.
    pub fn enable_motion<R: Rng + ?Sized>(
        &mut self,
        enabled: bool,
        pose: &Transform,
        config: &FlightConfig,
        rng: &mut R,
    ) -> Result<(), FlightError> {
        if !enabled {
            self.motion_enabled = false;
            return Ok(());
        }
        if self.departed {
            return Err(FlightError::Departed);
        }
        if self.launched {
            self.motion_enabled = true;
            return Ok(());
        }

        let descend_target = random_descend_target(rng, config);
        self.launch(descend_target, pose)
    }

    /// Старт влёта к точке спуска; точка выхода: текущая позиция
    pub fn launch(&mut self, descend_target: Vec3, pose: &Transform) -> Result<(), FlightError> {
        if self.departed {
            return Err(FlightError::Departed);
        }
        if self.launched {
            return Err(FlightError::CommandRejected {
                command: "launch",
                state: self.state,
            });
        }

        self.launched = true;
        self.motion_enabled = true;
        self.state = FlightState::Entering;
        self.routines.invalidate();
        self.leave_target = pose.translation;
        self.descend_target = descend_target;
        self.target_position = pose.translation;
        self.target_rotation = pose.rotation;

        crate::log_info(&format!(
            "🦋 Dragonfly launched: descend to {:?}, exit at {:?}",
            descend_target, self.leave_target
        ));
        Ok(())
    }

    pub fn set_scenario(&mut self, scenario: FlightScenario) {
        self.scenario = scenario;
    }

    /// None: цель посадки снята (на поверхности это считается сдвигом)
    pub fn set_land_target(&mut self, point: Option<Vec3>) {
        self.land.point = point;
    }

    pub fn land_now(&mut self) -> Result<(), FlightError> {
        self.ensure_active()?;
        if self.state != FlightState::Wandering {
            return Err(FlightError::CommandRejected {
                command: "land_now",
                state: self.state,
            });
        }

        self.notify(Milestone::WanderFinished);
        self.transition(FlightState::Landing)?;
        self.routines
            .schedule(RoutineKind::LandSearch { attempt: 0 }, Wake::Ticks(1));
        Ok(())
    }

    pub fn leave_now(&mut self) -> Result<(), FlightError> {
        self.ensure_active()?;
        match self.state {
            FlightState::Wandering => {
                self.notify(Milestone::WanderFinished);
            }
            FlightState::Landed | FlightState::Landing => {
                self.land = LandTarget::default();
            }
            state => {
                return Err(FlightError::CommandRejected {
                    command: "leave_now",
                    state,
                });
            }
        }
        crate::log_info("🦋 Dragonfly: start leaving");
        self.transition(FlightState::Leaving)
    }

    fn ensure_active(&self) -> Result<(), FlightError> {
        if self.departed {
            Err(FlightError::Departed)
        } else {
            Ok(())
        }
    }

    /// Что-то вошло в detection volume.
    ///
    /// Счётчик растёт всегда, бегство: только в Entering / Leaving с
    /// включенным motion. Возвращает true, если стрекоза отреагировала.
    pub fn disturb(&mut self, pose: &Transform, source: Vec3, config: &FlightConfig) -> bool {
        self.scare_count += 1;

        if !self.motion_enabled || !self.state.reacts_to_disturbance() {
            crate::log(&format!(
                "Dragonfly: disturbance ignored in {:?} (scare_count = {})",
                self.state, self.scare_count
            ));
            return false;
        }

        let wait = if self.state == FlightState::Entering {
            config.entering_flee_wait
        } else {
            config.leaving_flee_wait
        };

        // Смещение к источнику, без нормализации
        let toward = source - pose.translation;
        let resume = self.state;
        self.fly_away(pose.translation, toward, wait, true, resume, config);
        true
    }

    /// Steering дошёл до точки: отдохнуть и выбрать новую
    pub fn on_steering_arrived<R: Rng + ?Sized>(&mut self, config: &FlightConfig, rng: &mut R) {
        if self.departed {
            return;
        }
        let pause = pause_time(rng, config);
        self.routines
            .schedule_detached(RoutineKind::SteeringRest, Wake::Seconds(pause));
    }

    // ========================================================================
    // Tick
    // ========================================================================

    pub fn tick(&mut self, pose: &mut Transform, config: &FlightConfig, ctx: &mut FlightContext) {
        if !self.motion_enabled {
            return;
        }

        match self.state {
            FlightState::Entering => self.entering(pose, config, ctx),
            FlightState::Landed => self.check_landing_surface(pose, config),
            FlightState::Leaving => self.leaving(pose, config, ctx),
            FlightState::Wandering | FlightState::Landing | FlightState::Scared => {}
        }

        // Leaving мог завершиться
        if !self.motion_enabled {
            return;
        }

        self.resume_routines(pose, config, ctx);

        motion::integrate(
            pose,
            self.target_position,
            &mut self.target_rotation,
            ctx.delta,
            config,
        );
    }

    fn resume_routines(&mut self, pose: &Transform, config: &FlightConfig, ctx: &mut FlightContext) {
        for (kind, token) in self.routines.advance(ctx.delta) {
            // Более ранняя routine этого тика могла сменить состояние
            if !self.routines.is_live(token) || !self.motion_enabled {
                continue;
            }

            match kind {
                RoutineKind::WanderPause => self.wander_step(config, ctx),
                RoutineKind::LandSearch { attempt } => {
                    self.find_land_target(pose, config, ctx, attempt)
                }
                RoutineKind::LandApproach => self.approach_step(pose, config, ctx),
                RoutineKind::Chill => self.finish_chill(pose, config),
                RoutineKind::FlyAway { resume } => self.resume_after_fright(resume, pose, config, ctx),
                RoutineKind::SteeringRest => self.retarget_steering(pose, config, ctx),
            }
        }
    }

    fn entering(&mut self, pose: &Transform, config: &FlightConfig, ctx: &mut FlightContext) {
        let position = pose.translation;
        let mut target = move_towards(position, self.descend_target, config.descend_speed * ctx.delta);
        target.x += wobble(ctx.elapsed, config.descend_wander_side);
        self.target_position = target;

        let offset = self.descend_target - position;
        let horizontal = Vec2::new(offset.x, offset.z).length_squared();
        if horizontal >= ARRIVAL_DISTANCE * ARRIVAL_DISTANCE {
            return;
        }

        crate::log_info("🦋 Dragonfly entered");
        match self.scenario {
            FlightScenario::Wander => {
                if self.enter(FlightState::Wandering) {
                    self.schedule_wander(config, ctx);
                }
            }
            FlightScenario::Land => {
                if self.enter(FlightState::Landing) {
                    self.find_land_target(pose, config, ctx, 0);
                }
            }
        }
        self.notify(Milestone::EnterFinished);
    }

    fn leaving(&mut self, pose: &Transform, config: &FlightConfig, ctx: &mut FlightContext) {
        let position = pose.translation;
        let mut target = move_towards(position, self.leave_target, config.leave_speed * ctx.delta);
        target.x += wobble(ctx.elapsed, config.descend_wander_side);
        self.target_position = target;

        if (self.leave_target - position).length_squared() < ARRIVAL_DISTANCE * ARRIVAL_DISTANCE {
            crate::log_info("🦋 Dragonfly left");
            self.motion_enabled = false;
            self.departed = true;
            self.routines.cancel_all();
            self.notify(Milestone::LeaveFinished);
        }
    }

    // Wander

    fn schedule_wander(&mut self, config: &FlightConfig, ctx: &mut FlightContext) {
        let pause = pause_time(&mut *ctx.rng, config);
        self.routines
            .schedule(RoutineKind::WanderPause, Wake::Seconds(pause));
    }

    fn wander_step(&mut self, config: &FlightConfig, ctx: &mut FlightContext) {
        let mut offset = random_in_unit_sphere(&mut *ctx.rng) * config.wander_radius;
        offset.y = offset.y.clamp(-WANDER_VERTICAL_LIMIT, WANDER_VERTICAL_LIMIT);
        self.target_position += offset;
        self.schedule_wander(config, ctx);
    }

    // Land

    /// Есть цель → подлёт, нет → очередная попытка probe
    fn find_land_target(
        &mut self,
        pose: &Transform,
        config: &FlightConfig,
        ctx: &mut FlightContext,
        attempt: u32,
    ) {
        if self.land.point.is_some() {
            self.approach_step(pose, config, ctx);
        } else {
            self.search_land_target(pose, config, ctx, attempt + 1);
        }
    }

    fn search_land_target(
        &mut self,
        pose: &Transform,
        config: &FlightConfig,
        ctx: &mut FlightContext,
        attempt: u32,
    ) {
        let position = pose.translation;
        // Висим на месте: heading следует за поворотами поиска
        self.target_position = position;

        let hit = ctx.probe.sphere_cast(
            position,
            config.land_probe_radius,
            pose.forward().as_vec3(),
            config.land_probe_distance,
            detect_layers(config),
        );

        match hit {
            Some(hit) => {
                crate::log(&format!(
                    "Dragonfly: found land target {:?} (attempt {})",
                    hit.point, attempt
                ));
                self.land.point = Some(hit.point);
            }
            None => {
                let heading: f32 = ctx
                    .rng
                    .gen_range(-LAND_SEARCH_HEADING_JITTER..=LAND_SEARCH_HEADING_JITTER);
                self.target_rotation = perturb_heading(self.target_rotation, heading, heading / 3.0);

                let max_attempts = config.land_search_max_attempts;
                if max_attempts > 0 && attempt >= max_attempts {
                    crate::log_warning(&format!(
                        "Dragonfly: no landable surface after {} probes, giving up",
                        attempt
                    ));
                    self.enter(FlightState::Leaving);
                    return;
                }

                let warn_every = config.land_search_warn_every;
                if warn_every > 0 && attempt % warn_every == 0 {
                    crate::log_warning(&format!(
                        "Dragonfly: no landable surface after {} probes",
                        attempt
                    ));
                }
            }
        }

        self.routines.schedule(
            RoutineKind::LandSearch { attempt },
            Wake::Ticks(LAND_SEARCH_RETRY_TICKS),
        );
    }

    fn approach_step(&mut self, pose: &Transform, config: &FlightConfig, ctx: &mut FlightContext) {
        let Some(point) = self.land.point else {
            self.search_land_target(pose, config, ctx, 1);
            return;
        };

        let position = pose.translation;
        if point.distance_squared(position) > config.land_epsilon * config.land_epsilon {
            self.target_position = move_towards(position, point, config.leave_speed * ctx.delta);
            self.routines
                .schedule(RoutineKind::LandApproach, Wake::Ticks(1));
            return;
        }

        let confirm = ctx.probe.ray_cast(
            position,
            pose.forward().as_vec3(),
            config.land_confirm_distance,
            detect_layers(config),
        );

        match confirm {
            Some(hit) => self.touch_down(pose, hit.normal, config),
            None => {
                crate::log("Dragonfly: no surface under land target, searching again");
                self.land = LandTarget::default();
                self.search_land_target(pose, config, ctx, 1);
            }
        }
    }

    fn touch_down(&mut self, pose: &Transform, normal: Vec3, config: &FlightConfig) {
        if !self.enter(FlightState::Landed) {
            return;
        }

        self.land.normal = normal;
        self.land.landed = true;
        self.target_rotation = surface_rotation(normal, pose.rotation);
        self.target_position = pose.translation;
        self.land_count += 1;

        crate::log_info(&format!("🦋 Dragonfly landed (land_count = {})", self.land_count));
        self.notify(Milestone::LandFinished);

        self.routines
            .schedule(RoutineKind::Chill, Wake::Seconds(config.max_pause_time));
    }

    /// Каждый тик на поверхности: поверхность сдвинулась → испуг
    fn check_landing_surface(&mut self, pose: &Transform, config: &FlightConfig) {
        let position = pose.translation;
        let epsilon = config.land_epsilon;
        let settled = matches!(
            self.land.point,
            Some(point) if point.distance_squared(position) <= epsilon * epsilon
        );
        if settled {
            return;
        }

        crate::log_info("🦋 Dragonfly: landing surface moved!");
        let offset = self.land_offset(position);
        self.land = LandTarget::default();
        self.scare_count += 1;
        self.fly_away(position, offset, config.landed_flee_wait, true, FlightState::Landed, config);
    }

    fn finish_chill(&mut self, pose: &Transform, config: &FlightConfig) {
        let offset = self.land_offset(pose.translation);
        self.land = LandTarget::default();

        if self.land_count > config.land_max_stops {
            crate::log_info("🦋 Dragonfly: enough stops, start leaving");
            self.enter(FlightState::Leaving);
        } else {
            self.fly_away(
                pose.translation,
                offset,
                config.landed_flee_wait,
                false,
                FlightState::Landed,
                config,
            );
        }
    }

    /// Цель посадки минус позиция; цели нет: нулевой сдвиг
    fn land_offset(&self, position: Vec3) -> Vec3 {
        self.land.point.map_or(Vec3::ZERO, |point| point - position)
    }

    // Fright

    /// Бегство: сдвиг на `offset` (x2 при тревоге), пауза, потом возврат к `resume`.
    /// Слишком много испугов: сразу Leaving.
    fn fly_away(
        &mut self,
        position: Vec3,
        offset: Vec3,
        wait: f32,
        alarmed: bool,
        resume: FlightState,
        config: &FlightConfig,
    ) {
        if self.scare_count > config.scare_max_count {
            crate::log_info(&format!(
                "🦋 Dragonfly: scared {} times, leaving",
                self.scare_count
            ));
            self.enter(FlightState::Leaving);
            return;
        }

        if !self.enter(FlightState::Scared) {
            return;
        }

        let scale = if alarmed { 2.0 } else { 1.0 };
        self.target_position = position + offset * scale;
        self.routines
            .schedule(RoutineKind::FlyAway { resume }, Wake::Seconds(wait));
    }

    fn resume_after_fright(
        &mut self,
        resume: FlightState,
        pose: &Transform,
        config: &FlightConfig,
        ctx: &mut FlightContext,
    ) {
        match resume {
            FlightState::Landed => {
                if self.enter(FlightState::Landing) {
                    self.find_land_target(pose, config, ctx, 0);
                }
            }
            other => {
                self.enter(other);
            }
        }
    }

    // Steering

    fn retarget_steering(&mut self, pose: &Transform, config: &FlightConfig, ctx: &mut FlightContext) {
        let outcome = generate_waypoint(
            &mut *ctx.rng,
            pose.translation,
            config.wander_radius,
            ctx.tether,
            config.min_height,
        );
        self.steering_request = Some(outcome.point);
    }
}

fn detect_layers(config: &FlightConfig) -> Group {
    Group::from_bits_truncate(config.detect_layers)
}

fn pause_time<R: Rng + ?Sized>(rng: &mut R, config: &FlightConfig) -> f32 {
    if config.max_pause_time <= config.min_pause_time {
        config.min_pause_time
    } else {
        rng.gen_range(config.min_pause_time..=config.max_pause_time)
    }
}

/// Случайная точка спуска: над descend_center, высота 0.1..2
pub fn random_descend_target<R: Rng + ?Sized>(rng: &mut R, config: &FlightConfig) -> Vec3 {
    let mut offset = random_in_unit_sphere(rng) * config.descend_spread;
    offset.y = offset.y.abs().clamp(0.1, 2.0);
    config.descend_center() + offset
}
