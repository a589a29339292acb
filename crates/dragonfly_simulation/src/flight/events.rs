//! Flight events: команды хоста, disturbances, milestones
//!
//! Архитектура (как MovementCommand → system):
//! - Хост пишет FlightCommand / Disturbance
//! - FixedUpdate системы применяют их к Dragonfly
//! - Dragonfly копит milestones, publish система отдаёт FlightMilestone

use bevy::prelude::*;

use crate::flight::{FlightScenario, Milestone};

/// Приказ конкретной стрекозе
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightOrder {
    /// Первый true: старт влёта, дальше pause/resume
    SetMotion(bool),
    /// Старт влёта к заданной точке спуска
    Launch { descend_target: Vec3 },
    SetScenario(FlightScenario),
    /// Внешняя цель посадки (None: снять)
    SetLandTarget(Option<Vec3>),
    /// Wandering → Landing
    LandNow,
    /// Wandering | Landed → Leaving
    LeaveNow,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FlightCommand {
    pub agent: Entity,
    pub order: FlightOrder,
}

impl FlightCommand {
    pub fn new(agent: Entity, order: FlightOrder) -> Self {
        Self { agent, order }
    }
}

/// Что-то вошло в detection volume агента
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Disturbance {
    pub agent: Entity,
    /// Мировая позиция источника
    pub source: Vec3,
}

/// Завершение этапа полёта
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FlightMilestone {
    pub agent: Entity,
    pub milestone: Milestone,
}
