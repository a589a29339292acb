//! Tether steering: состояние внешнего steering компонента
//!
//! Сам steering (движение к точке, tether) живёт вне симуляции.
//! Стрекоза только пишет target_point/enabled и читает tether bounds.

use bevy::prelude::*;

/// Steering-to-point с привязкой (tether) к якорю.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
pub struct TetherSteering {
    /// Якорь привязки (точки дальше max_distance отвергаются)
    pub anchor: Vec3,
    pub max_distance: f32,
    /// Текущая цель steering'а (None: цели нет)
    pub target_point: Option<Vec3>,
    pub enabled: bool,
}

impl Default for TetherSteering {
    fn default() -> Self {
        Self {
            anchor: Vec3::ZERO,
            max_distance: 10.0,
            target_point: None,
            enabled: false, // выключен до первой цели
        }
    }
}

impl TetherSteering {
    pub fn bounds(&self) -> TetherBounds {
        TetherBounds {
            anchor: self.anchor,
            max_distance: self.max_distance,
        }
    }

    pub fn steer_to(&mut self, point: Vec3) {
        self.target_point = Some(point);
        self.enabled = true;
    }
}

/// Ограничение на waypoint'ы: расстояние от якоря < max_distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetherBounds {
    pub anchor: Vec3,
    pub max_distance: f32,
}

impl TetherBounds {
    /// Без steering компонента: без ограничений
    pub fn unbounded() -> Self {
        Self {
            anchor: Vec3::ZERO,
            max_distance: f32::INFINITY,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.distance_squared(self.anchor) < self.max_distance * self.max_distance
    }
}

/// Событие: steering дошёл до target_point
#[derive(Event, Debug, Clone)]
pub struct SteeringArrived {
    pub agent: Entity,
}
