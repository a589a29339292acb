//! FlightConfig: параметры полёта стрекозы (immutable per instance)

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Параметры полёта.
///
/// Загружается из JSON (`#[serde(default)]`: любое поле можно опустить).
/// Все расстояния в метрах, все паузы в секундах.
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Скорость интерполяции позиции к target (1/сек)
    pub lerp_rate: f32,
    /// Время поворота к target heading
    pub turn_time: f32,

    // Descend
    pub descend_speed: f32,
    /// Амплитуда горизонтального wobble при входе
    pub descend_wander_side: f32,
    /// Радиус случайной точки спуска вокруг descend_center
    pub descend_spread: f32,
    pub descend_center: [f32; 3],

    // Wander
    pub wander_radius: f32,
    pub min_pause_time: f32,
    pub max_pause_time: f32,
    /// Пол высоты для waypoint'ов
    pub min_height: f32,

    // Land
    pub land_max_stops: u32,
    pub land_probe_radius: f32,
    pub land_probe_distance: f32,
    pub land_confirm_distance: f32,
    pub land_epsilon: f32,
    /// Каждые N промахов поиска посадки: warning в лог
    pub land_search_warn_every: u32,
    /// Лимит промахов поиска, после него Leaving (0: без лимита)
    pub land_search_max_attempts: u32,

    // Leave
    pub leave_speed: f32,
    pub scare_max_count: u32,
    pub entering_flee_wait: f32,
    pub leaving_flee_wait: f32,
    pub landed_flee_wait: f32,

    /// Bitmask слоёв для probe'ов и sensor volume
    pub detect_layers: u32,
    /// Радиус detection volume (sensor)
    pub detect_radius: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            lerp_rate: 1.0,
            turn_time: 0.2,
            descend_speed: 10.0,
            descend_wander_side: 0.5,
            descend_spread: 4.0,
            descend_center: [0.0, 0.0, 0.0],
            wander_radius: 1.5,
            min_pause_time: 3.0,
            max_pause_time: 5.0,
            min_height: 0.3,
            land_max_stops: 3,
            land_probe_radius: 2.0,
            land_probe_distance: 10.0,
            land_confirm_distance: 2.0,
            land_epsilon: 0.05,
            land_search_warn_every: 20,
            land_search_max_attempts: 200,
            leave_speed: 20.0,
            scare_max_count: 3,
            entering_flee_wait: 3.0,
            leaving_flee_wait: 1.0,
            landed_flee_wait: 5.0,
            detect_layers: u32::MAX,
            detect_radius: 1.0,
        }
    }
}

impl FlightConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FlightConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn descend_center(&self) -> Vec3 {
        Vec3::from_array(self.descend_center)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.turn_time > 0.0) {
            return Err(invalid("turn_time", "must be > 0"));
        }
        if self.min_pause_time < 0.0 {
            return Err(invalid("min_pause_time", "must be >= 0"));
        }
        if self.min_pause_time > self.max_pause_time {
            return Err(invalid(
                "max_pause_time",
                format!(
                    "must be >= min_pause_time ({} > {})",
                    self.min_pause_time, self.max_pause_time
                ),
            ));
        }

        let non_negative = [
            ("lerp_rate", self.lerp_rate),
            ("descend_speed", self.descend_speed),
            ("descend_spread", self.descend_spread),
            ("wander_radius", self.wander_radius),
            ("land_probe_radius", self.land_probe_radius),
            ("land_confirm_distance", self.land_confirm_distance),
            ("land_epsilon", self.land_epsilon),
            ("leave_speed", self.leave_speed),
            ("entering_flee_wait", self.entering_flee_wait),
            ("leaving_flee_wait", self.leaving_flee_wait),
            ("landed_flee_wait", self.landed_flee_wait),
            ("detect_radius", self.detect_radius),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(invalid(field, format!("must be >= 0, got {}", value)));
            }
        }

        if !(self.land_probe_distance > 0.0) {
            return Err(invalid("land_probe_distance", "must be > 0"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
