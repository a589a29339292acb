//! Physics probes: forward sphere sweep / ray для поиска посадки
//!
//! Архитектура:
//! - FSM не знает о физическом движке, только о trait PhysicsProbe
//! - Хост кладёт свою реализацию в SurfaceProbe resource
//! - Headless режим: SurfaceField (аналитические плоскости и сферы)
//!
//! Слои фильтруются Rapier Group mask (те же биты, что у sensor volume).

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

pub mod sensor;
pub mod surfaces;

pub use sensor::*;
pub use surfaces::*;

/// Результат probe: точка контакта + нормаль поверхности
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Пройденное расстояние вдоль направления
    pub distance: f32,
}

/// Physics probe service.
///
/// `direction` не обязан быть нормализован; нулевое направление: промах.
/// Коллайдеры, пересекающиеся с формой в стартовой точке, игнорируются.
pub trait PhysicsProbe: Send + Sync {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        layers: Group,
    ) -> Option<ProbeHit>;

    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: Group,
    ) -> Option<ProbeHit> {
        self.sphere_cast(origin, 0.0, direction, max_distance, layers)
    }
}

/// Resource: активный probe backend
#[derive(Resource)]
pub struct SurfaceProbe(Box<dyn PhysicsProbe>);

impl SurfaceProbe {
    pub fn new(probe: impl PhysicsProbe + 'static) -> Self {
        Self(Box::new(probe))
    }

    pub fn probe(&self) -> &dyn PhysicsProbe {
        self.0.as_ref()
    }
}

impl Default for SurfaceProbe {
    /// Пустой мир: любой probe промахивается
    fn default() -> Self {
        Self::new(SurfaceField::default())
    }
}
