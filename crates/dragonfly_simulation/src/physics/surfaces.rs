//! SurfaceField: headless замена физическим коллайдерам
//!
//! Плоскости односторонние (solid за нормалью), сферы: solid целиком.
//! Sphere sweep = ray против поверхности, раздутой на радиус sweep'а.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

use super::{PhysicsProbe, ProbeHit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceShape {
    Plane { point: Vec3, normal: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub shape: SurfaceShape,
    pub layers: Group,
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceField {
    surfaces: Vec<Surface>,
}

impl SurfaceField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(mut self, height: f32, layers: Group) -> Self {
        self.surfaces.push(Surface {
            shape: SurfaceShape::Plane {
                point: Vec3::new(0.0, height, 0.0),
                normal: Vec3::Y,
            },
            layers,
        });
        self
    }

    pub fn with_sphere(mut self, center: Vec3, radius: f32, layers: Group) -> Self {
        self.surfaces.push(Surface {
            shape: SurfaceShape::Sphere { center, radius },
            layers,
        });
        self
    }
}

impl PhysicsProbe for SurfaceField {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        layers: Group,
    ) -> Option<ProbeHit> {
        let dir = direction.try_normalize()?;
        let radius = radius.max(0.0);

        self.surfaces
            .iter()
            .filter(|surface| surface.layers.intersects(layers))
            .filter_map(|surface| sweep(&surface.shape, origin, radius, dir, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

fn sweep(shape: &SurfaceShape, origin: Vec3, radius: f32, dir: Vec3, max_distance: f32) -> Option<ProbeHit> {
    match *shape {
        SurfaceShape::Plane { point, normal } => {
            let normal = normal.try_normalize()?;
            let start_distance = (origin - point).dot(normal);
            // Стартуем в контакте или за плоскостью
            if start_distance <= radius {
                return None;
            }
            let approach = -dir.dot(normal);
            if approach <= 0.0 {
                return None;
            }
            let t = (start_distance - radius) / approach;
            if t > max_distance {
                return None;
            }
            Some(ProbeHit {
                point: origin + dir * t - normal * radius,
                normal,
                distance: t,
            })
        }

        SurfaceShape::Sphere { center, radius: surface_radius } => {
            let inflated = surface_radius + radius;
            let offset = origin - center;
            let c = offset.length_squared() - inflated * inflated;
            if c <= 0.0 {
                return None;
            }
            let b = offset.dot(dir);
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                return None;
            }
            let t = -b - discriminant.sqrt();
            if t < 0.0 || t > max_distance {
                return None;
            }
            let normal = (origin + dir * t - center).try_normalize()?;
            Some(ProbeHit {
                point: center + normal * surface_radius,
                normal,
                distance: t,
            })
        }
    }
}
