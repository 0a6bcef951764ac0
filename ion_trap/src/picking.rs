//! Pointer hit testing against the ion spheres

use crate::ion::IonId;
use glam::Vec3;

/// Distance along the ray to the first intersection with a sphere, if any
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let dir = dir.normalize_or_zero();
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let near = -b - sqrt_disc;
    let far = -b + sqrt_disc;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

/// Nearest ion hit by the ray; `None` on a miss
pub fn pick_ion(
    origin: Vec3,
    dir: Vec3,
    ions: impl IntoIterator<Item = (IonId, Vec3)>,
    radius: f32,
) -> Option<IonId> {
    ions.into_iter()
        .filter_map(|(id, center)| ray_sphere(origin, dir, center, radius).map(|t| (id, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
