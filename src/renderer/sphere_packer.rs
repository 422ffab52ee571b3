// renderer/sphere_packer.rs
//
// Spheres are traced analytically, so each packs into a single record:
// world centre, radius and a randomly drawn material.

use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use super::records::SphereRecord;
use crate::settings::TracerSettings;

/// A registered sphere object: a stable per-entity key and its world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSource {
    pub key: u64,
    pub local_to_world: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereMaterial {
    pub albedo: Vec3,
    pub specular: Vec3,
    pub emission: Vec3,
    pub smoothness: f32,
}

impl SphereMaterial {
    /// 40% metal, 40% diffuse, 20% emissive.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let color = random_hsv(rng, 0.0..=1.0);
        let chance: f32 = rng.gen();
        if chance < 0.8 {
            let metal = chance < 0.4;
            Self {
                albedo: if metal { Vec3::ZERO } else { color },
                specular: if metal { color } else { Vec3::splat(0.04) },
                emission: Vec3::ZERO,
                smoothness: rng.gen(),
            }
        } else {
            Self {
                albedo: Vec3::ONE,
                specular: Vec3::ONE,
                emission: random_hsv(rng, 3.0..=8.0),
                smoothness: 1.0,
            }
        }
    }

    fn record(&self, center: Vec3, radius: f32) -> SphereRecord {
        SphereRecord {
            center: center.to_array(),
            radius,
            albedo: self.albedo.to_array(),
            specular: self.specular.to_array(),
            smoothness: self.smoothness,
            emission: self.emission.to_array(),
        }
    }
}

/// Half the smallest absolute world scale axis; a non-uniformly scaled
/// sphere is traced as the largest sphere its scale fully contains.
pub fn sphere_radius(local_to_world: &Mat4) -> f32 {
    let (scale, _, _) = local_to_world.to_scale_rotation_translation();
    scale.abs().min_element() * 0.5
}

/// Packs registered spheres. Materials are drawn from a generator seeded
/// with `seed ^ key`, so a sphere keeps its material across rebuilds.
pub fn pack_spheres(sources: &[SphereSource], seed: u64) -> Vec<SphereRecord> {
    sources
        .iter()
        .map(|source| {
            let mut rng = seeded(seed ^ source.key);
            let center = source.local_to_world.w_axis.truncate();
            let radius = sphere_radius(&source.local_to_world);
            SphereMaterial::random(&mut rng).record(center, radius)
        })
        .collect()
}

/// Scatters up to `spheres_max` non-intersecting spheres resting on the
/// ground plane within `sphere_placement_radius` of the origin.
pub fn scatter_spheres<R: Rng + ?Sized>(settings: &TracerSettings, rng: &mut R) -> Vec<SphereRecord> {
    let (min_radius, max_radius) = settings.sphere_radius;
    let mut spheres: Vec<SphereRecord> = Vec::new();

    for _ in 0..settings.spheres_max {
        let radius = min_radius + rng.gen::<f32>() * (max_radius - min_radius);
        let offset = inside_unit_circle(rng) * settings.sphere_placement_radius;
        let center = Vec3::new(offset.x, radius, offset.y);

        let intersects = spheres.iter().any(|other| {
            let min_dist = radius + other.radius;
            center.distance_squared(Vec3::from_array(other.center)) < min_dist * min_dist
        });
        if intersects {
            continue;
        }

        spheres.push(SphereMaterial::random(rng).record(center, radius));
    }

    log::info!(
        "Scattered {} of {} procedural spheres",
        spheres.len(),
        settings.spheres_max
    );
    spheres
}

pub fn seeded(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

fn inside_unit_circle<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    loop {
        let p = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}

/// Uniform hue and saturation, value drawn from `value`.
fn random_hsv<R: Rng + ?Sized>(rng: &mut R, value: std::ops::RangeInclusive<f32>) -> Vec3 {
    let h: f32 = rng.gen();
    let s: f32 = rng.gen();
    let v = rng.gen_range(value);
    hsv_to_rgb(h, s, v)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h6 = (h.fract() * 6.0).min(5.999_999);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u32 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}
