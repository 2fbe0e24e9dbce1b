// Sea-floor scatter: a ring of kelp sampled from noise plus a fixed line of
// coral clusters off the west shore.
//
// Placement is sequential and pure (it only reads the noise field). Growth
// runs one instance per rayon task; instance `k` gets its own
// `GenRng::derive(seed, k)` with kelp numbered first and coral after, so
// the output is identical however the work is scheduled.
//
// Kelp placement walks a square lattice and keeps a point when
// `noise(p + offset) * noise_weight - (amount / 2 - 2 * dist) > amount`,
// where `dist` is the distance from the origin. The distance term keeps the
// islands' shallows clear and thickens the field towards the edges.
//
// See also: `kelp.rs`, `coral.rs`, `scene.rs` (the only caller outside
// tests).

use crate::config::{CoralField, KelpField, ReefConfig};
use crate::coral::{CoralAssets, grow_coral};
use crate::error::GenResult;
use crate::kelp::{KelpAssets, grow_kelp};
use crate::math::Vec3;
use crate::mesh::{MeshAssetProvider, MeshBuffers};
use crate::noise::NoiseField;
use archipelago_prng::GenRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const CORAL_CLUSTERS: usize = 12;

/// Which clusters get the extra westward shift, west to east along z.
const CORAL_SHIFTED: [bool; CORAL_CLUSTERS] = [
    true, false, true, false, true, true, false, true, false, true, false, true,
];
const CORAL_SHIFT: f32 = -10.0;

#[derive(Clone, Debug)]
pub struct ReefAssets {
    pub kelp: KelpAssets,
    pub coral: CoralAssets,
}

impl ReefAssets {
    pub fn resolve(provider: &dyn MeshAssetProvider) -> GenResult<Self> {
        Ok(Self {
            kelp: KelpAssets::resolve(provider)?,
            coral: CoralAssets::resolve(provider)?,
        })
    }
}

/// One mesh per kelp plant and per coral cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReefOutput {
    pub kelp: Vec<MeshBuffers>,
    pub coral: Vec<MeshBuffers>,
}

/// Lattice points where kelp grows, on the sea floor.
pub fn kelp_sites(field: &KelpField, noise: &dyn NoiseField) -> Vec<Vec3> {
    let [ox, oy, oz] = field.noise_offset;
    let lattice = || (-field.extent..=field.extent).step_by(field.spacing.max(1) as usize);
    let mut sites = Vec::new();
    for i in lattice() {
        for j in lattice() {
            let (x, z) = (i as f64, j as f64);
            let dist = x.hypot(z);
            let sample = noise.sample([x + ox, oy, z + oz]);
            if sample * field.noise_weight - (field.amount / 2.0 - 2.0 * dist) > field.amount {
                sites.push(Vec3::new(i as f32, field.floor_y, j as f32));
            }
        }
    }
    sites
}

/// Bases of the coral clusters.
pub fn coral_centers(field: &CoralField) -> [Vec3; CORAL_CLUSTERS] {
    let mut centers = [Vec3::ZERO; CORAL_CLUSTERS];
    for (k, center) in centers.iter_mut().enumerate() {
        let i = k as f32 - 5.5;
        let shift = if CORAL_SHIFTED[k] { CORAL_SHIFT } else { 0.0 };
        *center = Vec3::new(
            -50.0 - ((i + 1.0) * 1.4).abs() + shift,
            field.floor_y,
            i * 5.0 + i * (10.0 + shift) / 10.0,
        );
    }
    centers
}

pub fn generate_reef(
    config: &ReefConfig,
    seed: u64,
    assets: &ReefAssets,
    noise: &dyn NoiseField,
) -> GenResult<ReefOutput> {
    let sites = kelp_sites(&config.kelp, noise);
    let centers = coral_centers(&config.coral);

    let kelp = sites
        .par_iter()
        .enumerate()
        .map(|(k, &base)| {
            let mut rng = GenRng::derive(seed, k as u64);
            grow_kelp(&config.kelp, &assets.kelp, base, &mut rng)
        })
        .collect::<GenResult<Vec<_>>>()?;

    let offset = sites.len() as u64;
    let coral = centers
        .par_iter()
        .enumerate()
        .map(|(k, &base)| {
            let mut rng = GenRng::derive(seed, offset + k as u64);
            grow_coral(&config.coral, &assets.coral, base, &mut rng)
        })
        .collect::<GenResult<Vec<_>>>()?;

    tracing::debug!(kelp = kelp.len(), coral = coral.len(), "reef grown");
    Ok(ReefOutput { kelp, coral })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::SimplexNoise;
    use crate::shapes::BuiltinShapes;

    fn small_field() -> KelpField {
        KelpField {
            extent: 20,
            spacing: 10,
            ..KelpField::default()
        }
    }

    #[test]
    fn kelp_sites_follow_the_growth_test() {
        let field = small_field();
        let lush = |_: [f64; 3]| 10.0;
        let barren = |_: [f64; 3]| 0.0;
        assert_eq!(kelp_sites(&field, &lush).len(), 25);
        assert!(kelp_sites(&field, &barren).is_empty());
        for site in kelp_sites(&field, &lush) {
            assert_eq!(site.y, field.floor_y);
        }
    }

    #[test]
    fn kelp_sites_sample_at_the_offset() {
        let field = KelpField {
            extent: 0,
            ..KelpField::default()
        };
        let only_at_offset = |p: [f64; 3]| {
            if p == [40.0, -50.0, -100.0] { 10.0 } else { 0.0 }
        };
        assert_eq!(kelp_sites(&field, &only_at_offset), vec![Vec3::new(0.0, -40.0, 0.0)]);
    }

    #[test]
    fn coral_centers_match_layout() {
        let centers = coral_centers(&CoralField::default());
        assert!((centers[0].x - -66.3).abs() < 1e-4);
        assert!((centers[0].z - -27.5).abs() < 1e-4);
        assert!((centers[1].x - -54.9).abs() < 1e-4);
        assert!((centers[1].z - -27.0).abs() < 1e-4);
        assert!(centers.iter().all(|c| c.y == -40.0));
    }

    #[test]
    fn reef_is_deterministic_and_instances_use_their_own_stream() {
        let config = ReefConfig {
            kelp: small_field(),
            ..ReefConfig::default()
        };
        let assets = ReefAssets::resolve(&BuiltinShapes).unwrap();
        let lush = |_: [f64; 3]| 10.0;
        let a = generate_reef(&config, 77, &assets, &lush).unwrap();
        let b = generate_reef(&config, 77, &assets, &lush).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.kelp.len(), 25);
        assert_eq!(a.coral.len(), CORAL_CLUSTERS);

        let sites = kelp_sites(&config.kelp, &lush);
        let third = grow_kelp(&config.kelp, &assets.kelp, sites[3], &mut GenRng::derive(77, 3)).unwrap();
        assert_eq!(a.kelp[3], third);
        let centers = coral_centers(&config.coral);
        let first_coral = grow_coral(
            &config.coral,
            &assets.coral,
            centers[0],
            &mut GenRng::derive(77, 25),
        )
        .unwrap();
        assert_eq!(a.coral[0], first_coral);
    }

    #[test]
    fn simplex_reef_grows_something() {
        let assets = ReefAssets::resolve(&BuiltinShapes).unwrap();
        let reef = generate_reef(&ReefConfig::default(), 1, &assets, &SimplexNoise).unwrap();
        assert!(reef.coral.iter().all(|c| !c.is_empty()));
    }
}
