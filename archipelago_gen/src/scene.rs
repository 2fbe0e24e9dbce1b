// One full generation run: city plus optional reef, ready for a renderer.
//
// `generate_scene` validates the config, resolves every shape it will need
// from the provider (so a missing asset fails before any interpretation),
// then plans, expands and interprets the city on the calling thread and
// grows the reef on the rayon pool. The city's tree jitter comes from
// `GenRng::new(seed)`; reef instances derive their own streams from the same
// seed (see `reef.rs`).
//
// See also: `main.rs` (the `generate` CLI), `city.rs`, `reef.rs`.

use crate::city::{CityAssets, CityGenerator};
use crate::config::GenConfig;
use crate::error::GenResult;
use crate::mesh::{MeshAssetProvider, MeshBuffers};
use crate::noise::{NoiseField, SimplexNoise};
use crate::reef::{ReefAssets, ReefOutput, generate_reef};
use archipelago_prng::GenRng;
use serde::{Deserialize, Serialize};

/// Renderer handoff: one buffer set per drawable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneOutput {
    pub city: MeshBuffers,
    pub kelp: Vec<MeshBuffers>,
    pub coral: Vec<MeshBuffers>,
}

/// Counts only, for logs and `--summary`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub city_vertices: usize,
    pub city_indices: usize,
    pub kelp_instances: usize,
    pub coral_instances: usize,
    pub total_vertices: usize,
    pub total_indices: usize,
}

impl SceneOutput {
    pub fn drawables(&self) -> impl Iterator<Item = &MeshBuffers> {
        std::iter::once(&self.city)
            .chain(self.kelp.iter())
            .chain(self.coral.iter())
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            city_vertices: self.city.vertex_count(),
            city_indices: self.city.count(),
            kelp_instances: self.kelp.len(),
            coral_instances: self.coral.len(),
            total_vertices: self.drawables().map(MeshBuffers::vertex_count).sum(),
            total_indices: self.drawables().map(MeshBuffers::count).sum(),
        }
    }
}

/// Run the pipeline with the stock simplex field.
pub fn generate_scene(config: &GenConfig, provider: &dyn MeshAssetProvider) -> GenResult<SceneOutput> {
    generate_scene_with(config, provider, &SimplexNoise)
}

pub fn generate_scene_with(
    config: &GenConfig,
    provider: &dyn MeshAssetProvider,
    noise: &dyn NoiseField,
) -> GenResult<SceneOutput> {
    config.validate()?;
    let city_assets = CityAssets::resolve(provider)?;
    let reef_assets = if config.reef.enabled {
        Some(ReefAssets::resolve(provider)?)
    } else {
        None
    };

    let mut city = CityGenerator::new(config, &city_assets, noise);
    city.expand(config.expansion_count);
    let city = city.interpret(&mut GenRng::new(config.seed))?;

    let ReefOutput { kelp, coral } = match &reef_assets {
        Some(assets) => generate_reef(&config.reef, config.seed, assets, noise)?,
        None => ReefOutput::default(),
    };

    let scene = SceneOutput { city, kelp, coral };
    let summary = scene.summary();
    tracing::info!(
        seed = config.seed,
        expansions = config.expansion_count,
        vertices = summary.total_vertices,
        indices = summary.total_indices,
        kelp = summary.kelp_instances,
        coral = summary.coral_instances,
        "scene generated"
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use crate::mesh::AssetLibrary;
    use crate::shapes::{self, BuiltinShapes};

    fn quick_config() -> GenConfig {
        let mut config = GenConfig::default();
        config.expansion_count = 4;
        config.reef.kelp.extent = 40;
        config
    }

    #[test]
    fn same_config_same_scene() {
        let config = quick_config();
        let a = generate_scene(&config, &BuiltinShapes).unwrap();
        let b = generate_scene(&config, &BuiltinShapes).unwrap();
        assert_eq!(a, b);
        assert!(!a.city.is_empty());
        assert_eq!(a.coral.len(), crate::reef::CORAL_CLUSTERS);
    }

    #[test]
    fn disabled_reef_yields_city_only() {
        let mut config = quick_config();
        config.reef.enabled = false;
        let scene = generate_scene(&config, &BuiltinShapes).unwrap();
        assert!(scene.kelp.is_empty() && scene.coral.is_empty());
        let summary = scene.summary();
        assert_eq!(summary.total_vertices, summary.city_vertices);
        assert_eq!(summary.total_indices, scene.city.count());
    }

    #[test]
    fn missing_asset_fails_before_generation() {
        let names: Vec<&str> = BuiltinShapes::NAMES
            .iter()
            .copied()
            .filter(|&n| n != shapes::STAIR_DOWN)
            .collect();
        let library = AssetLibrary::from_provider(&BuiltinShapes, &names).unwrap();
        match generate_scene(&quick_config(), &library) {
            Err(GenError::MissingAsset { name }) => assert_eq!(name, shapes::STAIR_DOWN),
            other => panic!("expected MissingAsset, got {other:?}"),
        }
    }

    #[test]
    fn reef_assets_only_required_when_enabled() {
        let names: Vec<&str> = BuiltinShapes::NAMES
            .iter()
            .copied()
            .filter(|&n| n != shapes::KELP)
            .collect();
        let library = AssetLibrary::from_provider(&BuiltinShapes, &names).unwrap();
        let mut config = quick_config();
        assert!(generate_scene(&config, &library).is_err());
        config.reef.enabled = false;
        assert!(generate_scene(&config, &library).is_ok());
    }

    #[test]
    fn sunken_land_config_is_rejected_before_drawing() {
        let mut config = quick_config();
        config.water_threshold = -0.9;
        let sunken = |_: [f64; 3]| -0.6;
        assert!(matches!(
            generate_scene_with(&config, &BuiltinShapes, &sunken),
            Err(GenError::InvalidConfig(_))
        ));

        config.city.island_height_base = 0.6;
        config.reef.enabled = false;
        let scene = generate_scene_with(&config, &BuiltinShapes, &sunken).unwrap();
        assert!(scene.city.normals.iter().all(|n| n.is_finite()));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = quick_config();
        config.expansion_count = crate::config::MAX_EXPANSIONS + 1;
        assert!(matches!(
            generate_scene(&config, &BuiltinShapes),
            Err(GenError::InvalidConfig(_))
        ));
    }
}
