// Data-driven generation configuration.
//
// Every numeric constant the interpreters use lives here: site lattice and
// noise frequency, island height mapping, the house/tree decision scale and
// cutoffs, bridge spacing, story styles, plant proportions, and the reef
// layout. `GenConfig` is loaded from JSON (any omitted field falls back to
// its default) and validated before a run starts.
//
// The defaults are tuned for `SimplexNoise`, whose output lies in [-1, 1].
// A different `NoiseField` will usually want a different `water_threshold`
// and `city.decision_scale`.
//
// See also: `city.rs`, `plant.rs`, `kelp.rs`, `coral.rs`, `reef.rs` for the
// readers of each section, `main.rs` for the CLI overrides.
//
// **Critical constraint: determinism.** Config values feed straight into
// generation. Same config + same seed = same buffers.

use crate::error::{GenError, GenResult};
use crate::mesh::{Rgba, rgb8};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// City
// ---------------------------------------------------------------------------

/// Shapes-independent parameters of one house style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryStyle {
    /// Uniform scale applied to the style's story and roof shapes.
    pub scale: f32,
    /// Story height in shape units; the turtle climbs `story_height * scale`.
    pub story_height: f32,
    /// One color per shape part (square houses have one part, round two).
    pub colors: Vec<Rgba>,
}

impl Default for StoryStyle {
    fn default() -> Self {
        Self {
            scale: 0.2,
            story_height: 0.75,
            colors: vec![rgb8(60, 20, 50)],
        }
    }
}

/// Smallest accepted `bridge_step`; one plank per step is emitted.
pub const MIN_BRIDGE_STEP: f32 = 0.01;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityTuning {
    /// Sites cover `-grid_extent..=grid_extent` on both axes.
    pub grid_extent: i32,
    /// Lattice coordinates are multiplied by this before sampling noise.
    pub site_noise_scale: f64,
    /// Half-width of the city square; geometry is clamped to it and houses
    /// are only placed strictly inside it.
    pub bounds: f32,

    /// Island height = `base + amplitude * site noise`.
    pub island_height_base: f32,
    pub island_height_amplitude: f32,
    /// The turtle stands at `height * island_lift` on its island.
    pub island_lift: f32,
    /// Island vertices at or below this (pre-scale) height are sand.
    pub sand_line: f32,

    /// `score = sqrt(noise) * y^2 * decision_scale`.
    pub decision_scale: f64,
    /// Below this score a lot gets a house (and stories keep going while
    /// the re-sampled score stays at or above it).
    pub house_cutoff: f64,
    /// At or above this score a lot gets a tree.
    pub tree_cutoff: f64,

    /// Horizontal foundation scale.
    pub foundation_scale: f32,
    /// Foundation height as a fraction of the turtle's height.
    pub foundation_height: f32,
    /// House width = `width_base - max(score, 0) * width_falloff`.
    pub width_base: f32,
    pub width_falloff: f32,
    pub square: StoryStyle,
    pub round: StoryStyle,

    /// `<` moves the turtle frame by `(0, -y * shift_drop, shift_out)`.
    pub shift_out: f32,
    pub shift_drop: f32,

    /// MST edges longer than this become bridges.
    pub bridge_min_length: f64,
    /// Distance covered by each stair or plank.
    pub bridge_step: f32,
    /// The first stair starts this far from the island center.
    pub stair_offset: f32,
    /// Scale applied to stair and plank shapes.
    pub bridge_scale: f32,

    /// Scale of instanced trees.
    pub tree_scale: f32,

    pub water_color: Rgba,
    pub grass_color: Rgba,
    pub sand_color: Rgba,
    pub bridge_color: Rgba,
    pub foundation_color: Rgba,
}

impl Default for CityTuning {
    fn default() -> Self {
        Self {
            grid_extent: 5,
            site_noise_scale: 0.37,
            bounds: 5.0,
            island_height_base: 0.3,
            island_height_amplitude: 0.5,
            island_lift: 0.43,
            sand_line: 0.01,
            decision_scale: 60.0,
            house_cutoff: 4.0,
            tree_cutoff: 6.0,
            foundation_scale: 0.2,
            foundation_height: 0.4,
            width_base: 1.55,
            width_falloff: 0.2,
            square: StoryStyle::default(),
            round: StoryStyle {
                scale: 0.23,
                story_height: 0.8,
                colors: vec![rgb8(0, 0, 0), rgb8(0, 0, 255)],
            },
            shift_out: 0.3,
            shift_drop: 0.35,
            bridge_min_length: 2.0,
            bridge_step: 0.1,
            stair_offset: 0.9,
            bridge_scale: 0.04,
            tree_scale: 0.4,
            water_color: rgb8(0, 0, 255),
            grass_color: rgb8(0, 255, 0),
            sand_color: rgb8(255, 255, 0),
            bridge_color: rgb8(112, 70, 42),
            foundation_color: rgb8(255, 255, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Plant
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantProfile {
    /// Base branching angle in degrees.
    pub angle_degrees: f32,
    /// Rewrite passes per tree.
    pub passes: u32,
    /// Only the first `window` symbols are rewritten each pass.
    pub window: usize,
    /// Segment width = `trunk_width * trunk_taper^depth`.
    pub trunk_width: f32,
    pub trunk_taper: f32,
    /// A segment advances the turtle by `segment_length * width`.
    pub segment_length: f32,
    /// Leaf size = `leaf_width * leaf_taper^depth`.
    pub leaf_width: f32,
    pub leaf_taper: f32,
    pub trunk_color: Rgba,
    pub leaf_color: Rgba,
}

impl Default for PlantProfile {
    fn default() -> Self {
        Self {
            angle_degrees: 25.0,
            passes: 3,
            window: 10,
            trunk_width: 0.1,
            trunk_taper: 0.75,
            segment_length: 3.5,
            leaf_width: 0.2,
            leaf_taper: 0.9,
            trunk_color: rgb8(49, 32, 15),
            leaf_color: rgb8(40, 150, 40),
        }
    }
}

// ---------------------------------------------------------------------------
// Reef
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KelpField {
    /// Candidates cover `-extent..=extent` on both axes.
    pub extent: i32,
    pub spacing: i32,
    /// Growth test: `noise * noise_weight - (amount / 2 - 2 * dist) > amount`.
    pub amount: f64,
    pub noise_weight: f64,
    /// Added to `(x, 0, z)` before sampling.
    pub noise_offset: [f64; 3],
    pub floor_y: f32,
    /// Base yaw per `+`, in degrees; a random 0..30 is added on top.
    pub turn_degrees: f32,
    /// Passes = `base_passes + ceil(extra_passes * r)`.
    pub base_passes: u32,
    pub extra_passes: u32,
    pub tip_width: f32,
    pub color: Rgba,
}

impl Default for KelpField {
    fn default() -> Self {
        Self {
            extent: 200,
            spacing: 10,
            amount: 300.0,
            noise_weight: 100.0,
            noise_offset: [40.0, -50.0, -100.0],
            floor_y: -40.0,
            turn_degrees: 10.0,
            base_passes: 2,
            extra_passes: 2,
            tip_width: 1.0,
            color: rgb8(70, 150, 54),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoralField {
    pub floor_y: f32,
    /// Piece scale before the `1 / sqrt(depth)` falloff.
    pub size: f32,
    /// Probability that a piece past the first is drawn.
    pub branch_chance: f64,
    pub base_passes: u32,
    pub extra_passes: u32,
    pub color: Rgba,
}

impl Default for CoralField {
    fn default() -> Self {
        Self {
            floor_y: -40.0,
            size: 1.0,
            branch_chance: 0.8,
            base_passes: 3,
            extra_passes: 3,
            color: rgb8(103, 63, 168),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReefConfig {
    pub enabled: bool,
    pub kelp: KelpField,
    pub coral: CoralField,
}

impl Default for ReefConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kelp: KelpField::default(),
            coral: CoralField::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Upper bound on city rewrite passes; each pass adds a story to every lot.
pub const MAX_EXPANSIONS: u32 = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub seed: u64,
    /// City rewrite passes.
    pub expansion_count: u32,
    /// A site is land when its noise sample is above this.
    pub water_threshold: f64,
    pub include_trees: bool,
    pub city: CityTuning,
    pub plant: PlantProfile,
    pub reef: ReefConfig,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            expansion_count: 5,
            water_threshold: 0.15,
            include_trees: true,
            city: CityTuning::default(),
            plant: PlantProfile::default(),
            reef: ReefConfig::default(),
        }
    }
}

impl GenConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> GenResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> GenResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> GenResult<()> {
        let fail = |msg: String| Err(GenError::InvalidConfig(msg));

        if self.expansion_count > MAX_EXPANSIONS {
            return fail(format!(
                "expansion_count {} exceeds {MAX_EXPANSIONS}",
                self.expansion_count
            ));
        }
        if !self.water_threshold.is_finite() {
            return fail("water_threshold must be finite".into());
        }

        let c = &self.city;
        if c.grid_extent <= 0 {
            return fail(format!("city.grid_extent must be positive, got {}", c.grid_extent));
        }
        if !(c.site_noise_scale.is_finite() && c.site_noise_scale > 0.0) {
            return fail("city.site_noise_scale must be positive".into());
        }
        if c.bounds.is_nan() || c.bounds <= 0.0 {
            return fail("city.bounds must be positive".into());
        }
        if c.island_height_amplitude.is_nan() || c.island_height_amplitude < 0.0 {
            return fail("city.island_height_amplitude must be non-negative".into());
        }
        // Land sits above the water threshold; noise is at least -1.
        let lowest = c.island_height_base
            + c.island_height_amplitude * self.water_threshold.max(-1.0) as f32;
        if lowest.is_nan() || lowest <= 0.0 {
            return fail(format!(
                "lowest island height {lowest} must be positive; raise water_threshold or city.island_height_base"
            ));
        }
        if c.house_cutoff > c.tree_cutoff {
            return fail(format!(
                "city.house_cutoff {} must not exceed city.tree_cutoff {}",
                c.house_cutoff, c.tree_cutoff
            ));
        }
        if c.bridge_step.is_nan() || c.bridge_step < MIN_BRIDGE_STEP {
            return fail(format!(
                "city.bridge_step must be at least {MIN_BRIDGE_STEP}, got {}",
                c.bridge_step
            ));
        }
        if c.bridge_min_length < 0.0 {
            return fail("city.bridge_min_length must be non-negative".into());
        }
        if c.square.colors.is_empty() || c.round.colors.is_empty() {
            return fail("house styles need at least one color".into());
        }

        if self.plant.window == 0 {
            return fail("plant.window must be at least 1".into());
        }

        let k = &self.reef.kelp;
        if k.spacing <= 0 || k.extent < 0 {
            return fail("reef.kelp needs a positive spacing and non-negative extent".into());
        }
        if !(0.0..=1.0).contains(&self.reef.coral.branch_chance) {
            return fail("reef.coral.branch_chance must be in [0, 1]".into());
        }

        let colors = [
            c.water_color,
            c.grass_color,
            c.sand_color,
            c.bridge_color,
            c.foundation_color,
            self.plant.trunk_color,
            self.plant.leaf_color,
            k.color,
            self.reef.coral.color,
        ];
        let styled = c.square.colors.iter().chain(c.round.colors.iter());
        for color in colors.iter().chain(styled) {
            if color.iter().any(|ch| !(0.0..=1.0).contains(ch)) {
                return fail(format!("color {color:?} has a channel outside [0, 1]"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_serializes() {
        let config = GenConfig::default();
        config.validate().unwrap();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = GenConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = GenConfig::from_json(
            r#"{
                "seed": 9,
                "expansion_count": 3,
                "include_trees": false,
                "city": { "decision_scale": 30.0 },
                "reef": { "enabled": false }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.expansion_count, 3);
        assert!(!config.include_trees);
        assert_eq!(config.city.decision_scale, 30.0);
        assert_eq!(config.city.grid_extent, 5);
        assert!(!config.reef.enabled);
        assert_eq!(config.reef.kelp.spacing, 10);
        assert_eq!(config.water_threshold, GenConfig::default().water_threshold);
    }

    #[test]
    fn out_of_range_color_is_rejected() {
        let mut config = GenConfig::default();
        config.plant.leaf_color = [0.0, 5.0, 0.0, 1.0];
        assert!(matches!(config.validate(), Err(GenError::InvalidConfig(_))));
    }

    #[test]
    fn swapped_cutoffs_are_rejected() {
        let mut config = GenConfig::default();
        config.city.house_cutoff = 7.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn too_many_expansions_are_rejected() {
        let config = GenConfig {
            expansion_count: MAX_EXPANSIONS + 1,
            ..GenConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sunken_islands_are_rejected() {
        let mut config = GenConfig {
            water_threshold: -0.9,
            ..GenConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenError::InvalidConfig(_))));
        config.water_threshold = -5.0;
        assert!(config.validate().is_err());
        config.city.island_height_base = 0.6;
        config.validate().unwrap();
        config.city.island_height_amplitude = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bridge_step_has_a_floor() {
        let mut config = GenConfig::default();
        config.city.bridge_step = 1e-9;
        assert!(matches!(config.validate(), Err(GenError::InvalidConfig(_))));
        config.city.bridge_step = MIN_BRIDGE_STEP;
        config.validate().unwrap();
    }

    #[test]
    fn partial_story_style_fills_defaults() {
        let config = GenConfig::from_json(r#"{ "city": { "round": { "scale": 0.5 } } }"#).unwrap();
        assert_eq!(config.city.round.scale, 0.5);
        assert_eq!(config.city.round.story_height, StoryStyle::default().story_height);
        assert_eq!(config.city.round.colors, StoryStyle::default().colors);
        assert_eq!(config.city.square, StoryStyle::default());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            GenConfig::from_json("{ not json"),
            Err(GenError::Json(_))
        ));
    }
}
