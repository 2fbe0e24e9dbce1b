// Mesh fragments, accumulated output buffers, and the asset-provider seam.
//
// `MeshFragment` is one named static shape (positions, normals, triangle
// indices) as supplied by a `MeshAssetProvider`. Interpreters never own
// fragments by name at interpretation time: every variant resolves the
// shapes it needs once, up front (`CityAssets::resolve` etc.), so a missing
// asset fails the run before any geometry is emitted.
//
// `MeshBuffers` is the renderer handoff: four flat arrays (positions and
// normals as homogeneous xyzw, RGBA colors, `u32` triangle indices). Every
// append offsets the fragment's indices by the running vertex count.
//
// `AssetLibrary` is an in-memory provider that can be filled from any other
// provider or loaded from JSON, which lets callers swap in hand-made shapes
// without touching the generator.
//
// See also: `shapes.rs` for the procedural `BuiltinShapes` provider.

use crate::error::{GenError, GenResult};
use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Fragments and providers
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshFragment {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshFragment {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Check that normals pair up with positions and every index is in
    /// range. `name` is only used for the error.
    pub fn validate(&self, name: &str) -> GenResult<()> {
        let invalid = |reason: String| GenError::InvalidAsset {
            name: name.to_string(),
            reason,
        };
        if self.positions.len() != self.normals.len() {
            return Err(invalid(format!(
                "{} positions but {} normals",
                self.positions.len(),
                self.normals.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(invalid(format!(
                "index {bad} out of range for {} vertices",
                self.positions.len()
            )));
        }
        Ok(())
    }
}

/// Source of named static shapes.
pub trait MeshAssetProvider {
    fn load(&self, name: &str) -> GenResult<MeshFragment>;

    /// Load and validate.
    fn load_checked(&self, name: &str) -> GenResult<MeshFragment> {
        let fragment = self.load(name)?;
        fragment.validate(name)?;
        Ok(fragment)
    }
}

/// Named fragments held in memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetLibrary {
    pub fragments: BTreeMap<String, MeshFragment>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, fragment: MeshFragment) {
        self.fragments.insert(name.into(), fragment);
    }

    /// Copy `names` out of another provider.
    pub fn from_provider(provider: &dyn MeshAssetProvider, names: &[&str]) -> GenResult<Self> {
        let mut library = Self::new();
        for &name in names {
            library.insert(name, provider.load_checked(name)?);
        }
        Ok(library)
    }

    pub fn from_json(json: &str) -> GenResult<Self> {
        let library: Self = serde_json::from_str(json)?;
        for (name, fragment) in &library.fragments {
            fragment.validate(name)?;
        }
        Ok(library)
    }

    pub fn load(path: &Path) -> GenResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> GenResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl MeshAssetProvider for AssetLibrary {
    fn load(&self, name: &str) -> GenResult<MeshFragment> {
        self.fragments
            .get(name)
            .cloned()
            .ok_or_else(|| GenError::MissingAsset {
                name: name.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Output buffers
// ---------------------------------------------------------------------------

pub type Rgba = [f32; 4];

/// `[r, g, b]` in 0..=255 to an opaque RGBA color.
pub fn rgb8(r: u8, g: u8, b: u8) -> Rgba {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Flat vertex/index arrays for one drawable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// `[x, y, z, 1.0, ...]`.
    pub positions: Vec<f32>,
    /// `[nx, ny, nz, 0.0, ...]`.
    pub normals: Vec<f32>,
    /// `[r, g, b, a, ...]`, each in [0, 1].
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 4
    }

    /// Number of indices, which is what the renderer draws.
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        let p = &self.positions[vertex * 4..vertex * 4 + 3];
        Vec3::new(p[0], p[1], p[2])
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, color: Rgba) {
        self.positions
            .extend_from_slice(&[position.x, position.y, position.z, 1.0]);
        self.normals
            .extend_from_slice(&[normal.x, normal.y, normal.z, 0.0]);
        self.colors.extend_from_slice(&color);
    }

    /// Append `fragment`, mapping each position and normal (with its vertex
    /// index) through the given functions. Colors are uniform.
    pub fn push_fragment(
        &mut self,
        fragment: &MeshFragment,
        color: Rgba,
        mut position: impl FnMut(usize, Vec3) -> Vec3,
        mut normal: impl FnMut(usize, Vec3) -> Vec3,
    ) {
        let base = self.vertex_count() as u32;
        for (i, (p, n)) in fragment
            .positions
            .iter()
            .zip(fragment.normals.iter())
            .enumerate()
        {
            self.push_vertex(
                position(i, Vec3::from_array(*p)),
                normal(i, Vec3::from_array(*n)),
                color,
            );
        }
        self.indices
            .extend(fragment.indices.iter().map(|&i| i + base));
    }

    /// Append `fragment`, letting `shade` pick each vertex's final position,
    /// normal and color.
    pub fn push_shaded(
        &mut self,
        fragment: &MeshFragment,
        mut shade: impl FnMut(Vec3, Vec3) -> (Vec3, Vec3, Rgba),
    ) {
        let base = self.vertex_count() as u32;
        for (p, n) in fragment.positions.iter().zip(fragment.normals.iter()) {
            let (position, normal, color) = shade(Vec3::from_array(*p), Vec3::from_array(*n));
            self.push_vertex(position, normal, color);
        }
        self.indices
            .extend(fragment.indices.iter().map(|&i| i + base));
    }

    /// Append another buffer set, mapping its positions. Normals and colors
    /// are copied as they are.
    pub fn push_instance(&mut self, other: &MeshBuffers, mut position: impl FnMut(Vec3) -> Vec3) {
        let base = self.vertex_count() as u32;
        for v in 0..other.vertex_count() {
            let p = position(other.position(v));
            self.positions.extend_from_slice(&[p.x, p.y, p.z, 1.0]);
        }
        self.normals.extend_from_slice(&other.normals);
        self.colors.extend_from_slice(&other.colors);
        self.indices.extend(other.indices.iter().map(|&i| i + base));
    }

    pub fn extend_from(&mut self, other: &MeshBuffers) {
        self.push_instance(other, |p| p);
    }
}
