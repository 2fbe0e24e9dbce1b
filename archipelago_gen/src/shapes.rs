// Procedural stand-ins for every named shape the interpreters draw.
//
// `BuiltinShapes` is the default `MeshAssetProvider`. Each shape is built
// from a handful of primitives (boxes, prisms, a dome) in the local frame
// the interpreter expects:
// - islands are a unit-height dome of radius 0.7 sitting on y = 0, with a
//   flat beach ring at y = 0 (the city colors anything at y <= 0.01 as sand);
// - house pieces span x, z in [-1, 1] and start at y = 0;
// - stairs and bridge planks are modelled at 25x scale along -z (the city
//   scales them by 0.04 and flips z);
// - trunk, leaf, coral and kelp pieces grow along +y.
//
// Shapes are rebuilt on every `load`; callers resolve them once per run.

use crate::error::{GenError, GenResult};
use crate::math::Vec3;
use crate::mesh::{MeshAssetProvider, MeshFragment};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

pub const WATER: &str = "water";
pub const ISLAND: &str = "island";
pub const HOUSE: &str = "house";
pub const SQUARE_FLOOR_GROUND: &str = "sFloor1";
pub const SQUARE_FLOOR_UPPER: &str = "sFloor2";
pub const SQUARE_ROOF: &str = "sRoof";
pub const ROUND_FLOOR_GROUND_WALL: &str = "rFloor1a";
pub const ROUND_FLOOR_GROUND_TRIM: &str = "rFloor1b";
pub const ROUND_FLOOR_UPPER_WALL: &str = "rFloor2a";
pub const ROUND_FLOOR_UPPER_TRIM: &str = "rFloor2b";
pub const ROUND_ROOF_CONE: &str = "rRoofa";
pub const ROUND_ROOF_SPIRE: &str = "rRoofb";
pub const STAIR_UP: &str = "stairUp";
pub const BRIDGE: &str = "bridge";
pub const STAIR_DOWN: &str = "stairDown";
pub const TRUNK: &str = "trunk";
pub const LEAF: &str = "leaf";
pub const KELP: &str = "kelp";
pub const CORAL: &str = "coral";

#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinShapes;

impl BuiltinShapes {
    pub const NAMES: [&'static str; 19] = [
        WATER,
        ISLAND,
        HOUSE,
        SQUARE_FLOOR_GROUND,
        SQUARE_FLOOR_UPPER,
        SQUARE_ROOF,
        ROUND_FLOOR_GROUND_WALL,
        ROUND_FLOOR_GROUND_TRIM,
        ROUND_FLOOR_UPPER_WALL,
        ROUND_FLOOR_UPPER_TRIM,
        ROUND_ROOF_CONE,
        ROUND_ROOF_SPIRE,
        STAIR_UP,
        BRIDGE,
        STAIR_DOWN,
        TRUNK,
        LEAF,
        KELP,
        CORAL,
    ];
}

impl MeshAssetProvider for BuiltinShapes {
    fn load(&self, name: &str) -> GenResult<MeshFragment> {
        let mut b = ShapeBuilder::default();
        match name {
            WATER => {
                let e = 8.0;
                b.quad(
                    [v(-e, 0.0, -e), v(e, 0.0, -e), v(e, 0.0, e), v(-e, 0.0, e)],
                    Vec3::Y,
                );
            }
            ISLAND => b.island(0.7, 1.0, 6, 12),
            HOUSE => b.cuboid(v(-1.0, 0.0, -1.0), v(1.0, 1.0, 1.0)),
            SQUARE_FLOOR_GROUND => b.cuboid(v(-1.0, 0.0, -1.0), v(1.0, 0.75, 1.0)),
            SQUARE_FLOOR_UPPER => {
                b.cuboid(v(-0.9, 0.0, -0.9), v(0.9, 0.75, 0.9));
                b.cuboid(v(-1.05, 0.0, -1.05), v(1.05, 0.08, 1.05));
            }
            SQUARE_ROOF => b.prism(4, FRAC_PI_4, 1.6, 0.0, 0.0, 0.9, false),
            ROUND_FLOOR_GROUND_WALL => b.prism(10, 0.0, 1.0, 1.0, 0.0, 0.8, false),
            ROUND_FLOOR_GROUND_TRIM => b.prism(10, 0.0, 1.02, 1.02, 0.35, 0.55, false),
            ROUND_FLOOR_UPPER_WALL => b.prism(10, 0.0, 0.95, 0.95, 0.0, 0.8, false),
            ROUND_FLOOR_UPPER_TRIM => b.prism(10, 0.0, 1.05, 1.05, 0.0, 0.08, true),
            ROUND_ROOF_CONE => b.prism(10, 0.0, 1.15, 0.0, 0.0, 1.0, false),
            ROUND_ROOF_SPIRE => b.prism(6, 0.0, 0.08, 0.0, 1.0, 1.4, false),
            STAIR_UP => b.stairs(true),
            STAIR_DOWN => b.stairs(false),
            BRIDGE => {
                b.cuboid(v(-4.0, 4.0, -2.5), v(4.0, 5.0, 0.0));
                b.cuboid(v(-4.0, 5.0, -2.5), v(-3.6, 7.0, 0.0));
                b.cuboid(v(3.6, 5.0, -2.5), v(4.0, 7.0, 0.0));
            }
            TRUNK => b.prism(6, 0.0, 1.0, 0.8, 0.0, 3.5, true),
            LEAF => {
                let outline = [v(0.0, 0.0, 0.0), v(1.0, 1.2, 0.0), v(0.0, 2.5, 0.0), v(-1.0, 1.2, 0.0)];
                b.quad(outline, Vec3::Z);
                b.quad(outline, -Vec3::Z);
            }
            KELP => {
                // Fixed layout: vertices 0 and 1 are the bottom edge, which
                // the kelp interpreter attaches to the previous segment.
                b.positions = vec![
                    [0.0, 0.0, -0.5],
                    [0.0, 0.0, 0.5],
                    [0.0, 1.0, 0.5],
                    [0.0, 1.0, -0.5],
                ];
                b.normals = vec![[1.0, 0.0, 0.0]; 4];
                b.indices = vec![0, 1, 2, 0, 2, 3];
            }
            CORAL => b.prism(5, 0.0, 1.0, 0.6, 0.0, 2.0, true),
            _ => {
                return Err(GenError::MissingAsset {
                    name: name.to_string(),
                });
            }
        }
        Ok(b.finish())
    }
}

fn v(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ShapeBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl ShapeBuilder {
    fn finish(self) -> MeshFragment {
        MeshFragment {
            positions: self.positions,
            normals: self.normals,
            indices: self.indices,
        }
    }

    fn vertex(&mut self, p: Vec3, n: Vec3) -> u32 {
        self.positions.push(p.to_array());
        self.normals.push(n.to_array());
        (self.positions.len() - 1) as u32
    }

    /// Triangle wound counter-clockwise around the average of its vertex
    /// normals.
    fn tri(&mut self, a: u32, b: u32, c: u32) {
        let p = |i: u32| Vec3::from_array(self.positions[i as usize]);
        let n = |i: u32| Vec3::from_array(self.normals[i as usize]);
        let face = (p(b) - p(a)).cross(p(c) - p(a));
        if face.dot(n(a) + n(b) + n(c)) < 0.0 {
            self.indices.extend_from_slice(&[a, c, b]);
        } else {
            self.indices.extend_from_slice(&[a, b, c]);
        }
    }

    fn quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let ids = corners.map(|c| self.vertex(c, normal));
        self.tri(ids[0], ids[1], ids[2]);
        self.tri(ids[0], ids[2], ids[3]);
    }

    fn cuboid(&mut self, lo: Vec3, hi: Vec3) {
        let (x0, y0, z0) = (lo.x, lo.y, lo.z);
        let (x1, y1, z1) = (hi.x, hi.y, hi.z);
        self.quad([v(x1, y0, z0), v(x1, y1, z0), v(x1, y1, z1), v(x1, y0, z1)], Vec3::X);
        self.quad([v(x0, y0, z0), v(x0, y0, z1), v(x0, y1, z1), v(x0, y1, z0)], -Vec3::X);
        self.quad([v(x0, y1, z0), v(x0, y1, z1), v(x1, y1, z1), v(x1, y1, z0)], Vec3::Y);
        self.quad([v(x0, y0, z0), v(x1, y0, z0), v(x1, y0, z1), v(x0, y0, z1)], -Vec3::Y);
        self.quad([v(x0, y0, z1), v(x1, y0, z1), v(x1, y1, z1), v(x0, y1, z1)], Vec3::Z);
        self.quad([v(x0, y0, z0), v(x0, y1, z0), v(x1, y1, z0), v(x1, y0, z0)], -Vec3::Z);
    }

    /// Flat-shaded prism (or frustum, or cone when `r1 == 0`) around +y.
    #[allow(clippy::too_many_arguments)]
    fn prism(&mut self, sides: u32, phase: f32, r0: f32, r1: f32, y0: f32, y1: f32, cap: bool) {
        let ring = |r: f32, y: f32, k: u32| {
            let a = phase + TAU * k as f32 / sides as f32;
            v(r * a.cos(), y, r * a.sin())
        };
        for k in 0..sides {
            let (b0, b1) = (ring(r0, y0, k), ring(r0, y0, k + 1));
            let (t0, t1) = (ring(r1, y1, k), ring(r1, y1, k + 1));
            let mid = (b0 + b1) * 0.5;
            let outward = (b1 - b0).cross(t0 - b0).normalize();
            let normal = if outward.dot(mid.flatten()) < 0.0 { -outward } else { outward };
            self.quad([b0, b1, t1, t0], normal);
        }
        if cap && r1 > 0.0 {
            let center = self.vertex(v(0.0, y1, 0.0), Vec3::Y);
            for k in 0..sides {
                let a = self.vertex(ring(r1, y1, k), Vec3::Y);
                let b = self.vertex(ring(r1, y1, k + 1), Vec3::Y);
                self.tri(center, a, b);
            }
        }
    }

    /// Smooth dome of the given radius and height on y = 0, ringed by a flat
    /// beach just above the water line.
    fn island(&mut self, radius: f32, height: f32, rings: u32, segments: u32) {
        let stride = segments + 1;
        let base = self.positions.len() as u32;
        for r in 0..=rings {
            let phi = FRAC_PI_2 * r as f32 / rings as f32;
            let (ring_r, y) = (radius * phi.sin(), height * phi.cos());
            for s in 0..=segments {
                let theta = TAU * s as f32 / segments as f32;
                let (x, z) = (ring_r * theta.cos(), ring_r * theta.sin());
                let n = v(x / (radius * radius), y / (height * height), z / (radius * radius));
                let n = if n == Vec3::ZERO { Vec3::Y } else { n.normalize() };
                self.vertex(v(x, y, z), n);
            }
        }
        for r in 0..rings {
            for s in 0..segments {
                let a = base + r * stride + s;
                let b = a + stride;
                self.tri(a, b, b + 1);
                self.tri(a, b + 1, a + 1);
            }
        }

        let beach = radius * 1.2;
        let edge = base + rings * stride;
        let outer = self.positions.len() as u32;
        for s in 0..=segments {
            let theta = TAU * s as f32 / segments as f32;
            self.vertex(v(beach * theta.cos(), 0.0, beach * theta.sin()), Vec3::Y);
        }
        for s in 0..segments {
            self.tri(edge + s, outer + s, outer + s + 1);
            self.tri(edge + s, outer + s + 1, edge + s + 1);
        }
    }

    /// Five steps along -z, climbing (or descending) between y = 0 and 5.
    fn stairs(&mut self, up: bool) {
        let steps = 5;
        for k in 0..steps {
            let rise = if up { (k + 1) as f32 } else { (steps - k) as f32 };
            let z0 = -(k as f32 + 1.0) * 0.5;
            self.cuboid(v(-4.0, 0.0, z0), v(4.0, rise, z0 + 0.5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_shape_loads_and_validates() {
        for name in BuiltinShapes::NAMES {
            let frag = BuiltinShapes.load_checked(name).unwrap();
            assert!(frag.vertex_count() > 0, "{name} is empty");
            assert!(!frag.indices.is_empty(), "{name} has no triangles");
        }
    }

    #[test]
    fn unknown_shape_is_missing() {
        assert!(matches!(
            BuiltinShapes.load("teapot"),
            Err(GenError::MissingAsset { .. })
        ));
    }

    #[test]
    fn kelp_quad_layout_is_fixed() {
        let kelp = BuiltinShapes.load(KELP).unwrap();
        assert_eq!(kelp.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(kelp.positions[0][1], 0.0);
        assert_eq!(kelp.positions[1][1], 0.0);
        assert_eq!(kelp.positions[2][1], 1.0);
        assert_eq!(kelp.positions[3][1], 1.0);
    }

    #[test]
    fn island_has_sand_and_grass_vertices() {
        let island = BuiltinShapes.load(ISLAND).unwrap();
        assert!(island.positions.iter().any(|p| p[1] <= 0.01));
        assert!(island.positions.iter().any(|p| p[1] > 0.01));
        let top = island
            .positions
            .iter()
            .map(|p| p[1])
            .fold(f32::MIN, f32::max);
        assert!((top - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cuboid_faces_wind_outward() {
        let house = BuiltinShapes.load(HOUSE).unwrap();
        for t in house.indices.chunks(3) {
            let p = |i: u32| Vec3::from_array(house.positions[i as usize]);
            let n = Vec3::from_array(house.normals[t[0] as usize]);
            let face = (p(t[1]) - p(t[0])).cross(p(t[2]) - p(t[0]));
            assert!(face.dot(n) > 0.0);
        }
    }
}
