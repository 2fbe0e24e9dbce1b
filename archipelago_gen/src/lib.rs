// archipelago_gen — grammar-driven island city generator.
//
// Turns a seed and a `GenConfig` into flat mesh buffers: a city of islands,
// bridges, houses and trees, plus a sea floor of kelp and coral. Nothing
// here renders; the output is position/normal/color/index arrays for
// whatever draws them.
//
// Module overview:
// - `scene.rs`:   `generate_scene` — the full pipeline, city + reef.
// - `city.rs`:    Site layout, MST bridges, city grammar and interpreter.
// - `plant.rs`:   Branching tree grammar (instanced by the city).
// - `kelp.rs`:    Swaying ribbon grammar.
// - `coral.rs`:   Fanned coral cluster grammar.
// - `reef.rs`:    Kelp field and coral placement, grown in parallel.
// - `grammar.rs`: Rule tables (fixed and stateful pool rules) + expansion passes.
// - `turtle.rs`:  Turtle state and the bracket stack.
// - `graph.rs`:   Sites, edge-weighted graph, Prim MST, Dijkstra.
// - `pq.rs`:      Indexed binary min-heap.
// - `noise.rs`:   `NoiseField` trait + deterministic 3D simplex noise.
// - `mesh.rs`:    MeshFragment, MeshBuffers, the asset provider seam.
// - `shapes.rs`:  BuiltinShapes — procedural stand-ins for every named shape.
// - `math.rs`:    Vec3 / column-major Mat4.
// - `config.rs`:  GenConfig and its sections — every tunable constant.
// - `error.rs`:   GenError.
// - `prng`:       Re-exported from `archipelago_prng`.
//
// **Critical constraint: determinism.** Same config + same seed + same noise
// field = byte-identical buffers. All jitter comes from `GenRng`; rule
// tables are only ever looked up by key, never iterated.

pub mod city;
pub mod config;
pub mod coral;
pub mod error;
pub mod grammar;
pub mod graph;
pub mod kelp;
pub mod math;
pub mod mesh;
pub mod noise;
pub mod plant;
pub mod pq;
pub use archipelago_prng as prng;
pub mod reef;
pub mod scene;
pub mod shapes;
pub mod turtle;
