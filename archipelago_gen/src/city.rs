// The island city: site layout, bridge planning, grammar, interpretation.
//
// Construction (`CityGenerator::new`) is the planning phase:
//
// 1. Classify a square lattice of sites as land or water by sampling the
//    noise field (`x` outer, `z` inner, land iff sample > water threshold).
// 2. Build the complete graph over the land sites and take Prim's MST.
//    Tree edges longer than `bridge_min_length` become bridges, kept in
//    the MST's vertex order.
// 3. Build the rule table. `W`, `L` and `B` are stateful pools: `W` yields
//    the seed string once, `L` yields `L[UG]` once per land site, and `B`
//    yields one `(---)` bridge string per bridge. Bridge strings are
//    registered in reverse so the pool hands them out in bridge order.
//
// Interpretation walks the expanded string with a turtle stack. The `[ ]`
// pair around the island run and the `[ ]` pair around the bridge run both
// start from the root, so a turtle's `depth` is the index of the next island
// (`L`) or bridge (`(`) to draw. Missing indices, a pop of the root frame
// and frames left open at the end are errors, not panics.
//
// Symbol table:
//   W  water plane, untransformed
//   L  island at the next land site; the turtle moves onto its hilltop
//   [  push                       ]  pop
//   (  push, face along the bridge, approach stair
//   -  bridge plank               )  departure stair, pop, next bridge
//   h  lot: foundation, tree or nothing, decided by a noise score
//   s  story (ground floor first), while the lot keeps building
//   r  roof, on some built lots
//   <  shift the frame outward and down the hill
//   +  turn 2pi/5 about Y          *  turn 2pi/9 about Y
//
// Lot score: `sqrt(noise(lot)) * y^2 * decision_scale`, where `lot` is the
// frame origin plus turtle position on the ground plane and `y` the turtle
// height. Below `house_cutoff` builds a house; otherwise at or above
// `tree_cutoff` plants a tree; anything else (including a negative sample,
// whose root is NaN) leaves the lot empty. The house check always runs
// first.
//
// See also: `graph.rs` (MST), `grammar.rs` (pools), `plant.rs` (trees),
// `config.rs` (`CityTuning`).
//
// **Critical constraint: determinism.** The only randomness is the tree
// generator, driven by the `GenRng` passed to `interpret`.

use crate::config::{GenConfig, StoryStyle};
use crate::error::{GenError, GenResult};
use crate::grammar::{Grammar, RuleTable};
use crate::graph::{EdgeWeightedGraph, PrimMst, Site, SiteKind, WeightedEdge};
use crate::math::Vec3;
use crate::mesh::{MeshAssetProvider, MeshBuffers, MeshFragment, Rgba};
use crate::noise::NoiseField;
use crate::plant::{PlantAssets, grow_plant};
use crate::shapes;
use crate::turtle::{Turtle, TurtleStack};
use archipelago_prng::GenRng;
use std::f32::consts::PI;

pub const CITY_AXIOM: &str = "W";

/// Floor on the vertical island scale.
const MIN_ISLAND_HEIGHT: f32 = 1e-3;

/// Houses around each hilltop, outer ring (`U`, five-fold turns).
const OUTER_RING: &str = "[[<h=]+[<h=]+[<h=]+[<h=]+[<h=]+[<h=]+[<h=]+[<h=]+[<h=]]";
/// Inner ring (`G`, nine-fold turns, shifted out twice).
const INNER_RING: &str = "[[<<h=]*[<<h=]*[<<h=]*[<<h=]*[<<h=]*[<<h=]*[<<h=]*[<<h=]*[<<h=]]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CityOp {
    Water,
    Island,
    Push,
    Pop,
    BridgeStart,
    Span,
    BridgeEnd,
    Lot,
    Story,
    Roof,
    ShiftOut,
    TurnWide,
    TurnNarrow,
}

pub const CITY_SYMBOLS: &[(char, CityOp)] = &[
    ('W', CityOp::Water),
    ('L', CityOp::Island),
    ('[', CityOp::Push),
    (']', CityOp::Pop),
    ('(', CityOp::BridgeStart),
    ('-', CityOp::Span),
    (')', CityOp::BridgeEnd),
    ('h', CityOp::Lot),
    ('s', CityOp::Story),
    ('r', CityOp::Roof),
    ('<', CityOp::ShiftOut),
    ('+', CityOp::TurnWide),
    ('*', CityOp::TurnNarrow),
];

impl CityOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        CITY_SYMBOLS
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|&(_, op)| op)
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Shapes of one house style; each level may have several colored parts.
#[derive(Clone, Debug)]
pub struct HouseParts {
    pub ground: Vec<MeshFragment>,
    pub upper: Vec<MeshFragment>,
    pub roof: Vec<MeshFragment>,
}

/// Every shape the city draws, resolved before interpretation starts.
#[derive(Clone, Debug)]
pub struct CityAssets {
    pub water: MeshFragment,
    pub island: MeshFragment,
    pub foundation: MeshFragment,
    pub square: HouseParts,
    pub round: HouseParts,
    pub stair_up: MeshFragment,
    pub plank: MeshFragment,
    pub stair_down: MeshFragment,
    pub plant: PlantAssets,
}

impl CityAssets {
    pub fn resolve(provider: &dyn MeshAssetProvider) -> GenResult<Self> {
        let load = |name: &str| provider.load_checked(name);
        let load_all = |names: &[&str]| names.iter().map(|&name| load(name)).collect::<GenResult<Vec<_>>>();
        Ok(Self {
            water: load(shapes::WATER)?,
            island: load(shapes::ISLAND)?,
            foundation: load(shapes::HOUSE)?,
            square: HouseParts {
                ground: load_all(&[shapes::SQUARE_FLOOR_GROUND])?,
                upper: load_all(&[shapes::SQUARE_FLOOR_UPPER])?,
                roof: load_all(&[shapes::SQUARE_ROOF])?,
            },
            round: HouseParts {
                ground: load_all(&[
                    shapes::ROUND_FLOOR_GROUND_WALL,
                    shapes::ROUND_FLOOR_GROUND_TRIM,
                ])?,
                upper: load_all(&[
                    shapes::ROUND_FLOOR_UPPER_WALL,
                    shapes::ROUND_FLOOR_UPPER_TRIM,
                ])?,
                roof: load_all(&[shapes::ROUND_ROOF_CONE, shapes::ROUND_ROOF_SPIRE])?,
            },
            stair_up: load(shapes::STAIR_UP)?,
            plank: load(shapes::BRIDGE)?,
            stair_down: load(shapes::STAIR_DOWN)?,
            plant: PlantAssets::resolve(provider)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Sample and classify the site lattice.
pub fn classify_sites(config: &GenConfig, noise: &dyn NoiseField) -> Vec<Site> {
    let e = config.city.grid_extent;
    let scale = config.city.site_noise_scale;
    let mut sites = Vec::new();
    for x in -e..=e {
        for z in -e..=e {
            let elevation = noise.sample([x as f64 * scale, 0.0, z as f64 * scale]);
            let kind = if elevation > config.water_threshold {
                SiteKind::Land
            } else {
                SiteKind::Water
            };
            sites.push(Site {
                x,
                z,
                kind,
                elevation,
            });
        }
    }
    sites
}

/// `(`, one `-` per `step` of length past `min_length`, then `)`.
pub fn bridge_string(weight: f64, min_length: f64, step: f32) -> String {
    let planks = ((weight - min_length) / f64::from(step)).ceil().max(0.0) as usize;
    let mut s = String::with_capacity(planks + 2);
    s.push('(');
    s.extend(std::iter::repeat_n('-', planks));
    s.push(')');
    s
}

/// `W[` + one `L` per island + `][` + one `B` per bridge + `]`.
pub fn seed_string(islands: usize, bridges: usize) -> String {
    format!("W[{}][{}]", "L".repeat(islands), "B".repeat(bridges))
}

fn city_rules(seed: &str, islands: usize, bridge_strings: &[String]) -> RuleTable {
    let mut rules = RuleTable::new();
    rules.set_pool('W', vec!["W".into(), seed.into()]);
    let mut land = vec!["L".to_string()];
    land.extend(std::iter::repeat_n("L[UG]".to_string(), islands));
    rules.set_pool('L', land);
    // Last registered is handed out first.
    rules.set_pool('B', bridge_strings.iter().rev().cloned().collect());
    rules.set_fixed('U', OUTER_RING);
    rules.set_fixed('G', INNER_RING);
    rules.set_fixed('=', "r");
    rules.set_fixed('h', "hs");
    rules.set_identity("sr<+*[]()-");
    rules
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct CityGenerator<'a> {
    config: &'a GenConfig,
    assets: &'a CityAssets,
    noise: &'a dyn NoiseField,
    sites: Vec<Site>,
    land: Vec<Site>,
    bridges: Vec<WeightedEdge>,
    seed: String,
    grammar: Grammar,
}

impl<'a> CityGenerator<'a> {
    pub fn new(config: &'a GenConfig, assets: &'a CityAssets, noise: &'a dyn NoiseField) -> Self {
        let c = &config.city;
        let sites = classify_sites(config, noise);
        let land: Vec<Site> = sites.iter().filter(|s| s.is_land()).copied().collect();

        let points: Vec<[f64; 2]> = land.iter().map(Site::planar).collect();
        let mst = PrimMst::new(&EdgeWeightedGraph::complete(&points));
        let bridges: Vec<WeightedEdge> = mst
            .edges()
            .into_iter()
            .filter(|e| e.weight() > c.bridge_min_length)
            .collect();

        let seed = seed_string(land.len(), bridges.len());
        let bridge_strings: Vec<String> = bridges
            .iter()
            .map(|e| bridge_string(e.weight(), c.bridge_min_length, c.bridge_step))
            .collect();
        let grammar = Grammar::new(CITY_AXIOM, city_rules(&seed, land.len(), &bridge_strings));

        tracing::debug!(
            sites = sites.len(),
            land = land.len(),
            bridges = bridges.len(),
            mst_weight = mst.weight(),
            "city planned"
        );

        Self {
            config,
            assets,
            noise,
            sites,
            land,
            bridges,
            seed,
            grammar,
        }
    }

    /// Every lattice site, land and water, in sampling order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Land sites; graph vertex `i` is `land_sites()[i]`.
    pub fn land_sites(&self) -> &[Site] {
        &self.land
    }

    pub fn bridges(&self) -> &[WeightedEdge] {
        &self.bridges
    }

    pub fn seed_string(&self) -> &str {
        &self.seed
    }

    pub fn symbols(&self) -> &str {
        self.grammar.symbols()
    }

    pub fn expand(&mut self, passes: u32) {
        self.grammar.expand(passes);
    }

    /// Draw the expanded program. A program that leaves frames open is
    /// malformed (`UnclosedFrames`).
    pub fn interpret(&self, rng: &mut GenRng) -> GenResult<MeshBuffers> {
        let (out, depth) = self.walk(rng)?;
        if depth != 1 {
            return Err(GenError::UnclosedFrames { open: depth - 1 });
        }
        tracing::debug!(
            symbols = self.grammar.len(),
            vertices = out.vertex_count(),
            indices = out.count(),
            "city interpreted"
        );
        Ok(out)
    }

    /// Run every symbol; returns the buffers and the final stack depth.
    fn walk(&self, rng: &mut GenRng) -> GenResult<(MeshBuffers, usize)> {
        let c = &self.config.city;
        let a = self.assets;
        let mut out = MeshBuffers::new();
        let mut stack = TurtleStack::new(Turtle::new(Vec3::ZERO, 0));

        for (i, symbol) in self.grammar.symbols().chars().enumerate() {
            let Some(op) = CityOp::from_symbol(symbol) else {
                continue;
            };
            match op {
                CityOp::Water => out.push_fragment(&a.water, c.water_color, |_, p| p, |_, n| n),
                CityOp::Island => self.draw_island(&mut out, stack.top_mut())?,
                CityOp::Push => stack.push(),
                CityOp::Pop => {
                    stack.pop(i)?;
                }
                CityOp::BridgeStart => {
                    stack.push();
                    let top = stack.top_mut();
                    let (start, line) = self.bridge_line(top.depth)?;
                    top.pos = start + line * c.stair_offset;
                    top.dir = top.dir.rotate_y(line.x.atan2(line.z));
                    self.draw_bridge_piece(&mut out, &a.stair_up, top);
                    top.pos += line * c.bridge_step;
                }
                CityOp::Span => {
                    let top = stack.top_mut();
                    let (_, line) = self.bridge_line(top.depth)?;
                    self.draw_bridge_piece(&mut out, &a.plank, top);
                    top.pos += line * c.bridge_step;
                }
                CityOp::BridgeEnd => {
                    self.draw_bridge_piece(&mut out, &a.stair_down, stack.top());
                    stack.pop(i)?;
                    stack.top_mut().depth += 1;
                }
                CityOp::Lot => self.decide_lot(&mut out, stack.top_mut(), rng)?,
                CityOp::Story => self.draw_story(&mut out, stack.top_mut()),
                CityOp::Roof => self.draw_roof(&mut out, stack.top_mut()),
                CityOp::ShiftOut => {
                    let top = stack.top_mut();
                    top.dir = top
                        .dir
                        .translate(Vec3::new(0.0, -top.pos.y * c.shift_drop, c.shift_out));
                }
                CityOp::TurnWide => {
                    let top = stack.top_mut();
                    top.dir = top.dir.rotate_y(2.0 * PI / 5.0);
                }
                CityOp::TurnNarrow => {
                    let top = stack.top_mut();
                    top.dir = top.dir.rotate_y(2.0 * PI / 9.0);
                }
            }
        }

        Ok((out, stack.depth()))
    }

    // -- islands and bridges ------------------------------------------------

    fn draw_island(&self, out: &mut MeshBuffers, t: &mut Turtle) -> GenResult<()> {
        let c = &self.config.city;
        let site = self.land.get(t.depth).ok_or(GenError::MissingSite {
            depth: t.depth,
            available: self.land.len(),
        })?;
        // Normals divide by the height; a custom field can sample below the
        // range `validate` assumes.
        let height = (c.island_height_base + c.island_height_amplitude * site.elevation as f32)
            .max(MIN_ISLAND_HEIGHT);
        let (x, z) = (site.x as f32, site.z as f32);
        let clamp = |v: f32| v.clamp(-c.bounds, c.bounds);

        out.push_shaded(&self.assets.island, |p, n| {
            let position = Vec3::new(clamp(p.x + x), p.y * height, clamp(p.z + z));
            let normal = Vec3::new(n.x, n.y / height, n.z).normalize();
            let color = if p.y > c.sand_line {
                c.grass_color
            } else {
                c.sand_color
            };
            (position, normal, color)
        });

        t.pos = Vec3::new(x, height * c.island_lift, z);
        t.depth += 1;
        Ok(())
    }

    /// Start of bridge `depth` on the ground plane and its unit direction.
    fn bridge_line(&self, depth: usize) -> GenResult<(Vec3, Vec3)> {
        let edge = self.bridges.get(depth).ok_or(GenError::MissingBridge {
            depth,
            available: self.bridges.len(),
        })?;
        let from = edge.either();
        let start = self.ground_point(from);
        let finish = self.ground_point(edge.other(from));
        Ok((start, (finish - start).flatten().normalize()))
    }

    fn ground_point(&self, land_index: usize) -> Vec3 {
        let site = &self.land[land_index];
        Vec3::new(site.x as f32, 0.0, site.z as f32)
    }

    /// Bridge pieces sit at water level: the turtle moves them in x and z
    /// only.
    fn draw_bridge_piece(&self, out: &mut MeshBuffers, piece: &MeshFragment, t: &Turtle) {
        let c = &self.config.city;
        let s = c.bridge_scale;
        out.push_fragment(
            piece,
            c.bridge_color,
            |_, p| {
                let q = t.dir.transform_point(Vec3::new(p.x * s, p.y * s, -p.z * s));
                Vec3::new(q.x + t.pos.x, q.y, q.z + t.pos.z)
            },
            |_, n| t.dir.transform_dir(n),
        );
    }

    // -- lots and houses ----------------------------------------------------

    /// Ground-plane point a lot's decisions are sampled at.
    fn lot_point(t: &Turtle) -> Vec3 {
        let origin = t.dir.translation();
        Vec3::new(origin.x + t.pos.x, 0.0, origin.z + t.pos.z)
    }

    fn lot_score(&self, at: Vec3, y: f32, height: f32) -> f64 {
        let sample = self.noise.sample([f64::from(at.x), f64::from(y), f64::from(at.z)]);
        sample.sqrt() * f64::from(height).powi(2) * self.config.city.decision_scale
    }

    fn in_bounds(&self, p: Vec3) -> bool {
        let b = self.config.city.bounds;
        p.x > -b && p.x < b && p.z > -b && p.z < b
    }

    fn style(&self, tall: bool) -> (&HouseParts, &StoryStyle) {
        if tall {
            (&self.assets.round, &self.config.city.round)
        } else {
            (&self.assets.square, &self.config.city.square)
        }
    }

    fn decide_lot(&self, out: &mut MeshBuffers, t: &mut Turtle, rng: &mut GenRng) -> GenResult<()> {
        let c = &self.config.city;
        let lot = Self::lot_point(t);
        let inside = self.in_bounds(lot);
        let score = self.lot_score(lot, 0.0, t.pos.y);

        if inside && score < c.house_cutoff {
            t.build = true;
            if score.floor() % 3.0 == 0.0 {
                t.tall = true;
            }
            t.width = c.width_base - score.max(0.0) as f32 * c.width_falloff;
            let (width, rise) = (t.width, c.foundation_height * t.pos.y);
            let frame = *t;
            out.push_fragment(
                &self.assets.foundation,
                c.foundation_color,
                |_, p| {
                    frame.place(Vec3::new(
                        p.x * c.foundation_scale * width,
                        p.y * rise,
                        -p.z * c.foundation_scale,
                    ))
                },
                |_, n| frame.dir.transform_dir(n),
            );
            t.pos.y += rise;
        } else if inside && score >= c.tree_cutoff && self.config.include_trees {
            t.keep_building = false;
            let tree = grow_plant(&self.config.plant, &self.assets.plant, Vec3::ZERO, rng)?;
            let anchor = t.dir.translation() + t.pos;
            out.push_instance(&tree, |p| p * c.tree_scale + anchor);
        } else {
            t.keep_building = false;
        }
        Ok(())
    }

    fn draw_story(&self, out: &mut MeshBuffers, t: &mut Turtle) {
        let lot = Self::lot_point(t);
        if !(self.in_bounds(lot) && t.keep_building) {
            return;
        }
        let (parts, style) = self.style(t.tall);
        let level = if t.stories == 0 {
            &parts.ground
        } else {
            &parts.upper
        };
        draw_house_parts(out, level, style, t);

        t.dir = t.dir.rotate_y(PI);
        t.pos.y += style.story_height * style.scale;
        t.stories += 1;
        if self.lot_score(lot, t.pos.y, t.pos.y) < self.config.city.house_cutoff {
            t.keep_building = false;
        }
    }

    fn draw_roof(&self, out: &mut MeshBuffers, t: &mut Turtle) {
        let lot = Self::lot_point(t);
        let score = self.lot_score(lot, 0.0, t.pos.y);
        if self.in_bounds(lot) && t.build && score.floor() % 2.0 == 0.0 {
            let (parts, style) = self.style(t.tall);
            draw_house_parts(out, &parts.roof, style, t);
            t.keep_building = false;
        }
    }
}

fn draw_house_parts(out: &mut MeshBuffers, parts: &[MeshFragment], style: &StoryStyle, t: &Turtle) {
    const UNSTYLED: Rgba = [1.0, 1.0, 1.0, 1.0];
    let s = style.scale;
    for (i, part) in parts.iter().enumerate() {
        let color = style
            .colors
            .get(i)
            .or(style.colors.last())
            .copied()
            .unwrap_or(UNSTYLED);
        out.push_fragment(
            part,
            color,
            |_, p| t.place(Vec3::new(p.x * s * t.width, p.y * s, -p.z * s)),
            |_, n| t.dir.transform_dir(n),
        );
    }
}
