// Branching plant: the tree the city drops onto lots that score high enough.
//
// Grammar: axiom `X`, two productive rules (`X` seeds a trunk with a few
// turns, `F` sprouts a bracketed side branch with leaves), everything else
// maps to itself. Each pass rewrites only the first `PlantProfile::window`
// symbols, which keeps trees small and lopsided.
//
// Interpretation keeps one piece of state outside the turtle stack: the
// current turn angle. `M` re-rolls it (15-35 degrees scaled by the profile's
// base angle, random sign) and every later `+ - & ^` uses it, across
// bracket boundaries.
//
// Symbol table:
//   F  trunk segment, width `trunk_width * trunk_taper^depth`, then advance
//      along the turtle's up axis and go one level deeper
//   L  leaf, size `leaf_width * leaf_taper^depth`
//   M  re-roll the turn angle
//   R  roll roughly a quarter turn about up, with jitter
//   +  yaw by +turn        -  yaw by -turn
//   &  pitch/roll by +turn ^  pitch/roll by -turn (mirrored when x < 0)
//   [  push                ]  pop
//
// See also: `city.rs` which instances these trees, `config.rs` for
// `PlantProfile`.
//
// **Critical constraint: determinism.** All jitter comes from the caller's
// `GenRng`.

use crate::config::PlantProfile;
use crate::error::GenResult;
use crate::grammar::{Grammar, RuleTable};
use crate::math::Vec3;
use crate::mesh::{MeshAssetProvider, MeshBuffers, MeshFragment};
use crate::shapes;
use crate::turtle::{Turtle, TurtleStack};
use archipelago_prng::GenRng;
use std::f32::consts::PI;

pub const PLANT_AXIOM: &str = "X";

/// Smallest re-rolled turn (15 degrees) before scaling.
const TURN_MIN: f32 = 0.261_799;
/// Random spread added on top (20 degrees).
const TURN_SPREAD: f32 = 0.349_066;
/// Base angle the two constants above were chosen for (25 degrees).
const TURN_REFERENCE: f32 = 0.436_332;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlantOp {
    Segment,
    Leaf,
    Reroll,
    Roll,
    YawLeft,
    YawRight,
    PitchDown,
    PitchUp,
    Push,
    Pop,
}

pub const PLANT_SYMBOLS: &[(char, PlantOp)] = &[
    ('F', PlantOp::Segment),
    ('L', PlantOp::Leaf),
    ('M', PlantOp::Reroll),
    ('R', PlantOp::Roll),
    ('+', PlantOp::YawLeft),
    ('-', PlantOp::YawRight),
    ('&', PlantOp::PitchDown),
    ('^', PlantOp::PitchUp),
    ('[', PlantOp::Push),
    (']', PlantOp::Pop),
];

impl PlantOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        PLANT_SYMBOLS
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|&(_, op)| op)
    }
}

pub fn plant_rules() -> RuleTable {
    let mut rules = RuleTable::new();
    rules.set_fixed('X', "MF---+F+F+F++F");
    rules.set_fixed('F', "F[RM&-F&-F^F^+F^[++&FFL[MM^FF&FML++LM]]^FLM]");
    rules.set_identity("L+-&^[]RM");
    rules
}

/// Shapes a plant draws, resolved once.
#[derive(Clone, Debug)]
pub struct PlantAssets {
    pub trunk: MeshFragment,
    pub leaf: MeshFragment,
}

impl PlantAssets {
    pub fn resolve(provider: &dyn MeshAssetProvider) -> GenResult<Self> {
        Ok(Self {
            trunk: provider.load_checked(shapes::TRUNK)?,
            leaf: provider.load_checked(shapes::LEAF)?,
        })
    }
}

/// One plant: its grammar plus the profile and shapes it draws with.
pub struct PlantGenerator<'a> {
    profile: &'a PlantProfile,
    assets: &'a PlantAssets,
    grammar: Grammar,
}

impl<'a> PlantGenerator<'a> {
    pub fn new(profile: &'a PlantProfile, assets: &'a PlantAssets) -> Self {
        Self {
            profile,
            assets,
            grammar: Grammar::new(PLANT_AXIOM, plant_rules()),
        }
    }

    /// Run the profile's windowed passes.
    pub fn expand(&mut self) {
        for _ in 0..self.profile.passes {
            self.grammar.expand_window(self.profile.window);
        }
    }

    pub fn symbols(&self) -> &str {
        self.grammar.symbols()
    }

    pub fn interpret(&self, center: Vec3, rng: &mut GenRng) -> GenResult<MeshBuffers> {
        let p = self.profile;
        let base_angle = p.angle_degrees.to_radians();
        let mut turn = base_angle;
        let mut out = MeshBuffers::new();
        let mut stack = TurtleStack::new(Turtle::new(center, 1));

        for (i, symbol) in self.grammar.symbols().chars().enumerate() {
            let Some(op) = PlantOp::from_symbol(symbol) else {
                continue;
            };
            match op {
                PlantOp::Segment => {
                    let t = *stack.top();
                    let w = p.trunk_width * p.trunk_taper.powi(t.depth as i32);
                    out.push_fragment(
                        &self.assets.trunk,
                        p.trunk_color,
                        |_, v| t.place(v * w),
                        |_, n| t.dir.transform_dir(n),
                    );
                    let top = stack.top_mut();
                    top.pos += t.dir.up() * (p.segment_length * w);
                    top.depth += 1;
                }
                PlantOp::Leaf => {
                    let t = *stack.top();
                    let w = p.leaf_width * p.leaf_taper.powi(t.depth as i32);
                    out.push_fragment(
                        &self.assets.leaf,
                        p.leaf_color,
                        |_, v| t.place(v * w),
                        |_, n| t.dir.transform_dir(n),
                    );
                }
                PlantOp::Reroll => {
                    turn = (TURN_MIN + TURN_SPREAD * rng.next_f32()) * (base_angle.abs() / TURN_REFERENCE);
                    if rng.random_bool(0.5) {
                        turn = -turn;
                    }
                }
                PlantOp::Roll => {
                    let jitter = (rng.next_f32() - 0.5) * 0.5;
                    stack.top_mut().yaw((PI + jitter) / 2.0);
                }
                PlantOp::YawLeft => stack.top_mut().yaw(turn),
                PlantOp::YawRight => stack.top_mut().yaw(-turn),
                PlantOp::PitchDown | PlantOp::PitchUp => {
                    let t = stack.top_mut();
                    let mirror = if t.pos.x < 0.0 { -1.0 } else { 1.0 };
                    let sign = if op == PlantOp::PitchDown { 1.0 } else { -1.0 };
                    let axis = if rng.random_bool(0.5) {
                        t.dir.forward()
                    } else {
                        t.dir.right()
                    };
                    t.dir = t.dir.rotate(mirror * sign * turn, axis);
                }
                PlantOp::Push => stack.push(),
                PlantOp::Pop => {
                    stack.pop(i)?;
                }
            }
        }

        tracing::trace!(
            symbols = self.grammar.len(),
            vertices = out.vertex_count(),
            "plant interpreted"
        );
        Ok(out)
    }
}

/// Expand and draw one plant at `center`.
pub fn grow_plant(
    profile: &PlantProfile,
    assets: &PlantAssets,
    center: Vec3,
    rng: &mut GenRng,
) -> GenResult<MeshBuffers> {
    let mut plant = PlantGenerator::new(profile, assets);
    plant.expand();
    plant.interpret(center, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::BuiltinShapes;

    fn assets() -> PlantAssets {
        PlantAssets::resolve(&BuiltinShapes).unwrap()
    }

    #[test]
    fn symbol_table_covers_rule_alphabet() {
        for c in "FLMR+-&^[]".chars() {
            assert!(PlantOp::from_symbol(c).is_some(), "{c} has no op");
        }
        assert_eq!(PlantOp::from_symbol('X'), None);
        assert_eq!(PlantOp::from_symbol(' '), None);
    }

    #[test]
    fn windowed_expansion_only_touches_the_head() {
        let profile = PlantProfile::default();
        let assets = assets();
        let mut plant = PlantGenerator::new(&profile, &assets);
        plant.expand();
        // The tail of the first-pass string survives untouched.
        assert!(plant.symbols().ends_with("]+F++F"));
        let opens = plant.symbols().matches('[').count();
        let closes = plant.symbols().matches(']').count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn same_seed_same_plant() {
        let profile = PlantProfile::default();
        let assets = assets();
        let a = grow_plant(&profile, &assets, Vec3::ZERO, &mut GenRng::new(4)).unwrap();
        let b = grow_plant(&profile, &assets, Vec3::ZERO, &mut GenRng::new(4)).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
        let c = grow_plant(&profile, &assets, Vec3::ZERO, &mut GenRng::new(5)).unwrap();
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn trunk_grows_upward_from_center() {
        let profile = PlantProfile::default();
        let assets = assets();
        let center = Vec3::new(2.0, 1.0, -3.0);
        let out = grow_plant(&profile, &assets, center, &mut GenRng::new(1)).unwrap();
        // First trunk vertex sits on the base ring at the center height.
        assert!((out.position(0).y - center.y).abs() < 1e-6);
        let top = (0..out.vertex_count())
            .map(|v| out.position(v).y)
            .fold(f32::MIN, f32::max);
        assert!(top > center.y + 0.3);
    }

    #[test]
    fn unbalanced_program_is_reported() {
        let profile = PlantProfile::default();
        let assets = assets();
        let mut plant = PlantGenerator::new(&profile, &assets);
        plant.grammar = Grammar::new("F]F", plant_rules());
        assert!(plant.interpret(Vec3::ZERO, &mut GenRng::new(0)).is_err());
    }
}
