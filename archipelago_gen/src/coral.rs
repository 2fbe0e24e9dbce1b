// Coral: clusters of flat pieces fanned out around a trunk line.
//
// Grammar: axiom `X -> +F+<F-F-+F+-FM`, `M -> <+F-+F-F+-FM`; `+ - < F` map
// to themselves. Each pass appends one more `M` run to the tail.
//
// Pieces are placed in three steps: the turtle's private `turn` matrix spins
// the piece in place, the accumulated `shift` pushes it outward along z, and
// finally `dir` and `pos` put it in the world. Pieces shrink by
// `1 / sqrt(depth)`, and past the first one each is only drawn with the
// field's branch chance, which thins the outer fronds.
//
// Symbol table:
//   F  piece (always when depth is 1, otherwise with `branch_chance`)
//   <  push the shift out by 1.5 piece sizes
//   +  spin the piece frame by a random full turn about up
//   -  yaw the turtle by up to 110 degrees
//
// See also: `reef.rs` for cluster placement, `config.rs` for `CoralField`.

use crate::config::CoralField;
use crate::error::GenResult;
use crate::grammar::{Grammar, RuleTable};
use crate::math::Vec3;
use crate::mesh::{MeshAssetProvider, MeshBuffers, MeshFragment};
use crate::shapes;
use crate::turtle::{Turtle, TurtleStack};
use archipelago_prng::GenRng;

pub const CORAL_AXIOM: &str = "X";

/// Outward step per `<`, in piece sizes.
const SHIFT_STEP: f32 = 1.5;
const MAX_SWING_DEGREES: f32 = 110.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoralOp {
    Piece,
    ShiftOut,
    Spin,
    Swing,
}

pub const CORAL_SYMBOLS: &[(char, CoralOp)] = &[
    ('F', CoralOp::Piece),
    ('<', CoralOp::ShiftOut),
    ('+', CoralOp::Spin),
    ('-', CoralOp::Swing),
];

impl CoralOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        CORAL_SYMBOLS
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|&(_, op)| op)
    }
}

pub fn coral_rules() -> RuleTable {
    let mut rules = RuleTable::new();
    rules.set_fixed('X', "+F+<F-F-+F+-FM");
    rules.set_fixed('M', "<+F-+F-F+-FM");
    rules.set_identity("+-<F");
    rules
}

#[derive(Clone, Debug)]
pub struct CoralAssets {
    pub piece: MeshFragment,
}

impl CoralAssets {
    pub fn resolve(provider: &dyn MeshAssetProvider) -> GenResult<Self> {
        Ok(Self {
            piece: provider.load_checked(shapes::CORAL)?,
        })
    }
}

pub struct CoralGenerator<'a> {
    field: &'a CoralField,
    assets: &'a CoralAssets,
    grammar: Grammar,
}

impl<'a> CoralGenerator<'a> {
    pub fn new(field: &'a CoralField, assets: &'a CoralAssets) -> Self {
        Self {
            field,
            assets,
            grammar: Grammar::new(CORAL_AXIOM, coral_rules()),
        }
    }

    pub fn expand(&mut self, passes: u32) {
        self.grammar.expand(passes);
    }

    pub fn symbols(&self) -> &str {
        self.grammar.symbols()
    }

    pub fn interpret(&self, base: Vec3, rng: &mut GenRng) -> GenResult<MeshBuffers> {
        let size = self.field.size;
        let mut out = MeshBuffers::new();
        let mut stack = TurtleStack::new(Turtle::new(base, 1));

        for symbol in self.grammar.symbols().chars() {
            let Some(op) = CoralOp::from_symbol(symbol) else {
                continue;
            };
            match op {
                CoralOp::Piece => {
                    let t = *stack.top();
                    // The first piece always draws and consumes no randomness.
                    if t.depth != 1 && !rng.random_bool(self.field.branch_chance) {
                        continue;
                    }
                    let scale = size / (t.depth as f32).sqrt();
                    let shift = Vec3::new(t.shift.x, 0.0, t.shift.z);
                    out.push_fragment(
                        &self.assets.piece,
                        self.field.color,
                        |_, p| t.place(t.turn.transform_point(p * scale) + shift),
                        |_, n| t.dir.transform_dir(t.turn.transform_dir(n)),
                    );
                    stack.top_mut().depth += 1;
                }
                CoralOp::ShiftOut => {
                    let top = stack.top_mut();
                    top.shift = Vec3::new(0.0, 0.0, top.shift.z + SHIFT_STEP * size);
                }
                CoralOp::Spin => {
                    let angle = (rng.next_f32() * 360.0).to_radians();
                    let top = stack.top_mut();
                    top.turn = top.turn.rotate(angle, top.dir.up());
                }
                CoralOp::Swing => {
                    let angle = (rng.next_f32() * MAX_SWING_DEGREES).to_radians();
                    stack.top_mut().yaw(angle);
                }
            }
        }
        Ok(out)
    }
}

/// Expand and draw one coral cluster at `base`, with a random pass count.
pub fn grow_coral(
    field: &CoralField,
    assets: &CoralAssets,
    base: Vec3,
    rng: &mut GenRng,
) -> GenResult<MeshBuffers> {
    let mut coral = CoralGenerator::new(field, assets);
    coral.expand(rng.pass_count(field.base_passes, field.extra_passes));
    coral.interpret(base, rng)
}
