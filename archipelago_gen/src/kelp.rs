// Kelp: a ribbon of quads swaying up from the sea floor.
//
// Grammar: axiom `X -> F+HWT`, `W -> WF+HW` (every `W` sprouts another
// segment with a fresh width and height), `H F T` map to themselves. `+` has
// no rule, so only the newest sway survives a pass; older ones blank out.
//
// A segment's bottom edge must meet the previous segment's top edge, so the
// interpreter remembers the orientation and width the last segment ended
// with. Vertices 0 and 1 of the quad (its bottom edge) are placed with that
// remembered frame; vertices 2 and 3 with the current turtle's.
//
// Symbol table:
//   F  segment, then climb by the turtle's height
//   T  tip: a segment whose top edge uses the field's tip width
//   W  random width in [3, 5)     H  random height in [3, 6)
//   +  yaw by (turn + 0..30) degrees, random sign
//   -  yaw by -turn degrees
//
// See also: `reef.rs` for field placement, `config.rs` for `KelpField`.

use crate::config::KelpField;
use crate::error::GenResult;
use crate::grammar::{Grammar, RuleTable};
use crate::math::{Mat4, Vec3};
use crate::mesh::{MeshAssetProvider, MeshBuffers, MeshFragment};
use crate::shapes;
use crate::turtle::{Turtle, TurtleStack};
use archipelago_prng::GenRng;

pub const KELP_AXIOM: &str = "X";

const ROOT_WIDTH: f32 = 0.5;
const ROOT_HEIGHT: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KelpOp {
    Segment,
    Tip,
    Widen,
    Lengthen,
    Sway,
    Unsway,
}

pub const KELP_SYMBOLS: &[(char, KelpOp)] = &[
    ('F', KelpOp::Segment),
    ('T', KelpOp::Tip),
    ('W', KelpOp::Widen),
    ('H', KelpOp::Lengthen),
    ('+', KelpOp::Sway),
    ('-', KelpOp::Unsway),
];

impl KelpOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        KELP_SYMBOLS
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|&(_, op)| op)
    }
}

pub fn kelp_rules() -> RuleTable {
    let mut rules = RuleTable::new();
    rules.set_fixed('X', "F+HWT");
    rules.set_fixed('W', "WF+HW");
    rules.set_identity("HFT");
    rules
}

#[derive(Clone, Debug)]
pub struct KelpAssets {
    pub piece: MeshFragment,
}

impl KelpAssets {
    pub fn resolve(provider: &dyn MeshAssetProvider) -> GenResult<Self> {
        Ok(Self {
            piece: provider.load_checked(shapes::KELP)?,
        })
    }
}

pub struct KelpGenerator<'a> {
    field: &'a KelpField,
    assets: &'a KelpAssets,
    grammar: Grammar,
}

impl<'a> KelpGenerator<'a> {
    pub fn new(field: &'a KelpField, assets: &'a KelpAssets) -> Self {
        Self {
            field,
            assets,
            grammar: Grammar::new(KELP_AXIOM, kelp_rules()),
        }
    }

    pub fn expand(&mut self, passes: u32) {
        self.grammar.expand(passes);
    }

    pub fn symbols(&self) -> &str {
        self.grammar.symbols()
    }

    pub fn interpret(&self, base: Vec3, rng: &mut GenRng) -> GenResult<MeshBuffers> {
        let mut out = MeshBuffers::new();
        let mut root = Turtle::new(base, 1);
        root.width = ROOT_WIDTH;
        root.height = ROOT_HEIGHT;
        let mut stack = TurtleStack::new(root);

        // Frame and width the previous segment's top edge ended with.
        let mut last_dir = Mat4::IDENTITY;
        let mut last_width = ROOT_WIDTH;

        for symbol in self.grammar.symbols().chars() {
            let Some(op) = KelpOp::from_symbol(symbol) else {
                continue;
            };
            match op {
                KelpOp::Segment | KelpOp::Tip => {
                    let t = *stack.top();
                    let top_width = if op == KelpOp::Tip {
                        self.field.tip_width
                    } else {
                        t.width
                    };
                    let (bottom_dir, bottom_width) = (last_dir, last_width);
                    let edge = |i: usize| {
                        if i < 2 {
                            (bottom_dir, bottom_width)
                        } else {
                            (t.dir, top_width)
                        }
                    };
                    out.push_fragment(
                        &self.assets.piece,
                        self.field.color,
                        |i, p| {
                            let (m, w) = edge(i);
                            m.transform_point(Vec3::new(p.x * w, p.y * t.height, p.z * w)) + t.pos
                        },
                        |i, n| edge(i).0.transform_dir(n),
                    );
                    last_dir = t.dir;
                    last_width = top_width;
                    if op == KelpOp::Segment {
                        let top = stack.top_mut();
                        top.pos.y += t.height;
                        top.depth += 1;
                    }
                }
                KelpOp::Widen => stack.top_mut().width = rng.next_f32() * 2.0 + 3.0,
                KelpOp::Lengthen => stack.top_mut().height = rng.next_f32() * 3.0 + 3.0,
                KelpOp::Sway => {
                    let degrees = rng.next_f32() * 30.0 + self.field.turn_degrees;
                    let degrees = rng.random_sign(degrees);
                    stack.top_mut().yaw(degrees.to_radians());
                }
                KelpOp::Unsway => stack.top_mut().yaw(-self.field.turn_degrees.to_radians()),
            }
        }
        Ok(out)
    }
}

/// Expand and draw one kelp rooted at `base`, with a random pass count.
pub fn grow_kelp(
    field: &KelpField,
    assets: &KelpAssets,
    base: Vec3,
    rng: &mut GenRng,
) -> GenResult<MeshBuffers> {
    let mut kelp = KelpGenerator::new(field, assets);
    kelp.expand(rng.pass_count(field.base_passes, field.extra_passes));
    kelp.interpret(base, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::BuiltinShapes;

    fn assets() -> KelpAssets {
        KelpAssets::resolve(&BuiltinShapes).unwrap()
    }

    #[test]
    fn every_width_symbol_sprouts_a_segment() {
        let field = KelpField::default();
        let assets = assets();
        let mut kelp = KelpGenerator::new(&field, &assets);
        kelp.expand(1);
        assert_eq!(kelp.symbols(), "F+HWT");
        kelp.expand(1);
        // The first `+` had no rule and blanked out.
        assert_eq!(kelp.symbols(), "F HWF+HWT");
        kelp.expand(1);
        assert_eq!(kelp.symbols(), "F HWF+HWF HWF+HWT");
    }

    #[test]
    fn segments_join_edge_to_edge() {
        let field = KelpField::default();
        let assets = assets();
        let mut kelp = KelpGenerator::new(&field, &assets);
        kelp.expand(3);
        let out = kelp.interpret(Vec3::ZERO, &mut GenRng::new(8)).unwrap();
        let quads = out.vertex_count() / 4;
        assert!(quads >= 3);
        for q in 1..quads {
            let prev_top = [out.position(q * 4 - 2), out.position(q * 4 - 1)];
            let bottom = [out.position(q * 4), out.position(q * 4 + 1)];
            // Bottom vertices 0 and 1 meet the previous top vertices 3 and 2.
            assert!((bottom[0] - prev_top[1]).length() < 1e-4, "quad {q}");
            assert!((bottom[1] - prev_top[0]).length() < 1e-4, "quad {q}");
        }
    }

    #[test]
    fn grows_upward_from_its_base() {
        let field = KelpField::default();
        let assets = assets();
        let base = Vec3::new(10.0, -40.0, 10.0);
        let out = grow_kelp(&field, &assets, base, &mut GenRng::new(3)).unwrap();
        assert!(!out.is_empty());
        for v in 0..out.vertex_count() {
            assert!(out.position(v).y >= base.y - 1e-4);
        }
        assert_eq!(&out.colors[0..4], &field.color);
    }
}
