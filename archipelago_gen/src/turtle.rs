// Turtle state and the bracket stack shared by every interpreter.
//
// A `Turtle` is plain data: position, orientation, a local turn matrix and
// outward shift (coral), a depth counter (island/bridge index in the city,
// branch depth in plants), proportions, and the city's house flags. It is
// `Copy`, so pushing a frame is a value copy of the parent; a child can
// never alias its parent's orientation.
//
// `TurtleStack` always holds at least the root frame. Popping the root is a
// malformed-program error reported with the symbol position, not a panic.

use crate::error::{GenError, GenResult};
use crate::math::{Mat4, Vec3};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Turtle {
    pub pos: Vec3,
    pub dir: Mat4,
    /// Extra local rotation applied to drawn pieces before `dir` (coral).
    pub turn: Mat4,
    /// Outward offset applied to drawn pieces before `dir` (coral).
    pub shift: Vec3,
    pub depth: usize,
    pub width: f32,
    pub height: f32,
    /// Stories drawn so far on this lot.
    pub stories: u32,
    /// A foundation was laid here.
    pub build: bool,
    /// Descendant story/roof symbols still draw.
    pub keep_building: bool,
    /// Round (tall) house style.
    pub tall: bool,
}

impl Turtle {
    pub fn new(pos: Vec3, depth: usize) -> Self {
        Self {
            pos,
            dir: Mat4::IDENTITY,
            turn: Mat4::IDENTITY,
            shift: Vec3::ZERO,
            depth,
            width: 0.0,
            height: 0.0,
            stories: 0,
            build: false,
            keep_building: true,
            tall: false,
        }
    }

    /// Rotate about the turtle's own up axis.
    pub fn yaw(&mut self, angle: f32) {
        self.dir = self.dir.rotate(angle, self.dir.up());
    }

    /// Point in the turtle's frame (including the frame's own translation),
    /// offset by the turtle position.
    pub fn place(&self, local: Vec3) -> Vec3 {
        self.dir.transform_point(local) + self.pos
    }
}

/// Bracket stack. Index 0 is the root frame.
#[derive(Clone, Debug)]
pub struct TurtleStack {
    frames: SmallVec<[Turtle; 8]>,
}

impl TurtleStack {
    pub fn new(root: Turtle) -> Self {
        let mut frames = SmallVec::new();
        frames.push(root);
        Self { frames }
    }

    /// Number of frames, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> &Turtle {
        &self.frames[self.frames.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut Turtle {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Push a copy of the current frame.
    pub fn push(&mut self) {
        let copy = *self.top();
        self.frames.push(copy);
    }

    /// Drop the current frame. `position` is the symbol index, reported if
    /// this would pop the root.
    pub fn pop(&mut self, position: usize) -> GenResult<Turtle> {
        if self.frames.len() <= 1 {
            return Err(GenError::UnbalancedPop { position });
        }
        self.frames.pop().ok_or(GenError::UnbalancedPop { position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_copies_and_pop_restores_parent() {
        let mut stack = TurtleStack::new(Turtle::new(Vec3::ZERO, 0));
        stack.top_mut().depth = 3;
        stack.push();
        assert_eq!(stack.depth(), 2);
        {
            let child = stack.top_mut();
            assert_eq!(child.depth, 3);
            child.depth = 7;
            child.pos = Vec3::X;
            child.yaw(1.0);
        }
        stack.pop(0).unwrap();
        let parent = stack.top();
        assert_eq!(parent.depth, 3);
        assert_eq!(parent.pos, Vec3::ZERO);
        assert_eq!(parent.dir, Mat4::IDENTITY);
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let mut stack = TurtleStack::new(Turtle::new(Vec3::ZERO, 0));
        stack.push();
        stack.top_mut().yaw(0.5);
        stack.pop(1).unwrap();
        stack.push();
        assert_eq!(stack.top().dir, Mat4::IDENTITY);
    }

    #[test]
    fn popping_root_is_an_error() {
        let mut stack = TurtleStack::new(Turtle::new(Vec3::ZERO, 0));
        assert!(matches!(
            stack.pop(12),
            Err(GenError::UnbalancedPop { position: 12 })
        ));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn deep_nesting_spills_past_inline_capacity() {
        let mut stack = TurtleStack::new(Turtle::new(Vec3::ZERO, 0));
        for i in 0..32 {
            stack.push();
            stack.top_mut().depth = i + 1;
        }
        assert_eq!(stack.top().depth, 32);
        for i in (0..32).rev() {
            stack.pop(0).unwrap();
            assert_eq!(stack.top().depth, i);
        }
    }

    #[test]
    fn place_applies_frame_then_position() {
        let mut t = Turtle::new(Vec3::new(1.0, 0.0, 0.0), 0);
        t.dir = Mat4::IDENTITY.translate(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(t.place(Vec3::Y), Vec3::new(1.0, 1.0, 2.0));
    }
}
