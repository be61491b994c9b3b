use crate::structs2d::{Rgba, Vec2};

/// One screen-space primitive emitted by a draw pass. Coordinates are
/// already scaled; the renderer only has to rasterize.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        min: Vec2,
        max: Vec2,
        colour: Rgba,
    },
    /// Textured quad, resolved by the renderer through the image name.
    Image {
        min: Vec2,
        max: Vec2,
        name: String,
        alpha: f32,
    },
    /// Filled convex polygon.
    Poly {
        points: Vec<Vec2>,
        colour: Rgba,
    },
    /// Closed line loop over the given points.
    Outline {
        points: Vec<Vec2>,
        colour: Rgba,
    },
    Line {
        a: Vec2,
        b: Vec2,
        colour: Rgba,
    },
}

/// Buffer of primitives built once per frame and handed to the
/// renderer in emission order.
#[derive(Debug, Default)]
pub struct DrawList {
    primitives: Vec<Primitive>,
}

impl DrawList {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
        }
    }

    pub fn rect(&mut self, min: Vec2, max: Vec2, colour: Rgba) {
        self.primitives.push(Primitive::Rect { min, max, colour });
    }

    pub fn image(&mut self, min: Vec2, max: Vec2, name: impl Into<String>, alpha: f32) {
        self.primitives.push(Primitive::Image {
            min,
            max,
            name: name.into(),
            alpha,
        });
    }

    pub fn poly(&mut self, points: Vec<Vec2>, colour: Rgba) {
        self.primitives.push(Primitive::Poly { points, colour });
    }

    pub fn outline(&mut self, points: Vec<Vec2>, colour: Rgba) {
        self.primitives.push(Primitive::Outline { points, colour });
    }

    pub fn line(&mut self, a: Vec2, b: Vec2, colour: Rgba) {
        self.primitives.push(Primitive::Line { a, b, colour });
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
