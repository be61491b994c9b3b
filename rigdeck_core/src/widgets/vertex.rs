use rigdeck_record::{Record, RecordError, Result};

use crate::draw::DrawList;
use crate::session::{Session, View};
use crate::structs2d::{Rgba, Vec2};
use crate::widgets::widget::WidgetCore;

pub const VERTEX_RADIUS: f32 = 8.0;
pub const HANDLE_RADIUS: f32 = 4.0;

const COLOUR: Rgba = Rgba::new(0.4, 0.4, 0.4, 0.9);

/// Draggable point with a circular hit area. Polygon corners, edge
/// handles and the interface sizing grips are all vertices; what a
/// finished drag means is decided by the owner.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub core: WidgetCore,
    pub radius: f32,
    /// Position of this vertex in its owner's list.
    pub index: usize,
}

impl Vertex {
    pub fn new(pos: Vec2, radius: f32, index: usize) -> Self {
        let mut core = WidgetCore::new(pos);
        core.active = true;
        core.grid_snap = true;
        Vertex {
            core,
            radius,
            index,
        }
    }

    /// `point` is in the owner's space.
    pub fn is_inside(&self, scale_ui: f32, point: Vec2) -> bool {
        let local = self.core.local(point);
        let radius = self.radius * scale_ui;
        local.x * local.x + local.y * local.y < radius * radius
    }

    /// A press inside the hit circle always grabs; vertices have no
    /// click behaviour of their own.
    pub fn press(&mut self, ctx: &Session, point: Vec2) -> bool {
        if self.core.active && self.core.visible && self.is_inside(ctx.settings.scale_ui, point) {
            self.core.begin_grab(self.core.local(point));
            return true;
        }
        false
    }

    pub fn hold(&mut self, ctx: &Session, point: Vec2) {
        self.core.drag(ctx, point);
    }

    /// Ends the gesture. True when this vertex held the grab, which
    /// tells the owner a drag of this vertex just finished.
    pub fn release(&mut self) -> bool {
        self.core.end_grab()
    }

    pub(crate) fn draw(&self, view: &View, origin: Vec2, out: &mut DrawList) {
        let at = origin + self.core.pos;
        let radius = Vec2::splat(self.radius * view.settings.scale_ui);
        let scale = view.settings.scale_all;
        out.rect((at - radius) * scale, (at + radius) * scale, COLOUR);
    }

    pub fn store(&self, rec: &mut Record) -> Result<()> {
        rec.write("index", self.index as i64)?;
        rec.write("radius", self.radius)?;
        self.core.store(rec)
    }

    pub fn load(&mut self, rec: &mut Record) -> Result<()> {
        let index = rec.read_int("index", 0)?;
        if index < 0 {
            return Err(RecordError::invalid("index", "negative index"));
        }
        self.index = index as usize;
        let radius = rec.read_float("radius", 0.0)?;
        if radius < 0.0 {
            return Err(RecordError::invalid("radius", "negative radius"));
        }
        self.radius = radius as f32;
        self.core.load(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_circle_scales_with_ui() {
        let vertex = Vertex::new(Vec2::new(10.0, 10.0), VERTEX_RADIUS, 0);
        assert!(vertex.is_inside(1.0, Vec2::new(14.0, 10.0)));
        assert!(!vertex.is_inside(1.0, Vec2::new(18.5, 10.0)));
        assert!(vertex.is_inside(2.0, Vec2::new(18.5, 10.0)));
    }

    #[test]
    fn test_store_load_round_trip() {
        let mut vertex = Vertex::new(Vec2::new(-8.0, 4.0), VERTEX_RADIUS, 3);
        let mut rec = Record::new();
        vertex.store(&mut rec).unwrap();

        let mut back = Vertex::new(Vec2::ZERO, VERTEX_RADIUS, 0);
        back.load(&mut rec).unwrap();
        assert_eq!(back.index, 3);
        assert_eq!(back.radius, VERTEX_RADIUS);
        assert_eq!(back.core.pos, vertex.core.pos);
    }

    #[test]
    fn test_load_rejects_negative_values() {
        let mut rec = Record::new();
        rec.write("index", -2i64).unwrap();
        let mut vertex = Vertex::new(Vec2::ZERO, VERTEX_RADIUS, 0);
        assert!(matches!(
            vertex.load(&mut rec),
            Err(RecordError::Invalid { .. })
        ));

        let mut rec = Record::new();
        rec.write("index", 0i64).unwrap();
        rec.write("radius", -1.0f64).unwrap();
        assert!(matches!(
            vertex.load(&mut rec),
            Err(RecordError::Invalid { .. })
        ));
    }
}
