use rigdeck_record::{Record, Result};

use crate::session::Session;
use crate::structs2d::Vec2;

/// State shared by every widget in the tree: a parent-relative
/// position, gating flags, and the transient grab that drives drags.
#[derive(Debug, Clone)]
pub struct WidgetCore {
    pub pos: Vec2,
    pub visible: bool,
    pub active: bool,
    /// Drags of this widget snap to the grid.
    pub grid_snap: bool,
    grab: Option<Vec2>,
}

impl WidgetCore {
    pub fn new(pos: Vec2) -> Self {
        WidgetCore {
            pos,
            visible: true,
            active: false,
            grid_snap: false,
            grab: None,
        }
    }

    /// Translates a parent-space point into this widget's space.
    pub fn local(&self, point: Vec2) -> Vec2 {
        point - self.pos
    }

    pub fn is_grabbing(&self) -> bool {
        self.grab.is_some()
    }

    pub fn begin_grab(&mut self, local: Vec2) {
        self.grab = Some(local);
    }

    /// Follows the pointer while grabbed, keeping the grab offset and
    /// snapping to the grid. Returns whether a grab was active.
    pub fn drag(&mut self, ctx: &Session, point: Vec2) -> bool {
        match self.grab {
            Some(grab) => {
                self.pos = ctx.snap(point - grab, self.grid_snap);
                true
            }
            None => false,
        }
    }

    /// Ends the gesture. True when this widget held the grab.
    pub fn end_grab(&mut self) -> bool {
        self.grab.take().is_some()
    }

    pub fn store(&self, rec: &mut Record) -> Result<()> {
        rec.write("pos", (self.pos.x, self.pos.y))?;
        rec.write("visible", self.visible)?;
        rec.write("active", self.active)
    }

    pub fn load(&mut self, rec: &mut Record) -> Result<()> {
        let (x, y) = rec.read_pair("pos", (0.0, 0.0))?;
        self.pos = Vec2::new(x as f32, y as f32);
        self.visible = rec.read_bool("visible", true)?;
        self.active = rec.read_bool("active", false)?;
        Ok(())
    }
}

/// Interface-space measurements handed down on release paths. The
/// deletion rules compare cursor positions against these bounds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    /// Offset of the median inside the interface.
    pub origin: Vec2,
    /// Interface size.
    pub size: Vec2,
}

impl Frame {
    /// `point` is in interface space.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x < self.size.x && point.y >= 0.0 && point.y < self.size.y
    }
}

/// Screen-space facts an interface passes down while drawing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Panel {
    /// Interface position on screen, before overlay scale.
    pub origin: Vec2,
    pub size: Vec2,
    pub median_ratio: f32,
    pub height_ratio: f32,
    pub edit: bool,
}

pub(crate) fn index_to_int(index: Option<usize>) -> i64 {
    index.map_or(-1, |i| i as i64)
}

pub(crate) fn int_to_index(value: i64) -> Option<usize> {
    if value < 0 { None } else { Some(value as usize) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_translation() {
        let core = WidgetCore::new(Vec2::new(10.0, 20.0));
        assert_eq!(core.local(Vec2::new(15.0, 20.0)), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_grab_lifecycle() {
        let mut core = WidgetCore::new(Vec2::ZERO);
        assert!(!core.end_grab());
        core.begin_grab(Vec2::new(2.0, 2.0));
        assert!(core.is_grabbing());
        assert!(core.end_grab());
        assert!(!core.is_grabbing());
    }

    #[test]
    fn test_store_load_round_trip() {
        let mut core = WidgetCore::new(Vec2::new(3.0, -4.0));
        core.active = true;
        let mut rec = Record::new();
        core.store(&mut rec).unwrap();

        let mut back = WidgetCore::new(Vec2::ZERO);
        back.load(&mut rec).unwrap();
        assert_eq!(back.pos, core.pos);
        assert!(back.visible);
        assert!(back.active);
    }

    #[test]
    fn test_frame_bounds() {
        let frame = Frame {
            origin: Vec2::ZERO,
            size: Vec2::new(100.0, 50.0),
        };
        assert!(frame.contains(Vec2::new(0.0, 0.0)));
        assert!(frame.contains(Vec2::new(99.0, 49.0)));
        assert!(!frame.contains(Vec2::new(100.0, 0.0)));
        assert!(!frame.contains(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn test_index_conversions() {
        assert_eq!(index_to_int(None), -1);
        assert_eq!(index_to_int(Some(2)), 2);
        assert_eq!(int_to_index(-1), None);
        assert_eq!(int_to_index(0), Some(0));
    }
}
