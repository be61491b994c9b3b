use rigdeck_record::{Record, Result};

use crate::draw::DrawList;
use crate::session::{Session, View};
use crate::settings::Settings;
use crate::structs2d::{Rgba, Vec2};
use crate::widgets::kind::KindRegistry;
use crate::widgets::median::Median;
use crate::widgets::vertex::Vertex;
use crate::widgets::widget::{Frame, Panel, WidgetCore};

const GRIP_RADIUS: f32 = 6.0;
const MIN_SIZE: f32 = 64.0;
const BORDER_MARGIN: f32 = 10.0;

const BORDER_COLOUR: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.8);
const BASE_TINT: Rgba = Rgba::new(0.1, 0.1, 0.1, 1.0);
const EDIT_TINT: Rgba = Rgba::new(0.2, 0.1, 0.1, 1.0);

/// One movable panel of the deck. Holds a median with its selectors,
/// and in edit mode grows grips for resizing and for the two layout
/// ratios. Body drags move the whole panel, body clicks in edit mode
/// start a new polygon.
#[derive(Debug, Clone)]
pub struct Interface {
    pub core: WidgetCore,
    pub size: Vec2,
    /// Name of the background image, resolved by the renderer.
    pub background: String,
    pub median: Median,
    /// Horizontal median position as a fraction of the width.
    pub median_ratio: f32,
    /// Container offset as a fraction of the height.
    pub height_ratio: f32,
    pub edit: bool,
    corners: Vec<Vertex>,
    median_handle: Option<Vertex>,
    height_handle: Option<Vertex>,
}

impl Interface {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        let mut core = WidgetCore::new(pos);
        core.active = true;
        Interface {
            core,
            size,
            background: String::new(),
            median: Median::new(),
            median_ratio: 0.5,
            height_ratio: 0.5,
            edit: false,
            corners: Vec::new(),
            median_handle: None,
            height_handle: None,
        }
    }

    /// `point` is in board space.
    pub fn is_inside(&self, point: Vec2) -> bool {
        let local = self.core.local(point);
        local.x >= 0.0 && local.x < self.size.x && local.y >= 0.0 && local.y < self.size.y
    }

    /// Children first, then the body. In edit mode a body press adds a
    /// vertex to the growing polygon, otherwise it starts a move.
    pub(crate) fn press(&mut self, ctx: &mut Session, point: Vec2, shift: bool) -> bool {
        let local = self.core.local(point);
        if self.median.press(ctx, local, shift) {
            return true;
        }
        for corner in &mut self.corners {
            if corner.press(ctx, local) {
                return true;
            }
        }
        if let Some(handle) = &mut self.median_handle {
            if handle.press(ctx, local) {
                return true;
            }
        }
        if let Some(handle) = &mut self.height_handle {
            if handle.press(ctx, local) {
                return true;
            }
        }
        if !self.core.active || !self.core.visible || !self.is_inside(point) {
            return false;
        }
        if self.edit {
            self.median.add_vertex(ctx, local);
        } else {
            self.core.begin_grab(local);
        }
        true
    }

    pub(crate) fn hold(&mut self, ctx: &Session, point: Vec2) {
        if self.core.drag(ctx, point) {
            return;
        }
        let local = self.core.local(point);
        self.median.hold(ctx, local);
        for corner in &mut self.corners {
            corner.hold(ctx, local);
        }
        if let Some(handle) = &mut self.median_handle {
            handle.hold(ctx, local);
        }
        if let Some(handle) = &mut self.height_handle {
            handle.hold(ctx, local);
        }
    }

    /// The local point is taken before the body drop can clamp the
    /// panel, so children see the position the gesture happened at.
    pub(crate) fn release(&mut self, ctx: &mut Session, point: Vec2) {
        let local = self.core.local(point);
        if self.core.end_grab() {
            self.clamp_to_screen(ctx.settings, ctx.screen);
        }
        let frame = Frame {
            origin: self.median.core.pos,
            size: self.size,
        };
        self.median.release(ctx, &frame, local);
        for index in 0..self.corners.len() {
            if self.corners[index].release() {
                self.adapt_size(index);
            }
        }
        if self
            .median_handle
            .as_mut()
            .is_some_and(|handle| handle.release())
        {
            self.adapt_median();
        }
        if self
            .height_handle
            .as_mut()
            .is_some_and(|handle| handle.release())
        {
            self.adapt_height();
        }
    }

    fn clamp_to_screen(&mut self, settings: &Settings, screen: Vec2) {
        if !settings.clamp {
            return;
        }
        let limit = screen / settings.scale_all - self.size;
        self.core.pos = self.core.pos.max(Vec2::ZERO).min(limit);
    }

    /// Grips exist only in edit mode. Corners carry indices 0 to 3, the
    /// median and height grips 4 and 5.
    pub(crate) fn set_edit(&mut self, ctx: &mut Session, active: bool) {
        self.median.set_edit(ctx, active);
        self.edit = active;

        if active {
            if self.corners.is_empty() {
                let slots = [
                    Vec2::ZERO,
                    Vec2::new(self.size.x, 0.0),
                    Vec2::new(0.0, self.size.y),
                    Vec2::new(self.size.x, self.size.y),
                ];
                for (index, pos) in slots.into_iter().enumerate() {
                    let mut corner = Vertex::new(pos, GRIP_RADIUS, index);
                    corner.core.grid_snap = false;
                    self.corners.push(corner);
                }

                let at = Vec2::new(self.median.core.pos.x + 1.0, -8.0);
                let mut handle = Vertex::new(at, GRIP_RADIUS, 4);
                handle.core.grid_snap = false;
                self.median_handle = Some(handle);

                let at = Vec2::new(-8.0, self.median.container.core.pos.y + 1.0);
                let mut handle = Vertex::new(at, GRIP_RADIUS, 5);
                handle.core.grid_snap = false;
                self.height_handle = Some(handle);
            }
        } else {
            self.corners.clear();
            self.median_handle = None;
            self.height_handle = None;
        }
    }

    /// Applies the drag of one corner grip to position and size, then
    /// puts every grip back on its slot.
    fn adapt_size(&mut self, corner: usize) {
        if corner >= self.corners.len() {
            return;
        }
        let grip = self.corners[corner].core.pos;
        match corner {
            0 => {
                self.core.pos += grip;
                self.size -= grip;
            }
            1 => {
                self.core.pos.y += grip.y;
                self.size = Vec2::new(grip.x, self.size.y - grip.y);
            }
            2 => {
                self.core.pos.x += grip.x;
                self.size = Vec2::new(self.size.x - grip.x, grip.y);
            }
            _ => self.size = grip,
        }
        // An inverted drag must not turn the panel inside out.
        self.size = self.size.max(Vec2::splat(MIN_SIZE));

        let slots = [
            Vec2::ZERO,
            Vec2::new(self.size.x, 0.0),
            Vec2::new(0.0, self.size.y),
            Vec2::new(self.size.x, self.size.y),
        ];
        for (vertex, pos) in self.corners.iter_mut().zip(slots) {
            vertex.core.pos = pos;
        }
        self.reset_ratio_grips();
    }

    fn adapt_median(&mut self) {
        if let Some(handle) = &self.median_handle {
            self.median_ratio = (handle.core.pos.x / self.size.x).clamp(0.0, 1.0);
        }
        self.reset_ratio_grips();
    }

    fn adapt_height(&mut self) {
        if let Some(handle) = &self.height_handle {
            self.height_ratio = (handle.core.pos.y / self.size.y).clamp(0.0, 1.0);
        }
        self.reset_ratio_grips();
    }

    fn reset_ratio_grips(&mut self) {
        let at = Vec2::new(self.size.x * self.median_ratio + 1.0, -8.0);
        if let Some(handle) = &mut self.median_handle {
            handle.core.pos = at;
        }
        let at = Vec2::new(-8.0, self.size.y * self.height_ratio + 1.0);
        if let Some(handle) = &mut self.height_handle {
            handle.core.pos = at;
        }
    }

    /// Lays out the median from the ratios, refreshes links of the
    /// selected selector and recomputes rig-driven visibility.
    pub(crate) fn update(&mut self, ctx: &Session) {
        self.clamp_to_screen(ctx.settings, ctx.screen);
        self.median.container.core.pos = Vec2::new(0.0, self.size.y * self.height_ratio);
        self.median.core.pos = Vec2::new(
            self.size.x * self.median_ratio - self.median.size.x / 2.0,
            0.0,
        );
        self.median.size.y = self.size.y;
        self.median.update(ctx);
        self.median.update_visibility(&*ctx.host);
    }

    /// `size` is the pixel size of the named image, if the host could
    /// resolve it. An unknown name clears the background.
    pub fn set_background(&mut self, name: &str, size: Option<Vec2>) {
        match size {
            Some(size) if !name.is_empty() => {
                self.size = size.max(Vec2::splat(32.0));
                self.background = name.to_string();
            }
            _ => self.background.clear(),
        }
    }

    pub(crate) fn draw(&self, view: &View, out: &mut DrawList) {
        if !self.core.visible || !self.median.core.visible {
            return;
        }
        let selected = view.selected_interface == Some(view.interface);
        let tint = if self.edit { EDIT_TINT } else { BASE_TINT };
        let alpha = if selected {
            view.settings.alpha
        } else {
            0.8 * view.settings.alpha
        };
        let colour = tint.with_alpha(alpha);

        let scale = view.settings.scale_all;
        let min = self.core.pos;
        let max = min + self.size;
        if self.background.is_empty() {
            out.rect(min * scale, max * scale, colour);
        } else {
            out.image(min * scale, max * scale, self.background.as_str(), colour.a);
        }
        if selected && self.edit {
            let margin = Vec2::splat(BORDER_MARGIN);
            let (lo, hi) = (min - margin, max + margin);
            out.outline(
                vec![
                    lo * scale,
                    Vec2::new(hi.x, lo.y) * scale,
                    hi * scale,
                    Vec2::new(lo.x, hi.y) * scale,
                ],
                BORDER_COLOUR,
            );
        }

        let panel = Panel {
            origin: self.core.pos,
            size: self.size,
            median_ratio: self.median_ratio,
            height_ratio: self.height_ratio,
            edit: self.edit,
        };
        self.median.draw(view, self.core.pos, &panel, out);

        for corner in &self.corners {
            if corner.core.visible {
                corner.draw(view, self.core.pos, out);
            }
        }
        if let Some(handle) = &self.median_handle {
            if handle.core.visible {
                handle.draw(view, self.core.pos, out);
            }
        }
        if let Some(handle) = &self.height_handle {
            if handle.core.visible {
                handle.draw(view, self.core.pos, out);
            }
        }
    }

    pub fn store(&self, rec: &mut Record) -> Result<()> {
        rec.write("width", self.median_ratio)?;
        rec.write("height", self.height_ratio)?;
        rec.write("background", self.background.as_str())?;
        self.median.store(rec.sub("median")?)?;
        rec.write("size", (self.size.x, self.size.y))?;
        self.core.store(rec)
    }

    /// Grips are not restored; the next edit toggle recreates them.
    pub fn load(&mut self, kinds: &KindRegistry, rec: &mut Record) -> Result<()> {
        self.median_ratio = rec.read_float("width", 0.5)? as f32;
        self.height_ratio = rec.read_float("height", 0.5)? as f32;
        self.background = rec.read_str("background", "")?;
        self.median
            .load(kinds, rec.sub("median")?)
            .map_err(|err| err.prefixed("median"))?;
        let (x, y) = rec.read_pair("size", (0.0, 0.0))?;
        self.size = Vec2::new(x as f32, y as f32);
        self.core.load(rec)
    }
}
