use rigdeck_record::{Record, Result};

use crate::draw::DrawList;
use crate::link::LinkHost;
use crate::session::{Session, View};
use crate::structs2d::{Rgba, Vec2};
use crate::widgets::container::Container;
use crate::widgets::kind::KindRegistry;
use crate::widgets::widget::{Frame, Panel, WidgetCore};

/// The mirror axis of an interface, drawn as a thin vertical strip.
/// Selectors hang off the median through its [`Container`], so every
/// pointer event crossing into selector land is localized here first.
#[derive(Debug, Clone)]
pub struct Median {
    pub core: WidgetCore,
    /// Strip width. The height is stretched to the interface on update.
    pub size: Vec2,
    pub container: Container,
}

impl Median {
    pub fn new() -> Self {
        Median {
            core: WidgetCore::new(Vec2::ZERO),
            size: Vec2::new(3.0, 0.0),
            container: Container::new(),
        }
    }

    pub(crate) fn press(&mut self, ctx: &mut Session, point: Vec2, shift: bool) -> bool {
        self.container.press(ctx, self.core.local(point), shift)
    }

    pub(crate) fn hold(&mut self, ctx: &Session, point: Vec2) {
        self.container.hold(ctx, self.core.local(point));
    }

    pub(crate) fn release(&mut self, ctx: &mut Session, frame: &Frame, point: Vec2) {
        self.container.release(ctx, frame, self.core.local(point));
    }

    /// `point` is in interface space.
    pub(crate) fn add_vertex(&mut self, ctx: &mut Session, point: Vec2) {
        self.container.add_vertex(ctx, self.core.local(point));
    }

    pub(crate) fn set_edit(&mut self, ctx: &mut Session, active: bool) {
        self.container.set_edit(ctx, active);
    }

    pub(crate) fn update(&mut self, ctx: &Session) {
        self.container.update(ctx);
    }

    pub(crate) fn update_visibility(&mut self, host: &dyn LinkHost) -> bool {
        self.core.visible = self.container.update_visibility(host);
        self.core.visible
    }

    /// `origin` is the interface position on screen, before overlay scale.
    pub(crate) fn draw(&self, view: &View, origin: Vec2, panel: &Panel, out: &mut DrawList) {
        let at = origin + self.core.pos;
        let colour = if view.settings.symmetry {
            Rgba::new(0.0, 0.0, 0.0, 0.5)
        } else {
            Rgba::TRANSPARENT
        };
        let scale = view.settings.scale_all;
        out.rect(at * scale, (at + self.size) * scale, colour);

        if self.container.core.visible {
            self.container.draw(view, at, panel, out);
        }
    }

    pub fn store(&self, rec: &mut Record) -> Result<()> {
        self.container.store(rec.sub("container")?)?;
        rec.write("size", (self.size.x, self.size.y))?;
        self.core.store(rec)
    }

    pub fn load(&mut self, kinds: &KindRegistry, rec: &mut Record) -> Result<()> {
        self.container
            .load(kinds, rec.sub("container")?)
            .map_err(|err| err.prefixed("container"))?;
        let (x, y) = rec.read_pair("size", (3.0, 0.0))?;
        self.size = Vec2::new(x as f32, y as f32);
        self.core.load(rec)
    }
}
