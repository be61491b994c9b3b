use rigdeck_record::{Record, RecordError, Result};

use crate::draw::DrawList;
use crate::link::LinkHost;
use crate::session::{Session, View};
use crate::structs2d::{Rgba, Vec2};
use crate::widgets::kind::{Linkable, SelectorKind};
use crate::widgets::vertex::{HANDLE_RADIUS, VERTEX_RADIUS, Vertex};
use crate::widgets::widget::{WidgetCore, index_to_int, int_to_index};

/// What a press landed on inside a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pressed {
    /// A vertex or edge handle took the grab.
    Child,
    /// The body took the grab, the selector is now being moved.
    Grabbed,
    /// The body was hit outside edit mode, a plain click.
    Clicked,
}

/// What finished when the pointer was released over a selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Dropped {
    /// The body drag ended at this selector-local point.
    Body(Vec2),
    /// The vertex with this index finished a drag.
    Vertex(usize),
    /// The edge handle with this index finished a drag.
    Handle(usize),
}

/// One convex polygon region. Vertices are selector-local and ordered
/// along the hull; `handles` sit on the edge midpoints and spawn new
/// vertices when dragged. A mirrored selector keeps its head and tail
/// vertex on the median and shadows a twin on the other side.
#[derive(Debug, Clone)]
pub struct Selector {
    pub core: WidgetCore,
    pub kind: SelectorKind,
    /// Still collecting vertices, clicks feed the polygon.
    pub build: bool,
    pub edit: bool,
    pub mirror: bool,
    /// Container index of the mirrored counterpart.
    pub twin: Option<usize>,
    pub vertices: Vec<Vertex>,
    pub handles: Vec<Vertex>,
}

/// 2D cross product of (b - a) and (c - a). Sign gives the turn
/// direction at b when walking a, b, c.
fn cross(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

impl Selector {
    pub fn new(pos: Vec2, kind: SelectorKind) -> Self {
        let mut core = WidgetCore::new(pos);
        core.active = true;
        core.grid_snap = true;
        let mut selector = Selector {
            core,
            kind,
            build: true,
            edit: true,
            mirror: false,
            twin: None,
            vertices: vec![Vertex::new(Vec2::ZERO, VERTEX_RADIUS, 0)],
            handles: Vec::new(),
        };
        selector.update_handles();
        selector
    }

    /// Polygon hit test, `point` in the owner's space. Works for both
    /// windings; anything with fewer than three vertices has no area.
    pub fn is_inside(&self, point: Vec2) -> bool {
        let num = self.vertices.len();
        if num <= 2 {
            return false;
        }
        let local = self.core.local(point);
        let dir = cross(
            self.vertices[0].core.pos,
            self.vertices[1].core.pos,
            self.vertices[2].core.pos,
        );
        for index in 0..num {
            let before = self.vertices[(index + num - 1) % num].core.pos;
            let side = cross(before, self.vertices[index].core.pos, local);
            if side * dir < 0.0 {
                return false;
            }
        }
        true
    }

    /// True when every corner turns the same way as the polygon.
    pub fn is_convex(&self) -> bool {
        let num = self.vertices.len();
        if num <= 2 {
            return true;
        }
        let dir = cross(
            self.vertices[0].core.pos,
            self.vertices[1].core.pos,
            self.vertices[2].core.pos,
        );
        for index in 0..num {
            let first = self.vertices[(index + num - 2) % num].core.pos;
            let second = self.vertices[(index + num - 1) % num].core.pos;
            let turn = cross(first, second, self.vertices[index].core.pos);
            if turn * dir < 0.0 {
                return false;
            }
        }
        true
    }

    /// Routes a press to the vertices and handles first, then to the
    /// body. In edit mode a body press starts a move, otherwise it is
    /// reported as a click for the owner to act on.
    pub(crate) fn press(&mut self, ctx: &Session, point: Vec2) -> Option<Pressed> {
        if !self.core.active || !self.core.visible {
            return None;
        }
        let local = self.core.local(point);
        for vertex in &mut self.vertices {
            if vertex.press(ctx, local) {
                return Some(Pressed::Child);
            }
        }
        for handle in &mut self.handles {
            if handle.press(ctx, local) {
                return Some(Pressed::Child);
            }
        }
        if !self.is_inside(point) {
            return None;
        }
        if self.edit {
            self.core.begin_grab(local);
            return Some(Pressed::Grabbed);
        }
        Some(Pressed::Clicked)
    }

    pub(crate) fn hold(&mut self, ctx: &Session, point: Vec2) {
        if self.core.drag(ctx, point) {
            return;
        }
        let local = self.core.local(point);
        for vertex in &mut self.vertices {
            vertex.hold(ctx, local);
        }
        for handle in &mut self.handles {
            handle.hold(ctx, local);
        }
    }

    /// Ends whichever grab this selector holds and reports it. At most
    /// one child can be grabbed at a time, so at most one drop comes
    /// back and the owner inspects it to run the follow-up edits.
    pub(crate) fn release(&mut self, point: Vec2) -> Option<Dropped> {
        let local = self.core.local(point);
        if self.core.end_grab() {
            return Some(Dropped::Body(local));
        }
        for (index, vertex) in self.vertices.iter_mut().enumerate() {
            if vertex.release() {
                return Some(Dropped::Vertex(index));
            }
        }
        for (index, handle) in self.handles.iter_mut().enumerate() {
            if handle.release() {
                return Some(Dropped::Handle(index));
            }
        }
        None
    }

    /// Appends a build vertex at a snapped owner-space point. Refuses
    /// points that would fold the first or last edge back onto the
    /// polygon; the owner closes the build on refusal.
    pub(crate) fn append_vertex(&mut self, point: Vec2) -> bool {
        let local = point - self.core.pos;
        let num = self.vertices.len();
        if num >= 3 {
            let dir = cross(
                self.vertices[0].core.pos,
                self.vertices[1].core.pos,
                self.vertices[2].core.pos,
            );
            let first = cross(local, self.vertices[0].core.pos, self.vertices[1].core.pos);
            let last = cross(
                self.vertices[num - 2].core.pos,
                self.vertices[num - 1].core.pos,
                local,
            );
            if last * dir < 0.0 || first * dir < 0.0 {
                return false;
            }
        }
        self.vertices.push(Vertex::new(local, VERTEX_RADIUS, num));
        self.update_handles();
        true
    }

    /// Moves the selector onto the median and closes the open chain
    /// with a head and tail vertex sitting on it. Fails when the closed
    /// shape would not be convex; needs at least two vertices.
    pub(crate) fn connect_with_median(&mut self) -> bool {
        let num = self.vertices.len();
        let first = self.vertices[0].core.pos.y;
        let last = self.vertices[num - 1].core.pos.y;
        let top = Vec2::new(-self.core.pos.x, first);
        let bot = Vec2::new(-self.core.pos.x, last);

        let tail = cross(
            self.vertices[num - 2].core.pos,
            self.vertices[num - 1].core.pos,
            bot,
        );
        let below = cross(self.vertices[num - 1].core.pos, bot, top);
        let above = cross(bot, top, self.vertices[0].core.pos);
        let head = cross(top, self.vertices[0].core.pos, self.vertices[1].core.pos);
        if tail * below < 0.0 || below * above < 0.0 || above * head < 0.0 {
            return false;
        }

        // Counteract moving the selector origin onto the median.
        let shift = self.core.pos.x;
        for vertex in &mut self.vertices {
            vertex.core.pos.x += shift;
            vertex.index += 1;
        }
        self.core.pos.x = 0.0;

        self.vertices
            .insert(0, Vertex::new(Vec2::new(0.0, first), VERTEX_RADIUS, 0));
        let end = self.vertices.len();
        self.vertices
            .push(Vertex::new(Vec2::new(0.0, last), VERTEX_RADIUS, end));
        true
    }

    /// Rebuilds the edge handles, one per edge, on the midpoints.
    pub(crate) fn update_handles(&mut self) {
        let num = self.vertices.len();
        self.handles.truncate(num);
        while self.handles.len() < num {
            let index = self.handles.len();
            self.handles.push(Vertex::new(Vec2::ZERO, HANDLE_RADIUS, index));
        }
        for index in 0..num {
            let before = self.vertices[(index + num - 1) % num].core.pos;
            let after = self.vertices[index].core.pos;
            let handle = &mut self.handles[index];
            handle.index = index;
            handle.core.pos = before.midpoint(after);
            handle.core.active = self.edit;
            handle.core.visible = self.edit;
        }
    }

    /// Pins the head and tail vertex back onto the median.
    pub(crate) fn correct_mirror(&mut self, index: usize) {
        if self.mirror && (index == 0 || index + 1 == self.vertices.len()) {
            self.vertices[index].core.pos.x = 0.0;
        }
    }

    /// Pulls a vertex that broke convexity back between its
    /// neighbours.
    pub(crate) fn correct_convex(&mut self, index: usize) {
        if self.is_convex() {
            return;
        }
        let num = self.vertices.len();
        let before = self.vertices[(index + num - 1) % num].core.pos;
        let after = self.vertices[(index + 1) % num].core.pos;
        self.vertices[index].core.pos = before.midpoint(after);
        self.correct_mirror(index);
    }

    pub(crate) fn remove_vertex(&mut self, index: usize) {
        if index >= self.vertices.len() {
            return;
        }
        self.vertices.remove(index);
        for i in index..self.vertices.len() {
            self.vertices[i].index = i;
        }
    }

    pub(crate) fn insert_vertex(&mut self, index: usize, pos: Vec2) {
        let index = index.min(self.vertices.len());
        self.vertices.insert(index, Vertex::new(pos, VERTEX_RADIUS, index));
        for i in index..self.vertices.len() {
            self.vertices[i].index = i;
        }
    }

    /// Switches the vertices in and out of edit mode. The owner closes
    /// any running build and refreshes the handles afterwards.
    pub(crate) fn apply_edit(&mut self, active: bool) {
        for vertex in &mut self.vertices {
            vertex.core.active = active;
        }
        self.edit = active;
    }

    /// Hides the selector while its link target is hidden, except in
    /// edit mode. Returns the resulting visibility.
    pub(crate) fn update_visibility(&mut self, host: &dyn LinkHost) -> bool {
        self.core.visible =
            !(self.kind.is_linked() && !self.edit && !self.kind.is_link_visible(host));
        self.core.visible
    }

    pub(crate) fn draw(&self, view: &View, origin: Vec2, selected: bool, out: &mut DrawList) {
        if self.vertices.is_empty() {
            return;
        }
        let at = origin + self.core.pos;
        let selected = selected && self.edit;

        let alpha = if self.kind.is_link_selected(view.host) {
            0.5
        } else {
            0.1
        };
        let colour = if self.build {
            Rgba::new(1.0, 1.0, 1.0, 0.5)
        } else if self.kind.is_linked() {
            self.kind.link_colour(view.host)
        } else {
            self.kind.base_colour()
        };
        let border = if selected {
            Rgba::new(1.0, 1.0, 1.0, alpha)
        } else {
            colour
        };

        let scale = view.settings.scale_all;
        let points: Vec<Vec2> = self
            .vertices
            .iter()
            .map(|vertex| (at + vertex.core.pos) * scale)
            .collect();
        out.poly(points.clone(), colour.faded(alpha));
        out.outline(points, border);

        if self.edit {
            for vertex in &self.vertices {
                if vertex.core.visible {
                    vertex.draw(view, at, out);
                }
            }
            for handle in &self.handles {
                if handle.core.visible {
                    handle.draw(view, at, out);
                }
            }
        }
    }

    pub fn store(&self, rec: &mut Record) -> Result<()> {
        self.kind.store(rec)?;
        rec.write("build", self.build)?;
        rec.write("mirror", self.mirror)?;
        for vertex in &self.vertices {
            vertex.store(rec.push("vertices")?)?;
        }
        rec.write("twin", index_to_int(self.twin))?;
        self.core.store(rec)
    }

    pub fn load(&mut self, rec: &mut Record) -> Result<()> {
        self.kind.load(rec)?;
        self.edit = false;
        self.build = rec.read_bool("build", false)?;
        self.mirror = rec.read_bool("mirror", false)?;

        self.vertices.clear();
        while let Some(mut sub) = rec.pop("vertices")? {
            let mut vertex = Vertex::new(Vec2::ZERO, VERTEX_RADIUS, 0);
            vertex.load(&mut sub)?;
            vertex.core.active = self.edit;
            self.vertices.push(vertex);
        }
        if !self.is_convex() {
            return Err(RecordError::invalid("vertices", "shape not convex"));
        }

        self.twin = int_to_index(rec.read_int("twin", -1)?);
        self.update_handles();
        self.core.load(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::NullHost;
    use crate::session::SessionState;
    use crate::settings::Settings;
    use crate::widgets::kind::{KindRegistry, PlainKind};

    struct Bench {
        settings: Settings,
        host: NullHost,
        kinds: KindRegistry,
        state: SessionState,
    }

    impl Bench {
        fn new() -> Self {
            Bench {
                settings: Settings::default(),
                host: NullHost,
                kinds: KindRegistry::with_builtin(),
                state: SessionState::default(),
            }
        }

        fn session(&mut self) -> Session<'_> {
            Session {
                settings: &mut self.settings,
                host: &mut self.host,
                kinds: &self.kinds,
                screen: Vec2::new(1920.0, 1080.0),
                state: &mut self.state,
            }
        }
    }

    fn polygon(points: &[(f32, f32)]) -> Selector {
        let mut selector = Selector::new(Vec2::ZERO, SelectorKind::Plain(PlainKind));
        selector.vertices.clear();
        for (index, (x, y)) in points.iter().enumerate() {
            selector
                .vertices
                .push(Vertex::new(Vec2::new(*x, *y), VERTEX_RADIUS, index));
        }
        selector.build = false;
        selector.update_handles();
        selector
    }

    // -------------------- Geometry --------------------

    #[test]
    fn test_hit_test_both_windings() {
        let ccw = polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        let cw = polygon(&[(0.0, 0.0), (5.0, 8.0), (10.0, 0.0)]);
        let inside = Vec2::new(5.0, 3.0);
        let outside = Vec2::new(-2.0, 3.0);
        assert!(ccw.is_inside(inside));
        assert!(cw.is_inside(inside));
        assert!(!ccw.is_inside(outside));
        assert!(!cw.is_inside(outside));
    }

    #[test]
    fn test_degenerate_polygon_has_no_area() {
        let line = polygon(&[(0.0, 0.0), (10.0, 0.0)]);
        assert!(!line.is_inside(Vec2::new(5.0, 0.0)));
        assert!(line.is_convex());
    }

    #[test]
    fn test_convexity_detects_reflex_corner() {
        let convex = polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let reflex = polygon(&[(0.0, 0.0), (10.0, 0.0), (3.0, 3.0), (0.0, 10.0)]);
        assert!(convex.is_convex());
        assert!(!reflex.is_convex());
    }

    #[test]
    fn test_correct_convex_moves_to_neighbour_midpoint() {
        let mut selector = polygon(&[(0.0, 0.0), (10.0, 0.0), (3.0, 3.0), (0.0, 10.0)]);
        selector.correct_convex(2);
        assert_eq!(selector.vertices[2].core.pos, Vec2::new(5.0, 5.0));
        assert!(selector.is_convex());
    }

    // -------------------- Building --------------------

    #[test]
    fn test_append_vertex_extends_hull() {
        let mut selector = Selector::new(Vec2::new(50.0, 50.0), SelectorKind::Plain(PlainKind));
        assert!(selector.append_vertex(Vec2::new(60.0, 50.0)));
        assert!(selector.append_vertex(Vec2::new(60.0, 60.0)));
        assert!(selector.append_vertex(Vec2::new(50.0, 60.0)));
        assert_eq!(selector.vertices.len(), 4);
        assert_eq!(selector.vertices[3].core.pos, Vec2::new(0.0, 10.0));
        assert_eq!(selector.handles.len(), 4);
    }

    #[test]
    fn test_append_vertex_rejects_folded_edge() {
        let mut selector = Selector::new(Vec2::new(50.0, 50.0), SelectorKind::Plain(PlainKind));
        assert!(selector.append_vertex(Vec2::new(60.0, 50.0)));
        assert!(selector.append_vertex(Vec2::new(60.0, 60.0)));
        assert!(selector.append_vertex(Vec2::new(50.0, 60.0)));
        assert!(!selector.append_vertex(Vec2::new(45.0, 45.0)));
        assert_eq!(selector.vertices.len(), 4);
    }

    #[test]
    fn test_connect_with_median_closes_onto_axis() {
        let mut selector = polygon(&[(10.0, 40.0), (20.0, 20.0), (10.0, 0.0)]);
        selector.core.pos = Vec2::new(30.0, 0.0);
        assert!(selector.connect_with_median());
        assert_eq!(selector.core.pos.x, 0.0);
        let positions: Vec<Vec2> = selector.vertices.iter().map(|v| v.core.pos).collect();
        assert_eq!(
            positions,
            vec![
                Vec2::new(0.0, 40.0),
                Vec2::new(40.0, 40.0),
                Vec2::new(50.0, 20.0),
                Vec2::new(40.0, 0.0),
                Vec2::new(0.0, 0.0),
            ]
        );
        for (index, vertex) in selector.vertices.iter().enumerate() {
            assert_eq!(vertex.index, index);
        }
        assert!(selector.is_convex());
    }

    #[test]
    fn test_connect_with_median_rejects_folded_chain() {
        let mut selector = polygon(&[(10.0, 0.0), (30.0, 20.0), (10.0, 10.0)]);
        selector.core.pos = Vec2::new(30.0, 0.0);
        assert!(!selector.connect_with_median());
        assert_eq!(selector.vertices.len(), 3);
        assert_eq!(selector.core.pos.x, 30.0);
    }

    // -------------------- Handles --------------------

    #[test]
    fn test_handles_sit_on_edge_midpoints() {
        let selector = polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        assert_eq!(selector.handles.len(), 3);
        assert_eq!(selector.handles[0].core.pos, Vec2::new(2.5, 4.0));
        assert_eq!(selector.handles[1].core.pos, Vec2::new(5.0, 0.0));
        assert_eq!(selector.handles[2].core.pos, Vec2::new(7.5, 4.0));
    }

    #[test]
    fn test_insert_vertex_renumbers() {
        let mut selector = polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        selector.insert_vertex(1, Vec2::new(5.0, -2.0));
        assert_eq!(selector.vertices.len(), 4);
        for (index, vertex) in selector.vertices.iter().enumerate() {
            assert_eq!(vertex.index, index);
        }
        selector.remove_vertex(1);
        for (index, vertex) in selector.vertices.iter().enumerate() {
            assert_eq!(vertex.index, index);
        }
    }

    // -------------------- Dispatch --------------------

    #[test]
    fn test_press_routes_by_mode() {
        let mut bench = Bench::new();
        let mut selector = polygon(&[(0.0, 0.0), (40.0, 0.0), (40.0, 40.0), (0.0, 40.0)]);
        selector.apply_edit(true);
        selector.update_handles();

        let ctx = bench.session();
        assert_eq!(
            selector.press(&ctx, Vec2::new(2.0, 1.0)),
            Some(Pressed::Child)
        );
        assert!(selector.vertices[0].core.is_grabbing());
        assert!(selector.vertices[0].release());

        assert_eq!(
            selector.press(&ctx, Vec2::new(20.0, 20.0)),
            Some(Pressed::Grabbed)
        );
        assert!(selector.core.end_grab());

        selector.apply_edit(false);
        assert_eq!(
            selector.press(&ctx, Vec2::new(20.0, 20.0)),
            Some(Pressed::Clicked)
        );
        assert_eq!(selector.press(&ctx, Vec2::new(-5.0, 20.0)), None);
    }

    #[test]
    fn test_release_reports_single_drop() {
        let mut bench = Bench::new();
        let mut selector = polygon(&[(0.0, 0.0), (40.0, 0.0), (40.0, 40.0), (0.0, 40.0)]);
        selector.apply_edit(true);
        selector.update_handles();

        let ctx = bench.session();
        assert!(selector.press(&ctx, Vec2::new(20.0, 20.0)).is_some());
        match selector.release(Vec2::new(25.0, 20.0)) {
            Some(Dropped::Body(point)) => assert_eq!(point, Vec2::new(25.0, 20.0)),
            other => panic!("expected a body drop, got {other:?}"),
        }
        assert_eq!(selector.release(Vec2::new(25.0, 20.0)), None);
    }

    #[test]
    fn test_drag_moves_selector_with_grid() {
        let mut bench = Bench::new();
        bench.settings.grid = 10.0;
        let mut selector = polygon(&[(0.0, 0.0), (40.0, 0.0), (40.0, 40.0), (0.0, 40.0)]);
        selector.apply_edit(true);

        let ctx = bench.session();
        assert_eq!(
            selector.press(&ctx, Vec2::new(20.0, 20.0)),
            Some(Pressed::Grabbed)
        );
        selector.hold(&ctx, Vec2::new(33.0, 20.0));
        assert_eq!(selector.core.pos, Vec2::new(10.0, 0.0));
    }

    // -------------------- Persistence --------------------

    #[test]
    fn test_store_load_round_trip() {
        let mut selector = polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        selector.core.pos = Vec2::new(12.0, 34.0);
        selector.mirror = true;
        selector.twin = Some(2);

        let mut rec = Record::new();
        selector.store(&mut rec).unwrap();

        let mut loaded = Selector::new(Vec2::ZERO, SelectorKind::Plain(PlainKind));
        loaded.load(&mut rec).unwrap();
        assert_eq!(loaded.core.pos, Vec2::new(12.0, 34.0));
        assert!(!loaded.build);
        assert!(loaded.mirror);
        assert_eq!(loaded.twin, Some(2));
        assert_eq!(loaded.vertices.len(), 3);
        assert_eq!(loaded.vertices[2].core.pos, Vec2::new(5.0, 8.0));
        assert_eq!(loaded.handles.len(), 3);
        assert!(!loaded.edit);
        assert!(!loaded.vertices[0].core.active);
    }

    #[test]
    fn test_load_rejects_non_convex_shape() {
        let mut rec = Record::new();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (3.0, 3.0), (0.0, 10.0)] {
            rec.push("vertices").unwrap().write("pos", (x, y)).unwrap();
        }
        let mut selector = Selector::new(Vec2::ZERO, SelectorKind::Plain(PlainKind));
        let err = selector.load(&mut rec).unwrap_err();
        assert_eq!(err.to_string(), "shape not convex at [vertices]");
    }

    // -------------------- Visibility --------------------

    #[test]
    fn test_hidden_link_hides_selector_outside_edit() {
        struct HiddenHost;
        impl LinkHost for HiddenHost {
            fn active_target(&self) -> Option<crate::link::LinkTarget> {
                None
            }
            fn is_link_visible(&self, _armature: &str, _bone: &str) -> bool {
                false
            }
            fn is_link_selected(&self, _armature: &str, _bone: &str) -> bool {
                false
            }
            fn toggle_link(&mut self, _armature: &str, _bone: &str) {}
            fn deselect_all(&mut self) {}
            fn link_colour(&self, _armature: &str, _bone: &str) -> Option<Rgba> {
                None
            }
            fn is_layer_enabled(&self, _armature: &str, _layer: i64) -> bool {
                false
            }
            fn toggle_layer(&mut self, _armature: &str, _layer: i64) {}
            fn activate_armature(&mut self, _armature: &str) {}
        }

        let mut selector = polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        selector.kind = SelectorKind::Bone(crate::widgets::kind::BoneKind {
            linked: true,
            armature: "Rig".into(),
            bone: "spine".into(),
        });
        selector.apply_edit(false);
        assert!(!selector.update_visibility(&HiddenHost));
        selector.apply_edit(true);
        assert!(selector.update_visibility(&HiddenHost));
    }
}
