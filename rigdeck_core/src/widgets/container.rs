use smallvec::SmallVec;

use rigdeck_record::{Record, Result};

use crate::draw::DrawList;
use crate::link::LinkHost;
use crate::session::{Action, SelectorPath, Session, View};
use crate::settings::round_towards;
use crate::structs2d::{Rgba, Vec2};
use crate::widgets::kind::{BoneKind, KindRegistry, Linkable, SelectorKind};
use crate::widgets::selector::{Dropped, Pressed, Selector};
use crate::widgets::widget::{Frame, Panel, WidgetCore, index_to_int, int_to_index};

const GRID_COLOUR: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.1);

/// Indices of selectors removed by one operation, in removal order.
/// Any index held from before the call must be replayed through
/// [`shifted`] before it is used again.
pub(crate) type Removed = SmallVec<[usize; 2]>;

/// Replays a removal sequence over `index`. `None` means the selector
/// at `index` is gone.
pub(crate) fn shifted(mut index: usize, removed: &[usize]) -> Option<usize> {
    for &gone in removed {
        if index == gone {
            return None;
        }
        if index > gone {
            index -= 1;
        }
    }
    Some(index)
}

/// Position of the first selector at or after `next` that survived
/// `removed`. Keeps a forward sweep stable while it removes entries.
pub(crate) fn advance(mut next: usize, removed: &[usize]) -> usize {
    loop {
        match shifted(next, removed) {
            Some(index) => return index,
            None => next += 1,
        }
    }
}

/// Owns the selectors of one interface and runs every edit that spans
/// more than one of them. Twin references, the build slot and the
/// shared selection all hold indices into `selectors`, so every
/// removal ripples through them before the operation returns.
#[derive(Debug, Clone)]
pub struct Container {
    pub core: WidgetCore,
    pub selectors: Vec<Selector>,
    /// Selector currently collecting vertices, if any.
    pub building: Option<usize>,
}

impl Container {
    pub fn new() -> Self {
        Container {
            core: WidgetCore::new(Vec2::ZERO),
            selectors: Vec::new(),
            building: None,
        }
    }

    fn building_index(&self) -> Option<usize> {
        self.building.filter(|&index| index < self.selectors.len())
    }

    /// Twin of the selector at `index`, dropped when it points outside
    /// the list or back at the selector itself.
    fn valid_twin(&self, index: usize) -> Option<usize> {
        self.selectors[index]
            .twin
            .filter(|&twin| twin != index && twin < self.selectors.len())
    }

    fn pair_mut(&mut self, index: usize, twin: usize) -> (&mut Selector, &mut Selector) {
        if index < twin {
            let (head, tail) = self.selectors.split_at_mut(twin);
            (&mut head[index], &mut tail[0])
        } else {
            let (head, tail) = self.selectors.split_at_mut(index);
            (&mut tail[0], &mut head[twin])
        }
    }

    pub(crate) fn press(&mut self, ctx: &mut Session, point: Vec2, shift: bool) -> bool {
        let local = self.core.local(point);
        for index in 0..self.selectors.len() {
            match self.selectors[index].press(ctx, local) {
                Some(Pressed::Child) | Some(Pressed::Grabbed) => return true,
                Some(Pressed::Clicked) => {
                    self.click_selector(ctx, index, shift);
                    return true;
                }
                None => {}
            }
        }
        false
    }

    pub(crate) fn hold(&mut self, ctx: &Session, point: Vec2) {
        let local = self.core.local(point);
        for selector in &mut self.selectors {
            selector.hold(ctx, local);
        }
    }

    /// Lets every selector close its drag, then applies the single
    /// drop that was reported. Dispatching after the loop keeps the
    /// cross-selector edits off the borrow of the iteration.
    pub(crate) fn release(&mut self, ctx: &mut Session, frame: &Frame, point: Vec2) {
        let local = self.core.local(point);
        let mut dropped = None;
        for (index, selector) in self.selectors.iter_mut().enumerate() {
            if let Some(drop) = selector.release(local) {
                if dropped.is_none() {
                    dropped = Some((index, drop));
                }
            }
        }
        match dropped {
            Some((index, Dropped::Body(at))) => {
                self.selector_dropped(ctx, frame, index, at);
            }
            Some((index, Dropped::Vertex(vertex))) => {
                self.adapt_vertex(ctx, frame, index, vertex);
            }
            Some((index, Dropped::Handle(handle))) => {
                self.adapt_handle(index, handle);
            }
            None => {}
        }
    }

    /// Runs the click protocol: finish whatever was selected before,
    /// move the selection here, then either close this selector's
    /// build or pass the click on to the linked rig.
    pub(crate) fn click_selector(&mut self, ctx: &mut Session, index: usize, shift: bool) -> Removed {
        let mut removed = Removed::new();
        let current = ctx.state.current_interface;

        if let Some(previous) = ctx.state.selected_selector {
            if previous.interface == current {
                removed = self.finish_selector(ctx, previous.selector);
            } else {
                // A selector on another interface is finished once the
                // board gets control back.
                ctx.state.defer(Action::FinishSelector(previous));
            }
        }
        let Some(index) = shifted(index, &removed) else {
            return removed;
        };

        ctx.state.selected_selector = Some(SelectorPath {
            interface: current,
            selector: index,
        });

        if self.selectors[index].build {
            removed.extend(self.finish_selector(ctx, index));
            return removed;
        }

        if !shift {
            self.selectors[index].kind.deselect_all(ctx.host);
        }
        let edit = self.selectors[index].edit;
        self.selectors[index].kind.select_link(ctx.host, edit);
        removed
    }

    /// Ends a build. Polygons with fewer than three vertices delete
    /// themselves and their twin; in symmetry mode a finished build
    /// spawns its mirrored twin by replaying every vertex across the
    /// median.
    pub(crate) fn finish_selector(&mut self, ctx: &mut Session, index: usize) -> Removed {
        let mut removed = Removed::new();
        if index >= self.selectors.len() || !self.selectors[index].build {
            return removed;
        }
        // Clear the flag first so the paths below cannot re-enter.
        self.selectors[index].build = false;

        let mut twin = self.valid_twin(index);

        if self.selectors[index].vertices.len() < 3 {
            let mut alive = Some(index);
            if let Some(twin) = twin {
                let more = self.remove_selector(ctx, twin);
                alive = shifted(index, &more);
                removed.extend(more);
            }
            if let Some(index) = alive {
                removed.extend(self.remove_selector(ctx, index));
            }
            return removed;
        }

        let mut index = index;
        if ctx.settings.symmetry {
            let origin = self.selectors[index].core.pos;
            let points: Vec<Vec2> = self.selectors[index]
                .vertices
                .iter()
                .map(|vertex| vertex.core.pos)
                .collect();

            let mark = removed.len();
            for point in points {
                let mirrored = Vec2::new(
                    self.core.pos.x - origin.x - point.x,
                    self.core.pos.y + origin.y + point.y,
                );
                removed.extend(self.add_vertex(ctx, mirrored));
            }
            let replay = &removed[mark..];
            twin = twin.and_then(|twin| shifted(twin, replay));
            match shifted(index, replay) {
                Some(still) => index = still,
                None => return removed,
            }

            if let Some(building) = self.building_index() {
                self.selectors[index].twin = Some(building);
                self.selectors[building].build = false;
                self.selectors[building].twin = Some(index);
                twin = Some(building);
            }
        }

        if self.selectors[index].edit {
            self.update_link(&*ctx.host, index);
            if let Some(twin) = twin {
                self.update_link(&*ctx.host, twin);
            }
        }

        self.selectors[index].update_handles();
        removed
    }

    /// Removes one selector, finishing any running build first. Twin
    /// references, the build slot and the shared selection collapse
    /// onto the new indices before this returns.
    pub(crate) fn remove_selector(&mut self, ctx: &mut Session, index: usize) -> Removed {
        let mut removed = Removed::new();

        let building = self.building_index();
        self.building = None;
        if let Some(building) = building {
            removed = self.finish_selector(ctx, building);
        }
        let Some(index) = shifted(index, &removed) else {
            return removed;
        };
        if index >= self.selectors.len() {
            return removed;
        }

        for selector in &mut self.selectors {
            match selector.twin {
                Some(twin) if twin == index => selector.twin = None,
                Some(twin) if twin > index => selector.twin = Some(twin - 1),
                _ => {}
            }
        }
        self.building = match self.building {
            Some(slot) if slot == index => None,
            Some(slot) if slot > index => Some(slot - 1),
            other => other,
        };

        self.selectors.remove(index);
        let current = ctx.state.current_interface;
        ctx.state.selector_removed(current, index);
        log::debug!("removed selector {index} from interface {current}");
        removed.push(index);
        removed
    }

    /// A click on empty interface space in edit mode. Feeds the
    /// running build, or starts a new selector at the snapped point.
    pub(crate) fn add_vertex(&mut self, ctx: &mut Session, point: Vec2) -> Removed {
        let local = self.core.local(point);

        if let Some(index) = self.building_index() {
            if self.selectors[index].build {
                return self.feed_vertex(ctx, index, local);
            }
        }

        let pos = ctx.snap(local, true);
        let index = self.selectors.len();
        self.selectors
            .push(Selector::new(pos, SelectorKind::Bone(BoneKind::default())));
        self.building = Some(index);
        ctx.state.selected_selector = Some(SelectorPath {
            interface: ctx.state.current_interface,
            selector: index,
        });
        Removed::new()
    }

    /// Routes one build click into the selector under construction.
    /// Crossing the median in symmetry mode closes the polygon onto
    /// the axis instead of appending.
    fn feed_vertex(&mut self, ctx: &mut Session, index: usize, point: Vec2) -> Removed {
        let mut removed = Removed::new();
        let snapped = ctx.snap(point, self.selectors[index].core.grid_snap);

        if ctx.settings.symmetry && snapped.x * self.selectors[index].core.pos.x < 0.0 {
            // A lone segment cannot close onto the median.
            if self.selectors[index].vertices.len() < 2 {
                return removed;
            }
            if self.selectors[index].connect_with_median() {
                self.selectors[index].mirror = true;
            }
            let more = self.finish_selector(ctx, index);
            let index = shifted(index, &more);
            removed.extend(more);
            if let Some(index) = index {
                if let Some(twin) = self.valid_twin(index) {
                    self.selectors[twin].mirror = self.selectors[index].mirror;
                }
            }
        } else if !self.selectors[index].append_vertex(snapped) {
            removed.extend(self.finish_selector(ctx, index));
        }
        removed
    }

    /// Body drag finished. Reapplies selection, clamps mirrored
    /// selectors back onto the median, mirrors the move into the twin
    /// and deletes the pair when the drop left the interface.
    fn selector_dropped(&mut self, ctx: &mut Session, frame: &Frame, index: usize, point: Vec2) -> Removed {
        let snapped = ctx.snap(point, self.selectors[index].core.grid_snap);

        let mut removed = self.click_selector(ctx, index, false);
        let Some(index) = shifted(index, &removed) else {
            return removed;
        };
        let more = self.finish_selector(ctx, index);
        let index = shifted(index, &more);
        removed.extend(more);
        let Some(index) = index else {
            return removed;
        };

        if self.selectors[index].mirror {
            self.selectors[index].core.pos.x = 0.0;
        }
        let twin = self.valid_twin(index);
        if let Some(twin) = twin {
            let pos = self.selectors[index].core.pos;
            self.selectors[twin].core.pos = Vec2::new(-pos.x, pos.y);
        }

        let world = snapped + self.selectors[index].core.pos + self.core.pos + frame.origin;
        if !frame.contains(world) {
            let mut alive = Some(index);
            if let Some(twin) = twin {
                let more = self.remove_selector(ctx, twin);
                alive = shifted(index, &more);
                removed.extend(more);
            }
            if let Some(index) = alive {
                removed.extend(self.remove_selector(ctx, index));
            }
            return removed;
        }

        self.selectors[index].update_handles();
        removed
    }

    /// A vertex drag finished. Mirror correction first, then the
    /// deletion checks, then convexity repair and the twin morph, each
    /// index replayed over the removals the earlier steps caused.
    fn adapt_vertex(&mut self, ctx: &mut Session, frame: &Frame, index: usize, vertex: usize) -> Removed {
        let mut removed = Removed::new();

        self.selectors[index].correct_mirror(vertex);

        let num = self.selectors[index].vertices.len();
        let twin = self.valid_twin(index);

        let selector = &self.selectors[index];
        let world =
            selector.vertices[vertex].core.pos + selector.core.pos + self.core.pos + frame.origin;
        let is_mirrored = selector.mirror && (vertex == 0 || vertex + 1 == num);
        let is_switching =
            (selector.core.pos.x + selector.vertices[vertex].core.pos.x) * selector.core.pos.x < 0.0;
        let building = selector.build;
        let out_of_bounds = !frame.contains(world);

        let mut alive = Some(index);
        if (out_of_bounds && !is_mirrored) || (building && is_switching) {
            if num <= 3 {
                if let Some(twin) = twin {
                    let more = self.remove_selector(ctx, twin);
                    alive = shifted(index, &more);
                    removed.extend(more);
                }
                if let Some(index) = alive {
                    removed.extend(self.remove_selector(ctx, index));
                }
                alive = None;
            } else {
                self.selectors[index].remove_vertex(vertex);
                if building && is_switching {
                    if self.selectors[index].connect_with_median() {
                        self.selectors[index].mirror = true;
                    }
                    let more = self.finish_selector(ctx, index);
                    alive = shifted(index, &more);
                    removed.extend(more);
                    if let Some(index) = alive {
                        if let Some(twin) = self.valid_twin(index) {
                            self.selectors[twin].mirror = self.selectors[index].mirror;
                        }
                    }
                } else if let Some(twin) = twin {
                    let twin = &mut self.selectors[twin];
                    if vertex < twin.vertices.len() {
                        twin.remove_vertex(vertex);
                    }
                    twin.update_handles();
                }
            }
        } else {
            if num >= 4 {
                self.selectors[index].correct_convex(vertex);
            }
            if let Some(twin) = twin {
                let (selector, twin) = self.pair_mut(index, twin);
                if vertex < twin.vertices.len() {
                    let x = selector.core.pos.x + selector.vertices[vertex].core.pos.x
                        + twin.core.pos.x;
                    let y = selector.core.pos.y + selector.vertices[vertex].core.pos.y
                        - twin.core.pos.y;
                    twin.vertices[vertex].core.pos = Vec2::new(-x, y);
                }
                twin.update_handles();
            }
        }

        if let Some(index) = alive {
            let more = self.click_selector(ctx, index, false);
            let index = shifted(index, &more);
            removed.extend(more);
            if let Some(index) = index {
                self.selectors[index].update_handles();
            }
        }
        removed
    }

    /// An edge handle drag finished: it becomes a real vertex at its
    /// dropped position, mirrored into the twin at the same index.
    fn adapt_handle(&mut self, index: usize, handle: usize) {
        let at = self.selectors[index].handles[handle].core.pos;
        self.selectors[index].insert_vertex(handle, at);
        self.selectors[index].correct_convex(handle);

        if let Some(twin) = self.valid_twin(index) {
            let (selector, twin) = self.pair_mut(index, twin);
            let x = selector.core.pos.x + selector.vertices[handle].core.pos.x + twin.core.pos.x;
            let y = selector.core.pos.y + selector.vertices[handle].core.pos.y - twin.core.pos.y;
            twin.insert_vertex(handle, Vec2::new(-x, y));
            twin.update_handles();
        }
        self.selectors[index].update_handles();
    }

    /// Applies edit mode to every selector, closing running builds on
    /// the way through.
    pub(crate) fn set_edit(&mut self, ctx: &mut Session, active: bool) {
        let mut index = 0;
        while index < self.selectors.len() {
            self.selectors[index].apply_edit(active);
            let removed = self.finish_selector(ctx, index);
            if let Some(still) = shifted(index, &removed) {
                self.selectors[still].update_handles();
            }
            index = advance(index + 1, &removed);
        }
    }

    /// Keeps the selected selector, and through it its mirror pair,
    /// linked to whatever the host activated since the last pass.
    pub(crate) fn update(&mut self, ctx: &Session) {
        let Some(path) = ctx.state.selected_selector else {
            return;
        };
        if path.interface != ctx.state.current_interface {
            return;
        }
        for index in 0..self.selectors.len() {
            let selector = &self.selectors[index];
            let selected = index == path.selector
                || (selector.mirror && selector.twin == Some(path.selector));
            if selected && selector.edit {
                self.update_link(&*ctx.host, index);
            }
        }
    }

    /// Refreshes a selector's link from the host's active target and
    /// keeps a mirrored pair on the same link.
    pub(crate) fn update_link(&mut self, host: &dyn LinkHost, index: usize) {
        self.selectors[index].kind.update_link(host);
        if !self.selectors[index].mirror {
            return;
        }
        if let Some(twin) = self.valid_twin(index) {
            let (selector, twin) = self.pair_mut(index, twin);
            twin.kind.adopt(&selector.kind);
        }
    }

    /// A container with no selectors stays visible so a freshly added
    /// interface still draws its body.
    pub(crate) fn update_visibility(&mut self, host: &dyn LinkHost) -> bool {
        let mut any = false;
        for selector in &mut self.selectors {
            any = selector.update_visibility(host) || any;
        }
        self.core.visible = any || self.selectors.is_empty();
        self.core.visible
    }

    pub(crate) fn draw(&self, view: &View, at: Vec2, panel: &Panel, out: &mut DrawList) {
        let settings = view.settings;
        if settings.grid > 0.0 && panel.edit {
            let origin = panel.origin;
            let center = Vec2::new(at.x, at.y + self.core.pos.y);
            let corner = Vec2::new(origin.x + panel.size.x, at.y + panel.size.y);

            // Align the line raster so the median sits on a grid line.
            let offset = Vec2::new(
                round_towards(panel.size.x * panel.median_ratio, 0.5, settings.grid),
                round_towards(panel.size.y * panel.height_ratio, 0.5, settings.grid),
            );
            let mut start = center - offset;
            let mut end = start + panel.size;

            if start.x < origin.x {
                start.x += settings.grid;
            }
            if start.y < origin.y {
                start.y += settings.grid;
            }
            if end.x > origin.x + panel.size.x {
                end.x -= settings.grid;
            }
            if end.y > origin.y + panel.size.y {
                end.y -= settings.grid;
            }

            let scale = settings.scale_all;
            let mut x = start.x;
            while x < end.x {
                out.line(
                    Vec2::new(x, origin.y) * scale,
                    Vec2::new(x, corner.y) * scale,
                    GRID_COLOUR,
                );
                x += settings.grid;
            }
            let mut y = start.y;
            while y < end.y {
                out.line(
                    Vec2::new(origin.x, y) * scale,
                    Vec2::new(corner.x, y) * scale,
                    GRID_COLOUR,
                );
                y += settings.grid;
            }
        }

        for (index, selector) in self.selectors.iter().enumerate() {
            if !selector.core.visible {
                continue;
            }
            let selected = match view.selected_selector {
                Some(path) if path.interface == view.interface => {
                    path.selector == index
                        || (selector.mirror && selector.twin == Some(path.selector))
                }
                _ => false,
            };
            selector.draw(view, at + self.core.pos, selected, out);
        }
    }

    pub fn store(&self, rec: &mut Record) -> Result<()> {
        for selector in &self.selectors {
            let sub = rec.push("selectors")?;
            sub.write("class", selector.kind.tag())?;
            selector.store(sub)?;
        }
        rec.write("building", index_to_int(self.building))?;
        self.core.store(rec)
    }

    pub fn load(&mut self, kinds: &KindRegistry, rec: &mut Record) -> Result<()> {
        self.selectors.clear();
        while let Some(mut sub) = rec.pop("selectors")? {
            let tag = sub.read_str("class", "Selector")?;
            let kind = kinds.create(&tag)?;
            let index = self.selectors.len();
            let mut selector = Selector::new(Vec2::ZERO, kind);
            selector
                .load(&mut sub)
                .map_err(|err| err.prefixed(&format!("selectors[{index}]")))?;
            self.selectors.push(selector);
        }
        self.building = int_to_index(rec.read_int("building", -1)?);
        self.core.load(rec)
    }
}

// -------------------- Tests --------------------
