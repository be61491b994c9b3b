use rigdeck_record::{Record, Result};

use crate::draw::DrawList;
use crate::link::LinkHost;
use crate::session::{Action, Session, SessionState, View};
use crate::settings::Settings;
use crate::structs2d::Vec2;
use crate::widgets::interface::Interface;
use crate::widgets::kind::{KindRegistry, LayerKind, SelectorKind};
use crate::widgets::selector::Selector;

const INTERFACE_SIZE: f32 = 256.0;
const LAYER_COUNT: i64 = 32;

/// What the host hands the board for one dispatch. The board adds its
/// own registry and selection on top to form a [`Session`].
pub struct Env<'a> {
    pub settings: &'a mut Settings,
    pub host: &'a mut dyn LinkHost,
    /// Raw screen size in pixels.
    pub screen: Vec2,
}

fn session<'a>(
    env: &'a mut Env<'_>,
    kinds: &'a KindRegistry,
    state: &'a mut SessionState,
) -> Session<'a> {
    Session {
        settings: &mut *env.settings,
        host: &mut *env.host,
        kinds,
        screen: env.screen,
        state,
    }
}

/// Root of the overlay: the interfaces plus the shared selection, the
/// kind registry and the capture slot for the running gesture. Pointer
/// coordinates arrive raw and are divided by the overall scale here,
/// once, before any dispatch.
pub struct Board {
    pub interfaces: Vec<Interface>,
    pub enabled: bool,
    pub state: SessionState,
    pub kinds: KindRegistry,
    /// Interface holding the pointer between press and release.
    active: Option<usize>,
}

impl Board {
    pub fn new() -> Self {
        Board {
            interfaces: Vec::new(),
            enabled: false,
            state: SessionState::default(),
            kinds: KindRegistry::with_builtin(),
            active: None,
        }
    }

    /// Offers the press to each interface in turn and captures the
    /// first one that takes it, until the matching [`Board::release`].
    /// A press inside any interface drops the selector selection
    /// before dispatch, so only the pressed widget can reclaim it.
    /// `_right` reports the secondary button; the deck treats both
    /// buttons the same. Returns whether the press was consumed.
    pub fn press(&mut self, env: &mut Env, point: Vec2, _right: bool, shift: bool) -> bool {
        if !self.enabled {
            return false;
        }
        let scaled = point / env.settings.scale_all;

        if self
            .interfaces
            .iter()
            .any(|interface| interface.is_inside(scaled))
        {
            self.state.selected_selector = None;
        }

        let mut hit = None;
        {
            let Board {
                interfaces,
                state,
                kinds,
                ..
            } = &mut *self;
            for (index, interface) in interfaces.iter_mut().enumerate() {
                state.current_interface = index;
                let mut ctx = session(env, kinds, state);
                if interface.press(&mut ctx, scaled, shift) {
                    hit = Some(index);
                    break;
                }
            }
        }
        if let Some(index) = hit {
            self.active = Some(index);
            self.state.selected_interface = Some(index);
        }
        self.drain(env);
        hit.is_some()
    }

    /// Routes pointer motion to the captured interface, if any.
    pub fn hold(&mut self, env: &mut Env, point: Vec2) {
        let Some(active) = self.active else {
            return;
        };
        let scaled = point / env.settings.scale_all;
        let Board {
            interfaces,
            state,
            kinds,
            ..
        } = self;
        let Some(interface) = interfaces.get_mut(active) else {
            return;
        };
        state.current_interface = active;
        let ctx = session(env, kinds, state);
        interface.hold(&ctx, scaled);
    }

    /// Ends the captured gesture and releases the capture.
    pub fn release(&mut self, env: &mut Env, point: Vec2) {
        let Some(active) = self.active.take() else {
            return;
        };
        let scaled = point / env.settings.scale_all;
        {
            let Board {
                interfaces,
                state,
                kinds,
                ..
            } = &mut *self;
            let Some(interface) = interfaces.get_mut(active) else {
                return;
            };
            state.current_interface = active;
            let mut ctx = session(env, kinds, state);
            interface.release(&mut ctx, scaled);
        }
        self.drain(env);
    }

    /// Runs work the widgets deferred because it targets an interface
    /// outside the subtree that was borrowed during dispatch.
    fn drain(&mut self, env: &mut Env) {
        loop {
            let pending = self.state.take_pending();
            if pending.is_empty() {
                return;
            }
            for action in pending {
                match action {
                    Action::FinishSelector(path) => {
                        let Board {
                            interfaces,
                            state,
                            kinds,
                            ..
                        } = &mut *self;
                        let Some(interface) = interfaces.get_mut(path.interface) else {
                            continue;
                        };
                        state.current_interface = path.interface;
                        let mut ctx = session(env, kinds, state);
                        interface.median.container.finish_selector(&mut ctx, path.selector);
                    }
                }
            }
        }
    }

    /// Recomputes layout and link visibility for every interface. Call
    /// once per frame before [`Board::draw`].
    pub fn update(&mut self, env: &mut Env) {
        if !self.enabled {
            return;
        }
        let Board {
            interfaces,
            state,
            kinds,
            ..
        } = self;
        for (index, interface) in interfaces.iter_mut().enumerate() {
            state.current_interface = index;
            let ctx = session(env, kinds, state);
            interface.update(&ctx);
        }
    }

    /// Produces the primitives for the whole deck, back to front.
    pub fn draw(&self, settings: &Settings, host: &dyn LinkHost, screen: Vec2) -> DrawList {
        let mut out = DrawList::new();
        if !self.enabled {
            return out;
        }
        for (index, interface) in self.interfaces.iter().enumerate() {
            let view = View {
                settings,
                host,
                screen,
                selected_selector: self.state.selected_selector,
                selected_interface: self.state.selected_interface,
                interface: index,
            };
            interface.draw(&view, &mut out);
        }
        out
    }

    /// Appends a fresh interface, selects it and applies the current
    /// edit mode across the deck. Returns its index.
    pub fn add_interface(&mut self, env: &mut Env) -> usize {
        let index = self.interfaces.len();
        self.interfaces
            .push(Interface::new(Vec2::ZERO, Vec2::splat(INTERFACE_SIZE)));
        self.state.selected_interface = Some(index);
        let editing = env.settings.editing;
        self.set_editing(env, editing);
        log::debug!("added interface {index}");
        index
    }

    /// Removes the selected interface. Selection and capture collapse
    /// onto the new indices.
    pub fn remove_interface(&mut self) -> bool {
        let Some(index) = self.state.selected_interface else {
            return false;
        };
        if index >= self.interfaces.len() {
            return false;
        }
        self.interfaces.remove(index);
        self.state.interface_removed(index);
        self.active = match self.active {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        log::debug!("removed interface {index}");
        true
    }

    /// Adds a ready-made selector to the selected interface and gives
    /// it its initial link state.
    pub fn add_selector(&mut self, env: &mut Env, selector: Selector) -> bool {
        let Some(index) = self.state.selected_interface else {
            return false;
        };
        let Some(interface) = self.interfaces.get_mut(index) else {
            return false;
        };
        let container = &mut interface.median.container;
        let slot = container.selectors.len();
        container.selectors.push(selector);
        container.update_link(&*env.host, slot);
        true
    }

    /// Adds a square layer selector to the selected interface. The
    /// side follows the grid size so the square lands on whole cells.
    pub fn add_layer_selector(&mut self, env: &mut Env, layer: i64) -> bool {
        if !(0..LAYER_COUNT).contains(&layer) {
            log::warn!("layer {layer} is out of range");
            return false;
        }
        let side = env.settings.grid.max(10.0) * 2.0;
        let mut selector = Selector::new(
            Vec2::ZERO,
            SelectorKind::Layer(LayerKind {
                layer,
                armature: String::new(),
            }),
        );
        selector.build = false;
        selector.append_vertex(Vec2::new(side, 0.0));
        selector.append_vertex(Vec2::new(side, side));
        selector.append_vertex(Vec2::new(0.0, side));
        selector.apply_edit(env.settings.editing);
        selector.update_handles();
        self.add_selector(env, selector)
    }

    /// Switches edit mode for the whole deck. Closes running builds on
    /// the way out of edit mode.
    pub fn set_editing(&mut self, env: &mut Env, active: bool) {
        env.settings.editing = active;
        let Board {
            interfaces,
            state,
            kinds,
            ..
        } = self;
        for (index, interface) in interfaces.iter_mut().enumerate() {
            state.current_interface = index;
            let mut ctx = session(env, kinds, state);
            interface.set_edit(&mut ctx, active);
        }
    }

    /// Writes the whole deck into `rec`, which is expected to be
    /// fresh.
    pub fn store(&self, settings: &Settings, rec: &mut Record) -> Result<()> {
        rec.write("grid", settings.grid)?;
        for interface in &self.interfaces {
            interface.store(rec.push("interfaces")?)?;
        }
        Ok(())
    }

    /// Rebuilds the deck from `rec`. The current deck is replaced only
    /// after every interface parsed, so a bad record leaves the board
    /// untouched.
    pub fn load(&mut self, env: &mut Env, rec: &mut Record) -> Result<()> {
        let grid = rec.read_float("grid", f64::from(env.settings.grid))? as f32;

        let mut interfaces = Vec::new();
        while let Some(mut sub) = rec.pop("interfaces")? {
            let index = interfaces.len();
            let mut interface = Interface::new(Vec2::ZERO, Vec2::ZERO);
            interface
                .load(&self.kinds, &mut sub)
                .map_err(|err| err.prefixed(&format!("interfaces[{index}]")))?;
            interfaces.push(interface);
        }

        env.settings.grid = grid;
        self.state = SessionState::default();
        self.state.selected_interface = interfaces.len().checked_sub(1);
        self.active = None;
        self.interfaces = interfaces;
        let editing = env.settings.editing;
        self.set_editing(env, editing);
        log::debug!("loaded {} interfaces", self.interfaces.len());
        Ok(())
    }

    /// Turns the deck on and restores it from `rec`.
    pub fn on_enable(&mut self, env: &mut Env, rec: &mut Record) -> Result<()> {
        self.enabled = true;
        self.load(env, rec)
    }

    /// Turns the deck off, storing it first when autosave is on.
    pub fn on_disable(&mut self, env: &mut Env, rec: &mut Record) -> Result<()> {
        self.enabled = false;
        if env.settings.autosave {
            self.store(env.settings, rec)?;
        }
        Ok(())
    }

    /// Host save hook. Stores the deck when autosave is on.
    pub fn on_before_save(&self, settings: &Settings, rec: &mut Record) -> Result<()> {
        if settings.autosave {
            self.store(settings, rec)?;
        }
        Ok(())
    }
}

// -------------------- Tests --------------------
