use crate::link::LinkHost;
use crate::settings::Settings;
use crate::structs2d::Vec2;
use crate::widgets::kind::KindRegistry;

/// Identifies one selector inside the board tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorPath {
    pub interface: usize,
    pub selector: usize,
}

/// Work that must run after the current dispatch pass, because it
/// targets a widget outside the subtree currently borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FinishSelector(SelectorPath),
}

/// Selection and build bookkeeping shared across the whole deck.
/// Indices in here are kept valid by the removal hooks below; nothing
/// else may outlive a removal.
#[derive(Debug, Default)]
pub struct SessionState {
    pub selected_selector: Option<SelectorPath>,
    pub selected_interface: Option<usize>,
    /// Interface currently being dispatched into.
    pub current_interface: usize,
    pending: Vec<Action>,
}

impl SessionState {
    pub fn defer(&mut self, action: Action) {
        self.pending.push(action);
    }

    pub fn take_pending(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }

    /// Call immediately after a selector leaves its container, in the
    /// same step, so no stale index survives into the next dispatch.
    pub fn selector_removed(&mut self, interface: usize, index: usize) {
        if let Some(path) = self.selected_selector {
            if path.interface == interface {
                if path.selector == index {
                    self.selected_selector = None;
                } else if path.selector > index {
                    self.selected_selector = Some(SelectorPath {
                        interface,
                        selector: path.selector - 1,
                    });
                }
            }
        }
        self.pending.retain_mut(|action| match action {
            Action::FinishSelector(path) if path.interface == interface => {
                if path.selector == index {
                    false
                } else {
                    if path.selector > index {
                        path.selector -= 1;
                    }
                    true
                }
            }
            _ => true,
        });
    }

    /// Counterpart of [`SessionState::selector_removed`] for a whole
    /// interface leaving the deck.
    pub fn interface_removed(&mut self, index: usize) {
        match self.selected_interface {
            Some(i) if i == index => self.selected_interface = None,
            Some(i) if i > index => self.selected_interface = Some(i - 1),
            _ => {}
        }
        if let Some(path) = self.selected_selector {
            if path.interface == index {
                self.selected_selector = None;
            } else if path.interface > index {
                self.selected_selector = Some(SelectorPath {
                    interface: path.interface - 1,
                    selector: path.selector,
                });
            }
        }
        self.pending.retain_mut(|action| match action {
            Action::FinishSelector(path) => {
                if path.interface == index {
                    false
                } else {
                    if path.interface > index {
                        path.interface -= 1;
                    }
                    true
                }
            }
        });
    }
}

/// Mutable environment threaded through a dispatch pass. Borrows split
/// so widget code can reach settings, rig and selection at once.
pub struct Session<'a> {
    pub settings: &'a mut Settings,
    pub host: &'a mut dyn LinkHost,
    pub kinds: &'a KindRegistry,
    /// Raw screen size in pixels, before overlay scaling.
    pub screen: Vec2,
    pub state: &'a mut SessionState,
}

impl Session<'_> {
    pub fn snap(&self, pos: Vec2, snapping: bool) -> Vec2 {
        self.settings.snap(pos, snapping)
    }
}

/// Read-only environment for producing a draw list.
pub struct View<'a> {
    pub settings: &'a Settings,
    pub host: &'a dyn LinkHost,
    pub screen: Vec2,
    pub selected_selector: Option<SelectorPath>,
    pub selected_interface: Option<usize>,
    /// Index of the interface currently drawing.
    pub interface: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(interface: usize, selector: usize) -> SelectorPath {
        SelectorPath {
            interface,
            selector,
        }
    }

    #[test]
    fn test_selector_removed_clears_and_shifts() {
        let mut state = SessionState::default();
        state.selected_selector = Some(path(0, 2));

        state.selector_removed(0, 2);
        assert_eq!(state.selected_selector, None);

        state.selected_selector = Some(path(0, 2));
        state.selector_removed(0, 0);
        assert_eq!(state.selected_selector, Some(path(0, 1)));

        // removals in other interfaces leave the selection alone
        state.selector_removed(1, 0);
        assert_eq!(state.selected_selector, Some(path(0, 1)));
    }

    #[test]
    fn test_selector_removed_fixes_pending() {
        let mut state = SessionState::default();
        state.defer(Action::FinishSelector(path(0, 1)));
        state.defer(Action::FinishSelector(path(0, 3)));
        state.defer(Action::FinishSelector(path(1, 1)));

        state.selector_removed(0, 1);
        assert_eq!(
            state.take_pending(),
            vec![
                Action::FinishSelector(path(0, 2)),
                Action::FinishSelector(path(1, 1)),
            ]
        );
    }

    #[test]
    fn test_interface_removed_fixes_everything() {
        let mut state = SessionState::default();
        state.selected_interface = Some(2);
        state.selected_selector = Some(path(2, 0));
        state.defer(Action::FinishSelector(path(1, 0)));
        state.defer(Action::FinishSelector(path(2, 4)));

        state.interface_removed(1);
        assert_eq!(state.selected_interface, Some(1));
        assert_eq!(state.selected_selector, Some(path(1, 0)));
        assert_eq!(
            state.take_pending(),
            vec![Action::FinishSelector(path(1, 4))]
        );

        state.interface_removed(1);
        assert_eq!(state.selected_interface, None);
        assert_eq!(state.selected_selector, None);
    }
}
