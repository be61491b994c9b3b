use crate::structs2d::Rgba;

/// Identity of a rig element a selector can bind to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkTarget {
    pub armature: String,
    pub bone: String,
}

/// Everything the widget tree needs to know about the rig lives behind
/// this trait. The host application implements it; the board never
/// touches rig data directly.
///
/// An empty `bone` refers to the armature object itself.
pub trait LinkHost {
    /// Rig element that would be adopted by a selector right now.
    fn active_target(&self) -> Option<LinkTarget>;

    fn is_link_visible(&self, armature: &str, bone: &str) -> bool;

    fn is_link_selected(&self, armature: &str, bone: &str) -> bool;

    /// Toggles selection of one rig element.
    fn toggle_link(&mut self, armature: &str, bone: &str);

    /// Clears the rig selection entirely.
    fn deselect_all(&mut self);

    /// Display colour the rig assigns to this element, if any.
    fn link_colour(&self, armature: &str, bone: &str) -> Option<Rgba>;

    fn is_layer_enabled(&self, armature: &str, layer: i64) -> bool;

    fn toggle_layer(&mut self, armature: &str, layer: i64);

    fn activate_armature(&mut self, armature: &str);
}

/// Host that answers every query with the neutral default. Useful in
/// tests and for running the overlay without a rig attached.
#[derive(Debug, Default)]
pub struct NullHost;

impl LinkHost for NullHost {
    fn active_target(&self) -> Option<LinkTarget> {
        None
    }

    fn is_link_visible(&self, _armature: &str, _bone: &str) -> bool {
        true
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
