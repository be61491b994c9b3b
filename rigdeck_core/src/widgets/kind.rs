use std::collections::HashMap;

use enum_dispatch::enum_dispatch;
use rigdeck_record::{Record, RecordError, Result};

use crate::link::LinkHost;
use crate::structs2d::Rgba;

/// Rig-facing behaviour of a selector. The polygon machinery never
/// looks past this trait; what a click or a link refresh means for the
/// rig is decided entirely here.
#[enum_dispatch]
pub trait Linkable {
    /// Stable tag written to the persisted document.
    fn tag(&self) -> &'static str;

    fn base_colour(&self) -> Rgba;

    fn is_linked(&self) -> bool;

    fn is_link_visible(&self, host: &dyn LinkHost) -> bool;

    fn is_link_selected(&self, host: &dyn LinkHost) -> bool;

    /// Click action in use mode, or with `edit` the edit-mode variant.
    fn select_link(&mut self, host: &mut dyn LinkHost, edit: bool);

    fn deselect_all(&self, host: &mut dyn LinkHost);

    /// Adopts whatever rig element is active right now.
    fn update_link(&mut self, host: &dyn LinkHost);

    fn link_colour(&self, host: &dyn LinkHost) -> Rgba;

    fn store(&self, rec: &mut Record) -> Result<()>;

    fn load(&mut self, rec: &mut Record) -> Result<()>;
}

/// Selector with no rig binding at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainKind;

impl Linkable for PlainKind {
    fn tag(&self) -> &'static str {
        "Selector"
    }

    fn base_colour(&self) -> Rgba {
        Rgba::BLACK
    }

    fn is_linked(&self) -> bool {
        false
    }

    fn is_link_visible(&self, _host: &dyn LinkHost) -> bool {
        true
    }

    fn is_link_selected(&self, _host: &dyn LinkHost) -> bool {
        false
    }

    fn select_link(&mut self, _host: &mut dyn LinkHost, _edit: bool) {}

    fn deselect_all(&self, _host: &mut dyn LinkHost) {}

    fn update_link(&mut self, _host: &dyn LinkHost) {}

    fn link_colour(&self, _host: &dyn LinkHost) -> Rgba {
        self.base_colour()
    }

    fn store(&self, _rec: &mut Record) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _rec: &mut Record) -> Result<()> {
        Ok(())
    }
}

/// Selector bound to one bone, or to the armature object itself when
/// `bone` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneKind {
    pub linked: bool,
    pub armature: String,
    pub bone: String,
}

impl Linkable for BoneKind {
    fn tag(&self) -> &'static str {
        "BoneSelector"
    }

    fn base_colour(&self) -> Rgba {
        Rgba::new(0.9, 0.7, 0.7, 0.9)
    }

    fn is_linked(&self) -> bool {
        self.linked
    }

    fn is_link_visible(&self, host: &dyn LinkHost) -> bool {
        self.linked && host.is_link_visible(&self.armature, &self.bone)
    }

    fn is_link_selected(&self, host: &dyn LinkHost) -> bool {
        self.linked && host.is_link_selected(&self.armature, &self.bone)
    }

    fn select_link(&mut self, host: &mut dyn LinkHost, _edit: bool) {
        if self.linked {
            host.toggle_link(&self.armature, &self.bone);
        }
    }

    fn deselect_all(&self, host: &mut dyn LinkHost) {
        host.deselect_all();
    }

    fn update_link(&mut self, host: &dyn LinkHost) {
        if let Some(target) = host.active_target() {
            self.linked = true;
            self.armature = target.armature;
            self.bone = target.bone;
        }
    }

    fn link_colour(&self, host: &dyn LinkHost) -> Rgba {
        if !self.linked {
            return self.base_colour();
        }
        match host.link_colour(&self.armature, &self.bone) {
            Some(colour) => colour.with_alpha(0.9),
            None => self.base_colour(),
        }
    }

    fn store(&self, rec: &mut Record) -> Result<()> {
        rec.write("linked", self.linked)?;
        rec.write("armature", self.armature.as_str())?;
        rec.write("bone", self.bone.as_str())
    }

    fn load(&mut self, rec: &mut Record) -> Result<()> {
        self.linked = rec.read_bool("linked", false)?;
        self.armature = rec.read_str("armature", "")?;
        self.bone = rec.read_str("bone", "")?;
        Ok(())
    }
}

/// Selector that toggles one armature layer instead of a bone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerKind {
    pub layer: i64,
    pub armature: String,
}

impl Linkable for LayerKind {
    fn tag(&self) -> &'static str {
        "LayerSelector"
    }

    fn base_colour(&self) -> Rgba {
        Rgba::new(0.9, 0.9, 0.7, 0.9)
    }

    fn is_linked(&self) -> bool {
        true
    }

    fn is_link_visible(&self, host: &dyn LinkHost) -> bool {
        host.is_link_visible(&self.armature, "")
    }

    fn is_link_selected(&self, host: &dyn LinkHost) -> bool {
        host.is_layer_enabled(&self.armature, self.layer)
    }

    fn select_link(&mut self, host: &mut dyn LinkHost, edit: bool) {
        if edit {
            // editing a layer deck only retargets the armature
            host.deselect_all();
            host.activate_armature(&self.armature);
        } else {
            host.toggle_layer(&self.armature, self.layer);
        }
    }

    fn deselect_all(&self, _host: &mut dyn LinkHost) {}

    fn update_link(&mut self, host: &dyn LinkHost) {
        if let Some(target) = host.active_target() {
            self.armature = target.armature;
        }
    }

    fn link_colour(&self, _host: &dyn LinkHost) -> Rgba {
        self.base_colour()
    }

    fn store(&self, rec: &mut Record) -> Result<()> {
        rec.write("layer", self.layer)?;
        rec.write("armature", self.armature.as_str())
    }

    fn load(&mut self, rec: &mut Record) -> Result<()> {
        self.layer = rec.read_int("layer", 0)?;
        self.armature = rec.read_str("armature", "")?;
        Ok(())
    }
}

/// Capability-tagged selector payload.
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(Linkable)]
pub enum SelectorKind {
    Plain(PlainKind),
    Bone(BoneKind),
    Layer(LayerKind),
}

impl SelectorKind {
    /// Copies link identity onto a mirrored twin of the same kind.
    pub fn adopt(&mut self, source: &SelectorKind) {
        if let (SelectorKind::Bone(target), SelectorKind::Bone(src)) = (self, source) {
            target.linked = src.linked;
            target.armature = src.armature.clone();
            target.bone = src.bone.clone();
        }
    }
}

pub type KindFactory = fn() -> SelectorKind;

/// Maps persisted tags to constructors. Hosts may register their own
/// kinds next to the built-in three.
pub struct KindRegistry {
    factories: HashMap<String, KindFactory>,
}

impl KindRegistry {
    pub fn with_builtin() -> Self {
        let mut registry = KindRegistry {
            factories: HashMap::new(),
        };
        registry.register("Selector", || SelectorKind::Plain(PlainKind));
        registry.register("BoneSelector", || SelectorKind::Bone(BoneKind::default()));
        registry.register("LayerSelector", || SelectorKind::Layer(LayerKind::default()));
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, factory: KindFactory) {
        self.factories.insert(tag.into(), factory);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn create(&self, tag: &str) -> Result<SelectorKind> {
        match self.factories.get(tag) {
            Some(factory) => Ok(factory()),
            None => Err(RecordError::invalid(
                "selectors",
                format!("class {tag} not found"),
            )),
        }
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::NullHost;

    #[test]
    fn test_registry_builtin_tags() {
        let registry = KindRegistry::with_builtin();
        for tag in ["Selector", "BoneSelector", "LayerSelector"] {
            let kind = registry.create(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
    }

    #[test]
    fn test_registry_unknown_tag() {
        let registry = KindRegistry::with_builtin();
        let err = registry.create("GhostSelector").unwrap_err();
        assert!(err.to_string().contains("class GhostSelector not found"));
    }

    #[test]
    fn test_registry_custom_kind() {
        let mut registry = KindRegistry::with_builtin();
        registry.register("Spare", || SelectorKind::Plain(PlainKind));
        assert!(registry.contains("Spare"));
        assert!(registry.create("Spare").is_ok());
    }

    #[test]
    fn test_bone_kind_round_trip() {
        let mut kind = BoneKind {
            linked: true,
            armature: "rig".into(),
            bone: "spine".into(),
        };
        let mut rec = rigdeck_record::Record::new();
        Linkable::store(&kind, &mut rec).unwrap();

        kind = BoneKind::default();
        Linkable::load(&mut kind, &mut rec).unwrap();
        assert!(kind.linked);
        assert_eq!(kind.armature, "rig");
        assert_eq!(kind.bone, "spine");
    }

    #[test]
    fn test_unlinked_bone_ignores_host() {
        let kind = BoneKind::default();
        let host = NullHost;
        assert!(!kind.is_link_visible(&host));
        assert!(!kind.is_link_selected(&host));
        assert_eq!(kind.link_colour(&host), kind.base_colour());
    }

    #[test]
    fn test_adopt_only_crosses_same_kind() {
        let src = SelectorKind::Bone(BoneKind {
            linked: true,
            armature: "rig".into(),
            bone: "hand".into(),
        });

        let mut twin = SelectorKind::Bone(BoneKind::default());
        twin.adopt(&src);
        assert_eq!(twin, src);

        let mut layer = SelectorKind::Layer(LayerKind::default());
        layer.adopt(&src);
        assert_eq!(layer, SelectorKind::Layer(LayerKind::default()));
    }
}
