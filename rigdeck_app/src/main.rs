use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use rigdeck_core::{Board, DrawList, Env, LinkHost, LinkTarget, Primitive, Rgba, Settings, Vec2};
use rigdeck_record::Record;

/// Bone of the demo rig.
struct DemoBone {
    name: String,
    selected: bool,
    visible: bool,
    colour: Option<Rgba>,
}

/// Stand-in rig: one armature, a few bones and 32 layers held in
/// memory. A real integration answers these queries from its scene.
struct DemoHost {
    armature: String,
    bones: Vec<DemoBone>,
    layers: [bool; 32],
}

impl DemoHost {
    fn new() -> Self {
        let bones = ["hip", "spine", "head", "hand.L", "hand.R"]
            .into_iter()
            .map(|name| DemoBone {
                name: name.to_string(),
                selected: false,
                visible: true,
                colour: None,
            })
            .collect();
        let mut host = DemoHost {
            armature: "rig".to_string(),
            bones,
            layers: [false; 32],
        };
        host.layers[0] = true;
        host.bones[2].colour = Some(Rgba::new(0.9, 0.6, 0.2, 1.0));
        host
    }

    fn bone(&self, armature: &str, bone: &str) -> Option<&DemoBone> {
        if armature != self.armature {
            return None;
        }
        self.bones.iter().find(|entry| entry.name == bone)
    }

    fn bone_mut(&mut self, armature: &str, bone: &str) -> Option<&mut DemoBone> {
        if armature != self.armature {
            return None;
        }
        self.bones.iter_mut().find(|entry| entry.name == bone)
    }
}

impl LinkHost for DemoHost {
    fn active_target(&self) -> Option<LinkTarget> {
        let bone = self.bones.iter().find(|bone| bone.selected)?;
        Some(LinkTarget {
            armature: self.armature.clone(),
            bone: bone.name.clone(),
        })
    }

    fn is_link_visible(&self, armature: &str, bone: &str) -> bool {
        match self.bone(armature, bone) {
            Some(entry) => entry.visible,
            None => true,
        }
    }

    fn is_link_selected(&self, armature: &str, bone: &str) -> bool {
        self.bone(armature, bone)
            .is_some_and(|entry| entry.selected)
    }

    fn toggle_link(&mut self, armature: &str, bone: &str) {
        if let Some(entry) = self.bone_mut(armature, bone) {
            entry.selected = !entry.selected;
        }
    }

    fn deselect_all(&mut self) {
        for bone in &mut self.bones {
            bone.selected = false;
        }
    }

    fn link_colour(&self, armature: &str, bone: &str) -> Option<Rgba> {
        self.bone(armature, bone)?.colour
    }

    fn is_layer_enabled(&self, armature: &str, layer: i64) -> bool {
        if armature != self.armature {
            return false;
        }
        match usize::try_from(layer) {
            Ok(index) => self.layers.get(index).copied().unwrap_or(false),
            Err(_) => false,
        }
    }

    fn toggle_layer(&mut self, armature: &str, layer: i64) {
        if armature != self.armature {
            return;
        }
        if let Ok(index) = usize::try_from(layer) {
            if let Some(slot) = self.layers.get_mut(index) {
                *slot = !*slot;
            }
        }
    }

    fn activate_armature(&mut self, armature: &str) {
        log::info!("armature {armature} activated");
    }
}

fn describe(list: &DrawList) -> String {
    let mut rects = 0;
    let mut images = 0;
    let mut polys = 0;
    let mut outlines = 0;
    let mut lines = 0;
    for primitive in list.primitives() {
        match primitive {
            Primitive::Rect { .. } => rects += 1,
            Primitive::Image { .. } => images += 1,
            Primitive::Poly { .. } => polys += 1,
            Primitive::Outline { .. } => outlines += 1,
            Primitive::Line { .. } => lines += 1,
        }
    }
    format!("{rects} rects, {images} images, {polys} polys, {outlines} outlines, {lines} lines")
}

/// First-run deck: one interface with a clicked-out triangle and a
/// layer square, built through the same gestures a user would make.
fn build_starter_deck(board: &mut Board, env: &mut Env) {
    board.set_editing(env, true);
    board.add_interface(env);
    board.update(env);

    // three clicks on the panel grow a triangle
    for point in [
        Vec2::new(60.0, 40.0),
        Vec2::new(100.0, 40.0),
        Vec2::new(100.0, 80.0),
    ] {
        board.press(env, point, false, false);
        board.release(env, point);
    }
    // a click on the body closes the build
    board.press(env, Vec2::new(95.0, 50.0), false, false);
    board.release(env, Vec2::new(95.0, 50.0));

    board.add_layer_selector(env, 0);
    board.set_editing(env, false);
    log::info!("authored starter deck");
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    // 1. Determine where the deck file lives (from --path or cwd)
    let args: Vec<String> = std::env::args().collect();
    let path = args
        .iter()
        .position(|arg| arg == "--path")
        .and_then(|index| args.get(index + 1))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("deck.json"));

    // 2. Set up the rig stand-in and the overlay settings
    let mut settings = Settings::default();
    settings.autosave = true;
    let mut host = DemoHost::new();
    let screen = Vec2::new(1920.0, 1080.0);

    // 3. Enable the board from the stored deck, if there is one
    let mut board = Board::new();
    let mut stored = match fs::read_to_string(&path) {
        Ok(text) => Record::from_json_str(&text)?,
        Err(_) => Record::new(),
    };
    {
        let mut env = Env {
            settings: &mut settings,
            host: &mut host,
            screen,
        };
        board.on_enable(&mut env, &mut stored)?;

        // 4. Author a starter deck on first run
        if board.interfaces.is_empty() {
            build_starter_deck(&mut board, &mut env);
        }

        // 5. One frame: layout first, then primitives
        board.update(&mut env);
    }
    let list = board.draw(&settings, &host, screen);
    println!(
        "deck {}: {} interfaces, {}",
        path.display(),
        board.interfaces.len(),
        describe(&list)
    );

    // 6. Drag the first interface 20 pixels to the right
    {
        let mut env = Env {
            settings: &mut settings,
            host: &mut host,
            screen,
        };
        board.press(&mut env, Vec2::new(40.0, 24.0), false, false);
        board.hold(&mut env, Vec2::new(60.0, 24.0));
        board.release(&mut env, Vec2::new(60.0, 24.0));
    }
    println!("first interface now at {:?}", board.interfaces[0].core.pos);

    // 7. Disabling with autosave on writes the deck back
    let mut rec = Record::new();
    {
        let mut env = Env {
            settings: &mut settings,
            host: &mut host,
            screen,
        };
        board.on_disable(&mut env, &mut rec)?;
    }
    fs::write(&path, rec.to_json_string()?)?;
    println!("deck saved to {}", path.display());
    Ok(())
}
