pub mod board;
pub use board::*;

pub mod draw;
pub use draw::*;

pub mod link;
pub use link::*;

pub mod session;
pub use session::*;

pub mod settings;
pub use settings::*;

pub mod structs2d;
pub use structs2d::*;

pub mod widgets;
pub use widgets::*;

#[cfg(test)]
mod tests {
    use super::*;
    use rigdeck_record::Record;

    // Builds a polygon with clicks, moves it, saves the deck and
    // restores it, all through the board surface.
    #[test]
    fn test_build_store_reload_cycle() {
        let mut settings = Settings::default();
        settings.editing = true;
        let mut host = NullHost;
        let screen = Vec2::new(1920.0, 1080.0);

        let mut board = Board::new();
        let mut empty = Record::new();
        {
            let mut env = Env {
                settings: &mut settings,
                host: &mut host,
                screen,
            };
            board.on_enable(&mut env, &mut empty).unwrap();
            board.add_interface(&mut env);
            board.update(&mut env);

            // three clicks on the panel grow a triangle
            for point in [
                Vec2::new(60.0, 40.0),
                Vec2::new(100.0, 40.0),
                Vec2::new(100.0, 80.0),
            ] {
                assert!(board.press(&mut env, point, false, false));
                board.release(&mut env, point);
            }
            {
                let container = &board.interfaces[0].median.container;
                assert_eq!(container.selectors.len(), 1);
                assert!(container.selectors[0].build);
                assert_eq!(container.selectors[0].vertices.len(), 3);
            }

            // a click on the polygon body closes the build
            assert!(board.press(&mut env, Vec2::new(95.0, 50.0), false, false));
            board.release(&mut env, Vec2::new(95.0, 50.0));
            {
                let container = &board.interfaces[0].median.container;
                assert!(!container.selectors[0].build);
                assert_eq!(container.selectors[0].handles.len(), 3);
            }

            board.set_editing(&mut env, false);
        }
        assert!(!settings.editing);

        let mut rec = Record::new();
        board.store(&settings, &mut rec).unwrap();

        let mut second = Board::new();
        {
            let mut env = Env {
                settings: &mut settings,
                host: &mut host,
                screen,
            };
            second.on_enable(&mut env, &mut rec).unwrap();
            second.update(&mut env);
        }
        let restored = &second.interfaces[0].median.container.selectors[0];
        assert_eq!(restored.vertices.len(), 3);
        assert!(!restored.edit);

        let list = second.draw(&settings, &host, screen);
        assert_eq!(list.len(), 4);
    }
}
