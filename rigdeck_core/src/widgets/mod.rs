pub mod container;
pub mod interface;
pub mod kind;
pub mod median;
pub mod selector;
pub mod vertex;
pub mod widget;

pub use container::*;
pub use interface::*;
pub use kind::*;
pub use median::*;
pub use selector::*;
pub use vertex::*;
pub use widget::*;
