pub mod rgba;
pub mod vector2;

pub use rgba::*;
pub use vector2::*;
