pub mod components;
pub mod config;
pub mod enums;
pub mod plugins;
pub mod tilemap;

pub use components::*;
pub use config::*;
pub use enums::*;
pub use tilemap::*;
