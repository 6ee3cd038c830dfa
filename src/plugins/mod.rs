pub mod animation;
pub mod camera;
pub mod map;
pub mod physics;
pub mod player;
pub mod spritesheet;

pub use animation::AnimationPlugin;
pub use camera::CameraPlugin;
pub use map::MapPlugin;
pub use physics::PhysicsPlugin;
pub use player::PlayerPlugin;
pub use spritesheet::SpritesheetPlugin;
