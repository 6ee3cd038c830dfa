use bevy::prelude::*;
use tile_platformer::config::{CONFIG_PATH, GameConfig, load_config_from_file};
use tile_platformer::plugins::{
    AnimationPlugin, CameraPlugin, MapPlugin, PhysicsPlugin, PlayerPlugin, SpritesheetPlugin,
};

fn main() {
    let (config, load_error) = match load_config_from_file(CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(e) => (GameConfig::default(), Some(e)),
    };

    let window = Window {
        title: config.window.title.clone(),
        resolution: (config.window.width, config.window.height).into(),
        ..default()
    };

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..default()
    }))
    .insert_resource(config)
    .add_plugins(CameraPlugin)
    .add_plugins(SpritesheetPlugin)
    .add_plugins(MapPlugin)
    .add_plugins(PlayerPlugin)
    .add_plugins(PhysicsPlugin)
    .add_plugins(AnimationPlugin);

    if let Some(e) = load_error {
        app.add_systems(Startup, move || warn!("{}, using defaults", e));
    }

    app.run();
}
