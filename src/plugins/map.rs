use crate::config::GameConfig;
use crate::plugins::camera::GameCamera;
use crate::plugins::spritesheet::Spritesheet;
use crate::tilemap::{SOLID_TILE, Tilemap};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// Plugin for map loading, tile sprites, editing and saving
pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ChangeTile>()
            .add_event::<SaveMap>()
            .add_systems(Startup, load_map_system)
            .add_systems(
                Update,
                (
                    mouse_edit_system,
                    save_key_system,
                    apply_tile_changes_system,
                    spawn_tile_sprites_system,
                    save_map_system,
                )
                    .chain(),
            );
    }
}

/// Marks the spritesheet entity holding the tileset
#[derive(Component)]
pub struct Tileset;

/// One rendered grid cell
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSprite {
    pub x: i32,
    pub y: i32,
}

/// Request to overwrite one cell of the map
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeTile {
    pub x: i32,
    pub y: i32,
    pub tile: u8,
}

/// Request to write the map back to its file
#[derive(Event, Clone, Copy, Debug)]
pub struct SaveMap;

/// Convert between map pixels (y down) and world space (y up)
pub fn map_to_world(point: Vec2) -> Vec2 {
    Vec2::new(point.x, -point.y)
}

pub fn world_to_map(point: Vec2) -> Vec2 {
    Vec2::new(point.x, -point.y)
}

/// World-space centre of a grid cell
pub fn tile_center_world(x: i32, y: i32, tile_res: u32) -> Vec2 {
    let res = tile_res as f32;
    map_to_world(Vec2::new(
        x as f32 * res + res / 2.0,
        y as f32 * res + res / 2.0,
    ))
}

/// Load the map file and the tileset it names
fn load_map_system(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Option<Res<GameConfig>>,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();

    let tileset = match Tilemap::load_file(&config.map.path) {
        Ok(map) => {
            info!(
                "Loaded map {} ({}x{} tiles of {} px)",
                config.map.path,
                map.width(),
                map.height(),
                map.tile_res()
            );
            let tileset = if map.bitmap_name().is_empty() {
                config.map.tileset.clone()
            } else {
                map.bitmap_name().to_string()
            };
            commands.insert_resource(map);
            tileset
        }
        Err(e) => {
            error!("Failed to load map: {}", e);
            config.map.tileset.clone()
        }
    };

    let tile_size = UVec2::splat(config.map.tile_size);
    commands.spawn((
        Tileset,
        Spritesheet::load(&asset_server, &tileset, tile_size),
    ));
}

/// Spawn one sprite per cell once both the map and the tileset are ready
fn spawn_tile_sprites_system(
    mut commands: Commands,
    map: Option<Res<Tilemap>>,
    tileset: Query<&Spritesheet, With<Tileset>>,
    mut spawned: Local<bool>,
) {
    if *spawned {
        return;
    }
    let Some(map) = map else {
        return;
    };
    let Ok(sheet) = tileset.get_single() else {
        return;
    };
    let Some(atlas) = sheet.atlas.clone() else {
        return;
    };

    let size = Vec2::splat(map.tile_res() as f32);
    for (x, y, tile) in map.iter_tiles() {
        let center = tile_center_world(x, y, map.tile_res());
        let mut sprite = TextureAtlasSprite::new(tile as usize);
        sprite.custom_size = Some(size);
        let visibility = if (tile as usize) < sheet.frame_count {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        commands.spawn((
            SpriteSheetBundle {
                sprite,
                texture_atlas: atlas.clone(),
                transform: Transform::from_xyz(center.x, center.y, 0.0),
                visibility,
                ..default()
            },
            TileSprite { x, y },
        ));
    }

    info!("Spawned {} tile sprites", map.iter_tiles().count());
    *spawned = true;
}

/// Write requested tile changes into the map and the matching sprites
fn apply_tile_changes_system(
    mut events: EventReader<ChangeTile>,
    map: Option<ResMut<Tilemap>>,
    tileset: Query<&Spritesheet, With<Tileset>>,
    mut tiles: Query<(&TileSprite, &mut TextureAtlasSprite, &mut Visibility)>,
) {
    let Some(mut map) = map else {
        events.clear();
        return;
    };
    let frame_count = tileset.get_single().map_or(0, |sheet| sheet.frame_count);

    for change in events.read() {
        if let Err(e) = map.set_tile(change.x, change.y, change.tile) {
            warn!("Ignoring tile change: {}", e);
            continue;
        }
        for (tile, mut sprite, mut visibility) in tiles.iter_mut() {
            if tile.x == change.x && tile.y == change.y {
                sprite.index = change.tile as usize;
                *visibility = if sprite.index < frame_count {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }
}

/// Left click places a solid tile, right click clears it
fn mouse_edit_system(
    buttons: Option<Res<Input<MouseButton>>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<GameCamera>>,
    map: Option<Res<Tilemap>>,
    mut changes: EventWriter<ChangeTile>,
) {
    let (Some(buttons), Some(map)) = (buttons, map) else {
        return;
    };
    let tile = if buttons.pressed(MouseButton::Left) {
        SOLID_TILE
    } else if buttons.pressed(MouseButton::Right) {
        0
    } else {
        return;
    };

    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        return;
    };
    let Some(world) = window
        .cursor_position()
        .and_then(|cursor| camera.viewport_to_world_2d(camera_transform, cursor))
    else {
        return;
    };

    let point = world_to_map(world);
    let (x, y) = map.tile_at_pixel(point.x, point.y);
    if let Some(current) = map.get_tile(x, y)
        && current != tile
    {
        changes.send(ChangeTile { x, y, tile });
    }
}

fn save_key_system(keyboard: Option<Res<Input<KeyCode>>>, mut saves: EventWriter<SaveMap>) {
    if let Some(keyboard) = keyboard
        && keyboard.just_pressed(KeyCode::F5)
    {
        saves.send(SaveMap);
    }
}

fn save_map_system(
    mut events: EventReader<SaveMap>,
    map: Option<Res<Tilemap>>,
    config: Option<Res<GameConfig>>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    let Some(map) = map else {
        warn!("No map to save");
        return;
    };
    let path = config.map_or_else(|| GameConfig::default().map.path, |c| c.map.path.clone());

    match map.save_file(&path) {
        Ok(()) => info!("Map saved to {}", path),
        Err(e) => error!("Failed to save map: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_event::<ChangeTile>()
            .add_event::<SaveMap>()
            .add_systems(Update, (apply_tile_changes_system, save_map_system));
        app
    }

    #[test]
    fn test_map_world_conversion() {
        let p = Vec2::new(10.0, 20.0);
        assert_eq!(map_to_world(p), Vec2::new(10.0, -20.0));
        assert_eq!(world_to_map(map_to_world(p)), p);
    }

    #[test]
    fn test_tile_center_world() {
        assert_eq!(tile_center_world(0, 0, 32), Vec2::new(16.0, -16.0));
        assert_eq!(tile_center_world(2, 1, 32), Vec2::new(80.0, -48.0));
    }

    #[test]
    fn test_change_tile_updates_map_and_sprite() {
        let mut app = test_app();
        app.insert_resource(Tilemap::create(32, 2, 2, "tiles.png"));
        let tile = app
            .world
            .spawn((
                TileSprite { x: 1, y: 0 },
                TextureAtlasSprite::new(0),
                Visibility::Inherited,
            ))
            .id();

        app.world.resource_mut::<Events<ChangeTile>>().send(ChangeTile {
            x: 1,
            y: 0,
            tile: SOLID_TILE,
        });
        app.update();

        let map = app.world.resource::<Tilemap>();
        assert!(map.is_solid(1, 0));
        assert!(!map.is_solid(0, 0));
        let sprite = app.world.get::<TextureAtlasSprite>(tile).unwrap();
        assert_eq!(sprite.index, 1);
        // no tileset loaded, so the sprite has no frame to show
        assert_eq!(
            *app.world.get::<Visibility>(tile).unwrap(),
            Visibility::Hidden
        );
    }

    #[test]
    fn test_change_tile_out_of_range_is_ignored() {
        let mut app = test_app();
        app.insert_resource(Tilemap::create(32, 2, 2, "tiles.png"));
        app.world.resource_mut::<Events<ChangeTile>>().send(ChangeTile {
            x: 5,
            y: 5,
            tile: SOLID_TILE,
        });
        app.update();

        let map = app.world.resource::<Tilemap>();
        assert!(map.iter_tiles().all(|(_, _, t)| t == 0));
    }

    #[test]
    fn test_save_map_event_writes_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let mut config = GameConfig::default();
        config.map.path = path.clone();

        let mut map = Tilemap::create(32, 3, 3, "testpic.png");
        map.set_tile(1, 2, SOLID_TILE).unwrap();

        let mut app = test_app();
        app.insert_resource(config);
        app.insert_resource(map.clone());
        app.world.resource_mut::<Events<SaveMap>>().send(SaveMap);
        app.update();

        assert_eq!(Tilemap::load_file(&path).unwrap(), map);
    }
}
