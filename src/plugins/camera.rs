use crate::components::{Body, Player};
use crate::config::GameConfig;
use crate::plugins::map::map_to_world;
use crate::plugins::physics::CharacterMoved;
use crate::tilemap::Tilemap;
use bevy::prelude::*;

/// Camera plugin - keeps the player in view inside the map
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CharacterMoved>()
            .add_systems(Startup, setup_camera)
            .add_systems(PostUpdate, camera_follow_system);
    }
}

/// Camera target component - marks the camera entity
#[derive(Component)]
pub struct GameCamera;

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2dBundle::default(), GameCamera));
}

/// Camera centre in map pixels for a player at `target`.
///
/// The view is clamped so it never shows past the map edges; a map smaller
/// than the viewport on an axis is centred on that axis.
pub fn follow_target(target: Vec2, map_size: Option<Vec2>, viewport: Vec2) -> Vec2 {
    let Some(map_size) = map_size else {
        return target;
    };
    let half = viewport / 2.0;

    let x = if map_size.x > viewport.x {
        target.x.clamp(half.x, map_size.x - half.x)
    } else {
        map_size.x / 2.0
    };
    let y = if map_size.y > viewport.y {
        target.y.clamp(half.y, map_size.y - half.y)
    } else {
        map_size.y / 2.0
    };
    Vec2::new(x, y)
}

/// Snap the camera onto the player whenever its hitbox moved
fn camera_follow_system(
    mut moved: EventReader<CharacterMoved>,
    config: Option<Res<GameConfig>>,
    map: Option<Res<Tilemap>>,
    player_query: Query<(Entity, Ref<Body>), With<Player>>,
    mut camera_query: Query<&mut Transform, With<GameCamera>>,
) {
    let Ok((player, body)) = player_query.get_single() else {
        moved.clear();
        return;
    };
    let player_moved = moved.read().any(|event| event.entity == player);
    if !player_moved && !body.is_added() {
        return;
    }

    let Ok(mut camera_transform) = camera_query.get_single_mut() else {
        return;
    };

    let window = config.map_or_else(|| GameConfig::default().window, |c| c.window.clone());
    let viewport = Vec2::new(window.width, window.height);
    let map_size = map.map(|m| Vec2::new(m.pixel_width(), m.pixel_height()));

    let center = map_to_world(follow_target(body.position, map_size, viewport));
    camera_transform.translation.x = center.x;
    camera_transform.translation.y = center.y;
}
