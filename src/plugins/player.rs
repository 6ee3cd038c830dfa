use crate::components::{AnimationState, JumpParams, JumpState, Player, PlayerIntent, Velocity};
use crate::config::GameConfig;
use crate::enums::AnimationType;
use crate::plugins::animation::AnimationSet;
use crate::plugins::physics::place_character;
use crate::plugins::spritesheet::Spritesheet;
use bevy::prelude::*;

/// Plugin for spawning the player and reading its input
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player_system)
            .add_systems(Update, process_input_system);
    }
}

/// Horizontal key transitions for one frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HorizontalKeys {
    pub left_held: bool,
    pub right_held: bool,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub left_released: bool,
    pub right_released: bool,
}

/// New horizontal velocity given this frame's key transitions.
///
/// The most recently pressed direction wins. Releasing a direction falls
/// back to the opposite one if it is still held, otherwise stops.
pub fn horizontal_velocity(current: f32, run_speed: f32, keys: &HorizontalKeys) -> f32 {
    let mut velocity = current;
    if keys.left_pressed {
        velocity = -run_speed;
    }
    if keys.right_pressed {
        velocity = run_speed;
    }
    if keys.left_released {
        velocity = if keys.right_held { run_speed } else { 0.0 };
    }
    if keys.right_released {
        velocity = if keys.left_held { -run_speed } else { 0.0 };
    }
    velocity
}

fn spawn_player_system(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Option<Res<GameConfig>>,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();
    let player = &config.player;

    let mut body = player.body();
    let mut jump = JumpState::default();
    place_character(&mut body, &mut jump, player.spawn[0], player.spawn[1]);

    let animations = AnimationSet::from(player.animations.as_slice());
    let anim_state = AnimationState {
        current: AnimationType::Idle,
        frame: animations
            .animations
            .get(&AnimationType::Idle)
            .map_or(0, |idle| idle.start_frame),
        ..default()
    };

    let sheet = Spritesheet::load(
        &asset_server,
        &player.spritesheet,
        UVec2::new(player.frame_width, player.frame_height),
    );

    commands.spawn((
        Player,
        body,
        jump,
        config.physics.jump_params(),
        Velocity::default(),
        PlayerIntent::default(),
        anim_state,
        animations,
        player.padding(),
        sheet,
        SpriteSheetBundle {
            transform: Transform::from_xyz(0.0, 0.0, 1.0),
            visibility: Visibility::Hidden,
            ..default()
        },
    ));

    info!("Player spawned at ({}, {})", player.spawn[0], player.spawn[1]);
}

/// Translate keyboard state into velocity and jump intent
fn process_input_system(
    keyboard: Res<Input<KeyCode>>,
    mut query: Query<(&mut Velocity, &mut PlayerIntent, &JumpParams), With<Player>>,
) {
    let keys = HorizontalKeys {
        left_held: keyboard.any_pressed([KeyCode::Left, KeyCode::A]),
        right_held: keyboard.any_pressed([KeyCode::Right, KeyCode::D]),
        left_pressed: keyboard.any_just_pressed([KeyCode::Left, KeyCode::A]),
        right_pressed: keyboard.any_just_pressed([KeyCode::Right, KeyCode::D]),
        left_released: keyboard.any_just_released([KeyCode::Left, KeyCode::A]),
        right_released: keyboard.any_just_released([KeyCode::Right, KeyCode::D]),
    };

    for (mut velocity, mut intent, params) in query.iter_mut() {
        velocity.x = horizontal_velocity(velocity.x, params.run_speed, &keys);
        intent.jump_held = keyboard.any_pressed([KeyCode::Up, KeyCode::W]);
    }
}
