use crate::components::{AnimationState, Body, JumpParams, JumpState, PlayerIntent, Velocity};
use crate::config::GameConfig;
use crate::enums::{AnimationType, Direction, FacingDirection, MovementState};
use crate::plugins::animation::AnimationSet;
use crate::tilemap::{SOLID_TILE, Tilemap};
use bevy::prelude::*;

/// Physics runs at a fixed 60 Hz
const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Moves that end closer than this to a blocking tile face snap onto it
const CONTACT_EPSILON: f32 = 1e-3;

/// Plugin for tile collision, jump kinematics and movement
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_seconds(FIXED_TIMESTEP as f64));
        app.add_event::<CharacterMoved>();
        app.add_systems(
            FixedUpdate,
            (apply_jump_input_system, move_characters_system).chain(),
        );
    }
}

/// Sent when a character's hitbox moved by at least one whole pixel
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct CharacterMoved {
    pub entity: Entity,
    pub position: Vec2,
}

/// Outcome of one movement step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveReport {
    pub moved: bool,
    pub animation: AnimationType,
    pub facing: Option<FacingDirection>,
}

/// Nearest blocking tile face found by a scan
#[derive(Clone, Copy, Debug, PartialEq)]
struct Scan {
    distance: f32,
    /// Pixel coordinate of the blocking face along the scan axis
    face: Option<f32>,
}

/// Cast one ray per tile in `first..=last` towards `direction` and return
/// the face of the closest cell that is solid or outside the grid.
fn blocking_face(map: &Tilemap, direction: Direction, first: IVec2, last: IVec2) -> Option<f32> {
    let (dx, dy) = direction.step();
    let mut min_steps: Option<i32> = None;

    for y in first.y..=last.y {
        for x in first.x..=last.x {
            let limit = min_steps.unwrap_or(i32::MAX);
            let (mut xi, mut yi, mut steps) = (x, y, 0);
            while steps < limit && map.get_tile(xi, yi).is_some_and(|t| t != SOLID_TILE) {
                xi += dx;
                yi += dy;
                steps += 1;
            }
            min_steps = Some(min_steps.map_or(steps, |m| m.min(steps)));
        }
    }

    let steps = min_steps? as i64;
    let res = map.tile_res() as i64;
    let face = match direction {
        Direction::Left => (first.x as i64 - steps + 1) * res,
        Direction::Right => (first.x as i64 + steps) * res,
        Direction::Up => (first.y as i64 - steps + 1) * res,
        Direction::Down => (first.y as i64 + steps) * res,
    };
    Some(face as f32)
}

fn distance_to_face(edge: f32, face: f32, direction: Direction) -> f32 {
    let distance = match direction {
        Direction::Left | Direction::Up => edge - face,
        Direction::Right | Direction::Down => face - edge,
    };
    distance.max(0.0)
}

/// Free distance from `edge` towards `direction`, scanning every tile in
/// the rectangle `first..=last`. Negative distances clamp to zero.
pub fn scan_distance(
    edge: f32,
    map: &Tilemap,
    direction: Direction,
    first: IVec2,
    last: IVec2,
) -> f32 {
    blocking_face(map, direction, first, last)
        .map_or(0.0, |face| distance_to_face(edge, face, direction))
}

fn scan(body: &Body, map: &Tilemap, direction: Direction) -> Scan {
    let res = map.tile_res() as i32;
    if res == 0 {
        return Scan {
            distance: 0.0,
            face: None,
        };
    }

    let hitbox = body.hitbox;
    let x1 = hitbox.x.div_euclid(res);
    let x2 = (hitbox.x + hitbox.w - 1).div_euclid(res);
    let y1 = hitbox.y.div_euclid(res);
    let y2 = (hitbox.y + hitbox.h - 1).div_euclid(res);

    let (edge, first, last) = match direction {
        Direction::Left => (body.left(), IVec2::new(x1, y1), IVec2::new(x1, y2)),
        Direction::Right => (body.right(), IVec2::new(x2, y1), IVec2::new(x2, y2)),
        Direction::Up => (body.top(), IVec2::new(x1, y1), IVec2::new(x2, y1)),
        Direction::Down => (body.bottom(), IVec2::new(x1, y2), IVec2::new(x2, y2)),
    };

    let face = blocking_face(map, direction, first, last);
    Scan {
        distance: face.map_or(0.0, |f| distance_to_face(edge, f, direction)),
        face,
    }
}

/// Maximum distance the body can travel towards `direction`
pub fn scan_boundary(body: &Body, map: &Tilemap, direction: Direction) -> f32 {
    scan(body, map, direction).distance
}

/// Put the body's leading edge exactly on a blocking face
fn snap_to_face(body: &mut Body, direction: Direction, face: f32) {
    match direction {
        Direction::Left => body.position.x = face + body.origin.x,
        Direction::Right => body.position.x = face - body.hitbox.w as f32 + body.origin.x,
        Direction::Up => body.position.y = face + body.origin.y,
        Direction::Down => body.position.y = face - body.hitbox.h as f32 + body.origin.y,
    }
}

/// Move towards `direction` by `amount` (non-negative), stopping at the
/// scanned boundary. Returns true if the move was blocked.
fn sweep(body: &mut Body, scanned: Scan, direction: Direction, amount: f32) -> bool {
    if amount < scanned.distance - CONTACT_EPSILON {
        match direction {
            Direction::Left => body.position.x -= amount,
            Direction::Right => body.position.x += amount,
            Direction::Up => body.position.y -= amount,
            Direction::Down => body.position.y += amount,
        }
        return false;
    }
    if let Some(face) = scanned.face {
        snap_to_face(body, direction, face);
    }
    true
}

/// Advance one character by `dt` seconds against the tilemap.
///
/// Vertical motion runs first: the grounded/rising/falling state machine
/// computes a target height from the jump arc, then the move is clamped to
/// the ceiling or floor. Horizontal motion integrates `velocity` and stops
/// at the nearest wall.
pub fn move_character(
    body: &mut Body,
    jump: &mut JumpState,
    params: &JumpParams,
    velocity: &Velocity,
    current: AnimationType,
    dt: f32,
    map: &Tilemap,
) -> MoveReport {
    let mut animation = current;
    let mut facing = None;
    let start_hitbox = body.hitbox;

    let down = scan(body, map, Direction::Down);

    if jump.state == MovementState::Grounded && down.distance > 0.0 {
        jump.state = MovementState::Falling;
        animation = AnimationType::Falling;
    }

    if jump.is_airborne() {
        jump.air_time += dt;
        let mut fall_dt = dt;
        let mut target = body.position.y;

        if jump.state == MovementState::Rising {
            if jump.air_time >= params.jump_time_max {
                jump.state = MovementState::Falling;
                fall_dt = jump.air_time - params.jump_time_max;
            } else {
                target = jump.start_height - params.jump_velocity * jump.air_time;
            }
        }

        if jump.state == MovementState::Falling {
            jump.fall_time += fall_dt;
            target = jump.start_height - jump.start_jump_vector * jump.air_time
                + 0.5 * params.gravity * jump.fall_time * jump.fall_time;

            let max_drop = params.terminal_velocity * fall_dt;
            if target - body.position.y > max_drop {
                target = body.position.y + max_drop;
            }
        }

        let dist = target - body.position.y;
        if dist < 0.0 {
            let up = scan(body, map, Direction::Up);
            if sweep(body, up, Direction::Up, -dist) {
                jump.state = MovementState::Falling;
                jump.reset_at(body.position.y);
                animation = AnimationType::Falling;
            } else {
                animation = AnimationType::Jumping;
            }
        } else if sweep(body, down, Direction::Down, dist) {
            jump.state = MovementState::Grounded;
            jump.reset_at(body.position.y);
            animation = AnimationType::Idle;
        } else {
            animation = AnimationType::Falling;
        }

        body.sync_hitbox();
    }

    let step = velocity.x * dt;
    if velocity.x < 0.0 {
        facing = Some(FacingDirection::Left);
        let left = scan(body, map, Direction::Left);
        sweep(body, left, Direction::Left, -step);
    } else if velocity.x > 0.0 {
        facing = Some(FacingDirection::Right);
        let right = scan(body, map, Direction::Right);
        sweep(body, right, Direction::Right, step);
    }

    if velocity.x != 0.0 {
        if animation == AnimationType::Idle {
            animation = AnimationType::Running;
        }
    } else if !jump.is_airborne() {
        animation = AnimationType::Idle;
    }

    body.sync_hitbox();

    MoveReport {
        moved: body.hitbox != start_hitbox,
        animation,
        facing,
    }
}

/// Teleport a character and restart its vertical state from there
pub fn place_character(body: &mut Body, jump: &mut JumpState, x: f32, y: f32) {
    body.move_to(x, y);
    jump.state = MovementState::Grounded;
    jump.reset_at(body.position.y);
}

/// Apply the jump key for one step. Returns true if a jump is active.
///
/// Outside freefall, holding the key starts or sustains a jump and letting
/// go turns an active jump into freefall.
pub fn apply_jump_input(jump: &mut JumpState, params: &JumpParams, jump_held: bool) -> bool {
    if jump.is_free_fall() {
        return false;
    }
    if jump_held {
        jump.start_jump(params);
        true
    } else {
        jump.release_jump();
        false
    }
}

/// Step length for the movement systems, capped at `max_frame_time`.
/// The default 1/60 s step is well under the cap; a coarser timestep set
/// on `Time<Fixed>` gets clamped.
fn step_time(time: &Time<Fixed>, config: Option<&GameConfig>) -> f32 {
    let dt = time.delta_seconds();
    match config {
        Some(config) => dt.min(config.physics.max_frame_time),
        None => dt,
    }
}

fn apply_jump_input_system(
    mut query: Query<(
        &PlayerIntent,
        &JumpParams,
        &mut JumpState,
        &mut AnimationState,
        Option<&mut AnimationSet>,
    )>,
) {
    for (intent, params, mut jump, mut anim_state, anim_set) in query.iter_mut() {
        if apply_jump_input(&mut jump, params, intent.jump_held)
            && let Some(mut set) = anim_set
        {
            set.change(&mut anim_state, AnimationType::Jumping);
        }
    }
}

#[allow(clippy::type_complexity)]
fn move_characters_system(
    time: Res<Time<Fixed>>,
    config: Option<Res<GameConfig>>,
    map: Option<Res<Tilemap>>,
    mut query: Query<(
        Entity,
        &mut Body,
        &mut JumpState,
        &JumpParams,
        &Velocity,
        &mut AnimationState,
        Option<&mut AnimationSet>,
    )>,
    mut moved_events: EventWriter<CharacterMoved>,
) {
    let Some(map) = map else {
        return;
    };
    let dt = step_time(&time, config.as_deref());

    for (entity, mut body, mut jump, params, velocity, mut anim_state, anim_set) in
        query.iter_mut()
    {
        let report = move_character(
            &mut body,
            &mut jump,
            params,
            velocity,
            anim_state.current,
            dt,
            &map,
        );

        if let Some(facing) = report.facing {
            anim_state.facing = facing;
        }
        if let Some(mut set) = anim_set {
            set.change(&mut anim_state, report.animation);
        }
        if report.moved {
            moved_events.send(CharacterMoved {
                entity,
                position: body.position,
            });
        }
    }
}
