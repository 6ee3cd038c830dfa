use crate::enums::{AnimationType, FacingDirection, MovementState};
use bevy::prelude::*;

/// Pixel-aligned collision rectangle, top-left origin, y grows downward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Hitbox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Physical body - continuous position plus the derived integer hitbox.
///
/// `origin` is the offset from the hitbox corner to `position`, so a body
/// with origin `(w / 2, h)` is positioned by its bottom centre.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub origin: Vec2,
    pub hitbox: Hitbox,
}

impl Body {
    pub fn new(width: i32, height: i32, origin: Vec2) -> Self {
        let mut body = Self {
            position: Vec2::ZERO,
            origin,
            hitbox: Hitbox {
                x: 0,
                y: 0,
                w: width,
                h: height,
            },
        };
        body.sync_hitbox();
        body
    }

    /// Teleport to `(x, y)` and re-derive the hitbox
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.sync_hitbox();
    }

    /// Re-derive the hitbox from the position. Returns true if it moved.
    pub fn sync_hitbox(&mut self) -> bool {
        let x = (self.position.x - self.origin.x).floor() as i32;
        let y = (self.position.y - self.origin.y).floor() as i32;
        let moved = x != self.hitbox.x || y != self.hitbox.y;
        self.hitbox.x = x;
        self.hitbox.y = y;
        moved
    }

    pub fn left(&self) -> f32 {
        self.position.x - self.origin.x
    }

    pub fn top(&self) -> f32 {
        self.position.y - self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.left() + self.hitbox.w as f32
    }

    pub fn bottom(&self) -> f32 {
        self.top() + self.hitbox.h as f32
    }
}

/// Horizontal velocity in pixels per second. Vertical motion comes from
/// the jump kinematics in [`JumpState`].
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
}

/// Jump and run tuning for a character
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct JumpParams {
    pub gravity: f32,
    pub run_speed: f32,
    pub jump_velocity: f32,
    pub jump_time_max: f32,
    pub terminal_velocity: f32,
}

/// Vertical movement state and the bookkeeping of the current jump or fall
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct JumpState {
    pub state: MovementState,
    /// Height the current jump or fall started from
    pub start_height: f32,
    /// Upward speed the current arc started with
    pub start_jump_vector: f32,
    pub air_time: f32,
    pub fall_time: f32,
}

impl JumpState {
    pub fn is_airborne(&self) -> bool {
        self.state.is_airborne()
    }

    pub fn is_free_fall(&self) -> bool {
        self.state.is_free_fall()
    }

    /// Start a new arc from height `y`
    pub fn reset_at(&mut self, y: f32) {
        self.start_height = y;
        self.start_jump_vector = 0.0;
        self.air_time = 0.0;
        self.fall_time = 0.0;
    }

    /// Begin (or keep) an active jump
    pub fn start_jump(&mut self, params: &JumpParams) {
        if self.state == MovementState::Grounded {
            self.state = MovementState::Rising;
        }
        self.start_jump_vector = params.jump_velocity;
    }

    /// Jump key released: an active jump turns into freefall
    pub fn release_jump(&mut self) {
        if self.state == MovementState::Rising {
            self.state = MovementState::Falling;
        }
    }
}

/// Sprite padding around the hitbox: left, top, right, bottom
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Padding {
    /// Render rectangle `(x, y, w, h)` for a hitbox, in map pixels
    pub fn render_rect(&self, hitbox: &Hitbox) -> (i32, i32, i32, i32) {
        (
            hitbox.x - self.left,
            hitbox.y - self.top,
            hitbox.w + self.left + self.right,
            hitbox.h + self.top + self.bottom,
        )
    }
}

/// Animation state - current animation
#[derive(Component, Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub current: AnimationType,
    pub frame: usize,
    pub timer: f32,
    pub facing: FacingDirection,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current: AnimationType::Idle,
            frame: 0,
            timer: 0.0,
            facing: FacingDirection::Right,
        }
    }
}

/// Player marker component
#[derive(Component)]
pub struct Player;

/// Player intent component - captures player input
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct PlayerIntent {
    pub jump_held: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> JumpParams {
        JumpParams {
            gravity: 5000.0,
            run_speed: 320.0,
            jump_velocity: 800.0,
            jump_time_max: 0.14,
            terminal_velocity: 960.0,
        }
    }

    #[test]
    fn test_body_hitbox_follows_position() {
        let mut body = Body::new(32, 52, Vec2::new(16.0, 52.0));
        body.move_to(112.0, 448.0);
        assert_eq!(body.hitbox, Hitbox { x: 96, y: 396, w: 32, h: 52 });
        assert_eq!(body.left(), 96.0);
        assert_eq!(body.bottom(), 448.0);
    }

    #[test]
    fn test_hitbox_floors_negative_positions() {
        let mut body = Body::new(10, 10, Vec2::ZERO);
        body.move_to(-0.5, -3.2);
        assert_eq!(body.hitbox.x, -1);
        assert_eq!(body.hitbox.y, -4);
    }

    #[test]
    fn test_sync_hitbox_reports_whole_pixel_moves_only() {
        let mut body = Body::new(10, 10, Vec2::ZERO);
        body.move_to(5.0, 5.0);
        body.position.x += 0.4;
        assert!(!body.sync_hitbox());
        body.position.x += 0.7;
        assert!(body.sync_hitbox());
        assert_eq!(body.hitbox.x, 6);
    }

    #[test]
    fn test_start_jump_from_ground() {
        let mut jump = JumpState::default();
        jump.start_jump(&params());
        assert_eq!(jump.state, MovementState::Rising);
        assert_eq!(jump.start_jump_vector, 800.0);
    }

    #[test]
    fn test_start_jump_does_not_cancel_freefall() {
        let mut jump = JumpState {
            state: MovementState::Falling,
            ..default()
        };
        jump.start_jump(&params());
        assert_eq!(jump.state, MovementState::Falling);
    }

    #[test]
    fn test_release_jump() {
        let mut jump = JumpState {
            state: MovementState::Rising,
            ..default()
        };
        jump.release_jump();
        assert!(jump.is_free_fall());

        let mut grounded = JumpState::default();
        grounded.release_jump();
        assert_eq!(grounded.state, MovementState::Grounded);
    }

    #[test]
    fn test_reset_at() {
        let mut jump = JumpState {
            state: MovementState::Falling,
            start_height: 10.0,
            start_jump_vector: 800.0,
            air_time: 0.3,
            fall_time: 0.2,
        };
        jump.reset_at(42.0);
        assert_eq!(jump.start_height, 42.0);
        assert_eq!(jump.start_jump_vector, 0.0);
        assert_eq!(jump.air_time, 0.0);
        assert_eq!(jump.fall_time, 0.0);
    }

    #[test]
    fn test_padding_render_rect() {
        let padding = Padding {
            left: 8,
            top: 12,
            right: 8,
            bottom: 0,
        };
        let hitbox = Hitbox { x: 96, y: 396, w: 32, h: 52 };
        assert_eq!(padding.render_rect(&hitbox), (88, 384, 48, 64));
    }
}
