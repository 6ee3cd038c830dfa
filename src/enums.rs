use serde::{Deserialize, Serialize};

/// Scan direction for boundary checks against the tile grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit step in tile coordinates (y grows downward)
    pub fn step(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// Vertical movement state - grounded, actively jumping, or in freefall
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MovementState {
    #[default]
    Grounded,
    Rising,
    Falling,
}

impl MovementState {
    pub fn is_airborne(self) -> bool {
        self != MovementState::Grounded
    }

    pub fn is_free_fall(self) -> bool {
        self == MovementState::Falling
    }
}

/// Animation type - different sprite animations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationType {
    Idle,
    Running,
    Jumping,
    Falling,
}

/// Which way the character sprite faces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FacingDirection {
    Left,
    #[default]
    Right,
}
