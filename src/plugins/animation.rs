use crate::components::{AnimationState, Body, Padding};
use crate::config::AnimationConfig;
use crate::enums::{AnimationType, FacingDirection};
use crate::plugins::spritesheet::Spritesheet;
use bevy::prelude::*;
use std::collections::HashMap;

/// Plugin for frame animation and sprite placement
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (advance_animation_system, update_character_sprite_system).chain(),
        );
    }
}

/// A run of spritesheet frames played at a fixed delay
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub start_frame: usize,
    pub end_frame: usize,
    pub frame_delay: f32,
    pub running: bool,
    pub looping: bool,
    pub pong: bool,
    pub forward: bool,
}

impl Animation {
    /// Animation over `start..=end`. Single-frame ranges (`end <= start`)
    /// and non-positive delays hold the start frame.
    pub fn new(start: usize, end: usize, delay: f32) -> Self {
        Self {
            start_frame: start,
            end_frame: end,
            frame_delay: delay,
            running: end > start && delay > 0.0,
            looping: true,
            pong: false,
            forward: true,
        }
    }

    pub fn with_pong(mut self, pong: bool) -> Self {
        self.pong = pong;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn restart(&mut self) {
        self.forward = true;
        self.running = self.end_frame > self.start_frame && self.frame_delay > 0.0;
    }

    /// Advance by `delta_time` from `current`, carrying leftover time in
    /// `counter`. Returns the new frame.
    pub fn animate(&mut self, delta_time: f32, current: usize, counter: &mut f32) -> usize {
        if !self.running {
            return current;
        }

        let start = self.start_frame as isize;
        let end = self.end_frame as isize;
        let mut frame = current as isize;

        *counter += delta_time;
        while *counter >= self.frame_delay {
            *counter -= self.frame_delay;

            frame += if self.forward { 1 } else { -1 };

            if frame > end {
                if self.pong {
                    self.forward = false;
                    frame = end - 1;
                } else if self.looping {
                    frame = start;
                } else {
                    frame = end;
                    self.running = false;
                    *counter = 0.0;
                    break;
                }
            } else if frame < start {
                if self.pong {
                    self.forward = true;
                    frame = start + 1;
                } else {
                    frame = end;
                }
            }
        }

        frame as usize
    }
}

/// Animations a character can switch between
#[derive(Component, Clone, Debug, Default)]
pub struct AnimationSet {
    pub animations: HashMap<AnimationType, Animation>,
}

impl AnimationSet {
    pub fn insert(&mut self, kind: AnimationType, animation: Animation) {
        self.animations.insert(kind, animation);
    }

    pub fn get_mut(&mut self, kind: AnimationType) -> Option<&mut Animation> {
        self.animations.get_mut(&kind)
    }

    /// Switch `state` to `kind`. Switching to the current animation or to
    /// one that is not in the set does nothing. Returns true on a switch.
    pub fn change(&mut self, state: &mut AnimationState, kind: AnimationType) -> bool {
        if state.current == kind {
            return false;
        }
        let Some(animation) = self.animations.get_mut(&kind) else {
            return false;
        };
        animation.restart();
        state.current = kind;
        state.frame = animation.start_frame;
        state.timer = 0.0;
        true
    }
}

impl From<&[(AnimationType, AnimationConfig)]> for AnimationSet {
    fn from(configs: &[(AnimationType, AnimationConfig)]) -> Self {
        let mut set = Self::default();
        for (kind, config) in configs {
            set.insert(*kind, Animation::new(config.start, config.end, config.delay));
        }
        set
    }
}

/// Step the current animation of every character
fn advance_animation_system(
    time: Res<Time>,
    mut query: Query<(&mut AnimationState, &mut AnimationSet)>,
) {
    let delta_time = time.delta_seconds();

    for (mut state, mut set) in query.iter_mut() {
        let state = &mut *state;
        if let Some(animation) = set.get_mut(state.current) {
            state.frame = animation.animate(delta_time, state.frame, &mut state.timer);
        }
    }
}

/// Centre of a map-pixel rectangle in world space (y up)
pub fn rect_center_world(x: i32, y: i32, w: i32, h: i32) -> Vec2 {
    Vec2::new(x as f32 + w as f32 / 2.0, -(y as f32 + h as f32 / 2.0))
}

/// Place the sprite over the padded hitbox and pick the animation frame
fn update_character_sprite_system(
    mut query: Query<(
        &Body,
        &Padding,
        &AnimationState,
        &Spritesheet,
        &mut Transform,
        &mut TextureAtlasSprite,
        &mut Visibility,
    )>,
) {
    for (body, padding, state, sheet, mut transform, mut sprite, mut visibility) in
        query.iter_mut()
    {
        let (x, y, w, h) = padding.render_rect(&body.hitbox);
        let center = rect_center_world(x, y, w, h);
        transform.translation.x = center.x;
        transform.translation.y = center.y;

        sprite.custom_size = Some(Vec2::new(w as f32, h as f32));
        sprite.flip_x = state.facing == FacingDirection::Left;

        if state.frame < sheet.frame_count {
            sprite.index = state.frame;
            *visibility = Visibility::Inherited;
        } else {
            *visibility = Visibility::Hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame_animation_holds() {
        let mut anim = Animation::new(7, 0, 0.0);
        assert!(!anim.running);
        let mut counter = 0.0;
        assert_eq!(anim.animate(1.0, 7, &mut counter), 7);
        assert_eq!(counter, 0.0);
    }

    #[test]
    fn test_zero_delay_does_not_run() {
        let anim = Animation::new(0, 8, 0.0);
        assert!(!anim.running);
    }

    #[test]
    fn test_loop_wraps_to_start() {
        let mut anim = Animation::new(0, 2, 0.1);
        let mut counter = 0.0;
        let mut frame = 0;
        let mut frames = Vec::new();
        for _ in 0..5 {
            frame = anim.animate(0.1, frame, &mut counter);
            frames.push(frame);
        }
        assert_eq!(frames, vec![1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_counter_carries_partial_time() {
        let mut anim = Animation::new(0, 8, 0.1);
        let mut counter = 0.0;
        let frame = anim.animate(0.25, 0, &mut counter);
        assert_eq!(frame, 2);
        assert!((counter - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_pong_reverses_at_both_ends() {
        let mut anim = Animation::new(2, 4, 0.1).with_pong(true);
        let mut counter = 0.0;
        let mut frame = 2;
        let mut frames = Vec::new();
        for _ in 0..6 {
            frame = anim.animate(0.1, frame, &mut counter);
            frames.push(frame);
        }
        assert_eq!(frames, vec![3, 4, 3, 2, 3, 4]);
    }

    #[test]
    fn test_non_looping_stops_at_end() {
        let mut anim = Animation::new(0, 2, 0.1).with_looping(false);
        let mut counter = 0.0;
        let frame = anim.animate(1.0, 0, &mut counter);
        assert_eq!(frame, 2);
        assert!(!anim.running);
        assert_eq!(anim.animate(1.0, frame, &mut counter), 2);
    }

    #[test]
    fn test_change_resets_frame_and_timer() {
        let mut set = AnimationSet::default();
        set.insert(AnimationType::Idle, Animation::new(7, 0, 0.0));
        set.insert(AnimationType::Running, Animation::new(0, 8, 0.01875));

        let mut state = AnimationState {
            current: AnimationType::Idle,
            frame: 7,
            timer: 0.3,
            ..default()
        };
        assert!(set.change(&mut state, AnimationType::Running));
        assert_eq!(state.current, AnimationType::Running);
        assert_eq!(state.frame, 0);
        assert_eq!(state.timer, 0.0);
    }

    #[test]
    fn test_change_to_same_state_is_ignored() {
        let mut set = AnimationSet::default();
        set.insert(AnimationType::Running, Animation::new(0, 8, 0.01875));
        let mut state = AnimationState {
            current: AnimationType::Running,
            frame: 5,
            timer: 0.01,
            ..default()
        };
        assert!(!set.change(&mut state, AnimationType::Running));
        assert_eq!(state.frame, 5);
        assert_eq!(state.timer, 0.01);
    }

    #[test]
    fn test_change_to_missing_animation_is_ignored() {
        let mut set = AnimationSet::default();
        let mut state = AnimationState::default();
        assert!(!set.change(&mut state, AnimationType::Falling));
        assert_eq!(state.current, AnimationType::Idle);
    }

    #[test]
    fn test_change_restarts_reversed_animation() {
        let mut set = AnimationSet::default();
        set.insert(AnimationType::Idle, Animation::new(0, 0, 0.0));
        set.insert(
            AnimationType::Running,
            Animation::new(0, 2, 0.1).with_pong(true),
        );
        set.get_mut(AnimationType::Running).unwrap().forward = false;

        let mut state = AnimationState::default();
        set.change(&mut state, AnimationType::Running);
        assert!(set.get_mut(AnimationType::Running).unwrap().forward);
    }

    #[test]
    fn test_set_from_default_config() {
        let config = crate::config::PlayerConfig::default();
        let set = AnimationSet::from(config.animations.as_slice());
        assert_eq!(set.animations.len(), 4);
        assert!(set.animations[&AnimationType::Running].running);
        assert!(!set.animations[&AnimationType::Idle].running);
    }

    #[test]
    fn test_rect_center_world_flips_y() {
        assert_eq!(rect_center_world(88, 384, 48, 64), Vec2::new(112.0, -416.0));
    }

    #[test]
    fn test_advance_animation_system_runs() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, advance_animation_system);

        let mut set = AnimationSet::default();
        set.insert(AnimationType::Running, Animation::new(0, 8, 0.01875));
        let entity = app
            .world
            .spawn((
                AnimationState {
                    current: AnimationType::Running,
                    ..default()
                },
                set,
            ))
            .id();

        for _ in 0..5 {
            app.update();
        }

        let state = app.world.get::<AnimationState>(entity).unwrap();
        assert_eq!(state.current, AnimationType::Running);
        assert!(state.frame <= 8);
    }
}
