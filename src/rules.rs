//! Per-frame game rules: steering, pursuit, world-wrap and contact outcomes.

use bevy::math::Vec2;

use crate::entities::{Enemy, EntityState, Player};
use crate::level::Level;
use crate::physics::move_and_collide;

/// Directional keys held during a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MovementInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    EnemyTouched { enemy: usize },
    ItemPicked { item: usize },
    /// `complete` is true when every item had been collected.
    ExitReached { complete: bool },
}

/// Rebuilds the player's velocity from scratch. Each direction is checked in
/// turn, so right beats left and down beats up when both are held.
pub fn steer_player(player: &mut Player, input: MovementInput) {
    let velocity = &mut player.body.velocity;
    *velocity = Vec2::ZERO;

    if input.left {
        velocity.x = -player.speed;
    }
    if input.right {
        velocity.x = player.speed;
    }
    if input.up {
        velocity.y = -player.speed;
    }
    if input.down {
        velocity.y = player.speed;
    }
}

pub fn pursue(enemy: &mut Enemy, target: Vec2) {
    let direction = (target - enemy.body.position).normalize_or_zero();
    enemy.body.velocity = direction * enemy.speed;
}

/// Teleports a point that left the world to the opposite edge. Returns
/// whether a teleport happened.
pub fn wrap_into_world(position: &mut Vec2, world_size: Vec2) -> bool {
    let before = *position;

    if position.x < 0.0 {
        position.x = world_size.x;
    } else if position.x > world_size.x {
        position.x = 0.0;
    }

    if position.y < 0.0 {
        position.y = world_size.y;
    } else if position.y > world_size.y {
        position.y = 0.0;
    }

    *position != before
}

/// Contact checks in registration order: enemies, then items, then the exit.
/// An enemy contact ends the frame's checks.
pub fn resolve_contacts(state: &mut EntityState, level: &Level) -> Vec<Contact> {
    let player = state.player.body;

    if let Some(enemy) = state
        .enemies
        .iter()
        .position(|enemy| enemy.body.overlaps(&player))
    {
        return vec![Contact::EnemyTouched { enemy }];
    }

    let mut contacts = Vec::new();
    for (idx, item) in state.items.iter_mut().enumerate() {
        if item.collected || !item.body.overlaps(&player) {
            continue;
        }
        item.collected = true;
        state.score += 1;
        contacts.push(Contact::ItemPicked { item: idx });
    }

    if level.exit_body().overlaps(&player) {
        contacts.push(Contact::ExitReached {
            complete: state.score == level.total_items(),
        });
    }

    contacts
}

/// Runs one frame of play and reports what the player touched.
pub fn advance(
    state: &mut EntityState,
    level: &Level,
    input: MovementInput,
    dt: f32,
) -> Vec<Contact> {
    steer_player(&mut state.player, input);

    let target = state.player_position();
    for enemy in &mut state.enemies {
        pursue(enemy, target);
    }

    move_and_collide(&mut state.player.body, &level.maze, dt);
    for enemy in &mut state.enemies {
        move_and_collide(&mut enemy.body, &level.maze, dt);
    }

    if wrap_into_world(&mut state.player.body.position, level.world_size) {
        bevy::log::debug!(position = ?state.player.body.position, "player wrapped around the world");
    }

    resolve_contacts(state, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelConfig;

    fn setup() -> (Level, EntityState) {
        let level = Level::from_config(&LevelConfig::default()).unwrap();
        let state = EntityState::spawn(&level);
        (level, state)
    }

    fn held(left: bool, right: bool, up: bool, down: bool) -> MovementInput {
        MovementInput {
            left,
            right,
            up,
            down,
        }
    }

    #[test]
    fn no_input_stops_the_player() {
        let (_, mut state) = setup();
        state.player.body.velocity = Vec2::new(150.0, -150.0);
        steer_player(&mut state.player, MovementInput::default());
        assert_eq!(state.player.body.velocity, Vec2::ZERO);
    }

    #[test]
    fn diagonal_movement_sets_both_axes() {
        let (_, mut state) = setup();
        steer_player(&mut state.player, held(true, false, false, true));
        assert_eq!(state.player.body.velocity, Vec2::new(-150.0, 150.0));
    }

    #[test]
    fn later_direction_wins_a_tie() {
        let (_, mut state) = setup();
        steer_player(&mut state.player, held(true, true, true, true));
        assert_eq!(state.player.body.velocity, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn enemies_head_straight_for_the_player() {
        let (_, mut state) = setup();
        let enemy = &mut state.enemies[0];
        enemy.body.position = Vec2::ZERO;
        pursue(enemy, Vec2::new(30.0, 40.0));
        assert!((enemy.body.velocity - Vec2::new(60.0, 80.0)).length() < 1e-4);
    }

    #[test]
    fn enemy_on_top_of_the_player_stands_still() {
        let (_, mut state) = setup();
        let enemy = &mut state.enemies[0];
        pursue(enemy, enemy.body.position);
        assert_eq!(enemy.body.velocity, Vec2::ZERO);
    }

    #[test]
    fn wrap_teleports_to_the_opposite_edge() {
        let world = Vec2::new(800.0, 600.0);

        let mut left = Vec2::new(-5.0, 300.0);
        assert!(wrap_into_world(&mut left, world));
        assert_eq!(left, Vec2::new(800.0, 300.0));

        let mut bottom_right = Vec2::new(801.0, 600.5);
        assert!(wrap_into_world(&mut bottom_right, world));
        assert_eq!(bottom_right, Vec2::new(0.0, 0.0));

        let mut top = Vec2::new(10.0, -0.1);
        assert!(wrap_into_world(&mut top, world));
        assert_eq!(top, Vec2::new(10.0, 600.0));
    }

    #[test]
    fn wrap_leaves_boundary_positions_alone() {
        let world = Vec2::new(800.0, 600.0);
        for point in [Vec2::ZERO, world, Vec2::new(400.0, 300.0)] {
            let mut moved = point;
            assert!(!wrap_into_world(&mut moved, world));
            assert_eq!(moved, point);
        }
    }

    #[test]
    fn player_leaving_the_world_wraps_on_the_same_frame() {
        let (level, mut state) = setup();
        state.player.body.position = Vec2::new(-5.0, 75.0);
        advance(&mut state, &level, MovementInput::default(), 1.0 / 60.0);
        assert_eq!(state.player_position(), Vec2::new(800.0, 75.0));
    }

    #[test]
    fn picking_up_an_item_counts_once() {
        let (level, mut state) = setup();
        state.player.body.position = Vec2::new(150.0, 150.0);

        let first = resolve_contacts(&mut state, &level);
        assert_eq!(first, vec![Contact::ItemPicked { item: 0 }]);
        assert_eq!(state.score, 1);
        assert!(state.items[0].collected);

        let second = resolve_contacts(&mut state, &level);
        assert!(second.is_empty());
        assert_eq!(state.score, 1);
    }

    #[test]
    fn enemy_contact_preempts_item_pickup() {
        let (level, mut state) = setup();
        state.player.body.position = Vec2::new(150.0, 150.0);
        state.enemies[2].body.position = Vec2::new(160.0, 150.0);

        let contacts = resolve_contacts(&mut state, &level);
        assert_eq!(contacts, vec![Contact::EnemyTouched { enemy: 2 }]);
        assert_eq!(state.score, 0);
        assert!(!state.items[0].collected);
    }

    #[test]
    fn exit_reports_whether_the_set_is_complete() {
        let (level, mut state) = setup();
        state.player.body.position = Vec2::new(735.0, 560.0);
        assert_eq!(
            resolve_contacts(&mut state, &level),
            vec![Contact::ExitReached { complete: false }]
        );

        for item in &mut state.items {
            item.collected = true;
        }
        state.score = level.total_items();
        assert_eq!(
            resolve_contacts(&mut state, &level),
            vec![Contact::ExitReached { complete: true }]
        );
    }

    #[test]
    fn enemies_close_in_over_time() {
        let (level, mut state) = setup();
        let start = state.enemies[2].body.position.distance(state.player_position());
        for _ in 0..30 {
            advance(&mut state, &level, MovementInput::default(), 1.0 / 60.0);
        }
        let end = state.enemies[2].body.position.distance(state.player_position());
        assert!(end < start);
    }
}
