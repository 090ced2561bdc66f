//! Mutable per-session entity state.

use bevy::math::Vec2;

use crate::level::Level;
use crate::physics::Body;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Body,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub body: Body,
    pub collected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub body: Body,
    pub speed: f32,
}

/// Everything that changes while a session is played.
///
/// Collected items stay in `items` with `collected` set, so indices remain
/// stable for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub player: Player,
    pub items: Vec<Item>,
    pub enemies: Vec<Enemy>,
    pub score: u32,
}

impl EntityState {
    pub fn spawn(level: &Level) -> Self {
        Self {
            player: Player {
                body: Body::new(level.player_spawn, level.player_size),
                speed: level.player_speed,
            },
            items: level
                .item_bodies()
                .into_iter()
                .map(|body| Item {
                    body,
                    collected: false,
                })
                .collect(),
            enemies: level
                .enemies
                .iter()
                .map(|&pos| Enemy {
                    body: Body::new(pos, level.enemy_size),
                    speed: level.enemy_speed,
                })
                .collect(),
            score: 0,
        }
    }

    pub fn player_position(&self) -> Vec2 {
        self.player.body.position
    }

    pub fn remaining_items(&self) -> impl Iterator<Item = (usize, &Item)> {
        self.items.iter().enumerate().filter(|(_, item)| !item.collected)
    }
}
