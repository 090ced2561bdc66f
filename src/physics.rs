//! Arcade-style collision: square bodies that slide against maze walls and
//! report overlaps with each other.

use bevy::math::Vec2;

use crate::level::Maze;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// How far `self` would have to move along `axis` to stop overlapping
    /// `other`, taking the shorter way out.
    pub fn depth_along(&self, other: &Aabb, axis: usize) -> f32 {
        (self.max[axis] - other.min[axis]).min(other.max[axis] - self.min[axis])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
}

impl Body {
    pub fn new(position: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        self.aabb().overlaps(&other.aabb())
    }
}

/// Integrates `body` for `dt` seconds, x axis first, stopping it flush
/// against any wall it runs into.
pub fn move_and_collide(body: &mut Body, maze: &Maze, dt: f32) {
    let delta = body.velocity * dt;
    advance_axis(body, maze, 0, delta.x);
    advance_axis(body, maze, 1, delta.y);
}

// A wall the body already overlapped before this step only lets it move in
// the direction that makes the overlap shallower, so bodies placed inside
// walls can work their way out but never burrow through.
fn advance_axis(body: &mut Body, maze: &Maze, axis: usize, delta: f32) {
    if delta == 0.0 {
        return;
    }

    let before = body.aabb();
    body.position[axis] += delta;
    let after = body.aabb();
    let half = body.size / 2.0;

    let mut stop: Option<f32> = None;
    for (col, row) in maze.cells_covering(&after) {
        if !maze.is_wall(col, row) {
            continue;
        }
        let wall = maze.cell_rect(col, row);
        if before.overlaps(&wall) {
            if after.depth_along(&wall, axis) > before.depth_along(&wall, axis) {
                body.position[axis] -= delta;
                return;
            }
            continue;
        }
        if !after.overlaps(&wall) {
            continue;
        }
        let flush = if delta > 0.0 {
            wall.min[axis] - half
        } else {
            wall.max[axis] + half
        };
        stop = Some(match stop {
            Some(current) if delta > 0.0 => current.min(flush),
            Some(current) => current.max(flush),
            None => flush,
        });
    }

    if let Some(position) = stop {
        body.position[axis] = position;
    }
}
