//! Static level layout: the maze grid, spawn tables and tuning values.
//!
//! A level starts life as a [`LevelConfig`], either the built-in reference
//! layout or a RON file, and is validated once into an immutable [`Level`].

use std::fs;
use std::path::{Path, PathBuf};

use bevy::math::Vec2;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::{Aabb, Body};

/// The reference maze, `#` for wall and `.` for open floor.
pub const REFERENCE_GRID: [&str; 13] = [
    "################",
    "#...#..........#",
    "#.#.#.#####.##.#",
    "#.#...#........#",
    "#.###.#.######.#",
    "#...#........#.#",
    "###.########.#.#",
    "#............#.#",
    "#.##########.#.#",
    "#......#.......#",
    "######.#######.#",
    "#..............#",
    "################",
];

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("maze grid is empty")]
    EmptyGrid,
    #[error("maze row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile {tile:?} at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, tile: char },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("level has no items to collect")]
    NoItems,
    #[error("player spawn ({x}, {y}) is not on an open maze cell")]
    SpawnBlocked { x: f32, y: f32 },
    #[error("{what} at ({x}, {y}) cannot be reached from the player spawn")]
    Unreachable { what: String, x: f32, y: f32 },
}

/// Level description as written in a level file.
///
/// Every field is optional in the file; anything left out falls back to the
/// reference level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub world_size: (f32, f32),
    pub tile_size: f32,
    pub grid: Vec<String>,
    pub player_spawn: (f32, f32),
    pub exit: (f32, f32),
    pub items: Vec<(f32, f32)>,
    pub enemies: Vec<(f32, f32)>,
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub player_size: f32,
    pub enemy_size: f32,
    pub item_size: f32,
    pub exit_size: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            world_size: (800.0, 600.0),
            tile_size: 50.0,
            grid: REFERENCE_GRID.iter().map(|row| row.to_string()).collect(),
            player_spawn: (75.0, 75.0),
            exit: (750.0, 550.0),
            items: vec![(150.0, 150.0), (450.0, 250.0), (650.0, 400.0)],
            enemies: vec![(300.0, 300.0), (500.0, 100.0), (700.0, 500.0)],
            player_speed: 150.0,
            enemy_speed: 100.0,
            player_size: 30.0,
            enemy_size: 30.0,
            item_size: 24.0,
            exit_size: 40.0,
        }
    }
}

impl LevelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, LevelError> {
        Ok(ron::de::from_str(text)?)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TileType {
    Wall,
    Floor,
}

/// Immutable tile grid. Cells outside the grid count as floor.
#[derive(Debug, Clone, PartialEq)]
pub struct Maze {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    pub tiles: Vec<TileType>,
}

impl Maze {
    pub fn parse(rows: &[String], tile_size: f32) -> Result<Self, LevelError> {
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(LevelError::EmptyGrid);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, tile) in line.chars().enumerate() {
                tiles.push(match tile {
                    '#' => TileType::Wall,
                    '.' => TileType::Floor,
                    _ => return Err(LevelError::UnknownTile { row, col, tile }),
                });
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            tile_size,
            tiles,
        })
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    pub fn tile(&self, col: i32, row: i32) -> TileType {
        self.index(col, row)
            .map(|idx| self.tiles[idx])
            .unwrap_or(TileType::Floor)
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        self.tile(col, row) == TileType::Wall
    }

    pub fn cell_of(&self, point: Vec2) -> (i32, i32) {
        (
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    pub fn cell_center(&self, col: i32, row: i32) -> Vec2 {
        Vec2::new(
            col as f32 * self.tile_size + self.tile_size / 2.0,
            row as f32 * self.tile_size + self.tile_size / 2.0,
        )
    }

    pub fn cell_rect(&self, col: i32, row: i32) -> Aabb {
        Aabb::from_center(self.cell_center(col, row), self.tile_size)
    }

    /// Cells whose area strictly overlaps `rect`.
    pub fn cells_covering(&self, rect: &Aabb) -> impl Iterator<Item = (i32, i32)> {
        let first_col = (rect.min.x / self.tile_size).floor() as i32;
        let last_col = (rect.max.x / self.tile_size).ceil() as i32 - 1;
        let first_row = (rect.min.y / self.tile_size).floor() as i32;
        let last_row = (rect.max.y / self.tile_size).ceil() as i32 - 1;
        (first_row..=last_row).flat_map(move |row| (first_col..=last_col).map(move |col| (col, row)))
    }

    pub fn walls(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == TileType::Wall)
            .map(|(idx, _)| ((idx % self.width) as i32, (idx / self.width) as i32))
    }

    /// Open cells connected to `start` through open 4-neighbours, indexed like `tiles`.
    pub fn reachable_from(&self, start: (i32, i32)) -> Vec<bool> {
        let mut reachable = vec![false; self.tiles.len()];
        let Some(start_idx) = self.index(start.0, start.1) else {
            return reachable;
        };
        if self.tiles[start_idx] == TileType::Wall {
            return reachable;
        }

        let mut graph = UnGraph::<usize, ()>::new_undirected();
        let mut node_map = vec![NodeIndex::end(); self.tiles.len()];
        for (idx, tile) in self.tiles.iter().enumerate() {
            if *tile == TileType::Floor {
                node_map[idx] = graph.add_node(idx);
            }
        }

        for y in 0..self.height {
            for x in 0..self.width {
                if self.tiles[y * self.width + x] != TileType::Floor {
                    continue;
                }
                let current_node = node_map[y * self.width + x];
                if x + 1 < self.width && self.tiles[y * self.width + (x + 1)] == TileType::Floor {
                    graph.add_edge(current_node, node_map[y * self.width + (x + 1)], ());
                }
                if y + 1 < self.height && self.tiles[(y + 1) * self.width + x] == TileType::Floor {
                    graph.add_edge(current_node, node_map[(y + 1) * self.width + x], ());
                }
            }
        }

        let mut bfs = Bfs::new(&graph, node_map[start_idx]);
        while let Some(node) = bfs.next(&graph) {
            reachable[graph[node]] = true;
        }
        reachable
    }
}

/// A validated level. Read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub maze: Maze,
    pub world_size: Vec2,
    pub player_spawn: Vec2,
    pub exit: Vec2,
    pub items: Vec<Vec2>,
    pub enemies: Vec<Vec2>,
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub player_size: f32,
    pub enemy_size: f32,
    pub item_size: f32,
    pub exit_size: f32,
}

impl Level {
    pub fn from_config(config: &LevelConfig) -> Result<Self, LevelError> {
        for (field, value) in [
            ("tile_size", config.tile_size),
            ("world width", config.world_size.0),
            ("world height", config.world_size.1),
            ("player_speed", config.player_speed),
            ("enemy_speed", config.enemy_speed),
            ("player_size", config.player_size),
            ("enemy_size", config.enemy_size),
            ("item_size", config.item_size),
            ("exit_size", config.exit_size),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(LevelError::NonPositive { field, value });
            }
        }
        if config.items.is_empty() {
            return Err(LevelError::NoItems);
        }

        let maze = Maze::parse(&config.grid, config.tile_size)?;
        let point = |(x, y): (f32, f32)| Vec2::new(x, y);
        let level = Self {
            world_size: point(config.world_size),
            player_spawn: point(config.player_spawn),
            exit: point(config.exit),
            items: config.items.iter().copied().map(point).collect(),
            enemies: config.enemies.iter().copied().map(point).collect(),
            player_speed: config.player_speed,
            enemy_speed: config.enemy_speed,
            player_size: config.player_size,
            enemy_size: config.enemy_size,
            item_size: config.item_size,
            exit_size: config.exit_size,
            maze,
        };
        level.check_reachability()?;
        Ok(level)
    }

    fn check_reachability(&self) -> Result<(), LevelError> {
        let spawn = self.player_spawn;
        let (col, row) = self.maze.cell_of(spawn);
        let on_grid = col >= 0
            && row >= 0
            && (col as usize) < self.maze.width
            && (row as usize) < self.maze.height;
        if !on_grid || self.maze.is_wall(col, row) {
            return Err(LevelError::SpawnBlocked {
                x: spawn.x,
                y: spawn.y,
            });
        }

        let reachable = self.maze.reachable_from((col, row));
        let touches_reachable = |body: &Body| {
            self.maze.cells_covering(&body.aabb()).any(|(c, r)| {
                self.maze
                    .index(c, r)
                    .is_some_and(|idx| reachable[idx])
            })
        };

        for (n, item) in self.item_bodies().iter().enumerate() {
            if !touches_reachable(item) {
                return Err(LevelError::Unreachable {
                    what: format!("item {n}"),
                    x: item.position.x,
                    y: item.position.y,
                });
            }
        }
        let exit = self.exit_body();
        if !touches_reachable(&exit) {
            return Err(LevelError::Unreachable {
                what: "exit".to_string(),
                x: exit.position.x,
                y: exit.position.y,
            });
        }
        Ok(())
    }

    pub fn total_items(&self) -> u32 {
        self.items.len() as u32
    }

    pub fn item_bodies(&self) -> Vec<Body> {
        self.items
            .iter()
            .map(|&pos| Body::new(pos, self.item_size))
            .collect()
    }

    pub fn exit_body(&self) -> Body {
        Body::new(self.exit, self.exit_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Level {
        Level::from_config(&LevelConfig::default()).unwrap()
    }

    #[test]
    fn reference_level_dimensions() {
        let level = reference();
        assert_eq!(level.maze.width, 16);
        assert_eq!(level.maze.height, 13);
        assert_eq!(level.total_items(), 3);
        assert_eq!(level.enemies.len(), 3);
        assert_eq!(level.world_size, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn shipped_level_file_matches_builtin_reference() {
        let parsed = LevelConfig::parse(include_str!("../levels/reference.ron")).unwrap();
        assert_eq!(parsed, LevelConfig::default());
    }

    #[test]
    fn omitted_fields_fall_back_to_reference() {
        let parsed = LevelConfig::parse("(enemy_speed: 80.0, items: [(150.0, 150.0)])").unwrap();
        assert_eq!(parsed.enemy_speed, 80.0);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.grid, LevelConfig::default().grid);
        assert!(Level::from_config(&parsed).is_ok());
    }

    #[test]
    fn cells_outside_the_grid_are_floor() {
        let level = reference();
        assert_eq!(level.maze.tile(-1, 0), TileType::Floor);
        assert_eq!(level.maze.tile(16, 3), TileType::Floor);
        assert_eq!(level.maze.tile(0, 0), TileType::Wall);
        assert_eq!(level.maze.tile(1, 1), TileType::Floor);
    }

    #[test]
    fn covering_cells_ignore_touching_edges() {
        let level = reference();
        let rect = Aabb::from_center(Vec2::new(625.0, 425.0), 50.0);
        let cells: Vec<_> = level.maze.cells_covering(&rect).collect();
        assert_eq!(cells, vec![(12, 8)]);
    }

    #[test]
    fn every_open_cell_of_the_reference_maze_is_connected() {
        let level = reference();
        let reachable = level.maze.reachable_from((1, 1));
        let open = level
            .maze
            .tiles
            .iter()
            .filter(|t| **t == TileType::Floor)
            .count();
        assert_eq!(reachable.iter().filter(|r| **r).count(), open);
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let config = LevelConfig {
            grid: vec!["###".into(), "#.".into()],
            ..LevelConfig::default()
        };
        assert!(matches!(
            Level::from_config(&config),
            Err(LevelError::RaggedRow { row: 1, expected: 3, found: 2 })
        ));
    }

    #[test]
    fn unknown_tiles_are_rejected() {
        let config = LevelConfig {
            grid: vec!["#x#".into()],
            ..LevelConfig::default()
        };
        assert!(matches!(
            Level::from_config(&config),
            Err(LevelError::UnknownTile { tile: 'x', .. })
        ));
    }

    #[test]
    fn spawn_inside_a_wall_is_rejected() {
        let config = LevelConfig {
            player_spawn: (25.0, 25.0),
            ..LevelConfig::default()
        };
        assert!(matches!(
            Level::from_config(&config),
            Err(LevelError::SpawnBlocked { .. })
        ));
    }

    #[test]
    fn walled_off_item_is_rejected() {
        let config = LevelConfig {
            grid: vec![
                "#######".into(),
                "#..#..#".into(),
                "#######".into(),
            ],
            world_size: (350.0, 150.0),
            player_spawn: (75.0, 75.0),
            items: vec![(275.0, 75.0)],
            exit: (125.0, 75.0),
            enemies: Vec::new(),
            ..LevelConfig::default()
        };
        assert!(matches!(
            Level::from_config(&config),
            Err(LevelError::Unreachable { .. })
        ));
    }

    #[test]
    fn level_without_items_is_rejected() {
        let config = LevelConfig {
            items: Vec::new(),
            ..LevelConfig::default()
        };
        assert!(matches!(Level::from_config(&config), Err(LevelError::NoItems)));
    }

    #[test]
    fn non_positive_tuning_is_rejected() {
        let config = LevelConfig {
            enemy_speed: 0.0,
            ..LevelConfig::default()
        };
        assert!(matches!(
            Level::from_config(&config),
            Err(LevelError::NonPositive { field: "enemy_speed", .. })
        ));
    }
}
