use std::path::PathBuf;

use anyhow::{bail, Context};
use bevy::log::{Level as LogLevel, LogPlugin};
use bevy::prelude::*;
use clap::Parser;

mod celebration;
mod entities;
mod game;
mod level;
mod physics;
mod rules;
mod session;

use level::{Level, LevelConfig};
use session::SessionState;

// Mirrors the session state so systems can be scheduled per phase
#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, States)]
pub enum GameState {
    #[default]
    Playing,
    Won,
    Lost,
}

impl From<SessionState> for GameState {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Playing => GameState::Playing,
            SessionState::Won => GameState::Won,
            SessionState::Lost => GameState::Lost,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "maze_escape", about = "Collect every item and reach the exit before the chasers catch you")]
struct Cli {
    /// Level file (RON) to play instead of the built-in maze
    #[arg(short, long, value_name = "PATH")]
    level: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.level {
        Some(path) => LevelConfig::load(path)
            .with_context(|| format!("failed to load level {}", path.display()))?,
        None => LevelConfig::default(),
    };
    let level = Level::from_config(&config).context("level failed validation")?;
    let window_size = level.world_size;

    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Maze Escape".into(),
                        resolution: (window_size.x, window_size.y).into(),
                        resizable: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level: if cli.verbose { LogLevel::DEBUG } else { LogLevel::INFO },
                    ..default()
                }),
        )
        .insert_resource(ClearColor(Color::srgb_u8(0x33, 0x33, 0x33)))
        .init_state::<GameState>()
        .add_systems(Startup, setup_camera)
        .add_plugins(game::GamePlugin::new(level))
        .run();

    if let AppExit::Error(code) = exit {
        bail!("game exited with error code {code}");
    }
    Ok(())
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}
