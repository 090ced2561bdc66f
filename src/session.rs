//! The session state machine: Playing until the player either escapes with
//! every item or gets caught, then waiting for a restart.
//!
//! The session never talks to the engine directly. `tick` and `press` return
//! [`Intent`]s that the presentation layer carries out.

use bevy::log::{debug, info};
use bevy::math::Vec2;
use bevy::prelude::Resource;

use crate::entities::EntityState;
use crate::level::Level;
use crate::rules::{self, Contact, MovementInput};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Playing,
    Won,
    Lost,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Discrete key presses the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Alarm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    /// Top-left corner, in world coordinates.
    pub position: Vec2,
    pub tone: Tone,
}

/// A named frame-sequence animation to play at a fixed spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationCue {
    pub name: &'static str,
    pub position: Vec2,
    pub first_frame: usize,
    pub last_frame: usize,
    pub frame_rate: f32,
    pub looping: bool,
}

pub const CELEBRATION: AnimationCue = AnimationCue {
    name: "celebration",
    position: Vec2::new(400.0, 300.0),
    first_frame: 0,
    last_frame: 10,
    frame_rate: 10.0,
    looping: true,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    RemoveItem(usize),
    SetScoreText(String),
    FreezeWorld,
    PlayAnimation(AnimationCue),
    ShowMessage(Message),
    AwaitRestart,
    ResetWorld,
}

#[derive(Debug, Resource)]
pub struct Session {
    level: Level,
    entities: EntityState,
    state: SessionState,
    awaiting_restart: bool,
}

impl Session {
    pub fn new(level: Level) -> Self {
        let entities = EntityState::spawn(&level);
        Self {
            level,
            entities,
            state: SessionState::Playing,
            awaiting_restart: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn entities(&self) -> &EntityState {
        &self.entities
    }

    pub fn score(&self) -> u32 {
        self.entities.score
    }

    pub fn total_items(&self) -> u32 {
        self.level.total_items()
    }

    pub fn score_text(&self) -> String {
        format!("Items: {}/{}", self.score(), self.total_items())
    }

    /// Nothing moves outside of `Playing`.
    pub fn is_frozen(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn awaiting_restart(&self) -> bool {
        self.awaiting_restart
    }

    /// Advances one frame. A no-op in the terminal states.
    pub fn tick(&mut self, input: MovementInput, dt: f32) -> Vec<Intent> {
        if self.is_frozen() {
            return Vec::new();
        }

        let contacts = rules::advance(&mut self.entities, &self.level, input, dt);
        let mut intents = Vec::new();
        for contact in contacts {
            match contact {
                Contact::EnemyTouched { enemy } => {
                    info!(enemy, score = self.score(), "caught by an enemy");
                    intents.extend(self.lose());
                }
                Contact::ItemPicked { item } => {
                    info!(item, score = self.score(), total = self.total_items(), "item collected");
                    intents.push(Intent::RemoveItem(item));
                    intents.push(Intent::SetScoreText(self.score_text()));
                }
                Contact::ExitReached { complete: true } => {
                    info!(score = self.score(), "reached the exit with every item");
                    intents.extend(self.win());
                }
                Contact::ExitReached { complete: false } => {
                    debug!(score = self.score(), total = self.total_items(), "exit is locked");
                }
            }
        }
        intents
    }

    /// Handles a discrete key press. Restart only works once the session has
    /// ended.
    pub fn press(&mut self, key: Key) -> Vec<Intent> {
        match key {
            Key::Restart if self.awaiting_restart => {
                self.entities = EntityState::spawn(&self.level);
                self.state = SessionState::Playing;
                self.awaiting_restart = false;
                info!("session restarted");
                vec![Intent::ResetWorld, Intent::SetScoreText(self.score_text())]
            }
            Key::Restart => Vec::new(),
        }
    }

    fn win(&mut self) -> Vec<Intent> {
        self.state = SessionState::Won;
        self.awaiting_restart = true;
        vec![
            Intent::FreezeWorld,
            Intent::PlayAnimation(CELEBRATION),
            Intent::ShowMessage(Message {
                text: "Congratulations! Press R to restart".to_string(),
                position: Vec2::new(300.0, 550.0),
                tone: Tone::Normal,
            }),
            Intent::AwaitRestart,
        ]
    }

    fn lose(&mut self) -> Vec<Intent> {
        self.state = SessionState::Lost;
        self.awaiting_restart = true;
        vec![
            Intent::FreezeWorld,
            Intent::ShowMessage(Message {
                text: "Game Over! Press R to restart".to_string(),
                position: Vec2::new(300.0, 300.0),
                tone: Tone::Alarm,
            }),
            Intent::AwaitRestart,
        ]
    }
}
