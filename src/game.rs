use bevy::color::palettes::css;
use bevy::ecs::schedule::common_conditions::not;
use bevy::prelude::*;
use bevy::sprite::Anchor;
use bevy_prototype_lyon::prelude::*;

use crate::celebration;
use crate::level::Level;
use crate::rules::MovementInput;
use crate::session::{Intent, Key, Message, Session, Tone};
use crate::GameState;

const LABEL_FONT_SIZE: f32 = 20.0;
const SCORE_POSITION: Vec2 = Vec2::new(10.0, 10.0);

// --- Plugin ---
pub struct GamePlugin {
    level: Level,
}

impl GamePlugin {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app
            .add_plugins(ShapePlugin)
            .insert_resource(Session::new(self.level.clone()));
        add_session_systems(app);
    }
}

fn add_session_systems(app: &mut App) {
    app
        .add_event::<SessionIntent>()
        .add_systems(OnEnter(GameState::Playing), build_session)
        .add_systems(OnExit(GameState::Won), clear_session)
        .add_systems(OnExit(GameState::Lost), clear_session)
        .add_systems(Update, (
            advance_session.run_if(in_state(GameState::Playing)),
            // R only counts once the Won/Lost state has been entered, so the
            // restart always goes through OnExit/OnEnter.
            listen_for_restart.run_if(not(in_state(GameState::Playing))),
            apply_intents,
            sync_transforms,
            celebration::animate_celebration,
        ).chain());
}

// --- Events ---
#[derive(Event, Debug, Clone)]
struct SessionIntent(Intent);

// --- Components ---
/// Anything spawned for the current session; cleared on restart.
#[derive(Component)]
struct SessionVisual;

#[derive(Component)]
struct PlayerSprite;

#[derive(Component)]
struct EnemySprite(usize);

#[derive(Component)]
struct ItemSprite(usize);

#[derive(Component)]
struct ScoreText;

/// Maps a world point (origin top-left, y down) onto the centred, y-up 2D camera.
pub fn to_screen(point: Vec2, world_size: Vec2, z: f32) -> Vec3 {
    Vec3::new(
        point.x - world_size.x / 2.0,
        world_size.y / 2.0 - point.y,
        z,
    )
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Normal => Color::WHITE,
        Tone::Alarm => css::RED.into(),
    }
}

fn label(text: impl Into<String>, at: Vec2, color: Color, world_size: Vec2) -> Text2dBundle {
    Text2dBundle {
        text: Text::from_section(
            text,
            TextStyle {
                font_size: LABEL_FONT_SIZE,
                color,
                ..default()
            },
        ),
        text_anchor: Anchor::TopLeft,
        transform: Transform::from_translation(to_screen(at, world_size, 20.0)),
        ..default()
    }
}

// --- Systems ---
fn build_session(mut commands: Commands, session: Res<Session>) {
    let level = session.level();
    let maze = &level.maze;
    let world_size = level.world_size;

    let mut wall_count = 0;
    for (col, row) in maze.walls() {
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: css::DARK_GRAY.into(),
                    custom_size: Some(Vec2::splat(maze.tile_size)),
                    ..default()
                },
                transform: Transform::from_translation(to_screen(
                    maze.cell_center(col, row),
                    world_size,
                    0.0,
                )),
                ..default()
            },
            SessionVisual,
        ));
        wall_count += 1;
    }

    commands.spawn((
        ShapeBundle {
            path: GeometryBuilder::build_as(&shapes::RegularPolygon {
                sides: 6,
                feature: shapes::RegularPolygonFeature::Radius(level.exit_size / 2.0),
                ..shapes::RegularPolygon::default()
            }),
            spatial: SpatialBundle {
                transform: Transform::from_translation(to_screen(level.exit, world_size, 1.0)),
                ..default()
            },
            mesh: default(),
            material: default(),
        },
        Fill::color(css::AQUA),
        Stroke::new(css::WHITE, 2.0),
        SessionVisual,
    ));

    let entities = session.entities();
    for (idx, item) in entities.remaining_items() {
        commands.spawn((
            ShapeBundle {
                path: GeometryBuilder::build_as(&shapes::Circle {
                    radius: item.body.size / 2.0,
                    center: Vec2::ZERO,
                }),
                spatial: SpatialBundle {
                    transform: Transform::from_translation(to_screen(
                        item.body.position,
                        world_size,
                        2.0,
                    )),
                    ..default()
                },
                mesh: default(),
                material: default(),
            },
            Fill::color(css::GOLD),
            Stroke::new(css::ORANGE, 2.0),
            ItemSprite(idx),
            SessionVisual,
        ));
    }

    for (idx, enemy) in entities.enemies.iter().enumerate() {
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: css::RED.into(),
                    custom_size: Some(Vec2::splat(enemy.body.size)),
                    ..default()
                },
                transform: Transform::from_translation(to_screen(
                    enemy.body.position,
                    world_size,
                    3.0,
                )),
                ..default()
            },
            EnemySprite(idx),
            SessionVisual,
        ));
    }

    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                color: css::DODGER_BLUE.into(),
                custom_size: Some(Vec2::splat(entities.player.body.size)),
                ..default()
            },
            transform: Transform::from_translation(to_screen(
                entities.player_position(),
                world_size,
                4.0,
            )),
            ..default()
        },
        PlayerSprite,
        SessionVisual,
    ));

    commands.spawn((
        label(session.score_text(), SCORE_POSITION, Color::WHITE, world_size),
        ScoreText,
        SessionVisual,
    ));

    info!(
        walls = wall_count,
        items = session.total_items(),
        enemies = entities.enemies.len(),
        "session built"
    );
}

fn clear_session(mut commands: Commands, visuals: Query<Entity, With<SessionVisual>>) {
    for entity in &visuals {
        commands.entity(entity).despawn_recursive();
    }
}

fn advance_session(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut session: ResMut<Session>,
    mut intents: EventWriter<SessionIntent>,
) {
    let input = MovementInput {
        left: keys.pressed(KeyCode::ArrowLeft),
        right: keys.pressed(KeyCode::ArrowRight),
        up: keys.pressed(KeyCode::ArrowUp),
        down: keys.pressed(KeyCode::ArrowDown),
    };
    for intent in session.tick(input, time.delta_seconds()) {
        intents.send(SessionIntent(intent));
    }
}

fn listen_for_restart(
    keys: Res<ButtonInput<KeyCode>>,
    mut session: ResMut<Session>,
    mut intents: EventWriter<SessionIntent>,
) {
    if !session.awaiting_restart() || !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    for intent in session.press(Key::Restart) {
        intents.send(SessionIntent(intent));
    }
}

fn apply_intents(
    mut commands: Commands,
    mut events: EventReader<SessionIntent>,
    session: Res<Session>,
    items: Query<(Entity, &ItemSprite)>,
    mut score_text: Query<&mut Text, With<ScoreText>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let world_size = session.level().world_size;

    for SessionIntent(intent) in events.read() {
        match intent {
            Intent::RemoveItem(index) => {
                for (entity, item) in &items {
                    if item.0 == *index {
                        commands.entity(entity).despawn_recursive();
                    }
                }
            }
            Intent::SetScoreText(value) => {
                for mut text in &mut score_text {
                    text.sections[0].value.clone_from(value);
                }
            }
            Intent::FreezeWorld => {
                next_state.set(GameState::from(session.state()));
            }
            Intent::PlayAnimation(cue) => {
                let origin = to_screen(cue.position, world_size, 10.0);
                let show = celebration::spawn_celebration(&mut commands, cue, origin);
                commands.entity(show).insert(SessionVisual);
            }
            Intent::ShowMessage(Message { text, position, tone }) => {
                commands.spawn((
                    label(text.as_str(), *position, tone_color(*tone), world_size),
                    SessionVisual,
                ));
            }
            Intent::AwaitRestart => {
                debug!("waiting for the restart key");
            }
            Intent::ResetWorld => {
                next_state.set(GameState::Playing);
            }
        }
    }
}

fn sync_transforms(
    session: Res<Session>,
    mut players: Query<&mut Transform, (With<PlayerSprite>, Without<EnemySprite>)>,
    mut enemies: Query<(&EnemySprite, &mut Transform), Without<PlayerSprite>>,
) {
    if !session.is_changed() {
        return;
    }
    let world_size = session.level().world_size;
    let entities = session.entities();

    for mut transform in &mut players {
        let z = transform.translation.z;
        transform.translation = to_screen(entities.player_position(), world_size, z);
    }
    for (sprite, mut transform) in &mut enemies {
        if let Some(enemy) = entities.enemies.get(sprite.0) {
            let z = transform.translation.z;
            transform.translation = to_screen(enemy.body.position, world_size, z);
        }
    }
}
