//! Victory animation: a ring of paint splats that pulses and changes colour
//! on every frame of the cue.

use bevy::color::palettes::css;
use bevy::prelude::*;
use bevy_prototype_lyon::prelude::*;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

use crate::session::AnimationCue;

const SPLAT_COUNT: usize = 12;
const RING_RADIUS: f32 = 140.0;
const SPLAT_RADIUS: f32 = 28.0;

const PALETTE: [Srgba; 6] = [
    css::HOT_PINK,
    css::LIME,
    css::ORANGE,
    css::DEEP_SKY_BLUE,
    css::YELLOW,
    css::VIOLET,
];

#[derive(Component)]
pub struct Celebration {
    cue: AnimationCue,
    frame: usize,
    timer: Timer,
}

#[derive(Component)]
pub(crate) struct Splat {
    slot: usize,
}

pub fn next_frame(cue: &AnimationCue, frame: usize) -> usize {
    if frame < cue.last_frame {
        frame + 1
    } else if cue.looping {
        cue.first_frame
    } else {
        cue.last_frame
    }
}

/// Splats grow from 0.6x to 1.4x over one run of the cue.
fn frame_scale(cue: &AnimationCue, frame: usize) -> f32 {
    let span = cue.last_frame.saturating_sub(cue.first_frame).max(1) as f32;
    let progress = frame.saturating_sub(cue.first_frame) as f32 / span;
    0.6 + 0.8 * progress
}

fn pick_color(rng: &mut impl Rng) -> Color {
    PALETTE.choose(rng).copied().unwrap_or(css::WHITE).into()
}

pub fn spawn_celebration(commands: &mut Commands, cue: &AnimationCue, origin: Vec3) -> Entity {
    info!(animation = cue.name, frames = cue.last_frame - cue.first_frame + 1, "playing animation");
    let mut rng = thread_rng();
    let scale = frame_scale(cue, cue.first_frame);

    commands
        .spawn((
            SpatialBundle::from_transform(Transform::from_translation(origin)),
            Celebration {
                cue: *cue,
                frame: cue.first_frame,
                timer: Timer::from_seconds(1.0 / cue.frame_rate, TimerMode::Repeating),
            },
        ))
        .with_children(|parent| {
            for slot in 0..SPLAT_COUNT {
                let angle = slot as f32 / SPLAT_COUNT as f32 * std::f32::consts::TAU;
                let offset = Vec2::from_angle(angle) * RING_RADIUS;
                parent.spawn((
                    ShapeBundle {
                        path: GeometryBuilder::build_as(&shapes::RegularPolygon {
                            sides: 3 + slot % 5,
                            feature: shapes::RegularPolygonFeature::Radius(SPLAT_RADIUS),
                            ..shapes::RegularPolygon::default()
                        }),
                        spatial: SpatialBundle {
                            transform: Transform::from_translation(offset.extend(0.0))
                                .with_scale(Vec3::splat(scale)),
                            ..default()
                        },
                        mesh: default(),
                        material: default(),
                    },
                    Fill::color(pick_color(&mut rng)),
                    Splat { slot },
                ));
            }
        })
        .id()
}

pub fn animate_celebration(
    time: Res<Time>,
    mut shows: Query<(&mut Celebration, &Children)>,
    mut splats: Query<(&Splat, &mut Fill, &mut Transform)>,
) {
    let mut rng = thread_rng();
    for (mut show, children) in &mut shows {
        if !show.timer.tick(time.delta()).just_finished() {
            continue;
        }
        let frame = next_frame(&show.cue, show.frame);
        show.frame = frame;
        let scale = frame_scale(&show.cue, frame);
        trace!(animation = show.cue.name, frame, "animation frame");

        for &child in children.iter() {
            if let Ok((splat, mut fill, mut transform)) = splats.get_mut(child) {
                fill.color = pick_color(&mut rng);
                transform.scale = Vec3::splat(scale);
                transform.rotation = Quat::from_rotation_z((frame + splat.slot) as f32 * 0.3);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CELEBRATION;

    #[test]
    fn looping_cue_wraps_back_to_the_first_frame() {
        assert_eq!(next_frame(&CELEBRATION, 0), 1);
        assert_eq!(next_frame(&CELEBRATION, 9), 10);
        assert_eq!(next_frame(&CELEBRATION, 10), 0);
    }

    #[test]
    fn one_shot_cue_holds_the_last_frame() {
        let cue = AnimationCue {
            looping: false,
            ..CELEBRATION
        };
        assert_eq!(next_frame(&cue, 10), 10);
    }

    #[test]
    fn splats_grow_across_the_cue() {
        assert_eq!(frame_scale(&CELEBRATION, 0), 0.6);
        assert!((frame_scale(&CELEBRATION, 10) - 1.4).abs() < 1e-6);
        assert!(frame_scale(&CELEBRATION, 5) > frame_scale(&CELEBRATION, 4));
    }

    #[test]
    fn palette_colors_only() {
        let mut rng = thread_rng();
        let allowed: Vec<Color> = PALETTE.iter().map(|&c| c.into()).collect();
        for _ in 0..20 {
            assert!(allowed.contains(&pick_color(&mut rng)));
        }
    }
}
