//! Wireframe world rendering and the HUD.
//!
//! The whole play field is drawn with gizmos each frame: floor, platforms,
//! tower parts tinted by lifecycle phase, the projectile, and an aim preview
//! polyline while the shot is staged.  Text HUD nodes show the score line,
//! the active arithmetic problem, and the typed answer.
//!
//! | System                  | Schedule | Purpose                              |
//! |-------------------------|----------|--------------------------------------|
//! | `setup_hud`             | Startup  | Spawn status/problem/hint text nodes |
//! | `hud_status_system`     | Update   | Refresh score, balls, level line     |
//! | `hud_problem_system`    | Update   | Refresh problem + answer + aim line  |
//! | `gizmo_rendering_system`| Update   | Draw the wireframe world             |

use crate::catapult::{AnswerInput, Projectile, ShotState};
use crate::config::GameConfig;
use crate::level::{Floor, GameSession, GameState, LevelCatalog, Platform};
use crate::scoring::{LevelProgress, PlayerScore};
use crate::tower::{BallMood, Tower, TowerBall, TowerBody, TowerPhase, TowerPlank, TowerProblem};
use crate::trajectory::TrajectoryParams;
use bevy::prelude::*;

// ── HUD markers ───────────────────────────────────────────────────────────────

/// Marker for the top-left status line (score / balls / level).
#[derive(Component)]
pub struct StatusHud;

/// Marker for the problem-and-answer line.
#[derive(Component)]
pub struct ProblemHud;

// ── Phase palette ─────────────────────────────────────────────────────────────

fn plank_color(phase: TowerPhase) -> Color {
    match phase {
        TowerPhase::Frozen => Color::srgb(0.55, 0.78, 0.95),
        TowerPhase::Unfrozen => Color::srgb(0.78, 0.6, 0.32),
        TowerPhase::Dynamic => Color::srgb(0.95, 0.55, 0.2),
    }
}

fn ball_color(phase: TowerPhase, mood: BallMood) -> Color {
    match mood {
        BallMood::Dazed => Color::srgb(0.5, 0.5, 0.55),
        BallMood::Worried => Color::srgb(0.95, 0.8, 0.25),
        BallMood::Calm => match phase {
            TowerPhase::Frozen => Color::srgb(0.6, 0.85, 0.95),
            _ => Color::srgb(0.35, 0.85, 0.45),
        },
    }
}

// ── Startup: HUD nodes ────────────────────────────────────────────────────────

/// Spawn the permanent HUD: status line top-left, problem line below it, and
/// a static controls hint at the bottom.
pub fn setup_hud(mut commands: Commands, config: Res<GameConfig>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            StatusHud,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Score: 0"),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.88, 0.45)),
            ));
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0 + config.hud_font_size + 8.0),
                ..default()
            },
            ProblemHud,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.92, 1.0)),
            ));
        });

    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            bottom: Val::Px(10.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Arrows: aim/power   0-9: answer   Enter: submit   R: reset"),
                TextFont {
                    font_size: config.hud_font_size * 0.7,
                    ..default()
                },
                TextColor(Color::srgb(0.42, 0.42, 0.52)),
            ));
        });
}

// ── Update: HUD text ──────────────────────────────────────────────────────────

fn set_hud_text(children: &Children, text_query: &mut Query<&mut Text>, value: String) {
    for child in children.iter() {
        if let Ok(mut text) = text_query.get_mut(child) {
            *text = Text::new(value.clone());
        }
    }
}

/// Refresh the score / balls-down / level line.
pub fn hud_status_system(
    score: Res<PlayerScore>,
    progress: Res<LevelProgress>,
    session: Res<GameSession>,
    catalog: Res<LevelCatalog>,
    parent_query: Query<&Children, With<StatusHud>>,
    mut text_query: Query<&mut Text>,
) {
    if !score.is_changed() && !progress.is_changed() && !session.is_changed() {
        return;
    }
    let level = session.current_level(&catalog);
    let line = format!(
        "Score: {}   Balls: {}/{}   Level {}: {}",
        score.points, progress.balls_down, progress.total_balls, level.id, level.name
    );
    for children in parent_query.iter() {
        set_hud_text(children, &mut text_query, line.clone());
    }
}

/// Refresh the problem line: the lowest-indexed frozen tower's question plus
/// the typed answer while playing, or the advance prompt on completion.
pub fn hud_problem_system(
    state: Res<State<GameState>>,
    shot: Res<ShotState>,
    answer: Res<AnswerInput>,
    q_problems: Query<(&Tower, &TowerProblem)>,
    parent_query: Query<&Children, With<ProblemHud>>,
    mut text_query: Query<&mut Text>,
) {
    let line = match state.get() {
        GameState::LevelComplete => "Level clear! Enter for the next pond".to_string(),
        GameState::Playing => {
            let question = q_problems
                .iter()
                .min_by_key(|(tower, _)| tower.index)
                .map(|(_, problem)| problem.0.expression.clone());
            match question {
                Some(expr) if !shot.launched => format!(
                    "{} = {}_    (angle {:.0}°, power {:.0})",
                    expr, answer.0, shot.angle_deg, shot.power
                ),
                Some(expr) => format!("{} = {}_", expr, answer.0),
                None if !shot.launched => format!(
                    "Ready!  angle {:.0}°, power {:.0}",
                    shot.angle_deg, shot.power
                ),
                None => String::new(),
            }
        }
    };
    for children in parent_query.iter() {
        set_hud_text(children, &mut text_query, line.clone());
    }
}

// ── Update: world gizmos ──────────────────────────────────────────────────────

/// Draw an axis-aligned-in-local-space rectangle, rotated by the transform.
fn draw_rect(gizmos: &mut Gizmos, transform: &Transform, half: Vec2, color: Color) {
    let pos = transform.translation.truncate();
    let rot = transform.rotation;
    let corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ];
    for i in 0..4 {
        let a = pos + rot.mul_vec3(corners[i].extend(0.0)).truncate();
        let b = pos + rot.mul_vec3(corners[(i + 1) % 4].extend(0.0)).truncate();
        gizmos.line_2d(a, b, color);
    }
}

/// Draw the wireframe world: floor, platforms, tower parts tinted by phase,
/// the projectile, and the staged-shot preview arc.
#[allow(clippy::too_many_arguments)]
pub fn gizmo_rendering_system(
    mut gizmos: Gizmos,
    config: Res<GameConfig>,
    shot: Res<ShotState>,
    q_floor: Query<&Transform, With<Floor>>,
    q_platforms: Query<&Transform, (With<Platform>, Without<Floor>)>,
    q_towers: Query<&TowerPhase, With<Tower>>,
    q_planks: Query<(&Transform, &TowerPlank, &TowerBody)>,
    q_balls: Query<(&Transform, &TowerBall, &TowerBody)>,
    q_projectile: Query<&Transform, With<Projectile>>,
) {
    for transform in q_floor.iter() {
        draw_rect(
            &mut gizmos,
            transform,
            Vec2::new(config.floor_half_width, config.floor_half_thickness),
            Color::srgb(0.35, 0.5, 0.3),
        );
    }

    for transform in q_platforms.iter() {
        draw_rect(
            &mut gizmos,
            transform,
            Vec2::new(config.platform_width / 2.0, config.platform_thickness / 2.0),
            Color::srgb(0.5, 0.45, 0.4),
        );
    }

    for (transform, plank, body) in q_planks.iter() {
        let phase = q_towers.get(body.tower).copied().unwrap_or(TowerPhase::Frozen);
        draw_rect(&mut gizmos, transform, plank.half_extents, plank_color(phase));
    }

    for (transform, ball, body) in q_balls.iter() {
        let phase = q_towers.get(body.tower).copied().unwrap_or(TowerPhase::Frozen);
        gizmos.circle_2d(
            transform.translation.truncate(),
            ball.radius,
            ball_color(phase, ball.mood),
        );
    }

    for transform in q_projectile.iter() {
        let pos = transform.translation.truncate();
        gizmos.circle_2d(pos, config.projectile_radius, Color::srgb(0.65, 0.42, 0.25));
        // Tail stub so spin reads even on a plain circle.
        let tail = transform.rotation.mul_vec3(Vec3::X).truncate() * config.projectile_radius;
        gizmos.line_2d(pos, pos + tail, Color::srgb(0.9, 0.75, 0.55));
    }

    if !shot.launched {
        draw_preview(&mut gizmos, &shot, &config);
    }
}

/// Dotted arc of the currently staged shot, sampled at a fixed time step and
/// cut off once the arc dips below the floor.
fn draw_preview(gizmos: &mut Gizmos, shot: &ShotState, config: &GameConfig) {
    let params = TrajectoryParams {
        angle_deg: shot.angle_deg,
        power: shot.power,
        gravity: config.gravity_accel,
    };
    let origin = config.catapult_origin();
    let cap = match params.time_of_flight() {
        Some(t) => t * 1.5,
        None => return,
    };

    let color = Color::srgba(0.9, 0.9, 0.6, 0.5);
    let mut t = 0.0;
    let mut prev = origin;
    while t < cap {
        t += config.preview_time_step;
        let next = params.position_at(origin, t);
        gizmos.line_2d(prev, next, color);
        if next.y < config.floor_top_y {
            break;
        }
        prev = next;
    }
}
