//! Ball-down scoring and level-completion tracking.
//!
//! ## Ball-down test
//!
//! A tower ball is down once **any** of three signals says so:
//!
//! 1. an active contact pair with the floor body,
//! 2. vertical distance to the floor top within radius + margin,
//! 3. center fallen below its platform's surface minus the platform
//!    thickness.
//!
//! The OR is deliberately permissive: a discrete physics step can carry a
//! ball through the exact contact height without ever reporting a contact
//! pair for it, and signal 3 catches balls that roll off the platform's far
//! side and land on a lower platform's tower instead of the floor.  Once set,
//! `down` never clears within the level attempt.
//!
//! ## Structural scoring
//!
//! Planks score one point the first time they touch the floor; a set of
//! already-credited bodies stops a plank resting on the floor from scoring
//! again every tick.

use crate::config::GameConfig;
use crate::level::{Floor, GameState};
use crate::tower::{BallMood, Tower, TowerBall, TowerBody, TowerPlank};
use bevy::prelude::*;
use std::collections::HashSet;
use bevy_rapier2d::prelude::*;

/// Per-level scoring bookkeeping.  Rebuilt from scratch on level entry.
#[derive(Resource, Default, Debug, Clone)]
pub struct LevelProgress {
    /// Total balls spawned across the level's towers.
    pub total_balls: u32,
    /// Balls marked down so far (monotonic).
    pub balls_down: u32,
    /// Set exactly once, when `balls_down` reaches `total_balls`.
    pub complete: bool,
    /// Structural bodies already credited for reaching the floor.
    pub scored_bodies: HashSet<Entity>,
}

impl LevelProgress {
    /// Fresh tracker for a level holding `total_balls` balls.
    pub fn for_level(total_balls: u32) -> Self {
        Self {
            total_balls,
            ..Default::default()
        }
    }

    /// Record one newly-down ball.
    pub fn record_ball_down(&mut self) {
        self.balls_down += 1;
    }

    /// Flip to complete when every ball is down.  Returns `true` only on the
    /// tick the flag flips, so completion side effects fire exactly once.
    pub fn try_complete(&mut self) -> bool {
        if !self.complete && self.total_balls > 0 && self.balls_down == self.total_balls {
            self.complete = true;
            true
        } else {
            false
        }
    }
}

/// The player's accumulated score, carried across levels.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct PlayerScore {
    pub points: u32,
}

/// The three-signal ball-down test.  Pure; see the module docs for why it is
/// an OR.
pub fn ball_is_down(
    ball_y: f32,
    radius: f32,
    touching_floor: bool,
    floor_top_y: f32,
    platform_surface_y: f32,
    platform_thickness: f32,
    margin: f32,
) -> bool {
    touching_floor
        || ball_y - floor_top_y <= radius + margin
        || ball_y < platform_surface_y - platform_thickness
}

/// Per-tick scoring pass: ball-down detection, structural floor credit, and
/// the completion check.
#[allow(clippy::too_many_arguments)]
pub fn scoring_system(
    rapier_context: ReadRapierContext,
    q_floor: Query<Entity, With<Floor>>,
    mut q_balls: Query<(Entity, &Transform, &mut TowerBall, &TowerBody)>,
    q_towers: Query<&Tower>,
    q_planks: Query<Entity, With<TowerPlank>>,
    mut progress: ResMut<LevelProgress>,
    mut score: ResMut<PlayerScore>,
    config: Res<GameConfig>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Ok(floor) = q_floor.single() else {
        return;
    };

    // Everything currently in active contact with the floor, in one query.
    let mut floor_contacts: HashSet<Entity> = HashSet::new();
    if let Ok(rapier) = rapier_context.single() {
        for pair in rapier.contact_pairs_with(floor) {
            if !pair.has_any_active_contact() {
                continue;
            }
            let (Some(a), Some(b)) = (pair.collider1(), pair.collider2()) else {
                continue;
            };
            floor_contacts.insert(if a == floor { b } else { a });
        }
    }

    // Ball-down pass.
    for (entity, transform, mut ball, body) in q_balls.iter_mut() {
        if ball.down {
            continue;
        }
        let surface_y = match q_towers.get(body.tower) {
            Ok(tower) => tower.surface_y,
            Err(_) => continue,
        };
        if ball_is_down(
            transform.translation.y,
            ball.radius,
            floor_contacts.contains(&entity),
            config.floor_top_y,
            surface_y,
            config.platform_thickness,
            config.ball_down_margin,
        ) {
            ball.down = true;
            ball.mood = BallMood::Dazed;
            progress.record_ball_down();
            score.points += config.ball_points;
        }
    }

    // Structural pass: first floor contact of a plank scores once.
    for plank in q_planks.iter() {
        if floor_contacts.contains(&plank) && progress.scored_bodies.insert(plank) {
            score.points += config.plank_points;
        }
    }

    if progress.try_complete() {
        next_state.set(GameState::LevelComplete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::level::{Floor, GameState, LevelEntity};
    use bevy::state::app::StatesPlugin;

    #[test]
    fn down_via_floor_contact_alone() {
        assert!(ball_is_down(500.0, 14.0, true, 0.0, 120.0, 16.0, 4.0));
    }

    #[test]
    fn down_via_floor_proximity() {
        // Center 17 px above the floor, radius 14 + margin 4 covers it.
        assert!(ball_is_down(17.0, 14.0, false, 0.0, 120.0, 16.0, 4.0));
        assert!(!ball_is_down(19.0, 14.0, false, 0.0, 120.0, 16.0, 4.0));
    }

    #[test]
    fn down_via_falling_below_platform_base() {
        // High platform: the ball is far from the floor but under its own
        // platform's underside.
        assert!(ball_is_down(100.0, 14.0, false, 0.0, 120.0, 16.0, 4.0));
        assert!(!ball_is_down(105.0, 14.0, false, 0.0, 120.0, 16.0, 4.0));
    }

    #[test]
    fn down_test_is_stable_for_an_unmoved_ball() {
        // Same inputs twice: same verdict.  Monotonicity of the flag itself
        // is enforced by the system (a down ball is skipped entirely).
        let first = ball_is_down(17.0, 14.0, false, 0.0, 120.0, 16.0, 4.0);
        let second = ball_is_down(17.0, 14.0, false, 0.0, 120.0, 16.0, 4.0);
        assert_eq!(first, second);
    }

    #[test]
    fn completion_requires_every_ball() {
        let mut progress = LevelProgress::for_level(3);
        progress.record_ball_down();
        progress.record_ball_down();
        assert!(!progress.try_complete(), "2 of 3 must not complete");
        progress.record_ball_down();
        assert!(progress.try_complete(), "3 of 3 completes");
        // Exactly once: the flag stays set but the transition never re-fires.
        assert!(!progress.try_complete());
    }

    #[test]
    fn empty_level_never_completes() {
        let mut progress = LevelProgress::for_level(0);
        assert!(!progress.try_complete());
    }

    fn scoring_test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.init_state::<GameState>();
        app.insert_resource(GameConfig::default());
        app.insert_resource(PlayerScore::default());
        app.add_systems(Update, scoring_system);
        app
    }

    /// Spawn a tower root + one ball at `ball_y` and return the ball entity.
    fn spawn_ball(app: &mut App, surface_y: f32, ball_y: f32) -> Entity {
        let root = app
            .world_mut()
            .spawn((
                Tower {
                    index: 0,
                    surface_y,
                },
                LevelEntity,
            ))
            .id();
        app.world_mut()
            .spawn((
                Transform::from_translation(Vec3::new(400.0, ball_y, 0.1)),
                TowerBall {
                    radius: 14.0,
                    down: false,
                    mood: BallMood::Calm,
                },
                TowerBody { tower: root },
                LevelEntity,
            ))
            .id()
    }

    #[test]
    fn system_marks_proximity_ball_down_and_scores_once() {
        let mut app = scoring_test_app();
        app.world_mut().spawn((Floor, LevelEntity));
        app.insert_resource(LevelProgress::for_level(2));
        // One ball resting just above the floor, one safely up on its tower.
        let low = spawn_ball(&mut app, 120.0, 10.0);
        let high = spawn_ball(&mut app, 120.0, 150.0);

        app.update();
        app.update(); // second tick must not double-count

        let progress = app.world().resource::<LevelProgress>();
        assert_eq!(progress.balls_down, 1);
        assert!(!progress.complete);
        let score = app.world().resource::<PlayerScore>();
        assert_eq!(score.points, GameConfig::default().ball_points);

        let low_ball = app.world().get::<TowerBall>(low).unwrap();
        assert!(low_ball.down);
        assert_eq!(low_ball.mood, BallMood::Dazed);
        let high_ball = app.world().get::<TowerBall>(high).unwrap();
        assert!(!high_ball.down);
    }

    #[test]
    fn system_completes_when_last_ball_drops() {
        let mut app = scoring_test_app();
        app.world_mut().spawn((Floor, LevelEntity));
        app.insert_resource(LevelProgress::for_level(1));
        spawn_ball(&mut app, 120.0, 10.0);

        app.update();
        assert!(app.world().resource::<LevelProgress>().complete);

        // The queued transition applies on the next state-transition pass.
        app.update();
        let state = app.world().resource::<State<GameState>>();
        assert_eq!(*state.get(), GameState::LevelComplete);
    }
}
