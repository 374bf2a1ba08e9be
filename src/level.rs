//! Level catalog, platform layout, and the build/teardown lifecycle.
//!
//! Platforms are not hand-placed.  Each level names a "perfect shot" power;
//! the layout generator samples the parabola that power would fly at the
//! reference angle and drops a platform under each sample, so a well-aimed
//! shot sweeps naturally across every tower.  The sample times live in a
//! separate pure function so tests can check their spacing without spawning
//! anything.

use crate::catapult::{spawn_projectile, AnswerInput, ShotState};
use crate::config::GameConfig;
use crate::error::{validate_gravity, validate_level_config};
use crate::problems::{generate_problem, GameRng};
use crate::scoring::{LevelProgress, PlayerScore};
use crate::settle::SettleWatch;
use crate::tower::{spawn_tower, TowerCatalog};
use crate::trajectory::TrajectoryParams;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

/// Top-level flow: aiming/solving/knocking inside a level, or the short
/// interstitial once every ball is down.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Playing,
    LevelComplete,
}

/// Everything spawned by level setup carries this so teardown is one query.
#[derive(Component)]
pub struct LevelEntity;

/// The single static ground body.
#[derive(Component)]
pub struct Floor;

/// A platform slab under a tower.
#[derive(Component)]
pub struct Platform;

/// Static description of one level.  Loaded once at level start; immutable
/// during play.
#[derive(Debug, Clone)]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    /// How many platforms (and towers) the layout generator places.
    pub platform_count: u32,
    /// Fraction (0..1) of the symmetric flight time skipped before the first
    /// platform.  Smaller values start the platform band closer to the
    /// catapult.
    pub platform_gap_fraction: f32,
    /// Tower definition ids this level may draw from.
    pub tower_ids: Vec<String>,
    /// Reference power used only to place platforms, independent of the
    /// player's actual aim.
    pub perfect_shot_power: f32,
    /// Upper bound on the player's charged power for this level.
    pub max_power: f32,
    /// School year the arithmetic problems are pitched at.
    pub year_level: u32,
    /// Settle grace delay before an auto-reset, per level profile.
    pub settle_grace_ms: f64,
}

/// The built-in level sequence.
#[derive(Resource, Debug, Clone)]
pub struct LevelCatalog {
    pub levels: Vec<LevelConfig>,
}

impl LevelCatalog {
    pub fn level_by_id(&self, id: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.id == id)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self {
            levels: vec![
                LevelConfig {
                    id: 1,
                    name: "Lodge Pond".to_string(),
                    platform_count: 1,
                    platform_gap_fraction: 0.5,
                    tower_ids: vec!["single_stack".to_string()],
                    perfect_shot_power: 750.0,
                    max_power: 900.0,
                    year_level: 1,
                    settle_grace_ms: 500.0,
                },
                LevelConfig {
                    id: 2,
                    name: "Birch Rapids".to_string(),
                    platform_count: 2,
                    platform_gap_fraction: 0.35,
                    tower_ids: vec![
                        "single_stack".to_string(),
                        "ball_nest".to_string(),
                        "twin_deck".to_string(),
                    ],
                    perfect_shot_power: 850.0,
                    max_power: 1000.0,
                    year_level: 3,
                    settle_grace_ms: 1200.0,
                },
                LevelConfig {
                    id: 3,
                    name: "Granite Falls".to_string(),
                    platform_count: 3,
                    platform_gap_fraction: 0.25,
                    tower_ids: vec![
                        "ball_nest".to_string(),
                        "twin_deck".to_string(),
                        "high_perch".to_string(),
                    ],
                    perfect_shot_power: 1000.0,
                    max_power: 1150.0,
                    year_level: 5,
                    settle_grace_ms: 3000.0,
                },
            ],
        }
    }
}

/// Which level the player is on.  Survives level transitions; the score
/// resource rides along with it.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct GameSession {
    pub level_index: usize,
}

impl GameSession {
    /// The active level, clamped to the catalog's last entry so a stale index
    /// can never panic mid-frame.
    pub fn current_level<'a>(&self, catalog: &'a LevelCatalog) -> &'a LevelConfig {
        let index = self.level_index.min(catalog.levels.len().saturating_sub(1));
        &catalog.levels[index]
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

/// Where one platform goes: collider center x and top-surface y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformAnchor {
    pub center_x: f32,
    pub surface_y: f32,
}

/// Sample times along the perfect-shot parabola, one per platform.
///
/// The band runs from `gap_fraction` of the symmetric flight time out to the
/// moment the offset surface height returns to launch level, interpolated
/// evenly in t (not in x or y, which bunch up near the apex).  Returns an
/// empty vec when the trajectory cannot arc up and back down, or when the
/// platform surface never re-crosses launch height.
pub fn platform_sample_times(level: &LevelConfig, config: &GameConfig) -> Vec<f32> {
    let params = TrajectoryParams {
        angle_deg: config.reference_angle_deg,
        power: level.perfect_shot_power,
        gravity: config.gravity_accel,
    };
    let (Some(t_return), Some(t_end)) = (
        params.time_of_flight(),
        params.time_to_offset_return(config.platform_y_offset),
    ) else {
        return Vec::new();
    };

    let t_start = (level.platform_gap_fraction.clamp(0.0, 0.99) * t_return).min(t_end);
    let count = level.platform_count;
    (0..count)
        .map(|i| {
            let frac = if count == 1 {
                0.5
            } else {
                i as f32 / (count - 1) as f32
            };
            t_start + (t_end - t_start) * frac
        })
        .collect()
}

/// Turn sample times into platform anchors.  The platform's left edge sits at
/// the sampled x and its top surface `platform_y_offset` below the sampled y.
pub fn layout_platforms(level: &LevelConfig, config: &GameConfig) -> Vec<PlatformAnchor> {
    let params = TrajectoryParams {
        angle_deg: config.reference_angle_deg,
        power: level.perfect_shot_power,
        gravity: config.gravity_accel,
    };
    let origin = config.catapult_origin();
    platform_sample_times(level, config)
        .into_iter()
        .map(|t| {
            let sample = params.position_at(origin, t);
            PlatformAnchor {
                center_x: sample.x + config.platform_width / 2.0,
                surface_y: sample.y + config.platform_y_offset,
            }
        })
        .collect()
}

// ── Lifecycle systems ─────────────────────────────────────────────────────────

/// Startup sanity pass over the built-in catalog.  A level that would lay out
/// zero platforms is a configuration bug, so it is caught here rather than
/// discovered as a silently empty play field.
pub fn validate_catalog(
    catalog: Res<LevelCatalog>,
    config: Res<GameConfig>,
    towers: Res<TowerCatalog>,
) {
    if let Err(e) = validate_gravity(config.gravity_accel) {
        eprintln!("⚠ Config error: {}", e);
    }
    for level in &catalog.levels {
        match validate_level_config(level, &config, &towers) {
            Ok(()) => println!("✓ Level {} '{}' validated", level.id, level.name),
            Err(e) => eprintln!("⚠ Level {} '{}' invalid: {}", level.id, level.name, e),
        }
    }
}

/// Build the current level: floor, platforms, towers with fresh problems, a
/// staged projectile, and zeroed per-level resources.
pub fn setup_level(
    mut commands: Commands,
    config: Res<GameConfig>,
    catalog: Res<LevelCatalog>,
    towers: Res<TowerCatalog>,
    session: Res<GameSession>,
    mut rng: ResMut<GameRng>,
) {
    let level = session.current_level(&catalog).clone();

    commands.spawn((
        Floor,
        LevelEntity,
        Transform::from_translation(Vec3::new(
            0.0,
            config.floor_top_y - config.floor_half_thickness,
            0.0,
        )),
        GlobalTransform::default(),
        RigidBody::Fixed,
        Collider::cuboid(config.floor_half_width, config.floor_half_thickness),
        Friction::coefficient(config.tower_friction),
        Restitution::coefficient(0.0),
    ));

    let allowed = towers.resolve_allowed(&level.tower_ids);
    let mut total_balls: u32 = 0;
    for (index, anchor) in layout_platforms(&level, &config).into_iter().enumerate() {
        commands.spawn((
            Platform,
            LevelEntity,
            Transform::from_translation(Vec3::new(
                anchor.center_x,
                anchor.surface_y - config.platform_thickness / 2.0,
                0.0,
            )),
            GlobalTransform::default(),
            RigidBody::Fixed,
            Collider::cuboid(config.platform_width / 2.0, config.platform_thickness / 2.0),
            Friction::coefficient(config.tower_friction),
            Restitution::coefficient(0.0),
        ));

        // An empty catalog leaves the platform bare rather than panicking on
        // the index below.
        if allowed.is_empty() {
            continue;
        }
        let def = allowed[rng.0.gen_range(0..allowed.len())];
        total_balls += def.ball_count() as u32;
        let problem = generate_problem(&mut rng.0, level.year_level, None);
        spawn_tower(
            &mut commands,
            def,
            index as u32,
            Vec2::new(anchor.center_x, anchor.surface_y),
            problem,
            &config,
        );
    }

    spawn_projectile(&mut commands, &config);

    commands.insert_resource(LevelProgress::for_level(total_balls));
    commands.insert_resource(ShotState::default());
    commands.insert_resource(SettleWatch::default());
    commands.insert_resource(AnswerInput::default());

    println!(
        "▶ Level {} '{}': {} platforms, {} balls",
        level.id, level.name, level.platform_count, total_balls
    );
}

/// Tear the level down on the way out of [`GameState::Playing`].
pub fn teardown_level(mut commands: Commands, q_level: Query<Entity, With<LevelEntity>>) {
    for entity in q_level.iter() {
        commands.entity(entity).despawn();
    }
}

/// On the completion screen, any of the advance keys moves to the next level
/// (wrapping back to the first after the last).  Score carries over.
pub fn level_advance_system(
    keys: Res<ButtonInput<KeyCode>>,
    catalog: Res<LevelCatalog>,
    mut session: ResMut<GameSession>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Enter) || keys.just_pressed(KeyCode::Space) {
        session.level_index = (session.level_index + 1) % catalog.levels.len().max(1);
        next_state.set(GameState::Playing);
    }
}

/// Session-long resources that must exist before the first level builds.
pub fn setup_session(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(GameSession::default());
    commands.insert_resource(PlayerScore::default());
    commands.insert_resource(GameRng::from_seed_config(config.rng_seed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn level(platform_count: u32, gap: f32, power: f32) -> LevelConfig {
        LevelConfig {
            id: 1,
            name: "Test Pond".to_string(),
            platform_count,
            platform_gap_fraction: gap,
            tower_ids: vec!["single_stack".to_string()],
            perfect_shot_power: power,
            max_power: power,
            year_level: 1,
            settle_grace_ms: 500.0,
        }
    }

    #[test]
    fn single_platform_sits_at_band_midpoint() {
        let config = GameConfig::default();
        let lvl = level(1, 0.5, 750.0);
        let params = TrajectoryParams {
            angle_deg: config.reference_angle_deg,
            power: lvl.perfect_shot_power,
            gravity: config.gravity_accel,
        };
        let t_return = params.time_of_flight().unwrap();
        let t_end = params.time_to_offset_return(config.platform_y_offset).unwrap();
        let t_start = (0.5 * t_return).min(t_end);

        let times = platform_sample_times(&lvl, &config);
        assert_eq!(times.len(), 1);
        let expected = t_start + (t_end - t_start) * 0.5;
        assert!((times[0] - expected).abs() < 1e-5);

        let anchors = layout_platforms(&lvl, &config);
        let sample = params.position_at(config.catapult_origin(), times[0]);
        assert!((anchors[0].center_x - (sample.x + config.platform_width / 2.0)).abs() < 1e-3);
        assert!((anchors[0].surface_y - (sample.y + config.platform_y_offset)).abs() < 1e-3);
    }

    #[test]
    fn sample_times_strictly_increasing_and_evenly_spaced() {
        let config = GameConfig::default();
        for count in 2u32..=6 {
            let times = platform_sample_times(&level(count, 0.3, 900.0), &config);
            assert_eq!(times.len(), count as usize);
            let step = times[1] - times[0];
            assert!(step > 0.0);
            for pair in times.windows(2) {
                assert!(pair[1] > pair[0]);
                assert!((pair[1] - pair[0] - step).abs() < 1e-4, "uneven spacing");
            }
        }
    }

    #[test]
    fn degenerate_trajectory_lays_out_nothing() {
        let config = GameConfig::default();
        // Far too weak to ever bring the offset surface back to launch
        // height: the discriminant goes negative and the layout is empty.
        assert!(layout_platforms(&level(3, 0.3, 50.0), &config).is_empty());
        assert!(platform_sample_times(&level(3, 0.3, 50.0), &config).is_empty());
    }

    #[test]
    fn gap_fraction_is_clamped_and_band_never_inverts() {
        let config = GameConfig::default();
        // gap 1.0 clamps to 0.99; the clamp against t_end keeps the band
        // start at or before its end, so times stay ordered.
        let times = platform_sample_times(&level(3, 1.0, 900.0), &config);
        assert_eq!(times.len(), 3);
        assert!(times[0] <= times[2]);
    }

    #[test]
    fn built_in_catalog_validates() {
        let config = GameConfig::default();
        let towers = TowerCatalog::default();
        for lvl in &LevelCatalog::default().levels {
            assert!(
                crate::error::validate_level_config(lvl, &config, &towers).is_ok(),
                "level {} failed validation",
                lvl.id
            );
        }
    }

    #[test]
    fn empty_tower_catalog_leaves_platforms_bare() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.insert_resource(LevelCatalog::default());
        app.insert_resource(TowerCatalog { defs: Vec::new() });
        app.insert_resource(GameSession::default());
        app.insert_resource(GameRng::from_seed_config(1));
        app.add_systems(Update, setup_level);
        app.update();

        let world = app.world_mut();
        let platforms = world
            .query_filtered::<(), With<Platform>>()
            .iter(world)
            .count();
        assert!(platforms > 0, "platforms still build without towers");
        let towers = world
            .query_filtered::<(), With<crate::tower::Tower>>()
            .iter(world)
            .count();
        assert_eq!(towers, 0);
        assert_eq!(world.resource::<LevelProgress>().total_balls, 0);
    }

    #[test]
    fn session_index_clamps_to_catalog() {
        let catalog = LevelCatalog::default();
        let session = GameSession { level_index: 99 };
        assert_eq!(session.current_level(&catalog).id, 3);
    }
}
