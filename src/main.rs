use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;

use beaverball::catapult::{
    aim_input_system, answer_input_system, reset_system, AnswerInput, ResetRequested, ShotState,
};
use beaverball::config::{load_game_config, GameConfig};
use beaverball::graphics::setup_camera;
use beaverball::level::{
    level_advance_system, setup_level, setup_session, teardown_level, validate_catalog, GameState,
    LevelCatalog,
};
use beaverball::rendering::{
    gizmo_rendering_system, hud_problem_system, hud_status_system, setup_hud,
};
use beaverball::scoring::{scoring_system, LevelProgress, PlayerScore};
use beaverball::settle::{settle_system, SettleWatch};
use beaverball::tower::{
    answer_system, impact_system, load_tower_catalog, AnswerSubmitted, TowerCatalog,
};

/// Point Rapier's gravity at the same constant the trajectory math uses.
fn setup_physics_config(mut rapier: Query<&mut RapierConfiguration>, config: Res<GameConfig>) {
    for mut cfg in rapier.iter_mut() {
        cfg.gravity = Vec2::new(0.0, config.gravity_accel);
    }
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Beaverball".into(),
                resolution: WindowResolution::new(1280, 720),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.08, 0.1, 0.14)))
        // pixels_per_meter(1.0) keeps world units and physics units identical,
        // so the trajectory constants apply unscaled inside Rapier.
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
        // Compiled defaults; load_game_config overwrites from assets/game.toml
        // (if present) before anything else runs at startup.
        .insert_resource(GameConfig::default())
        .insert_resource(LevelCatalog::default())
        .insert_resource(TowerCatalog::default())
        .insert_resource(ShotState::default())
        .insert_resource(AnswerInput::default())
        .insert_resource(SettleWatch::default())
        .insert_resource(LevelProgress::default())
        .insert_resource(PlayerScore::default())
        .add_message::<AnswerSubmitted>()
        .add_message::<ResetRequested>()
        .init_state::<GameState>()
        .add_systems(
            Startup,
            (
                load_game_config,
                (
                    setup_session,
                    setup_physics_config,
                    load_tower_catalog,
                    setup_camera,
                    setup_hud,
                )
                    .after(load_game_config),
                // Validation wants the merged catalog, not just the built-ins.
                validate_catalog
                    .after(load_game_config)
                    .after(load_tower_catalog),
            ),
        )
        .add_systems(OnEnter(GameState::Playing), setup_level)
        .add_systems(OnExit(GameState::Playing), teardown_level)
        .add_systems(
            Update,
            (
                aim_input_system,
                answer_input_system,
                answer_system.after(answer_input_system),
                impact_system.after(answer_system),
                scoring_system.after(impact_system),
                settle_system.after(scoring_system),
                reset_system.after(settle_system),
            )
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(
            Update,
            level_advance_system.run_if(in_state(GameState::LevelComplete)),
        )
        .add_systems(
            Update,
            (hud_status_system, hud_problem_system, gizmo_rendering_system),
        )
        .run();
}
