//! Headless tests for the [`GameState`] lifecycle.
//!
//! These use [`MinimalPlugins`] (no window, no rendering, no physics) so
//! they run fast and deterministically in CI.
//!
//! Covered scenarios:
//! 1. Default initial state is `Playing`.
//! 2. A `NextState` request transitions `Playing` → `LevelComplete`.
//! 3. Leaving `Playing` despawns everything tagged [`LevelEntity`].
//! 4. The advance key on the completion screen bumps the level index and
//!    returns to `Playing`, wrapping after the last level.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use beaverball::level::{
    level_advance_system, teardown_level, GameSession, GameState, LevelCatalog, LevelEntity,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Minimal headless app with the state machine registered.
fn state_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.init_state::<GameState>();
    app
}

fn set_state(app: &mut App, state: GameState) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(state);
    app.update();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn default_state_is_playing() {
    let mut app = state_app();
    app.update();
    let state = app.world().resource::<State<GameState>>();
    assert_eq!(*state.get(), GameState::Playing);
}

#[test]
fn transition_playing_to_level_complete() {
    let mut app = state_app();
    app.update();

    set_state(&mut app, GameState::LevelComplete);

    let state = app.world().resource::<State<GameState>>();
    assert_eq!(*state.get(), GameState::LevelComplete);
}

#[test]
fn leaving_playing_tears_down_level_entities() {
    let mut app = state_app();
    app.add_systems(OnExit(GameState::Playing), teardown_level);
    app.update();

    app.world_mut().spawn(LevelEntity);
    app.world_mut().spawn(LevelEntity);
    app.world_mut().spawn_empty(); // untagged survivor

    set_state(&mut app, GameState::LevelComplete);

    let remaining = app
        .world_mut()
        .query_filtered::<Entity, With<LevelEntity>>()
        .iter(app.world())
        .count();
    assert_eq!(remaining, 0, "tagged entities must be despawned on exit");
}

#[test]
fn advance_key_moves_to_next_level_and_replays() {
    let mut app = state_app();
    app.init_resource::<ButtonInput<KeyCode>>();
    app.insert_resource(LevelCatalog::default());
    app.insert_resource(GameSession::default());
    app.add_systems(
        Update,
        level_advance_system.run_if(in_state(GameState::LevelComplete)),
    );
    app.update();
    set_state(&mut app, GameState::LevelComplete);

    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::Enter);
    app.update(); // advance system runs, queues Playing
    app.update(); // transition applies

    assert_eq!(app.world().resource::<GameSession>().level_index, 1);
    let state = app.world().resource::<State<GameState>>();
    assert_eq!(*state.get(), GameState::Playing);
}

#[test]
fn advance_wraps_after_the_last_level() {
    let mut app = state_app();
    app.init_resource::<ButtonInput<KeyCode>>();
    app.insert_resource(LevelCatalog::default());
    let last = LevelCatalog::default().levels.len() - 1;
    app.insert_resource(GameSession { level_index: last });
    app.add_systems(
        Update,
        level_advance_system.run_if(in_state(GameState::LevelComplete)),
    );
    app.update();
    set_state(&mut app, GameState::LevelComplete);

    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::Space);
    app.update();

    assert_eq!(app.world().resource::<GameSession>().level_index, 0);
}
