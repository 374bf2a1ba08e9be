//! Runtime game configuration loaded from `assets/game.toml`.
//!
//! [`GameConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_game_config`] reads
//! `assets/game.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a
//! minimal TOML can override just the constants you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<GameConfig>` to any system parameter list and read values
//! with `config.gravity_accel`, `config.settle_linvel_threshold`, etc.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `GameConfig::default()`.

use crate::constants::*;
use bevy::prelude::*;
use serde::Deserialize;

/// Runtime-tunable physics and gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset by setting the value in
/// `assets/game.toml`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // ── Kinematics ───────────────────────────────────────────────────────────
    pub gravity_accel: f32,
    pub reference_angle_deg: f32,
    pub angle_min_deg: f32,
    pub angle_max_deg: f32,
    pub power_min: f32,
    pub aim_angle_rate: f32,
    pub aim_power_rate: f32,

    // ── Catapult & projectile ────────────────────────────────────────────────
    pub catapult_x: f32,
    pub catapult_y: f32,
    pub projectile_radius: f32,
    pub projectile_restitution: f32,

    // ── Floor & platforms ────────────────────────────────────────────────────
    pub floor_top_y: f32,
    pub floor_half_width: f32,
    pub floor_half_thickness: f32,
    pub platform_width: f32,
    pub platform_thickness: f32,
    pub platform_y_offset: f32,

    // ── Tower parts ──────────────────────────────────────────────────────────
    pub tower_restitution: f32,
    pub tower_friction: f32,

    // ── Settle detection ─────────────────────────────────────────────────────
    pub settle_linvel_threshold: f32,
    pub settle_angvel_threshold: f32,
    pub hard_reset_timeout_ms: f64,

    // ── Scoring ──────────────────────────────────────────────────────────────
    pub ball_down_margin: f32,
    pub ball_points: u32,
    pub plank_points: u32,

    // ── Randomness ───────────────────────────────────────────────────────────
    pub rng_seed: u64,

    // ── Rendering ────────────────────────────────────────────────────────────
    pub hud_font_size: f32,
    pub preview_time_step: f32,
    pub camera_offset_x: f32,
    pub camera_offset_y: f32,
}

impl GameConfig {
    /// Catapult cup position as a vector.
    pub fn catapult_origin(&self) -> Vec2 {
        Vec2::new(self.catapult_x, self.catapult_y)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            // Kinematics
            gravity_accel: GRAVITY_ACCEL,
            reference_angle_deg: REFERENCE_ANGLE_DEG,
            angle_min_deg: ANGLE_MIN_DEG,
            angle_max_deg: ANGLE_MAX_DEG,
            power_min: POWER_MIN,
            aim_angle_rate: AIM_ANGLE_RATE,
            aim_power_rate: AIM_POWER_RATE,
            // Catapult & projectile
            catapult_x: CATAPULT_ORIGIN.0,
            catapult_y: CATAPULT_ORIGIN.1,
            projectile_radius: PROJECTILE_RADIUS,
            projectile_restitution: PROJECTILE_RESTITUTION,
            // Floor & platforms
            floor_top_y: FLOOR_TOP_Y,
            floor_half_width: FLOOR_HALF_WIDTH,
            floor_half_thickness: FLOOR_HALF_THICKNESS,
            platform_width: PLATFORM_WIDTH,
            platform_thickness: PLATFORM_THICKNESS,
            platform_y_offset: PLATFORM_Y_OFFSET,
            // Tower parts
            tower_restitution: TOWER_RESTITUTION,
            tower_friction: TOWER_FRICTION,
            // Settle detection
            settle_linvel_threshold: SETTLE_LINVEL_THRESHOLD,
            settle_angvel_threshold: SETTLE_ANGVEL_THRESHOLD,
            hard_reset_timeout_ms: HARD_RESET_TIMEOUT_MS,
            // Scoring
            ball_down_margin: BALL_DOWN_MARGIN,
            ball_points: BALL_POINTS,
            plank_points: PLANK_POINTS,
            // Randomness
            rng_seed: RNG_SEED,
            // Rendering
            hud_font_size: HUD_FONT_SIZE,
            preview_time_step: PREVIEW_TIME_STEP,
            camera_offset_x: CAMERA_OFFSET_X,
            camera_offset_y: CAMERA_OFFSET_Y,
        }
    }
}

/// Startup system: attempt to load `assets/game.toml` and overwrite the
/// `GameConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  TOML parse errors are
/// printed to stderr but do not abort the game.  A missing file is silently
/// ignored (defaults are already in place from `insert_resource`).
pub fn load_game_config(mut config: ResMut<GameConfig>) {
    let path = "assets/game.toml";
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<GameConfig>(&contents) {
            Ok(loaded) => {
                *config = loaded;
                println!("✓ Loaded game config from {path}");
            }
            Err(e) => {
                eprintln!("⚠ Failed to parse {path}: {e}; using defaults");
            }
        },
        Err(_) => {
            // File not present; defaults are already in place, not an error.
            println!("ℹ No {path} found; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = GameConfig::default();
        assert_eq!(config.gravity_accel, GRAVITY_ACCEL);
        assert_eq!(config.hard_reset_timeout_ms, HARD_RESET_TIMEOUT_MS);
        assert_eq!(config.catapult_origin(), Vec2::new(80.0, 140.0));
        assert_eq!(config.camera_offset_x, CAMERA_OFFSET_X);
        assert_eq!(config.camera_offset_y, CAMERA_OFFSET_Y);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config: GameConfig =
            toml::from_str("gravity_accel = -600.0\nball_points = 25").unwrap();
        assert_eq!(config.gravity_accel, -600.0);
        assert_eq!(config.ball_points, 25);
        // Everything else keeps the compiled default.
        assert_eq!(config.platform_y_offset, PLATFORM_Y_OFFSET);
        assert_eq!(config.settle_linvel_threshold, SETTLE_LINVEL_THRESHOLD);
    }
}
