//! Game-specific error types.
//!
//! The core absorbs runtime anomalies into degraded-but-continuing gameplay
//! (a degenerate trajectory lays out zero platforms, an unknown tower id
//! falls back to the full catalog), so these types surface almost entirely at
//! *config validation time*: [`validate_level_config`] is run over the whole
//! level catalog at startup and any error is logged before play begins.

use crate::config::GameConfig;
use crate::level::LevelConfig;
use crate::tower::TowerCatalog;
use crate::trajectory::TrajectoryParams;
use std::fmt;

/// Top-level error enum for the beaverball core.
#[derive(Debug)]
pub enum GameError {
    /// The level's perfect-shot trajectory never arcs up and back down
    /// through launch height, so no platform band exists.
    NoValidTrajectory {
        /// Offending level id (for logging).
        level_id: u32,
        /// The power the level's layout would use.
        perfect_shot_power: f32,
    },

    /// The level would generate no platforms at all.
    EmptyLevel {
        level_id: u32,
    },

    /// A level references a tower definition id missing from the catalog.
    /// Non-fatal at runtime (the full catalog is used instead); reported here
    /// so broken level data is visible at startup.
    UnknownTowerId {
        level_id: u32,
        tower_id: String,
    },

    /// A configured constant is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::NoValidTrajectory {
                level_id,
                perfect_shot_power,
            } => write!(
                f,
                "level {} has no valid perfect-shot trajectory at power {}",
                level_id, perfect_shot_power
            ),
            GameError::EmptyLevel { level_id } => {
                write!(f, "level {} would generate zero platforms", level_id)
            }
            GameError::UnknownTowerId { level_id, tower_id } => write!(
                f,
                "level {} references unknown tower id '{}'",
                level_id, tower_id
            ),
            GameError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for GameError {}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `gravity` is not strictly negative (y-up world).
///
/// A zero or upward gravity breaks every flight-time formula: the symmetric
/// return time divides by it.
pub fn validate_gravity(value: f32) -> GameResult<()> {
    if !value.is_finite() || value >= 0.0 {
        Err(GameError::UnsafeConstant {
            name: "GRAVITY_ACCEL",
            value,
            safe_range: "(-inf, 0.0)",
        })
    } else {
        Ok(())
    }
}

/// Validates a single level against the layout math it will be built with.
///
/// Checks, in order:
/// 1. `platform_count >= 1` (a zero-platform level is unwinnable: completion
///    requires at least one ball down).
/// 2. The perfect-shot trajectory produces both a symmetric flight time and a
///    platform-band end time, i.e. the layout will not silently come out
///    empty at runtime.
/// 3. Every allowed tower id resolves in the catalog, so the runtime
///    full-catalog fallback never has to paper over broken level data.
pub fn validate_level_config(
    level: &LevelConfig,
    config: &GameConfig,
    towers: &TowerCatalog,
) -> GameResult<()> {
    if level.platform_count == 0 {
        return Err(GameError::EmptyLevel {
            level_id: level.id,
        });
    }

    let params = TrajectoryParams {
        angle_deg: config.reference_angle_deg,
        power: level.perfect_shot_power,
        gravity: config.gravity_accel,
    };
    if params.time_of_flight().is_none()
        || params.time_to_offset_return(config.platform_y_offset).is_none()
    {
        return Err(GameError::NoValidTrajectory {
            level_id: level.id,
            perfect_shot_power: level.perfect_shot_power,
        });
    }

    for id in &level.tower_ids {
        if towers.definition_by_id(id).is_none() {
            return Err(GameError::UnknownTowerId {
                level_id: level.id,
                tower_id: id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::level::LevelConfig;
    use crate::tower::TowerCatalog;

    fn test_level() -> LevelConfig {
        LevelConfig {
            id: 99,
            name: "Test Pond".to_string(),
            platform_count: 2,
            platform_gap_fraction: 0.4,
            tower_ids: vec!["single_stack".to_string()],
            perfect_shot_power: 750.0,
            max_power: 900.0,
            year_level: 1,
            settle_grace_ms: 500.0,
        }
    }

    #[test]
    fn valid_level_passes() {
        let config = GameConfig::default();
        let towers = TowerCatalog::default();
        assert!(validate_level_config(&test_level(), &config, &towers).is_ok());
    }

    #[test]
    fn zero_platforms_is_rejected() {
        let config = GameConfig::default();
        let mut level = test_level();
        level.platform_count = 0;
        assert!(matches!(
            validate_level_config(&level, &config, &TowerCatalog::default()),
            Err(GameError::EmptyLevel { level_id: 99 })
        ));
    }

    #[test]
    fn underpowered_shot_is_rejected() {
        // At this power the platform band's quadratic has no real root: the
        // arc never climbs high enough for the offset surface to reach
        // launch height.
        let config = GameConfig::default();
        let mut level = test_level();
        level.perfect_shot_power = 50.0;
        assert!(matches!(
            validate_level_config(&level, &config, &TowerCatalog::default()),
            Err(GameError::NoValidTrajectory { level_id: 99, .. })
        ));
    }

    #[test]
    fn unresolvable_tower_id_is_rejected() {
        let config = GameConfig::default();
        let mut level = test_level();
        level.tower_ids.push("driftwood_fort".to_string());
        let err = validate_level_config(&level, &config, &TowerCatalog::default());
        assert!(matches!(
            err,
            Err(GameError::UnknownTowerId { level_id: 99, ref tower_id }) if tower_id.as_str() == "driftwood_fort"
        ));
    }

    #[test]
    fn positive_gravity_is_rejected() {
        assert!(validate_gravity(9.81).is_err());
        assert!(validate_gravity(f32::NAN).is_err());
        assert!(validate_gravity(-900.0).is_ok());
    }
}
