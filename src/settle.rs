//! Settle detection: decide when a shot's aftermath has stopped moving.
//!
//! Each tick after launch the detector watches the projectile and every
//! dynamic tower body.  When all of them stay under the linear and angular
//! speed thresholds for the level's grace period, the shot is over and the
//! catapult re-arms automatically.  A hard timeout backs the heuristic up:
//! micro-jitter below threshold that never truly stops, or a mis-tuned
//! threshold, can otherwise leave a shot in limbo forever.  The two timers
//! together are the deliberate defense against an unreliable "stopped"
//! signal in a continuous rigid-body simulation.
//!
//! Timing is sim-clock milliseconds, never frame counts, so behaviour is
//! identical across frame rates.

use crate::catapult::{Projectile, ResetRequested, ShotState};
use crate::config::GameConfig;
use crate::level::{GameSession, LevelCatalog};
use crate::scoring::LevelProgress;
use crate::tower::TowerBody;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Pure settle/timeout state machine.  Fed one observation per tick.
#[derive(Resource, Default, Debug, Clone)]
pub struct SettleWatch {
    /// Sim-clock timestamp (ms) of the first tick of the current settled
    /// streak; `None` while anything is still moving.
    settled_since_ms: Option<f64>,
}

/// Per-tick observation thresholds and timers, bundled so the pure core has
/// a single tidy signature.
#[derive(Debug, Clone, Copy)]
pub struct SettleParams {
    pub linvel_threshold: f32,
    pub angvel_threshold: f32,
    pub grace_ms: f64,
    pub hard_timeout_ms: f64,
}

impl SettleWatch {
    /// Forget any pending settle streak (level rebuild, shot restaged).
    pub fn clear(&mut self) {
        self.settled_since_ms = None;
    }

    /// Feed one tick's maxima; returns `true` when the shot should reset.
    ///
    /// The hard timeout fires on sim time since launch regardless of motion.
    /// Otherwise any body over threshold clears the pending streak, and a
    /// streak older than the grace period triggers the reset.
    pub fn observe(
        &mut self,
        max_linvel: f32,
        max_angvel: f32,
        now_ms: f64,
        launched_at_ms: f64,
        params: SettleParams,
    ) -> bool {
        if now_ms - launched_at_ms > params.hard_timeout_ms {
            self.settled_since_ms = None;
            return true;
        }

        if max_linvel > params.linvel_threshold || max_angvel > params.angvel_threshold {
            self.settled_since_ms = None;
            return false;
        }

        match self.settled_since_ms {
            None => {
                self.settled_since_ms = Some(now_ms);
                false
            }
            Some(since) => {
                if now_ms - since > params.grace_ms {
                    self.settled_since_ms = None;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Per-tick scan feeding [`SettleWatch`]; requests a reset when it fires.
///
/// Only runs while a shot is in flight and the level is incomplete: a
/// finished level must not quietly re-arm the catapult under the completion
/// screen.
#[allow(clippy::too_many_arguments)]
pub fn settle_system(
    time: Res<Time>,
    shot: Res<ShotState>,
    mut watch: ResMut<SettleWatch>,
    progress: Res<LevelProgress>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    catalog: Res<LevelCatalog>,
    q_projectile: Query<&Velocity, With<Projectile>>,
    q_bodies: Query<(&RigidBody, &Velocity), With<TowerBody>>,
    mut resets: MessageWriter<ResetRequested>,
) {
    if !shot.launched || progress.complete {
        watch.clear();
        return;
    }

    let mut max_linvel: f32 = 0.0;
    let mut max_angvel: f32 = 0.0;
    if let Ok(velocity) = q_projectile.single() {
        max_linvel = max_linvel.max(velocity.linvel.length());
        max_angvel = max_angvel.max(velocity.angvel.abs());
    }
    for (body, velocity) in q_bodies.iter() {
        if *body != RigidBody::Dynamic {
            continue;
        }
        max_linvel = max_linvel.max(velocity.linvel.length());
        max_angvel = max_angvel.max(velocity.angvel.abs());
    }

    let params = SettleParams {
        linvel_threshold: config.settle_linvel_threshold,
        angvel_threshold: config.settle_angvel_threshold,
        grace_ms: session.current_level(&catalog).settle_grace_ms,
        hard_timeout_ms: config.hard_reset_timeout_ms,
    };
    let now_ms = time.elapsed_secs_f64() * 1000.0;
    if watch.observe(max_linvel, max_angvel, now_ms, shot.launched_at_ms, params) {
        resets.write(ResetRequested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(grace_ms: f64) -> SettleParams {
        SettleParams {
            linvel_threshold: 0.01,
            angvel_threshold: 0.00001,
            grace_ms,
            hard_timeout_ms: 7000.0,
        }
    }

    #[test]
    fn motion_keeps_the_timer_cleared() {
        let mut watch = SettleWatch::default();
        let p = params(100.0);
        for tick in 0..50 {
            let now = tick as f64 * 16.0;
            assert!(!watch.observe(5.0, 0.0, now, 0.0, p));
        }
        assert!(watch.settled_since_ms.is_none());
    }

    #[test]
    fn settled_past_grace_triggers_reset() {
        let mut watch = SettleWatch::default();
        let p = params(100.0);
        // First settled tick arms the timer.
        assert!(!watch.observe(0.0, 0.0, 1000.0, 0.0, p));
        // Still inside the grace window.
        assert!(!watch.observe(0.0, 0.0, 1050.0, 0.0, p));
        // Past the window: reset fires.
        assert!(watch.observe(0.0, 0.0, 1116.0, 0.0, p));
        // State is consumed; the next streak starts from scratch.
        assert!(!watch.observe(0.0, 0.0, 1132.0, 0.0, p));
    }

    #[test]
    fn jitter_mid_streak_rearms_the_grace_window() {
        let mut watch = SettleWatch::default();
        let p = params(100.0);
        assert!(!watch.observe(0.0, 0.0, 0.0, 0.0, p));
        // A single moving tick wipes the streak...
        assert!(!watch.observe(0.5, 0.0, 50.0, 0.0, p));
        // ...so settling again must wait out a full grace period.
        assert!(!watch.observe(0.0, 0.0, 60.0, 0.0, p));
        assert!(!watch.observe(0.0, 0.0, 140.0, 0.0, p));
        assert!(watch.observe(0.0, 0.0, 170.0, 0.0, p));
    }

    #[test]
    fn angular_motion_alone_counts_as_moving() {
        let mut watch = SettleWatch::default();
        let p = params(100.0);
        assert!(!watch.observe(0.0, 0.0, 0.0, 0.0, p));
        assert!(!watch.observe(0.0, 0.001, 90.0, 0.0, p));
        assert!(watch.settled_since_ms.is_none());
    }

    #[test]
    fn hard_timeout_fires_despite_endless_jitter() {
        let mut watch = SettleWatch::default();
        let p = params(100.0);
        // Perpetual above-threshold jitter never settles...
        for tick in 0..437 {
            let now = tick as f64 * 16.0;
            assert!(!watch.observe(3.0, 0.1, now, 0.0, p));
        }
        // ...but 7 s after launch the fallback forces the reset.
        assert!(watch.observe(3.0, 0.1, 7001.0, 0.0, p));
    }

    #[test]
    fn timers_are_clock_based_not_frame_based() {
        // Two frames 200 ms apart clear a 100 ms grace; frame count is two
        // in both cases, only the clock differs.
        let mut watch = SettleWatch::default();
        let p = params(100.0);
        assert!(!watch.observe(0.0, 0.0, 0.0, 0.0, p));
        assert!(watch.observe(0.0, 0.0, 200.0, 0.0, p));

        let mut fast = SettleWatch::default();
        assert!(!fast.observe(0.0, 0.0, 0.0, 0.0, p));
        assert!(!fast.observe(0.0, 0.0, 8.0, 0.0, p));
    }
}
