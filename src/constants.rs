//! Centralised physics and gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! [`crate::config::GameConfig`] mirrors every constant and can override any
//! subset at runtime via `assets/game.toml`; this file remains the
//! authoritative default source.
//!
//! ## Units
//!
//! World space is Bevy-native: pixels, y up, seconds.  Gravity is therefore a
//! *negative* acceleration.  Launch angles are degrees above the horizontal,
//! firing toward +x.

// ── Kinematics ────────────────────────────────────────────────────────────────

/// Vertical acceleration applied to launched bodies (px/s²).  Negative is down.
///
/// This value feeds both the Rapier world gravity and the pure trajectory
/// math, so platform layout and the actual flight path always agree.
pub const GRAVITY_ACCEL: f32 = -900.0;

/// Reference launch angle (degrees above horizontal) used for platform layout.
///
/// Platforms are placed along the parabola a shot at this angle and the
/// level's `perfect_shot_power` would follow, so a player matching both lands
/// dead on target.
pub const REFERENCE_ANGLE_DEG: f32 = 55.0;

/// Smallest launch angle the player can aim (degrees above horizontal).
pub const ANGLE_MIN_DEG: f32 = 10.0;

/// Largest launch angle the player can aim.
///
/// Capped below 90° so a shot always makes forward progress toward the
/// platforms; a perfectly vertical shot would never reach them.
pub const ANGLE_MAX_DEG: f32 = 85.0;

/// Smallest launch power (px/s).  The per-level maximum lives on
/// [`crate::level::LevelConfig::max_power`].
pub const POWER_MIN: f32 = 200.0;

/// Degrees per second the aim angle changes while an arrow key is held.
pub const AIM_ANGLE_RATE: f32 = 40.0;

/// Power units per second the launch power changes while an arrow key is held.
pub const AIM_POWER_RATE: f32 = 250.0;

// ── Catapult & projectile ─────────────────────────────────────────────────────

/// World position of the catapult cup: the staged projectile's resting point
/// and the origin of every trajectory sample.
pub const CATAPULT_ORIGIN: (f32, f32) = (80.0, 140.0);

/// Collider radius of the beaver projectile (px).
pub const PROJECTILE_RADIUS: f32 = 16.0;

/// Restitution of the projectile.  Slightly bouncy so a near miss still
/// rattles the tower instead of dying on first contact.
pub const PROJECTILE_RESTITUTION: f32 = 0.3;

// ── Floor & platforms ─────────────────────────────────────────────────────────

/// Y coordinate of the floor's top surface.  Balls are scored against this.
pub const FLOOR_TOP_Y: f32 = 0.0;

/// Half-width of the fixed floor collider (px).  Wide enough that nothing a
/// shot can reach ever falls past its edge.
pub const FLOOR_HALF_WIDTH: f32 = 4000.0;

/// Half-thickness of the floor collider (px).
pub const FLOOR_HALF_THICKNESS: f32 = 20.0;

/// Platform width (px).  The sampled trajectory point aligns with the
/// platform's *left* edge so the perfect shot arrives over the platform body.
pub const PLATFORM_WIDTH: f32 = 160.0;

/// Platform thickness (px).  Also part of the ball-down test: a ball that has
/// fallen below its platform's surface minus this thickness is down.
pub const PLATFORM_THICKNESS: f32 = 16.0;

/// Signed vertical offset from a trajectory sample to the platform top
/// surface beneath it (px, negative = below).
///
/// The gap leaves room for a tower to stand on the platform with its upper
/// parts intersecting the flight path, so the perfect shot strikes the tower
/// rather than the platform.
pub const PLATFORM_Y_OFFSET: f32 = -120.0;

// ── Tower parts ───────────────────────────────────────────────────────────────

/// Restitution for tower planks and balls.
pub const TOWER_RESTITUTION: f32 = 0.1;

/// Friction for tower planks and balls.  High enough that toppled parts come
/// to rest instead of sliding along the floor forever.
pub const TOWER_FRICTION: f32 = 0.9;

// ── Settle detection ──────────────────────────────────────────────────────────

/// Linear speed (px/s) below which a body counts as stationary.
///
/// Tuned against Rapier's resting jitter at pixels_per_meter(1.0); bodies in
/// stable contact oscillate well below this.  Raising it makes auto-reset
/// eager; lowering it risks a shot that never settles (caught by the hard
/// timeout instead).
pub const SETTLE_LINVEL_THRESHOLD: f32 = 0.01;

/// Angular speed (rad/s) below which a body counts as stationary.
pub const SETTLE_ANGVEL_THRESHOLD: f32 = 0.00001;

/// Hard ceiling (ms) on a shot's lifetime.  Once this much sim time has
/// passed since launch the projectile is reset regardless of what the settle
/// detector thinks.  The "stopped" signal is a heuristic, not proof.
pub const HARD_RESET_TIMEOUT_MS: f64 = 7000.0;

// ── Scoring ───────────────────────────────────────────────────────────────────

/// Extra slack (px) added to a ball's radius when testing distance-to-floor.
///
/// Covers the tick where a discrete physics step carries the ball through the
/// exact contact height without reporting a contact pair.
pub const BALL_DOWN_MARGIN: f32 = 4.0;

/// Points awarded when a tower ball is knocked down.
pub const BALL_POINTS: u32 = 10;

/// Points awarded the first time a plank body touches the floor.
pub const PLANK_POINTS: u32 = 1;

// ── Randomness ────────────────────────────────────────────────────────────────

/// Seed for the game rng.  0 = seed from entropy; any other value makes tower
/// selection and problem generation fully reproducible.
pub const RNG_SEED: u64 = 0;

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Font size of the HUD text lines.
pub const HUD_FONT_SIZE: f32 = 22.0;

/// Sample spacing (s) of the aim-preview polyline.
pub const PREVIEW_TIME_STEP: f32 = 0.05;

/// Camera center relative to the catapult.  Pushes the view right and up so
/// the catapult hugs the left edge and the platform band fills the frame.
pub const CAMERA_OFFSET_X: f32 = 560.0;
pub const CAMERA_OFFSET_Y: f32 = 160.0;
