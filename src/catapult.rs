//! Catapult and projectile: staging, aiming, launch, and reset.
//!
//! The beaver projectile exists for the whole level.  While staged it sits in
//! the catapult cup with gravity suspended (`GravityScale(0.0)`) and zero
//! velocity; launch flips gravity on and applies the aim velocity in one
//! step.  A reset (manual key, or the settle detector's auto-reset) is the
//! exact inverse, plus fresh problems for every still-frozen tower.
//!
//! Aim state lives in [`ShotState`] and mutates only while un-launched.

use crate::config::GameConfig;
use crate::level::{GameSession, LevelCatalog, LevelEntity};
use crate::problems::{generate_problem, GameRng};
use crate::tower::{AnswerSubmitted, Tower, TowerPhase, TowerProblem};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

// ── Components, resources, messages ───────────────────────────────────────────

/// Marker component for the beaver projectile entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile;

/// Per-shot session state: aim plus launch bookkeeping.
///
/// Owned exclusively by the level session; mutated only by the aim input
/// (while staged), by launch, and by reset.
#[derive(Resource, Debug, Clone)]
pub struct ShotState {
    /// Whether the current shot is in flight.
    pub launched: bool,
    /// Sim-clock timestamp (ms) of the launch; meaningless while staged.
    pub launched_at_ms: f64,
    /// Aim angle, degrees above horizontal.
    pub angle_deg: f32,
    /// Aim power (px/s).
    pub power: f32,
}

impl Default for ShotState {
    fn default() -> Self {
        Self {
            launched: false,
            launched_at_ms: 0.0,
            angle_deg: crate::constants::REFERENCE_ANGLE_DEG,
            power: crate::constants::POWER_MIN,
        }
    }
}

/// The player's in-progress typed answer.
#[derive(Resource, Default, Debug, Clone)]
pub struct AnswerInput(pub String);

/// Request to re-arm the catapult.  Written by the settle detector's
/// auto-reset and by the manual reset key; consumed by [`reset_system`].
#[derive(Message, Debug, Clone, Copy)]
pub struct ResetRequested;

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Spawn the staged projectile in the catapult cup.  Called once per level.
pub fn spawn_projectile(commands: &mut Commands, config: &GameConfig) -> Entity {
    commands
        .spawn((
            Projectile,
            LevelEntity,
            Transform::from_translation(config.catapult_origin().extend(0.2)),
            GlobalTransform::default(),
            RigidBody::Dynamic,
            Collider::ball(config.projectile_radius),
            Restitution::coefficient(config.projectile_restitution),
            Friction::coefficient(0.8),
            Velocity::zero(),
            GravityScale(0.0),
            // Fast shots against 8 px planks tunnel without sweep testing.
            Ccd::enabled(),
            Sleeping::disabled(),
        ))
        .id()
}

// ── Launch & reset helpers ────────────────────────────────────────────────────

/// Fire the staged shot: aim velocity on, gravity on, timestamp recorded.
pub fn launch_staged(
    shot: &mut ShotState,
    velocity: &mut Velocity,
    gravity_scale: &mut GravityScale,
    now_ms: f64,
) {
    let theta = shot.angle_deg.to_radians();
    velocity.linvel = Vec2::new(shot.power * theta.cos(), shot.power * theta.sin());
    velocity.angvel = 0.0;
    gravity_scale.0 = 1.0;
    shot.launched = true;
    shot.launched_at_ms = now_ms;
}

/// Return the projectile to the cup: zero velocity, gravity suspended,
/// position restored, launch flag cleared.
pub fn restage_projectile(
    shot: &mut ShotState,
    transform: &mut Transform,
    velocity: &mut Velocity,
    gravity_scale: &mut GravityScale,
    origin: Vec2,
) {
    transform.translation = origin.extend(0.2);
    transform.rotation = Quat::IDENTITY;
    velocity.linvel = Vec2::ZERO;
    velocity.angvel = 0.0;
    gravity_scale.0 = 0.0;
    shot.launched = false;
}

/// Apply one frame of aim adjustment, clamped to the playable ranges.
/// No-op once the shot is in flight.
pub fn apply_aim(
    shot: &mut ShotState,
    d_angle: f32,
    d_power: f32,
    config: &GameConfig,
    max_power: f32,
) {
    if shot.launched {
        return;
    }
    shot.angle_deg = crate::trajectory::clamp_angle(
        shot.angle_deg + d_angle,
        config.angle_min_deg,
        config.angle_max_deg,
    );
    shot.power = crate::trajectory::clamp_power(shot.power + d_power, config.power_min, max_power);
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Arrow-key aim adjustment while the shot is staged.
pub fn aim_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut shot: ResMut<ShotState>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    catalog: Res<LevelCatalog>,
) {
    let dt = time.delta_secs();
    let mut d_angle = 0.0;
    let mut d_power = 0.0;
    if keys.pressed(KeyCode::ArrowUp) {
        d_angle += config.aim_angle_rate * dt;
    }
    if keys.pressed(KeyCode::ArrowDown) {
        d_angle -= config.aim_angle_rate * dt;
    }
    if keys.pressed(KeyCode::ArrowRight) {
        d_power += config.aim_power_rate * dt;
    }
    if keys.pressed(KeyCode::ArrowLeft) {
        d_power -= config.aim_power_rate * dt;
    }
    if d_angle == 0.0 && d_power == 0.0 {
        return;
    }
    let max_power = session.current_level(&catalog).max_power;
    apply_aim(&mut shot, d_angle, d_power, &config, max_power);
}

/// Digit-key answer entry.  Enter submits the buffer as an
/// [`AnswerSubmitted`] message; Backspace edits; R requests a manual reset.
///
/// This is deliberately thin glue: the real text-entry UI is presentation,
/// and the message is the seam the core is tested through.
pub fn answer_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut input: ResMut<AnswerInput>,
    mut answers: MessageWriter<AnswerSubmitted>,
    mut resets: MessageWriter<ResetRequested>,
) {
    const DIGITS: [(KeyCode, char); 10] = [
        (KeyCode::Digit0, '0'),
        (KeyCode::Digit1, '1'),
        (KeyCode::Digit2, '2'),
        (KeyCode::Digit3, '3'),
        (KeyCode::Digit4, '4'),
        (KeyCode::Digit5, '5'),
        (KeyCode::Digit6, '6'),
        (KeyCode::Digit7, '7'),
        (KeyCode::Digit8, '8'),
        (KeyCode::Digit9, '9'),
    ];

    for (key, ch) in DIGITS {
        if keys.just_pressed(key) {
            input.0.push(ch);
        }
    }
    // Generated answers are never negative today, but the checker accepts a
    // signed parse, so the key is wired through.
    if keys.just_pressed(KeyCode::Minus) && input.0.is_empty() {
        input.0.push('-');
    }
    if keys.just_pressed(KeyCode::Backspace) {
        input.0.pop();
    }
    if keys.just_pressed(KeyCode::Enter) && !input.0.is_empty() {
        answers.write(AnswerSubmitted {
            value: std::mem::take(&mut input.0),
        });
    }
    if keys.just_pressed(KeyCode::KeyR) {
        resets.write(ResetRequested);
    }
}

/// Consume reset requests: restage the projectile and hand every still-frozen
/// tower a fresh arithmetic problem for the next shot.
///
/// Resets are all-or-nothing; there is no partial cancel of a shot.
#[allow(clippy::too_many_arguments)]
pub fn reset_system(
    mut commands: Commands,
    mut resets: MessageReader<ResetRequested>,
    mut shot: ResMut<ShotState>,
    mut q_projectile: Query<
        (&mut Transform, &mut Velocity, &mut GravityScale),
        With<Projectile>,
    >,
    q_towers: Query<(Entity, &TowerPhase), With<Tower>>,
    mut rng: ResMut<GameRng>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    catalog: Res<LevelCatalog>,
) {
    if resets.read().next().is_none() {
        return;
    }

    let Ok((mut transform, mut velocity, mut gravity_scale)) = q_projectile.single_mut() else {
        return;
    };
    restage_projectile(
        &mut shot,
        &mut transform,
        &mut velocity,
        &mut gravity_scale,
        config.catapult_origin(),
    );

    let year_level = session.current_level(&catalog).year_level;
    for (entity, phase) in q_towers.iter() {
        if *phase == TowerPhase::Frozen {
            let problem = generate_problem(&mut rng.0, year_level, None);
            commands.entity(entity).insert(TowerProblem(problem));
        }
    }
}
