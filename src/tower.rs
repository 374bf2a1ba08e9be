//! Tower catalog, spawning, and the per-tower lifecycle state machine.
//!
//! ## Lifecycle
//!
//! | Phase      | Physics            | Contact checks | Problem |
//! |------------|--------------------|----------------|---------|
//! | `Frozen`   | fixed              | ignored        | live    |
//! | `Unfrozen` | fixed              | eligible       | retired |
//! | `Dynamic`  | dynamic, awake     | is an impactor | retired |
//!
//! Transitions are strictly monotonic: `Frozen → Unfrozen` when the player
//! answers the tower's arithmetic problem ([`answer_system`]), and
//! `Unfrozen → Dynamic` when any of the tower's bodies touches an impactor
//! ([`impact_system`]).  The impactor set is rebuilt every tick from the
//! launched projectile plus the bodies of every already-dynamic tower, so
//! dynamic towers chain-trigger their neighbours.
//!
//! ## Catalog
//!
//! Tower shapes are data: an ordered list of plank/ball parts with offsets
//! from the platform anchor.  A built-in catalog ships in code; at startup
//! [`load_tower_catalog`] merges in any definitions found in
//! `assets/towers.json` (same document shape the level-authoring tool
//! exports).  A missing file is silently ignored; parse errors keep the
//! built-ins.

use crate::catapult::{launch_staged, Projectile, ShotState};
use crate::config::GameConfig;
use crate::level::LevelEntity;
use crate::problems::ArithmeticProblem;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

// ── Definitions ───────────────────────────────────────────────────────────────

/// One part of a tower shape, positioned relative to the tower anchor
/// (platform center x, platform surface y).  Serialises as the JSON document
/// shape used by the authoring tool: `{"type":"plank","dx":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TowerPartDef {
    Plank { dx: f32, dy: f32, w: f32, h: f32 },
    Ball { dx: f32, dy: f32, r: f32 },
}

/// A catalog entry: an id plus an ordered part list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerDefinition {
    pub id: String,
    pub parts: Vec<TowerPartDef>,
}

impl TowerDefinition {
    /// Number of ball parts (each one a scoring target).
    pub fn ball_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, TowerPartDef::Ball { .. }))
            .count()
    }
}

/// Resource holding every known tower definition, looked up by id.
#[derive(Resource, Debug, Clone)]
pub struct TowerCatalog {
    pub defs: Vec<TowerDefinition>,
}

impl TowerCatalog {
    pub fn definition_by_id(&self, id: &str) -> Option<&TowerDefinition> {
        self.defs.iter().find(|d| d.id == id)
    }

    /// Resolve a level's allowed tower ids into definitions.
    ///
    /// Ids missing from the catalog are skipped with a warning; if *none*
    /// resolve, the full catalog is returned so a broken level selection
    /// degrades to "any tower" rather than blocking play.
    pub fn resolve_allowed(&self, ids: &[String]) -> Vec<&TowerDefinition> {
        let mut resolved = Vec::new();
        for id in ids {
            match self.definition_by_id(id) {
                Some(def) => resolved.push(def),
                None => eprintln!("⚠ Unknown tower id '{id}'; skipping"),
            }
        }
        if resolved.is_empty() {
            eprintln!("⚠ No allowed tower ids resolved; falling back to full catalog");
            self.defs.iter().collect()
        } else {
            resolved
        }
    }
}

impl Default for TowerCatalog {
    fn default() -> Self {
        // Offsets in px from the platform anchor; dy grows upward.
        Self {
            defs: vec![
                TowerDefinition {
                    id: "single_stack".to_string(),
                    parts: vec![
                        TowerPartDef::Plank {
                            dx: 0.0,
                            dy: 4.0,
                            w: 90.0,
                            h: 8.0,
                        },
                        TowerPartDef::Ball {
                            dx: 0.0,
                            dy: 22.0,
                            r: 14.0,
                        },
                    ],
                },
                TowerDefinition {
                    id: "ball_nest".to_string(),
                    parts: vec![
                        TowerPartDef::Plank {
                            dx: 0.0,
                            dy: 4.0,
                            w: 120.0,
                            h: 8.0,
                        },
                        TowerPartDef::Ball {
                            dx: -30.0,
                            dy: 22.0,
                            r: 14.0,
                        },
                        TowerPartDef::Ball {
                            dx: 30.0,
                            dy: 22.0,
                            r: 14.0,
                        },
                    ],
                },
                TowerDefinition {
                    id: "twin_deck".to_string(),
                    parts: vec![
                        TowerPartDef::Plank {
                            dx: 0.0,
                            dy: 4.0,
                            w: 120.0,
                            h: 8.0,
                        },
                        TowerPartDef::Ball {
                            dx: -30.0,
                            dy: 22.0,
                            r: 14.0,
                        },
                        TowerPartDef::Ball {
                            dx: 30.0,
                            dy: 22.0,
                            r: 14.0,
                        },
                        TowerPartDef::Plank {
                            dx: 0.0,
                            dy: 40.0,
                            w: 120.0,
                            h: 8.0,
                        },
                        TowerPartDef::Ball {
                            dx: 0.0,
                            dy: 58.0,
                            r: 14.0,
                        },
                    ],
                },
                TowerDefinition {
                    id: "high_perch".to_string(),
                    parts: vec![
                        TowerPartDef::Plank {
                            dx: -35.0,
                            dy: 20.0,
                            w: 8.0,
                            h: 40.0,
                        },
                        TowerPartDef::Plank {
                            dx: 35.0,
                            dy: 20.0,
                            w: 8.0,
                            h: 40.0,
                        },
                        TowerPartDef::Plank {
                            dx: 0.0,
                            dy: 44.0,
                            w: 110.0,
                            h: 8.0,
                        },
                        TowerPartDef::Ball {
                            dx: 0.0,
                            dy: 66.0,
                            r: 14.0,
                        },
                    ],
                },
            ],
        }
    }
}

/// Startup system: merge `assets/towers.json` into the built-in catalog.
///
/// Documents with a known id replace the built-in definition; new ids are
/// appended.  The file is the same JSON document array the authoring tool
/// exports.
pub fn load_tower_catalog(mut catalog: ResMut<TowerCatalog>) {
    let path = "assets/towers.json";
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Vec<TowerDefinition>>(&contents) {
            Ok(loaded) => {
                let count = loaded.len();
                for def in loaded {
                    match catalog.defs.iter_mut().find(|d| d.id == def.id) {
                        Some(existing) => *existing = def,
                        None => catalog.defs.push(def),
                    }
                }
                println!("✓ Merged {count} tower definition(s) from {path}");
            }
            Err(e) => {
                eprintln!("⚠ Failed to parse {path}: {e}; keeping built-in towers");
            }
        },
        Err(_) => {
            println!("ℹ No {path} found; using built-in towers");
        }
    }
}

// ── Components & messages ─────────────────────────────────────────────────────

/// Lifecycle phase of a tower.  Transitions are monotonic; a tower never
/// regresses to an earlier phase within a level.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowerPhase {
    /// Inert and protected: ignored by all contact checks, problem live.
    Frozen,
    /// Still kinematically fixed, but now eligible to be struck.
    Unfrozen,
    /// Fully simulated; terminal for the tower's remaining lifetime.
    Dynamic,
}

/// Root entity of one spawned tower.
#[derive(Component, Debug, Clone)]
pub struct Tower {
    /// Platform index the tower stands on; also the scan order for the
    /// same-tick impact cascade.
    pub index: u32,
    /// Y of the hosting platform's top surface (ball-down thresholding).
    pub surface_y: f32,
}

/// The tower's live arithmetic problem.  Present exactly while the tower is
/// frozen; removed on unfreeze (the displayed question is retired) and
/// re-inserted with a fresh problem when a reset re-arms the catapult.
#[derive(Component, Debug, Clone)]
pub struct TowerProblem(pub ArithmeticProblem);

/// Physics entities making up one tower.
#[derive(Component, Debug, Clone)]
pub struct TowerParts {
    pub planks: Vec<Entity>,
    pub balls: Vec<Entity>,
}

impl TowerParts {
    pub fn all_bodies(&self) -> impl Iterator<Item = Entity> + '_ {
        self.planks.iter().chain(self.balls.iter()).copied()
    }
}

/// Marker on every physics body belonging to a tower, pointing back at the
/// tower root.
#[derive(Component, Debug, Clone, Copy)]
pub struct TowerBody {
    pub tower: Entity,
}

/// A structural plank body.  Half extents are kept on the component so the
/// wireframe renderer never has to read them back out of the collider.
#[derive(Component, Debug, Clone, Copy)]
pub struct TowerPlank {
    pub half_extents: Vec2,
}

/// Presentation mood of a tower ball; flipped by the state machine and by
/// ball-down scoring.  Never consulted by gameplay logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallMood {
    Calm,
    Worried,
    Dazed,
}

/// A scoring ball body.
#[derive(Component, Debug, Clone)]
pub struct TowerBall {
    pub radius: f32,
    /// Monotonic: set once the ball is judged down, never cleared within the
    /// same level attempt.
    pub down: bool,
    pub mood: BallMood,
}

/// A player-submitted answer, as typed.  Emitted by the catapult input glue;
/// consumed by [`answer_system`].
#[derive(Message, Debug, Clone)]
pub struct AnswerSubmitted {
    pub value: String,
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Spawn a tower from a definition, anchored to a platform.
///
/// `anchor` is (platform center x, platform surface y).  Every part spawns as
/// a fixed Rapier body; [`impact_system`] flips them to dynamic when the
/// tower is struck.
pub fn spawn_tower(
    commands: &mut Commands,
    def: &TowerDefinition,
    index: u32,
    anchor: Vec2,
    problem: ArithmeticProblem,
    config: &GameConfig,
) -> Entity {
    let root = commands
        .spawn((
            Tower {
                index,
                surface_y: anchor.y,
            },
            TowerPhase::Frozen,
            TowerProblem(problem),
            Transform::from_translation(anchor.extend(0.0)),
            GlobalTransform::default(),
            LevelEntity,
        ))
        .id();

    let mut planks = Vec::new();
    let mut balls = Vec::new();
    for part in &def.parts {
        match *part {
            TowerPartDef::Plank { dx, dy, w, h } => {
                let entity = commands
                    .spawn((
                        Transform::from_translation(Vec3::new(anchor.x + dx, anchor.y + dy, 0.1)),
                        GlobalTransform::default(),
                        TowerBody { tower: root },
                        TowerPlank {
                            half_extents: Vec2::new(w / 2.0, h / 2.0),
                        },
                        LevelEntity,
                        RigidBody::Fixed,
                        Collider::cuboid(w / 2.0, h / 2.0),
                        Restitution::coefficient(config.tower_restitution),
                        Friction::coefficient(config.tower_friction),
                        Velocity::zero(),
                        Sleeping::disabled(),
                    ))
                    .id();
                planks.push(entity);
            }
            TowerPartDef::Ball { dx, dy, r } => {
                let entity = commands
                    .spawn((
                        Transform::from_translation(Vec3::new(anchor.x + dx, anchor.y + dy, 0.1)),
                        GlobalTransform::default(),
                        TowerBody { tower: root },
                        TowerBall {
                            radius: r,
                            down: false,
                            mood: BallMood::Calm,
                        },
                        LevelEntity,
                        RigidBody::Fixed,
                        Collider::ball(r),
                        Restitution::coefficient(config.tower_restitution),
                        Friction::coefficient(config.tower_friction),
                        Velocity::zero(),
                        Sleeping::disabled(),
                    ))
                    .id();
                balls.push(entity);
            }
        }
    }

    commands.entity(root).insert(TowerParts { planks, balls });
    root
}

// ── frozen → unfrozen ─────────────────────────────────────────────────────────

/// Check each submitted answer against every frozen tower's problem.
///
/// A correct answer unfreezes the matching tower(s): the problem component is
/// removed (the displayed question is retired) and the skin flips via
/// `TowerPhase`, which rendering reads.  The tower's bodies stay fixed; only
/// a physical strike makes them dynamic.
///
/// If at least one tower unfroze while the projectile was still staged, the
/// shot fires: a correct answer both opens the target and launches the
/// beaver.  Incorrect answers are absorbed silently; play continues.
pub fn answer_system(
    mut commands: Commands,
    mut answers: MessageReader<AnswerSubmitted>,
    mut q_towers: Query<(Entity, &mut TowerPhase, &TowerProblem)>,
    mut q_projectile: Query<(&mut Velocity, &mut GravityScale), With<Projectile>>,
    mut shot: ResMut<ShotState>,
    time: Res<Time>,
) {
    let mut any_unfrozen = false;

    for answer in answers.read() {
        for (entity, mut phase, problem) in q_towers.iter_mut() {
            if *phase != TowerPhase::Frozen {
                continue;
            }
            if crate::problems::check_answer(&problem.0, &answer.value) {
                *phase = TowerPhase::Unfrozen;
                commands.entity(entity).remove::<TowerProblem>();
                any_unfrozen = true;
            }
        }
    }

    if any_unfrozen && !shot.launched {
        if let Ok((mut velocity, mut gravity_scale)) = q_projectile.single_mut() {
            launch_staged(
                &mut shot,
                &mut velocity,
                &mut gravity_scale,
                time.elapsed_secs_f64() * 1000.0,
            );
        }
    }
}

// ── unfrozen → dynamic ────────────────────────────────────────────────────────

/// One tower's contact-check input for [`select_promotions`].
#[derive(Debug, Clone)]
pub struct TowerBodies {
    pub tower: Entity,
    pub bodies: Vec<Entity>,
}

/// Decide which unfrozen towers get promoted to dynamic this tick.
///
/// `unfrozen` must be in scan order; `impactors` starts as the launched
/// projectile plus every already-dynamic tower's bodies.  A promoted tower's
/// bodies are appended to `impactors` before the next tower is checked, so a
/// strike can cascade through several towers within a single tick.
///
/// The contact check is injected so the decision is testable without a
/// physics engine.
pub fn select_promotions<F>(
    unfrozen: &[TowerBodies],
    impactors: &mut Vec<Entity>,
    has_contact: F,
) -> Vec<Entity>
where
    F: Fn(Entity, Entity) -> bool,
{
    let mut promoted = Vec::new();
    for tower in unfrozen {
        let hit = tower
            .bodies
            .iter()
            .any(|&body| impactors.iter().any(|&imp| has_contact(body, imp)));
        if hit {
            promoted.push(tower.tower);
            impactors.extend_from_slice(&tower.bodies);
        }
    }
    promoted
}

/// Per-tick contact pass driving `Unfrozen → Dynamic`.
///
/// Rebuilds the impactor set from current state, scans unfrozen towers in
/// platform order, and switches every body of a struck tower to a movable
/// type, awake, within the same tick.
pub fn impact_system(
    mut commands: Commands,
    mut q_towers: Query<(Entity, &Tower, &mut TowerPhase, &TowerParts)>,
    q_projectile: Query<Entity, With<Projectile>>,
    mut q_balls: Query<&mut TowerBall>,
    shot: Res<ShotState>,
    rapier_context: ReadRapierContext,
) {
    let Ok(rapier) = rapier_context.single() else {
        return;
    };

    // Impactors: the projectile (only once launched) plus every body of every
    // tower already dynamic.
    let mut impactors: Vec<Entity> = Vec::new();
    if shot.launched {
        if let Ok(projectile) = q_projectile.single() {
            impactors.push(projectile);
        }
    }
    for (_, _, phase, parts) in q_towers.iter() {
        if *phase == TowerPhase::Dynamic {
            impactors.extend(parts.all_bodies());
        }
    }
    if impactors.is_empty() {
        return;
    }

    // Scan order: platform index, so the cascade walks outward along the band.
    let mut unfrozen: Vec<(u32, TowerBodies)> = q_towers
        .iter()
        .filter(|(_, _, phase, _)| **phase == TowerPhase::Unfrozen)
        .map(|(entity, tower, _, parts)| {
            (
                tower.index,
                TowerBodies {
                    tower: entity,
                    bodies: parts.all_bodies().collect(),
                },
            )
        })
        .collect();
    unfrozen.sort_by_key(|(index, _)| *index);
    let unfrozen: Vec<TowerBodies> = unfrozen.into_iter().map(|(_, t)| t).collect();

    let promoted = select_promotions(&unfrozen, &mut impactors, |a, b| {
        rapier
            .contact_pair(a, b)
            .map(|pair| pair.has_any_active_contact())
            .unwrap_or(false)
    });

    for tower_entity in promoted {
        let Ok((_, _, mut phase, parts)) = q_towers.get_mut(tower_entity) else {
            continue;
        };
        *phase = TowerPhase::Dynamic;
        for body in parts.all_bodies() {
            commands
                .entity(body)
                .insert((RigidBody::Dynamic, Sleeping::disabled()));
        }
        for &ball in &parts.balls {
            if let Ok(mut ball) = q_balls.get_mut(ball) {
                if ball.mood == BallMood::Calm {
                    ball.mood = BallMood::Worried;
                }
            }
        }
    }
}
