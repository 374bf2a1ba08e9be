//! Beaverball: a physics arcade game where arithmetic loads the catapult.
//!
//! A beaver is launched along a parabolic arc at towers of planks and balls;
//! solving a tower's arithmetic problem unfreezes it so the shot (or a
//! toppling neighbour) can knock its balls to the ground.  All balls down
//! clears the level.

pub mod catapult;
pub mod config;
pub mod constants;
pub mod error;
pub mod graphics;
pub mod level;
pub mod problems;
pub mod rendering;
pub mod scoring;
pub mod settle;
pub mod tower;
pub mod trajectory;
