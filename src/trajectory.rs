//! Pure projectile kinematics for layout and aim preview.
//!
//! No ECS, no physics engine: just the closed-form parabola a launched body
//! follows under constant gravity.  [`crate::level`] uses this to place
//! platforms along the perfect shot; [`crate::rendering`] samples it for the
//! aim-preview polyline.  Keeping the math pure means every layout property
//! is unit-testable without an engine in the loop.
//!
//! Conventions: y up, `gravity < 0`, angle in degrees above the horizontal,
//! shots travel toward +x.

use bevy::prelude::Vec2;

/// Parameters of one ballistic shot.  Immutable per shot; the player's aim
/// mutates only while the projectile is still staged on the catapult.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryParams {
    /// Launch angle, degrees above horizontal.
    pub angle_deg: f32,
    /// Launch speed (px/s).
    pub power: f32,
    /// Vertical acceleration (px/s², negative).
    pub gravity: f32,
}

impl TrajectoryParams {
    /// Launch velocity as a cartesian vector.
    pub fn velocity(&self) -> Vec2 {
        let theta = self.angle_deg.to_radians();
        Vec2::new(self.power * theta.cos(), self.power * theta.sin())
    }

    /// Position along the parabola at time `t` seconds after launch from
    /// `origin`:
    ///
    /// `x(t) = x0 + v·cosθ·t`
    /// `y(t) = y0 + v·sinθ·t + ½·g·t²`
    pub fn position_at(&self, origin: Vec2, t: f32) -> Vec2 {
        let v = self.velocity();
        Vec2::new(
            origin.x + v.x * t,
            origin.y + v.y * t + 0.5 * self.gravity * t * t,
        )
    }

    /// Time for the shot to return to launch height (symmetric about the
    /// apex): `t = -2·v·sinθ / g`.
    ///
    /// `None` when the result is non-finite or not strictly positive, i.e.
    /// when the shot does not arc upward and back down through launch height.
    /// Callers treat that as "no layout possible".
    pub fn time_of_flight(&self) -> Option<f32> {
        let t = -2.0 * self.velocity().y / self.gravity;
        (t.is_finite() && t > 0.0).then_some(t)
    }

    /// Time at which the parabola passes back through `launch height +
    /// offset` (offset negative = below launch height): the larger root of
    ///
    /// `½·g·t² + v·sinθ·t + offset = 0`
    ///
    /// This bounds the platform band: the last platform's top surface, which
    /// sits `offset` below its trajectory sample, returns to launch height
    /// exactly here.  `None` when the discriminant is non-positive or the
    /// root is non-finite or not strictly positive; the caller then emits no
    /// platforms.
    pub fn time_to_offset_return(&self, offset: f32) -> Option<f32> {
        let a = 0.5 * self.gravity;
        let b = self.velocity().y;
        let c = offset;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant <= 0.0 {
            return None;
        }
        // With a < 0, the larger root takes the negative branch.
        let t = (-b - discriminant.sqrt()) / (2.0 * a);
        (t.is_finite() && t > 0.0).then_some(t)
    }
}

/// Clamp an aim angle to the playable arc.
pub fn clamp_angle(angle_deg: f32, min_deg: f32, max_deg: f32) -> f32 {
    angle_deg.clamp(min_deg, max_deg)
}

/// Clamp launch power to `[min, level max]`.
pub fn clamp_power(power: f32, min: f32, max: f32) -> f32 {
    power.clamp(min, max)
}
