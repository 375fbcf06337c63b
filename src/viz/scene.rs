/*
3-D Scene Model
===============

The spatial studio's scene: a listener ring fixed at the origin and a
source sphere whose position is either dragged by the user (static
pattern only) or computed from elapsed time by a movement pattern.

Movement patterns are PURE functions of (elapsed time, speed, distance):
no integration, no hidden state. That determinism is what lets the
offline exporter replay the exact trajectory the user heard live.

  circle      (cos ωt, 0, sin ωt) · distance
  spiral      circle with the radius breathing sinusoidally and a
              vertical sinusoid added
  left-right  x swings ±distance, y = z = 0
  infinity    a lissajous figure-eight on the ground plane

Dragging is a ray-cast onto the Y=0 plane in the front-end; here it
reduces to `try_drag(x, z)`, which refuses unless the pattern is static.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementPattern {
    Static,
    Circle,
    Spiral,
    LeftRight,
    Infinity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3 {
    pub const ORIGIN: Position3 = Position3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_from_origin(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene3D {
    pattern: MovementPattern,
    /// Radians per second of pattern phase at speed 1.
    pub movement_speed: f32,
    /// Orbit radius / swing amplitude, meters.
    pub distance: f32,
    /// Where the source sits while the pattern is static.
    static_position: Position3,
    pub cone_inner_deg: f32,
    pub cone_outer_deg: f32,
    pub rolloff_factor: f32,
}

impl Default for Scene3D {
    fn default() -> Self {
        Self {
            pattern: MovementPattern::Static,
            movement_speed: 1.0,
            distance: 3.0,
            static_position: Position3::new(0.0, 0.0, -3.0),
            cone_inner_deg: 360.0,
            cone_outer_deg: 360.0,
            rolloff_factor: 1.0,
        }
    }
}

impl Scene3D {
    pub fn pattern(&self) -> MovementPattern {
        self.pattern
    }

    pub fn set_pattern(&mut self, pattern: MovementPattern) {
        self.pattern = pattern;
    }

    /// Source position at `elapsed` seconds of wall-clock time.
    ///
    /// For static scenes this is the dragged position; for every other
    /// pattern it is a deterministic function of time and the scene's
    /// speed/distance only.
    pub fn position_at(&self, elapsed: f64) -> Position3 {
        let omega = self.movement_speed as f64;
        let phase = (omega * elapsed) as f32;
        let r = self.distance;

        match self.pattern {
            MovementPattern::Static => self.static_position,
            MovementPattern::Circle => {
                Position3::new(phase.cos() * r, 0.0, phase.sin() * r)
            }
            MovementPattern::Spiral => {
                // Radius breathes between 0.4r and r; height rides its own
                // slower sinusoid.
                let breathe = 0.7 + 0.3 * (phase * 0.5).sin();
                Position3::new(
                    phase.cos() * r * breathe,
                    (phase * 0.25).sin() * r * 0.5,
                    phase.sin() * r * breathe,
                )
            }
            MovementPattern::LeftRight => Position3::new(phase.sin() * r, 0.0, 0.0),
            MovementPattern::Infinity => {
                // Figure-eight on the ground plane
                Position3::new(phase.sin() * r, 0.0, (phase * 2.0).sin() * r * 0.5)
            }
        }
    }

    /// Radial velocity toward/away from the listener around `elapsed`,
    /// m/s (negative = approaching). Derived by finite difference; the
    /// spatial widget reads it for its Doppler readout.
    pub fn radial_velocity_at(&self, elapsed: f64) -> f32 {
        const DT: f64 = 1.0 / 120.0;
        let before = self.position_at(elapsed - DT).distance_from_origin();
        let after = self.position_at(elapsed + DT).distance_from_origin();
        (after - before) / (2.0 * DT) as f32
    }

    /// Drag the source on the ground plane. Only static scenes accept
    /// drags; moving patterns own their trajectory.
    pub fn try_drag(&mut self, x: f32, z: f32) -> bool {
        if self.pattern != MovementPattern::Static {
            return false;
        }
        self.static_position = Position3::new(x, 0.0, z);
        true
    }

    pub fn static_position(&self) -> Position3 {
        self.static_position
    }
}
