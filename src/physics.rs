use rapier2d::prelude::*;

// Simulation constants
pub const FIXED_TIME_STEP: Real = 1.0 / 50.0;
pub const GRAVITY: [Real; 2] = [0.0, -900.0];
// Rapier tolerances are tuned for meters; the walker lives in screen-sized units.
pub const LENGTH_UNIT: Real = 100.0;

// Collision groups
pub const GROUP_WORLD: u32 = 0b0001;
pub const GROUP_WALKER: u32 = 0b0010;

// World constants
pub const GROUND_START_X: Real = -1000.0;
pub const GROUND_END_X: Real = 10_000.0;
pub const GROUND_HEIGHT: Real = 50.0;
pub const GROUND_RADIUS: Real = 5.0;
pub const GROUND_FRICTION: Real = 1.0;

// Walker spawn
pub const WALKER_SPAWN: [Real; 2] = [200.0, 200.0];
/// Legs hang this far below the torso centre at spawn.
pub const LEG_SPAWN_DROP: Real = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodySnapshot {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub rotation: f32,
    pub angular_velocity: f32,
}

impl RigidBodySnapshot {
    pub fn from_body(body: &RigidBody) -> Self {
        Self {
            position: [body.translation().x, body.translation().y],
            velocity: [body.linvel().x, body.linvel().y],
            rotation: body.rotation().angle(),
            angular_velocity: body.angvel(),
        }
    }

    /// Maps a point from body-local coordinates into world coordinates.
    pub fn local_to_world(&self, local: [f32; 2]) -> [f32; 2] {
        let (sin, cos) = self.rotation.sin_cos();
        [
            self.position[0] + local[0] * cos - local[1] * sin,
            self.position[1] + local[0] * sin + local[1] * cos,
        ]
    }
}
