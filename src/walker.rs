use rapier2d::prelude::*;

use crate::config::BodyConfig;
use crate::physics::{GROUP_WALKER, GROUP_WORLD};

pub const LEG_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkerPartShape {
    Disc { radius: Real },
    Box { half_extents: [Real; 2] },
}

impl WalkerPartShape {
    /// Corners of a box in body-local coordinates, counter-clockwise.
    /// Discs have no polygon outline and yield an empty list.
    pub fn local_vertices(&self) -> Vec<[Real; 2]> {
        match *self {
            WalkerPartShape::Disc { .. } => Vec::new(),
            WalkerPartShape::Box { half_extents: [hx, hy] } => {
                vec![[-hx, -hy], [hx, -hy], [hx, hy], [-hx, hy]]
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkerPart {
    pub handle: RigidBodyHandle,
    pub shape: WalkerPartShape,
}

/// Handles to the torso, both legs and their hip actuators.
#[derive(Debug)]
pub struct Walker {
    pub torso: RigidBodyHandle,
    pub legs: [RigidBodyHandle; LEG_COUNT],
    pub hips: [ImpulseJointHandle; LEG_COUNT],
    motor_damping: Real,
    parts: Vec<WalkerPart>,
}

impl Walker {
    pub fn spawn(
        body: &BodyConfig,
        rigid_body_set: &mut RigidBodySet,
        collider_set: &mut ColliderSet,
        impulse_joint_set: &mut ImpulseJointSet,
    ) -> Self {
        let mut parts = Vec::with_capacity(1 + LEG_COUNT);
        let origin = vector![body.spawn[0], body.spawn[1]];

        let torso = Self::insert_part(
            origin,
            ColliderBuilder::ball(body.torso_radius)
                .mass(body.torso_mass)
                .friction(body.torso_friction),
            WalkerPartShape::Disc {
                radius: body.torso_radius,
            },
            rigid_body_set,
            collider_set,
            &mut parts,
        );

        let half = [body.leg_size[0] / 2.0, body.leg_size[1] / 2.0];
        let leg_center = origin - vector![0.0, body.leg_drop];
        let mut spawn_leg = || {
            let leg = Self::insert_part(
                leg_center,
                ColliderBuilder::cuboid(half[0], half[1])
                    .mass(body.leg_mass)
                    .friction(body.leg_friction),
                WalkerPartShape::Box { half_extents: half },
                rigid_body_set,
                collider_set,
                &mut parts,
            );
            let hip = Self::hip_joint(impulse_joint_set, torso, leg, half[1], body);
            (leg, hip)
        };
        let (leg_1, hip_1) = spawn_leg();
        let (leg_2, hip_2) = spawn_leg();

        Self {
            torso,
            legs: [leg_1, leg_2],
            hips: [hip_1, hip_2],
            motor_damping: body.motor_damping,
            parts,
        }
    }

    /// Parts in draw order: legs first, torso on top.
    pub fn parts(&self) -> impl Iterator<Item = &WalkerPart> {
        self.parts
            .iter()
            .filter(|p| p.handle != self.torso)
            .chain(self.parts.iter().filter(|p| p.handle == self.torso))
    }

    pub fn part(&self, handle: RigidBodyHandle) -> Option<&WalkerPart> {
        self.parts.iter().find(|p| p.handle == handle)
    }

    pub fn bodies(&self) -> [RigidBodyHandle; 1 + LEG_COUNT] {
        [self.torso, self.legs[0], self.legs[1]]
    }

    /// Commands each hip motor with a rate in rad/s. A positive rate swings the leg
    /// clockwise relative to the torso (torso angvel minus leg angvel equals the rate).
    pub fn set_leg_rates(&self, rates: [Real; LEG_COUNT], impulse_joint_set: &mut ImpulseJointSet) {
        for (hip, rate) in self.hips.iter().zip(rates) {
            if let Some(joint) = impulse_joint_set.get_mut(*hip, true) {
                // The joint motor targets leg angvel minus torso angvel.
                joint
                    .data
                    .set_motor_velocity(JointAxis::AngX, -rate, self.motor_damping);
            }
        }
    }

    fn insert_part(
        center: Vector<Real>,
        collider: ColliderBuilder,
        shape: WalkerPartShape,
        rigid_body_set: &mut RigidBodySet,
        collider_set: &mut ColliderSet,
        parts: &mut Vec<WalkerPart>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(center)
            .can_sleep(false)
            .build();
        let handle = rigid_body_set.insert(body);
        // Walker parts only see the world, so torso and legs never touch each other.
        let collider = collider
            .collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(GROUP_WALKER),
                Group::from_bits_truncate(GROUP_WORLD),
            ))
            .build();
        collider_set.insert_with_parent(collider, handle, rigid_body_set);
        parts.push(WalkerPart {
            handle,
            shape,
        });
        handle
    }

    /// Pivot from the torso centre to the top of the leg, with a velocity motor.
    fn hip_joint(
        impulse_joint_set: &mut ImpulseJointSet,
        torso: RigidBodyHandle,
        leg: RigidBodyHandle,
        leg_half_length: Real,
        body: &BodyConfig,
    ) -> ImpulseJointHandle {
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(point![0.0, 0.0])
            .local_anchor2(point![0.0, leg_half_length])
            .contacts_enabled(false)
            .motor_model(MotorModel::AccelerationBased)
            .motor_velocity(0.0, body.motor_damping)
            .motor_max_force(body.motor_max_force)
            .build();
        impulse_joint_set.insert(torso, leg, joint, true)
    }
}
