use rapier2d::{geometry::DefaultBroadPhase, prelude::*};

use crate::config::WalkerConfig;
use crate::physics::{
    RigidBodySnapshot, GROUND_END_X, GROUND_HEIGHT, GROUND_RADIUS, GROUND_START_X, GROUP_WALKER,
    GROUP_WORLD,
};
use crate::walker::{Walker, WalkerPart, LEG_COUNT};

/// One episode's physics: ground, walker and the rapier pipeline state.
///
/// Each environment owns exactly one of these. Nothing in here is global, so
/// worlds on different threads never observe each other.
pub struct SimulationWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    walker: Walker,
    time: Real,
}

impl SimulationWorld {
    pub fn new(config: &WalkerConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.physics.dt;
        integration_parameters.length_unit = config.physics.length_unit;

        let gravity = vector![config.physics.gravity[0], config.physics.gravity[1]];

        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();
        let mut impulse_joint_set = ImpulseJointSet::new();

        // Static ground, long enough that the walker never reaches its ends.
        let ground_body = rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        let ground_collider = ColliderBuilder::capsule_from_endpoints(
            point![GROUND_START_X, GROUND_HEIGHT],
            point![GROUND_END_X, GROUND_HEIGHT],
            GROUND_RADIUS,
        )
        .friction(config.physics.ground_friction)
        .collision_groups(InteractionGroups::new(
            Group::from_bits_truncate(GROUP_WORLD),
            Group::from_bits_truncate(GROUP_WORLD | GROUP_WALKER),
        ))
        .build();
        collider_set.insert_with_parent(ground_collider, ground_body, &mut rigid_body_set);

        let walker = Walker::spawn(
            &config.body,
            &mut rigid_body_set,
            &mut collider_set,
            &mut impulse_joint_set,
        );

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity,
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set,
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            walker,
            time: 0.0,
        }
    }

    /// Advances the simulation by exactly one integration step.
    pub fn step(&mut self) {
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &physics_hooks,
            &event_handler,
        );
        self.time += self.integration_parameters.dt;
    }

    pub fn walker(&self) -> &Walker {
        &self.walker
    }

    pub fn time(&self) -> Real {
        self.time
    }

    pub fn set_leg_rates(&mut self, rates: [Real; LEG_COUNT]) {
        self.walker.set_leg_rates(rates, &mut self.impulse_joint_set);
    }

    pub fn body_snapshot(&self, handle: RigidBodyHandle) -> Option<RigidBodySnapshot> {
        self.rigid_body_set.get(handle).map(RigidBodySnapshot::from_body)
    }

    pub fn torso_state(&self) -> RigidBodySnapshot {
        RigidBodySnapshot::from_body(&self.rigid_body_set[self.walker.torso])
    }

    pub fn leg_states(&self) -> [RigidBodySnapshot; LEG_COUNT] {
        self.walker
            .legs
            .map(|leg| RigidBodySnapshot::from_body(&self.rigid_body_set[leg]))
    }

    pub fn body_mass(&self, handle: RigidBodyHandle) -> Option<Real> {
        self.rigid_body_set.get(handle).map(|body| body.mass())
    }

    /// World-space outline of a box part (rotated local corners plus position).
    pub fn part_world_vertices(&self, part: &WalkerPart) -> Vec<[Real; 2]> {
        let Some(snapshot) = self.body_snapshot(part.handle) else {
            return Vec::new();
        };
        part.shape
            .local_vertices()
            .into_iter()
            .map(|v| snapshot.local_to_world(v))
            .collect()
    }

    /// Rigidly moves the whole walker so the torso sits at `position` with
    /// orientation `angle`, keeping the legs' pose relative to the torso and
    /// zeroing all velocities.
    pub fn set_walker_pose(&mut self, position: [Real; 2], angle: Real) {
        let torso_pose = *self.rigid_body_set[self.walker.torso].position();
        let target = Isometry::new(vector![position[0], position[1]], angle);
        for handle in self.walker.bodies() {
            if let Some(body) = self.rigid_body_set.get_mut(handle) {
                let relative = torso_pose.inv_mul(body.position());
                body.set_position(target * relative, true);
                body.set_linvel(vector![0.0, 0.0], true);
                body.set_angvel(0.0, true);
            }
        }
    }
}
