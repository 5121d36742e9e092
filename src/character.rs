//! Player character tick driver.
//!
//! [`PlayerCharacter`] queues commands from input, then runs a fixed pipeline on
//! every [`tick`](PlayerCharacter::tick):
//!
//! 1. Run deferred actions due this tick
//! 2. Flush held notifications to the animation bridge
//! 3. Scan for walls ahead
//! 4. Apply queued commands (climb requests are gated against the fresh scan)
//! 5. Integrate movement for the active mode
//! 6. Apply the climb request / cancel to the locomotion mode
//! 7. Open a pending attack window, then strike overlapping bodies while it is open
//!
//! The character entity is kinematic: it needs a [`Transform`], a capsule
//! [`Collider`] and, for pushing released bodies around, a kinematic [`RigidBody`].

use std::collections::VecDeque;

use glam::{Vec2, Vec3};

use crate::anim::{AnimationBridge, AnimationEvent};
use crate::combat::{ImpactReport, ImpactResolver};
use crate::config::CharacterConfig;
use crate::deferred::{DeferredAction, DeferredQueue};
use crate::ecs::components::physics::{Collider, ColliderShape, RigidBody};
use crate::ecs::components::transform::{GlobalTransform, Transform};
use crate::error::CharacterError;
use crate::locomotion::movement::MoveRequest;
use crate::locomotion::{
    CharacterMotor, ClimbGate, ClimbVerdict, ControlRotation, EyeProbe, LocomotionMode,
    LocomotionStateMachine, ModeTransition, SurfaceScanner,
};
use crate::physics::query::{CapsuleProbe, OverlapQuery, QueryFilter};
use crate::physics::SceneQuery;

/// Capsule radius of a character created with [`PlayerCharacter::spawn`].
pub const DEFAULT_CAPSULE_RADIUS: f32 = 42.0;
/// Capsule total half height (to the cap tips) of a spawned character.
pub const DEFAULT_CAPSULE_HALF_HEIGHT: f32 = 96.0;
/// Mass given to a spawned character's kinematic body.
pub const DEFAULT_CHARACTER_MASS: f32 = 80.0;

/// Discrete input delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Move axis, `x` right and `y` forward. Held until the next `Move`.
    Move(Vec2),
    /// Look delta in degrees, `x` right and `y` up.
    Look(Vec2),
    StartClimb,
    CancelClimb,
    StartAttack,
    AttackWindowClosed,
    Jump,
    StopJumping,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub mode: LocomotionMode,
    /// Gate verdict when a climb was requested this tick.
    pub climb_verdict: Option<ClimbVerdict>,
    pub transitions: Vec<ModeTransition>,
    pub impacts: ImpactReport,
}

pub struct PlayerCharacter {
    entity: hecs::Entity,
    config: CharacterConfig,
    tick: u64,
    commands: VecDeque<Command>,
    pending_notifications: Vec<AnimationEvent>,
    pending_attack: bool,
    move_input: Vec2,
    jump_held: bool,
    control: ControlRotation,
    scanner: SurfaceScanner,
    gate: ClimbGate,
    state: LocomotionStateMachine,
    motor: CharacterMotor,
    resolver: ImpactResolver,
    deferred: DeferredQueue,
}

impl PlayerCharacter {
    /// Controller for an existing character `entity`.
    ///
    /// The entity must already carry a [`Transform`] and a capsule [`Collider`].
    pub fn new(world: &hecs::World, entity: hecs::Entity, config: CharacterConfig) -> Result<Self, CharacterError> {
        config.validate()?;
        let transform = *world
            .get::<&Transform>(entity)
            .map_err(|source| CharacterError::MissingComponent { entity, source })?;
        let collider = world
            .get::<&Collider>(entity)
            .map_err(|source| CharacterError::MissingComponent { entity, source })?;
        if !matches!(collider.shape, ColliderShape::Capsule { .. }) {
            return Err(CharacterError::NotACapsule);
        }

        let yaw = crate::locomotion::movement::yaw_facing(transform.forward()).unwrap_or(0.0);
        tracing::debug!(?entity, "character controller created");
        Ok(Self {
            entity,
            tick: 0,
            commands: VecDeque::new(),
            pending_notifications: Vec::new(),
            pending_attack: false,
            move_input: Vec2::ZERO,
            jump_held: false,
            control: ControlRotation { yaw, pitch: 0.0 },
            scanner: SurfaceScanner::new(entity, config.scan.clone()),
            gate: ClimbGate::new(config.climb.clone()),
            state: LocomotionStateMachine::new(config.climb.climbing_shrink),
            motor: CharacterMotor::new(config.movement.clone(), &config.climb, yaw),
            resolver: ImpactResolver::new(entity, config.impact.clone()),
            deferred: DeferredQueue::new(),
            config,
        })
    }

    /// Spawn a standard character entity at `position` facing `yaw` and wrap it.
    pub fn spawn(
        world: &mut hecs::World,
        position: Vec3,
        yaw: f32,
        config: CharacterConfig,
    ) -> Result<Self, CharacterError> {
        config.validate()?;
        let transform = Transform::from_position_yaw(position, yaw);
        let entity = world.spawn((
            transform,
            GlobalTransform::from_transform(&transform),
            RigidBody::new_kinematic(DEFAULT_CHARACTER_MASS),
            Collider::new(ColliderShape::capsule_with_total_half_height(
                DEFAULT_CAPSULE_RADIUS,
                DEFAULT_CAPSULE_HALF_HEIGHT,
            )),
        ));
        Self::new(world, entity, config)
    }

    #[inline]
    pub fn entity(&self) -> hecs::Entity {
        self.entity
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> LocomotionMode {
        self.state.mode()
    }

    #[inline]
    pub fn is_climbing(&self) -> bool {
        self.state.is_climbing()
    }

    pub fn locomotion(&self) -> &LocomotionStateMachine {
        &self.state
    }

    pub fn scanner(&self) -> &SurfaceScanner {
        &self.scanner
    }

    pub fn resolver(&self) -> &ImpactResolver {
        &self.resolver
    }

    pub fn control_rotation(&self) -> ControlRotation {
        self.control
    }

    pub fn velocity(&self) -> Vec3 {
        self.motor.velocity()
    }

    /// Number of ticks run so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Notifications held until an animation bridge is available.
    pub fn pending_notifications(&self) -> &[AnimationEvent] {
        &self.pending_notifications
    }

    pub fn push_command(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn move_input(&mut self, axis: Vec2) {
        self.push_command(Command::Move(axis));
    }

    pub fn look(&mut self, axis: Vec2) {
        self.push_command(Command::Look(axis));
    }

    pub fn start_climb(&mut self) {
        self.push_command(Command::StartClimb);
    }

    pub fn cancel_climb(&mut self) {
        self.push_command(Command::CancelClimb);
    }

    pub fn start_attack(&mut self) {
        self.push_command(Command::StartAttack);
    }

    pub fn attack_window_closed(&mut self) {
        self.push_command(Command::AttackWindowClosed);
    }

    pub fn jump(&mut self) {
        self.push_command(Command::Jump);
    }

    pub fn stop_jumping(&mut self) {
        self.push_command(Command::StopJumping);
    }

    /// Advance the character by `dt` seconds.
    ///
    /// `bridge` may be absent; notifications are then held and an accepted attack
    /// waits for the first tick that has one.
    pub fn tick(
        &mut self,
        world: &mut hecs::World,
        mut bridge: Option<&mut dyn AnimationBridge>,
        dt: f32,
    ) -> Result<TickReport, CharacterError> {
        let entity = self.entity;
        let missing = |source| CharacterError::MissingComponent { entity, source };

        let transform = *world.get::<&Transform>(entity).map_err(missing)?;
        let capsule = match world.get::<&Collider>(entity).map_err(missing)?.shape {
            ColliderShape::Capsule { radius, half_height } => CapsuleProbe { radius, half_height },
            _ => return Err(CharacterError::NotACapsule),
        };

        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            mode: self.state.mode(),
            climb_verdict: None,
            transitions: Vec::new(),
            impacts: ImpactReport::default(),
        };

        // 1. Deferred actions.
        for action in self.deferred.run_due(self.tick) {
            match action {
                DeferredAction::ClearImpactLatch { cycle } => {
                    self.resolver.clear_latch(cycle);
                }
            }
        }

        // 2. Held notifications.
        if let Some(bridge) = bridge.as_deref_mut() {
            for event in self.pending_notifications.drain(..) {
                event.deliver(bridge);
            }
        }

        let position = transform.position;
        let forward = transform.forward();
        let outcome = {
            let query = SceneQuery::new(world);

            // 3. Scan.
            self.scanner.scan(&query, position, forward);

            // 4. Commands.
            while let Some(command) = self.commands.pop_front() {
                match command {
                    Command::Move(axis) => self.move_input = axis,
                    Command::Look(axis) => {
                        self.control.apply_look(axis, self.config.movement.look_sensitivity);
                    }
                    Command::StartClimb => {
                        let probe = EyeProbe {
                            query: &query,
                            position,
                            up: transform.up(),
                            filter: QueryFilter::static_world_except(entity),
                        };
                        let verdict = self.gate.evaluate(self.scanner.contacts(), forward, &probe);
                        tracing::debug!(?verdict, contacts = self.scanner.contacts().len(), "climb requested");
                        self.state.try_climb(verdict.accepted());
                        report.climb_verdict = Some(verdict);
                    }
                    Command::CancelClimb => self.state.cancel_climb(),
                    Command::StartAttack => {
                        if self.resolver.window().is_active() {
                            tracing::debug!("attack ignored, window already open");
                        } else {
                            self.pending_attack = true;
                        }
                    }
                    Command::AttackWindowClosed => match self.resolver.on_window_close() {
                        Some(cycle) => {
                            self.deferred
                                .schedule_next_tick(self.tick, DeferredAction::ClearImpactLatch { cycle });
                            self.notify(AnimationEvent::AttackWindow(false), bridge.as_deref_mut());
                            tracing::debug!(cycle, "attack window closed");
                        }
                        None if self.pending_attack => {
                            self.pending_attack = false;
                            tracing::debug!("attack window closed before it opened, attack dropped");
                        }
                        None => tracing::debug!("attack window close with no open window"),
                    },
                    Command::Jump => self.jump_held = true,
                    Command::StopJumping => self.jump_held = false,
                }
            }

            if self.jump_held && self.state.jump() {
                self.motor.launch();
                self.jump_held = false;
                tracing::debug!("jump");
            }

            // 5. Movement.
            let gravity = if self.state.gravity_enabled() {
                self.config.physics.gravity
            } else {
                Vec3::ZERO
            };
            let request = MoveRequest {
                mode: self.state.mode(),
                input: self.move_input,
                control: self.control,
                surface_normal: self.scanner.surface_normal(),
                gravity,
                dt,
            };
            self.motor
                .integrate(&query, capsule, &QueryFilter::all_except(entity), position, &request)
        };

        let moved = Transform {
            position: outcome.position,
            rotation: self.motor.rotation(),
            scale: transform.scale,
        };
        *world.get::<&mut Transform>(entity).map_err(missing)? = moved;
        if let Ok(mut global) = world.get::<&mut GlobalTransform>(entity) {
            *global = GlobalTransform::from_transform(&moved);
        }
        if let Ok(mut body) = world.get::<&mut RigidBody>(entity) {
            body.linear_velocity = self.motor.velocity();
        }

        if !self.state.is_climbing() {
            if let Some(transition) = self.state.set_grounded(outcome.floor.is_some()) {
                if transition == ModeTransition::Landed {
                    self.jump_held = false;
                }
                tracing::debug!(?transition, "ground state changed");
                report.transitions.push(transition);
            }
        }

        // 6. Mode transition.
        let transition = {
            let mut collider = world.get::<&mut Collider>(entity).map_err(missing)?;
            self.state.on_movement_updated(&mut collider.shape)
        };
        if let Some(transition) = transition {
            match transition {
                ModeTransition::EnteredClimbing => {
                    self.notify(AnimationEvent::Climbing(true), bridge.as_deref_mut());
                }
                ModeTransition::ExitedClimbing => {
                    self.motor.clear_surface();
                    self.notify(AnimationEvent::Climbing(false), bridge.as_deref_mut());
                }
                ModeTransition::Landed | ModeTransition::LeftGround => {}
            }
            report.transitions.push(transition);
        }

        // 7. Attack.
        if self.pending_attack {
            if let Some(bridge) = bridge.as_deref_mut() {
                if self.resolver.on_window_open() {
                    tracing::debug!(cycle = self.resolver.window().cycle(), "attack window opened");
                    AnimationEvent::AttackWindow(true).deliver(bridge);
                }
                self.pending_attack = false;
            }
        }
        if self.resolver.window().is_active() {
            let impact = &self.config.impact;
            let fist = GlobalTransform::from_transform(&moved).with_local_offset(impact.fist_offset);
            let shape = ColliderShape::Sphere {
                radius: impact.fist_radius,
            };
            let overlapping = SceneQuery::new(world).overlapping(&shape, &fist, &QueryFilter::all_except(entity));
            report.impacts = self.resolver.resolve_overlaps(&overlapping, world, moved.forward());
        }

        report.mode = self.state.mode();
        Ok(report)
    }

    fn notify<'b>(&mut self, event: AnimationEvent, bridge: Option<&mut (dyn AnimationBridge + 'b)>) {
        match bridge {
            Some(bridge) => event.deliver(bridge),
            None => self.pending_notifications.push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::RecordingBridge;
    use crate::ecs::components::physics::{ArticulatedBody, RigidBodyType};
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    fn spawn_static_box(world: &mut hecs::World, center: Vec3, half_extents: Vec3) -> hecs::Entity {
        let transform = Transform::from_position(center);
        world.spawn((
            transform,
            GlobalTransform::from_transform(&transform),
            RigidBody::new_static(),
            Collider::new(ColliderShape::Box { half_extents }),
        ))
    }

    fn spawn_dummy(world: &mut hecs::World, position: Vec3) -> hecs::Entity {
        let transform = Transform::from_position(position);
        world.spawn((
            transform,
            GlobalTransform::from_transform(&transform),
            RigidBody::new_kinematic(60.0),
            Collider::new(ColliderShape::Capsule {
                radius: 25.0,
                half_height: 50.0,
            }),
            ArticulatedBody::new(),
        ))
    }

    /// Ground with its top at y = 0 and a wall occupying x in [200, 220].
    fn scene() -> hecs::World {
        let mut world = hecs::World::new();
        spawn_static_box(&mut world, Vec3::new(0.0, -10.0, 0.0), Vec3::new(2000.0, 10.0, 2000.0));
        spawn_static_box(&mut world, Vec3::new(210.0, 300.0, 0.0), Vec3::new(10.0, 300.0, 2000.0));
        world
    }

    /// Character standing 18 cm from the wall, facing it (+X).
    fn character_at_wall(world: &mut hecs::World) -> PlayerCharacter {
        PlayerCharacter::spawn(world, Vec3::new(140.0, 96.01, 0.0), -FRAC_PI_2, CharacterConfig::default())
            .unwrap()
    }

    fn total_half_height(world: &hecs::World, entity: hecs::Entity) -> f32 {
        match world.get::<&Collider>(entity).unwrap().shape {
            ColliderShape::Capsule { radius, half_height } => radius + half_height,
            _ => panic!("not a capsule"),
        }
    }

    fn position(world: &hecs::World, entity: hecs::Entity) -> Vec3 {
        world.get::<&Transform>(entity).unwrap().position
    }

    #[test]
    fn test_climb_facing_wall() {
        let mut world = scene();
        let mut character = character_at_wall(&mut world);
        let mut bridge = RecordingBridge::default();

        character.start_climb();
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(report.climb_verdict, Some(ClimbVerdict::Confirmed));
        assert_eq!(character.mode(), LocomotionMode::Climbing);
        assert!(!character.locomotion().gravity_enabled());
        assert_eq!(bridge.events, vec![AnimationEvent::Climbing(true)]);
        assert!((total_half_height(&world, character.entity()) - 66.0).abs() < 1e-4);

        // Forward input climbs up the wall.
        character.move_input(Vec2::new(0.0, 1.0));
        let start_y = position(&world, character.entity()).y;
        for _ in 0..30 {
            character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        }
        let climbed = position(&world, character.entity()).y - start_y;
        assert!((climbed - 60.0).abs() < 0.5, "climbed {climbed}");
        assert_eq!(character.mode(), LocomotionMode::Climbing);
    }

    #[test]
    fn test_only_cancel_leaves_climbing() {
        let mut world = scene();
        let mut character = character_at_wall(&mut world);
        let mut bridge = RecordingBridge::default();
        character.start_climb();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();

        character.jump();
        character.start_attack();
        for _ in 0..5 {
            character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        }
        assert_eq!(character.mode(), LocomotionMode::Climbing);

        character.attack_window_closed();
        character.start_climb();
        character.look(Vec2::new(30.0, 10.0));
        character.move_input(Vec2::new(1.0, 0.0));
        for _ in 0..5 {
            character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        }
        assert_eq!(character.mode(), LocomotionMode::Climbing);
        assert_eq!(bridge.events.iter().filter(|e| **e == AnimationEvent::Climbing(false)).count(), 0);
        character.move_input(Vec2::ZERO);

        character.stop_jumping();
        character.cancel_climb();
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(report.transitions.contains(&ModeTransition::ExitedClimbing));
        assert_eq!(character.mode(), LocomotionMode::Airborne);
        assert!(character.locomotion().gravity_enabled());
        assert!((total_half_height(&world, character.entity()) - 96.0).abs() < 1e-4);
        assert_eq!(bridge.events.last(), Some(&AnimationEvent::Climbing(false)));

        // Falls back onto the ground.
        for _ in 0..60 {
            character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        }
        assert_eq!(character.mode(), LocomotionMode::Grounded);
    }

    #[test]
    fn test_climb_request_without_wall_is_ignored() {
        let mut world = scene();
        let mut character =
            PlayerCharacter::spawn(&mut world, Vec3::new(-500.0, 96.01, 0.0), -FRAC_PI_2, CharacterConfig::default())
                .unwrap();
        character.start_climb();
        let report = character.tick(&mut world, None, DT).unwrap();
        assert!(character.scanner().is_empty());
        assert_eq!(report.climb_verdict, Some(ClimbVerdict::Rejected));
        assert_ne!(character.mode(), LocomotionMode::Climbing);
        assert!(!character.locomotion().wants_to_climb());
    }

    #[test]
    fn test_notifications_held_without_bridge() {
        let mut world = scene();
        let mut character = character_at_wall(&mut world);
        character.start_climb();
        character.tick(&mut world, None, DT).unwrap();
        assert!(character.is_climbing());
        assert_eq!(character.pending_notifications(), &[AnimationEvent::Climbing(true)]);

        let mut bridge = RecordingBridge::default();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(bridge.events, vec![AnimationEvent::Climbing(true)]);
        assert!(character.pending_notifications().is_empty());
    }

    /// Standing character facing -Z with two dummies in reach of the fist.
    fn attack_scene() -> (hecs::World, PlayerCharacter, hecs::Entity, hecs::Entity) {
        let mut world = scene();
        let character =
            PlayerCharacter::spawn(&mut world, Vec3::new(-500.0, 96.01, 0.0), 0.0, CharacterConfig::default()).unwrap();
        let a = spawn_dummy(&mut world, Vec3::new(-500.0, 96.0, -90.0));
        let b = spawn_dummy(&mut world, Vec3::new(-480.0, 96.0, -85.0));
        (world, character, a, b)
    }

    fn speed(world: &hecs::World, entity: hecs::Entity) -> f32 {
        world.get::<&RigidBody>(entity).unwrap().linear_velocity.length()
    }

    #[test]
    fn test_attack_waits_for_bridge_then_strikes_each_once() {
        let (mut world, mut character, a, b) = attack_scene();
        character.start_attack();
        let report = character.tick(&mut world, None, DT).unwrap();
        assert!(!character.resolver().window().is_active());
        assert!(report.impacts.resolved.is_empty());

        let mut bridge = RecordingBridge::default();
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(bridge.events, vec![AnimationEvent::AttackWindow(true)]);
        assert_eq!(report.impacts.resolved.len(), 2);
        assert!(report.impacts.resolved.contains(&a) && report.impacts.resolved.contains(&b));
        assert_eq!(world.get::<&RigidBody>(a).unwrap().body_type, RigidBodyType::Dynamic);
        assert!((speed(&world, a) - 10000.0).abs() < 1e-2);

        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(report.impacts.resolved.is_empty());
        assert!((speed(&world, a) - 10000.0).abs() < 1e-2);

        // A third body entering the fist later in the same window is struck once.
        let c = spawn_dummy(&mut world, Vec3::new(-520.0, 96.0, -85.0));
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(report.impacts.resolved, vec![c]);
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(report.impacts.resolved.is_empty());
    }

    #[test]
    fn test_window_gating_and_deferred_latch_clear() {
        let (mut world, mut character, _, _) = attack_scene();
        let mut bridge = RecordingBridge::default();
        character.start_attack();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(character.resolver().window().cycle(), 1);

        // Attack while open does not start a new cycle.
        character.start_attack();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(character.resolver().window().cycle(), 1);
        assert!(character.resolver().window().is_active());

        character.attack_window_closed();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(!character.resolver().window().is_active());
        assert_eq!(bridge.events.last(), Some(&AnimationEvent::AttackWindow(false)));
        assert_eq!(character.resolver().window().latched_count(), 2);

        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(character.resolver().window().latched_count(), 0);
    }

    #[test]
    fn test_deferred_clear_discarded_by_new_cycle() {
        let (mut world, mut character, _, _) = attack_scene();
        let mut bridge = RecordingBridge::default();
        character.start_attack();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();

        // Close and immediately re-attack in the same tick.
        character.attack_window_closed();
        character.start_attack();
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(character.resolver().window().cycle(), 2);
        assert_eq!(report.impacts.resolved.len(), 2);

        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert_eq!(character.resolver().window().latched_count(), 2);
    }

    #[test]
    fn test_close_before_open_drops_pending_attack() {
        let (mut world, mut character, a, _) = attack_scene();
        let mut bridge = RecordingBridge::default();
        character.start_attack();
        character.attack_window_closed();
        let report = character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(!character.resolver().window().is_active());
        assert!(report.impacts.resolved.is_empty());
        assert!(bridge.events.is_empty());

        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(!character.resolver().window().is_active());
        assert_eq!(speed(&world, a), 0.0);

        // A close with nothing pending is a no-op, and the next attack opens normally.
        character.attack_window_closed();
        character.start_attack();
        character.tick(&mut world, Some(&mut bridge), DT).unwrap();
        assert!(character.resolver().window().is_active());
        assert_eq!(character.resolver().window().cycle(), 1);
    }

    #[test]
    fn test_missing_components() {
        let mut world = scene();
        let mut character = character_at_wall(&mut world);
        world.despawn(character.entity()).unwrap();
        assert!(matches!(
            character.tick(&mut world, None, DT),
            Err(CharacterError::MissingComponent { .. })
        ));

        let not_a_capsule = world.spawn((Transform::identity(), Collider::new(ColliderShape::Sphere { radius: 1.0 })));
        assert!(matches!(
            PlayerCharacter::new(&world, not_a_capsule, CharacterConfig::default()),
            Err(CharacterError::NotACapsule)
        ));
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut world = scene();
        let mut config = CharacterConfig::default();
        config.climb.climbing_shrink = 100.0;
        assert!(matches!(
            PlayerCharacter::spawn(&mut world, Vec3::ZERO, 0.0, config),
            Err(CharacterError::Config(_))
        ));
    }

    #[test]
    fn test_walk_and_jump() {
        let mut world = scene();
        let mut character =
            PlayerCharacter::spawn(&mut world, Vec3::new(-500.0, 96.01, 0.0), 0.0, CharacterConfig::default()).unwrap();
        character.tick(&mut world, None, DT).unwrap();
        assert_eq!(character.mode(), LocomotionMode::Grounded);

        character.move_input(Vec2::new(0.0, 1.0));
        for _ in 0..30 {
            character.tick(&mut world, None, DT).unwrap();
        }
        assert!(position(&world, character.entity()).z < -50.0);

        character.jump();
        let report = character.tick(&mut world, None, DT).unwrap();
        assert_eq!(report.mode, LocomotionMode::Airborne);
        assert!(character.velocity().y > 600.0);

        for _ in 0..120 {
            character.tick(&mut world, None, DT).unwrap();
        }
        assert_eq!(character.mode(), LocomotionMode::Grounded);
    }
}
