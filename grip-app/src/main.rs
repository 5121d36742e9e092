//! Headless demo: walk to a wall, climb it, drop off, then punch two training dummies.
//!
//! Run with `RUST_LOG=debug cargo run --manifest-path grip-app/Cargo.toml [config.toml]`.

use anyhow::Context;
use glam::{Vec2, Vec3};
use grip::ecs::components::physics::{ArticulatedBody, Collider, ColliderShape, RigidBody, SleepInfo};
use grip::ecs::components::transform::{GlobalTransform, Transform};
use grip::{AnimationBridge, CharacterConfig, PhysicsWorld, PlayerCharacter};

const FIXED_DT: f32 = 1.0 / 60.0;
const DEMO_TICKS: u64 = 420;

/// Animation stand-in that just reports what it is told.
struct LoggingBridge;

impl AnimationBridge for LoggingBridge {
    fn attack_window_changed(&mut self, open: bool) {
        log::info!("animation: attack window {}", if open { "opened" } else { "closed" });
    }

    fn climbing_state_changed(&mut self, climbing: bool) {
        log::info!("animation: climbing {}", if climbing { "started" } else { "stopped" });
    }
}

struct DemoApp {
    world: hecs::World,
    physics: PhysicsWorld,
    character: PlayerCharacter,
    bridge: LoggingBridge,
    dummies: Vec<hecs::Entity>,
}

impl DemoApp {
    fn init(config: CharacterConfig) -> anyhow::Result<Self> {
        let mut world = hecs::World::new();

        // Ground, top at y = 0
        spawn_static_box(&mut world, Vec3::new(0.0, -10.0, 0.0), Vec3::new(3000.0, 10.0, 3000.0));
        // Climbable wall, face at x = 400
        spawn_static_box(&mut world, Vec3::new(420.0, 250.0, 0.0), Vec3::new(20.0, 250.0, 600.0));

        // Training dummies to the character's left once it has dropped off the wall
        let dummies = vec![
            spawn_dummy(&mut world, Vec3::new(300.0, 96.0, -120.0)),
            spawn_dummy(&mut world, Vec3::new(320.0, 96.0, -115.0)),
        ];

        let physics = PhysicsWorld::new(config.physics.clone());
        let character = PlayerCharacter::spawn(
            &mut world,
            Vec3::new(0.0, 96.01, 0.0),
            -std::f32::consts::FRAC_PI_2,
            config,
        )
        .context("failed to spawn character")?;

        Ok(Self {
            world,
            physics,
            character,
            bridge: LoggingBridge,
            dummies,
        })
    }

    /// Feed the scripted input for `tick`.
    fn script(&mut self, tick: u64) {
        let character = &mut self.character;
        match tick {
            1 => character.move_input(Vec2::new(0.0, 1.0)),
            // Climb once the wall is in scanner range.
            t if t < 150 && !character.is_climbing() && !character.scanner().is_empty() => {
                character.start_climb();
            }
            150 => character.move_input(Vec2::ZERO),
            200 => character.cancel_climb(),
            // Turn left to face the dummies, then attack.
            230 => character.look(Vec2::new(-90.0, 0.0)),
            231 => character.move_input(Vec2::new(0.0, 0.4)),
            260 => character.move_input(Vec2::ZERO),
            280 => character.start_attack(),
            300 => character.attack_window_closed(),
            _ => {}
        }
    }

    fn fixed_update(&mut self, tick: u64) -> anyhow::Result<()> {
        self.script(tick);
        let report = self
            .character
            .tick(&mut self.world, Some(&mut self.bridge), FIXED_DT)
            .context("character tick failed")?;
        if !report.transitions.is_empty() {
            log::debug!("tick {}: {:?} -> {:?}", report.tick, report.transitions, report.mode);
        }
        if !report.impacts.resolved.is_empty() {
            log::info!("tick {}: struck {:?}", report.tick, report.impacts.resolved);
        }
        self.physics.step(&mut self.world, FIXED_DT as f64);
        Ok(())
    }

    fn summary(&self) {
        if let Ok(transform) = self.world.get::<&Transform>(self.character.entity()) {
            log::info!(
                "character finished at {:?} in {:?}",
                transform.position,
                self.character.mode()
            );
        }
        for &dummy in &self.dummies {
            if let Ok(transform) = self.world.get::<&Transform>(dummy) {
                log::info!("dummy {:?} finished at {:?}", dummy, transform.position);
            }
        }
    }
}

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
        SleepInfo::default(),
    ))
}

fn load_config() -> anyhow::Result<CharacterConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            CharacterConfig::from_toml_str(&source).with_context(|| format!("parsing {path}"))
        }
        None => Ok(CharacterConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut app = DemoApp::init(load_config()?)?;
    for tick in 1..=DEMO_TICKS {
        app.fixed_update(tick)?;
    }
    app.summary();
    Ok(())
}
