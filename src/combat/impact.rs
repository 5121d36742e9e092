//! Converts melee contact into a physics response on the struck body.

use glam::Vec3;

use crate::config::ImpactConfig;
use crate::ecs::components::physics::{ArticulatedBody, RigidBody, SleepInfo};
use crate::physics::rigid_body;

use super::window::AttackWindow;

/// Physics handle of a body that can be released into simulation.
pub trait PhysicsProxy {
    fn is_simulating(&self) -> bool;
    fn set_simulate_physics(&mut self, simulate: bool);
    fn set_angular_damping(&mut self, damping: f32);
    fn set_linear_damping(&mut self, damping: f32);
    /// Impulse at the centre of mass; `velocity_change` ignores the body's mass.
    fn add_impulse(&mut self, impulse: Vec3, velocity_change: bool);
}

/// Looks up the [`PhysicsProxy`] of an entity, if it has one.
pub trait ProxyAccess {
    fn physics_proxy(&mut self, entity: hecs::Entity) -> Option<Box<dyn PhysicsProxy + '_>>;
}

/// [`PhysicsProxy`] over an entity's `ArticulatedBody` and `RigidBody`.
pub struct BodyProxy<'w> {
    articulated: &'w mut ArticulatedBody,
    body: &'w mut RigidBody,
    sleep: Option<&'w mut SleepInfo>,
}

impl PhysicsProxy for BodyProxy<'_> {
    fn is_simulating(&self) -> bool {
        self.articulated.is_simulating()
    }

    fn set_simulate_physics(&mut self, simulate: bool) {
        self.articulated.set_simulate_physics(self.body, simulate);
    }

    fn set_angular_damping(&mut self, damping: f32) {
        self.body.angular_damping = damping;
    }

    fn set_linear_damping(&mut self, damping: f32) {
        self.body.linear_damping = damping;
    }

    fn add_impulse(&mut self, impulse: Vec3, velocity_change: bool) {
        if let Some(sleep) = self.sleep.as_deref_mut() {
            rigid_body::wake(sleep);
        }
        rigid_body::apply_central_impulse(self.body, impulse, velocity_change);
    }
}

impl ProxyAccess for hecs::World {
    fn physics_proxy(&mut self, entity: hecs::Entity) -> Option<Box<dyn PhysicsProxy + '_>> {
        let (articulated, body, sleep) = self
            .query_one_mut::<(&mut ArticulatedBody, &mut RigidBody, Option<&mut SleepInfo>)>(entity)
            .ok()?;
        Some(Box::new(BodyProxy {
            articulated,
            body,
            sleep,
        }))
    }
}

/// Outcome of one [`ImpactResolver::resolve_overlaps`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactReport {
    /// Entities struck during this pass, in overlap order.
    pub resolved: Vec<hecs::Entity>,
    /// Overlaps passed over because they were already struck or have no proxy.
    pub skipped: usize,
}

/// Owns the attack window and applies impacts while it is open.
pub struct ImpactResolver {
    owner: hecs::Entity,
    config: ImpactConfig,
    window: AttackWindow,
}

impl ImpactResolver {
    pub fn new(owner: hecs::Entity, config: ImpactConfig) -> Self {
        Self {
            owner,
            config,
            window: AttackWindow::new(),
        }
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    pub fn window(&self) -> &AttackWindow {
        &self.window
    }

    /// Open the attack window. Returns `false` if it was already open.
    pub fn on_window_open(&mut self) -> bool {
        self.window.open()
    }

    /// Close the attack window, returning the cycle that ended.
    pub fn on_window_close(&mut self) -> Option<u64> {
        self.window.close()
    }

    /// Clear the latch left by `cycle` unless a newer cycle has started.
    pub fn clear_latch(&mut self, cycle: u64) -> bool {
        let cleared = self.window.clear_latch(cycle);
        if !cleared {
            tracing::trace!(cycle, current = self.window.cycle(), "stale latch clear ignored");
        }
        cleared
    }

    /// Strike every overlapping body not yet struck in this cycle.
    ///
    /// Does nothing while the window is closed. Struck bodies are left simulating
    /// with the configured damping; nothing here reverts that.
    pub fn resolve_overlaps(
        &mut self,
        overlapping: &[hecs::Entity],
        proxies: &mut dyn ProxyAccess,
        forward: Vec3,
    ) -> ImpactReport {
        let mut report = ImpactReport::default();
        if !self.window.is_active() {
            return report;
        }

        let impulse = forward.normalize_or_zero() * self.config.impulse_magnitude;
        for &entity in overlapping {
            if entity == self.owner {
                continue;
            }
            if self.window.is_latched(entity) {
                report.skipped += 1;
                continue;
            }
            let Some(mut proxy) = proxies.physics_proxy(entity) else {
                tracing::trace!(?entity, "overlap without physics proxy");
                report.skipped += 1;
                continue;
            };

            if !proxy.is_simulating() {
                proxy.set_simulate_physics(true);
            }
            proxy.set_angular_damping(self.config.angular_damping);
            proxy.set_linear_damping(self.config.linear_damping);
            proxy.add_impulse(impulse, true);
            drop(proxy);

            self.window.latch(entity);
            tracing::info!(?entity, cycle = self.window.cycle(), "impact applied");
            report.resolved.push(entity);
        }
        report
    }
}
