//! Melee attack window and impact resolution.

pub mod impact;
pub mod window;

pub use impact::{BodyProxy, ImpactReport, ImpactResolver, PhysicsProxy, ProxyAccess};
pub use window::AttackWindow;
