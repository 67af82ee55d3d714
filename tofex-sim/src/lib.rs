//! Headless corridor scene standing in for a game engine: geometry, ray
//! queries, goal triggers and simple agent controllers.

pub mod corridor;
pub mod driver;
pub mod mover;
pub mod navigator;
pub mod tof;

pub use corridor::{Corridor, CorridorConfig, Obstacle};
pub use driver::{Driver, Steering};
pub use mover::Mover;
pub use navigator::{Action, HapticMap, Navigator, NavigatorConfig};
pub use tof::{ArrayReading, ToFArray, ToFArrayConfig};
