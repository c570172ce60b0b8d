//! Tethered characters
//!
//! A character is a small anchor that loosely follows a cursor and is tied
//! to it with a rope. It is a purely local visual effect and never sent over
//! the network.
//!
//! ```text
//! cursor (world)
//!   └─> Tether::step()
//!       ├─> CharacterController::update()  (seek / flee / damping)
//!       ├─> RopePhysics::set_endpoints()   (character + start_offset, cursor + end_offset)
//!       └─> RopePhysics::update(dt)
//! ```

mod controller;
mod tether;

pub use controller::{CharacterConfig, CharacterController};
pub use tether::Tether;
