//! Interrupt line and transport seams for the slice/base link.
//!
//! This is the lowest layer of slicebus. The physical I2C peripheral driver
//! and the GPIO that raises the interrupt toward the base live outside this
//! workspace; they plug in through the [`Transport`] and [`InterruptLine`]
//! traits defined here.
//!
//! [`MemoryLine`] is an in-memory pin used by tests and the simulator.

pub mod error;
pub mod pin;
pub mod traits;

pub use error::{Result, TransportError};
pub use pin::MemoryLine;
pub use traits::{InterruptLine, Transport};
