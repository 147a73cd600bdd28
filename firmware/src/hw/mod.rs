//! STM32G0 adapters for the `centrifuge-core` hardware traits.
//!
//! Only compiled for the MCU target. Everything here is a thin GPIO shim; the
//! behavior lives in the portable tasks.

pub mod displays;
pub mod gpio;
pub mod keypad;
pub mod lines;
