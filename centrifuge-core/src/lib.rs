#![no_std]

// Portable logic for the centrifuge controller.
//
// Everything here avoids the standard library so the firmware tasks and the
// host emulator drive the same state machines.

pub mod buttons;
pub mod clock;
pub mod command;
pub mod config;
pub mod countdown;
pub mod display;
pub mod gesture;
pub mod hal;
pub mod keypad;
pub mod motor;
pub mod telemetry;
