//! Color Match Party
//!
//! Players tilt Bluetooth motion sensors to steer a color; the first one to
//! match the round's target color before the countdown runs out scores.

pub mod domain;
pub mod infrastructure;
pub mod presentation;
