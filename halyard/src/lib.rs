//! Service wiring and the periodic drain loop for halyard.

pub mod controller;

pub use controller::Controller;
