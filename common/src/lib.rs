//! Common utilities for the trap visualization
//!
//! This crate provides the shared GPU/window setup and the orbit camera,
//! including the pointer rays used for picking objects in the scene.

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;
