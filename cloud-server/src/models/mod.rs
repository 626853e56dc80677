//! Request and response models

pub mod predict;

pub use predict::*;
