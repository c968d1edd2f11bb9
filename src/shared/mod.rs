//! Value types shared across the crate

pub mod window_state;

pub use window_state::{Geometry, NativeHandle, WindowState};
