//! Interactive field layout.
//!
//! # Responsibility
//! - Turn pointer gestures into position/size edits on one field at a time.
//! - Keep the resize math independent of how pointer events are captured.
//!
//! # Invariants
//! - At most one gesture is active per controller.
//! - Gesture moves never perform I/O; saving is a separate, explicit step.

pub mod controller;
pub mod geometry;
