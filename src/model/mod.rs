//! Reference Model
//!
//! Typed handles naming fields inside a cube (a logical table exposed by the
//! Cube.js service):
//!
//! - **Cube**: factory that scopes references to a cube name
//! - **Measure / Dimension / Segment**: immutable field references
//! - **Member**: a dimension or measure, used by filters and ordering
//!
//! No I/O happens here and names are never validated client-side; the
//! remote service rejects unknown members.

mod cube;

pub use cube::{Cube, Dimension, Measure, Member, Segment};
