//! Domain layer: entities, normalization and the streaming state machine.
//!
//! Nothing here performs I/O.

pub mod entities;
pub mod normalize;
pub mod stream;
