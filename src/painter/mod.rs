// src/painter/mod.rs

//! Painting model, operations and the operation loop.

pub mod event_loop;
pub mod op;
pub mod state;

pub use event_loop::{
    LoopOptions, LoopStatus, OperationLoop, Poster, Receiver, ShutdownPolicy,
};
pub use op::{Operation, OperationFn};
pub use state::{BackgroundRect, Figure, Marker, OperationKind, State};
