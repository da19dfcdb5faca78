//! Painter library crate.
//!
//! A small line-oriented command language drives an incremental 2-D drawing
//! surface. Scripts compile to `Operation`s, which a single worker thread
//! applies to a double-buffered surface, handing finished frames to a
//! `Receiver`.

/// Color values.
pub mod color;
/// Configuration management.
pub mod config;
/// Headless frame presentation.
pub mod display;
/// Command lexer and parser.
pub mod lang;
/// Painting state, operations and the operation loop.
pub mod painter;
/// Drawable surfaces.
pub mod surface;
/// Script submission and the HTTP listener.
pub mod transport;
