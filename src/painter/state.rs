// src/painter/state.rs

//! The accumulated painting model replayed by redraw operations.

use crate::color::{Rgba, BLACK};
use std::fmt;

/// Axis-aligned rectangle in normalized coordinates. Corners are stored as
/// given; nothing orders or clamps them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundRect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A figure at a logical (pre-offset) normalized position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub x: f32,
    pub y: f32,
    pub color: Rgba,
}

/// Plus-sign marker geometry, in pixels. Same for every figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Length of each bar.
    pub size_px: u32,
    /// Thickness of each bar.
    pub thickness_px: u32,
}

impl Default for Marker {
    fn default() -> Self {
        Marker {
            size_px: 100,
            thickness_px: 25,
        }
    }
}

/// Diagnostic tag for the most recently applied state-changing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Reset,
    Background,
    BackgroundRect,
    Figure,
    Move,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Reset => "reset",
            OperationKind::Background => "background",
            OperationKind::BackgroundRect => "bgrect",
            OperationKind::Figure => "figure",
            OperationKind::Move => "move",
        };
        f.write_str(name)
    }
}

/// Shared painting state.
///
/// `background_rects` and `figures` only ever grow, until `reset` clears them.
/// The offset is applied at draw time and never baked into figure positions.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub background_color: Rgba,
    pub background_rects: Vec<BackgroundRect>,
    pub figures: Vec<Figure>,
    pub offset_x: f32,
    pub offset_y: f32,
    pub last_operation: Option<OperationKind>,
    /// Rendering configuration; survives `reset`.
    pub marker: Marker,
}

impl Default for State {
    fn default() -> Self {
        Self::with_marker(Marker::default())
    }
}

impl State {
    pub fn with_marker(marker: Marker) -> Self {
        State {
            background_color: BLACK,
            background_rects: Vec::new(),
            figures: Vec::new(),
            offset_x: 0.0,
            offset_y: 0.0,
            last_operation: None,
            marker,
        }
    }

    /// Reinitialize in place to start-up defaults, keeping the marker geometry.
    pub fn reset(&mut self) {
        let marker = self.marker;
        *self = State::with_marker(marker);
    }

    /// Position of `figure` on the surface, in normalized coordinates.
    pub fn placed(&self, figure: &Figure) -> (f32, f32) {
        (figure.x + self.offset_x, figure.y + self.offset_y)
    }
}
