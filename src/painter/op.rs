// src/painter/op.rs

//! Operations: the unit of work executed by the operation loop.
//!
//! An operation mutates a surface and, for most variants, the shared `State`.
//! Its return value says whether the surface is now ready to be presented.
//! Only `Update` reports ready on its own; `List` is ready if any member was.
//!
//! Redraw-on-change operations (`SetBackground`, `Move`) repaint everything in
//! a fixed order: background fill, every background rect, every figure.

use crate::color::{Rgba, BLACK};
use crate::painter::state::{BackgroundRect, Figure, Marker, OperationKind, State};
use crate::surface::{PixelRect, Surface};
use std::fmt;

/// Closure adapter for custom operations.
pub type OperationFn = Box<dyn FnOnce(&mut State, &mut dyn Surface) -> bool + Send>;

pub enum Operation {
    /// Set the background color and repaint everything.
    SetBackground(Rgba),
    /// Append a black background rectangle and fill it.
    AddBackgroundRect(BackgroundRect),
    /// Append a figure and draw its marker at the current offset.
    AddFigure { x: f32, y: f32, color: Rgba },
    /// Replace the pan offset and repaint everything.
    Move { x: f32, y: f32 },
    /// Reinitialize the state and clear the surface to black.
    Reset,
    /// Marks the surface as presentable. Touches nothing.
    Update,
    /// Apply every member in order.
    List(Vec<Operation>),
    /// Arbitrary work supplied by the host.
    Func(OperationFn),
}

impl Operation {
    /// Wrap a closure as an operation.
    pub fn func<F>(f: F) -> Self
    where
        F: FnOnce(&mut State, &mut dyn Surface) -> bool + Send + 'static,
    {
        Operation::Func(Box::new(f))
    }

    /// Apply this operation, returning `true` if the surface should be presented.
    pub fn apply(self, state: &mut State, surface: &mut dyn Surface) -> bool {
        match self {
            Operation::SetBackground(color) => {
                state.background_color = color;
                state.last_operation = Some(OperationKind::Background);
                redraw(state, surface);
                false
            }
            Operation::AddBackgroundRect(rect) => {
                state.background_rects.push(rect);
                state.last_operation = Some(OperationKind::BackgroundRect);
                fill_background_rect(surface, &rect);
                false
            }
            Operation::AddFigure { x, y, color } => {
                let figure = Figure { x, y, color };
                state.figures.push(figure);
                state.last_operation = Some(OperationKind::Figure);
                draw_figure(surface, state, &figure);
                false
            }
            Operation::Move { x, y } => {
                state.offset_x = x;
                state.offset_y = y;
                state.last_operation = Some(OperationKind::Move);
                redraw(state, surface);
                false
            }
            Operation::Reset => {
                state.reset();
                state.last_operation = Some(OperationKind::Reset);
                let bounds = surface.bounds();
                surface.fill(bounds, BLACK);
                false
            }
            Operation::Update => true,
            Operation::List(ops) => {
                let mut ready = false;
                for op in ops {
                    ready = op.apply(state, surface) || ready;
                }
                ready
            }
            Operation::Func(f) => f(state, surface),
        }
    }

    /// Command keyword for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SetBackground(_) => "background",
            Operation::AddBackgroundRect(_) => "bgrect",
            Operation::AddFigure { .. } => "figure",
            Operation::Move { .. } => "move",
            Operation::Reset => "reset",
            Operation::Update => "update",
            Operation::List(_) => "list",
            Operation::Func(_) => "func",
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetBackground(color) => f.debug_tuple("SetBackground").field(color).finish(),
            Operation::AddBackgroundRect(rect) => {
                f.debug_tuple("AddBackgroundRect").field(rect).finish()
            }
            Operation::AddFigure { x, y, color } => f
                .debug_struct("AddFigure")
                .field("x", x)
                .field("y", y)
                .field("color", color)
                .finish(),
            Operation::Move { x, y } => f.debug_struct("Move").field("x", x).field("y", y).finish(),
            Operation::Reset => f.write_str("Reset"),
            Operation::Update => f.write_str("Update"),
            Operation::List(ops) => f.debug_tuple("List").field(ops).finish(),
            Operation::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Structural equality. `Func` never compares equal, not even to itself.
impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        use Operation::*;
        match (self, other) {
            (SetBackground(a), SetBackground(b)) => a == b,
            (AddBackgroundRect(a), AddBackgroundRect(b)) => a == b,
            (
                AddFigure { x, y, color },
                AddFigure {
                    x: x2,
                    y: y2,
                    color: color2,
                },
            ) => x == x2 && y == y2 && color == color2,
            (Move { x, y }, Move { x: x2, y: y2 }) => x == x2 && y == y2,
            (Reset, Reset) | (Update, Update) => true,
            (List(a), List(b)) => a == b,
            _ => false,
        }
    }
}

/// Map a normalized point to pixel coordinates on a `width` x `height` surface.
pub fn denormalize(x: f32, y: f32, width: u32, height: u32) -> (i32, i32) {
    (
        (x * width as f32).round() as i32,
        (y * height as f32).round() as i32,
    )
}

/// Map a normalized rectangle by denormalizing both corners independently.
pub fn denormalize_rect(rect: &BackgroundRect, width: u32, height: u32) -> PixelRect {
    let (x0, y0) = denormalize(rect.x1, rect.y1, width, height);
    let (x1, y1) = denormalize(rect.x2, rect.y2, width, height);
    PixelRect::new(x0, y0, x1, y1)
}

/// The horizontal and vertical bars of a plus sign centered on `(cx, cy)`.
pub fn marker_bars(marker: Marker, cx: i32, cy: i32) -> [PixelRect; 2] {
    let size = i32::try_from(marker.size_px).unwrap_or(i32::MAX);
    let thickness = i32::try_from(marker.thickness_px).unwrap_or(i32::MAX);
    let (left, top) = (cx.saturating_sub(size / 2), cy.saturating_sub(thickness / 2));
    let horizontal = PixelRect::new(
        left,
        top,
        left.saturating_add(size),
        top.saturating_add(thickness),
    );
    let (left, top) = (cx.saturating_sub(thickness / 2), cy.saturating_sub(size / 2));
    let vertical = PixelRect::new(
        left,
        top,
        left.saturating_add(thickness),
        top.saturating_add(size),
    );
    [horizontal, vertical]
}

fn fill_background_rect(surface: &mut dyn Surface, rect: &BackgroundRect) {
    let (w, h) = surface.size();
    surface.fill(denormalize_rect(rect, w, h), BLACK);
}

fn draw_figure(surface: &mut dyn Surface, state: &State, figure: &Figure) {
    let (w, h) = surface.size();
    let (x, y) = state.placed(figure);
    let (cx, cy) = denormalize(x, y, w, h);
    for bar in marker_bars(state.marker, cx, cy) {
        surface.fill(bar, figure.color);
    }
}

/// Full repaint of the accumulated state.
fn redraw(state: &State, surface: &mut dyn Surface) {
    let bounds = surface.bounds();
    surface.fill(bounds, state.background_color);
    for rect in &state.background_rects {
        fill_background_rect(surface, rect);
    }
    for figure in &state.figures {
        draw_figure(surface, state, figure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{GREEN, RED, WHITE};
    use crate::surface::PixelBuffer;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const SMALL_MARKER: Marker = Marker {
        size_px: 10,
        thickness_px: 2,
    };

    fn setup() -> (State, PixelBuffer) {
        (State::with_marker(SMALL_MARKER), PixelBuffer::new(100, 100))
    }

    fn figure(x: f32, y: f32) -> Operation {
        Operation::AddFigure { x, y, color: RED }
    }

    #[test]
    fn denormalize_rounds_to_nearest_pixel() {
        assert_eq!(denormalize(0.5, 0.25, 100, 200), (50, 50));
        assert_eq!(denormalize(0.004, 0.006, 100, 100), (0, 1));
        assert_eq!(denormalize(1.5, -0.5, 10, 10), (15, -5));
    }

    #[test]
    fn rect_corners_are_not_reordered() {
        let rect = BackgroundRect {
            x1: 0.9,
            y1: 0.9,
            x2: 0.1,
            y2: 0.1,
        };
        let px = denormalize_rect(&rect, 100, 100);
        assert_eq!(px, PixelRect::new(90, 90, 10, 10));
        assert!(px.is_empty());
    }

    #[test]
    fn only_update_reports_ready() {
        let (mut state, mut surface) = setup();
        let ops = vec![
            Operation::Reset,
            Operation::SetBackground(WHITE),
            Operation::AddBackgroundRect(BackgroundRect {
                x1: 0.1,
                y1: 0.1,
                x2: 0.2,
                y2: 0.2,
            }),
            figure(0.5, 0.5),
            Operation::Move { x: 0.1, y: 0.1 },
        ];
        for op in ops {
            assert!(!op.apply(&mut state, &mut surface));
        }
        assert!(Operation::Update.apply(&mut state, &mut surface));
    }

    #[test]
    fn update_leaves_state_and_surface_alone() {
        let (mut state, mut surface) = setup();
        figure(0.3, 0.3).apply(&mut state, &mut surface);
        let (state_before, surface_before) = (state.clone(), surface.clone());
        Operation::Update.apply(&mut state, &mut surface);
        assert_eq!(state, state_before);
        assert_eq!(surface, surface_before);
    }

    #[test]
    fn list_is_ready_if_any_member_is() {
        let (mut state, mut surface) = setup();
        let list = Operation::List(vec![Operation::Update, figure(0.5, 0.5)]);
        assert!(list.apply(&mut state, &mut surface));
        // The figure after the ready member still ran.
        assert_eq!(state.figures.len(), 1);

        let list = Operation::List(vec![figure(0.1, 0.1), Operation::Reset]);
        assert!(!list.apply(&mut state, &mut surface));
        assert!(!Operation::List(Vec::new()).apply(&mut state, &mut surface));
    }

    #[test]
    fn background_repaints_rects_and_figures() {
        let (mut state, mut surface) = setup();
        Operation::AddBackgroundRect(BackgroundRect {
            x1: 0.0,
            y1: 0.0,
            x2: 0.2,
            y2: 0.2,
        })
        .apply(&mut state, &mut surface);
        figure(0.5, 0.5).apply(&mut state, &mut surface);
        Operation::SetBackground(GREEN).apply(&mut state, &mut surface);

        assert_eq!(state.background_color, GREEN);
        assert_eq!(state.last_operation, Some(OperationKind::Background));
        assert_eq!(surface.pixel(10, 10), Some(BLACK));
        assert_eq!(surface.pixel(50, 50), Some(RED));
        assert_eq!(surface.pixel(90, 90), Some(GREEN));
    }

    #[test]
    fn figure_marker_is_a_plus_sign() {
        let (mut state, mut surface) = setup();
        Operation::SetBackground(WHITE).apply(&mut state, &mut surface);
        figure(0.5, 0.5).apply(&mut state, &mut surface);

        // Bars: x in [45, 55) at y in [49, 51), and the transpose.
        assert_eq!(surface.pixel(45, 50), Some(RED));
        assert_eq!(surface.pixel(54, 49), Some(RED));
        assert_eq!(surface.pixel(50, 45), Some(RED));
        assert_eq!(surface.pixel(49, 54), Some(RED));
        assert_eq!(surface.pixel(55, 50), Some(WHITE));
        // Corners of the bounding box stay clear.
        assert_eq!(surface.pixel(46, 46), Some(WHITE));
        assert_eq!(surface.pixel(53, 53), Some(WHITE));
    }

    #[test]
    fn move_redraws_figures_at_new_offset() {
        let (mut state, mut surface) = setup();
        Operation::SetBackground(WHITE).apply(&mut state, &mut surface);
        figure(0.2, 0.2).apply(&mut state, &mut surface);
        Operation::Move { x: 0.5, y: 0.3 }.apply(&mut state, &mut surface);

        assert_eq!(state.figures[0].x, 0.2);
        assert_eq!(surface.pixel(20, 20), Some(WHITE));
        assert_eq!(surface.pixel(70, 50), Some(RED));
    }

    #[test]
    fn repeated_moves_are_absolute() {
        let (mut state, mut surface) = setup();
        figure(0.2, 0.2).apply(&mut state, &mut surface);
        Operation::Move { x: 0.1, y: 0.1 }.apply(&mut state, &mut surface);
        Operation::Move { x: 0.1, y: 0.1 }.apply(&mut state, &mut surface);
        let once = surface.clone();

        let (mut state2, mut surface2) = setup();
        figure(0.2, 0.2).apply(&mut state2, &mut surface2);
        Operation::Move { x: 0.1, y: 0.1 }.apply(&mut state2, &mut surface2);

        assert_eq!(surface, once);
        assert_eq!(surface2, once);
        assert_eq!((state.offset_x, state.offset_y), (0.1, 0.1));
    }

    #[test]
    fn figure_added_after_move_uses_current_offset() {
        let (mut state, mut surface) = setup();
        Operation::Move { x: 0.25, y: 0.0 }.apply(&mut state, &mut surface);
        figure(0.25, 0.5).apply(&mut state, &mut surface);
        assert_eq!(surface.pixel(50, 50), Some(RED));
        assert_eq!(surface.pixel(25, 50), Some(BLACK));
    }

    #[test]
    fn reset_clears_state_and_surface() {
        let (mut state, mut surface) = setup();
        Operation::SetBackground(GREEN).apply(&mut state, &mut surface);
        figure(0.5, 0.5).apply(&mut state, &mut surface);
        Operation::Move { x: 0.1, y: 0.1 }.apply(&mut state, &mut surface);
        Operation::Reset.apply(&mut state, &mut surface);

        assert_eq!(state.background_color, BLACK);
        assert!(state.figures.is_empty());
        assert!(state.background_rects.is_empty());
        assert_eq!((state.offset_x, state.offset_y), (0.0, 0.0));
        assert_eq!(state.last_operation, Some(OperationKind::Reset));
        assert_eq!(state.marker, SMALL_MARKER);
        assert_eq!(surface, PixelBuffer::new(100, 100));
    }

    #[test]
    fn out_of_range_coordinates_are_silently_clipped() {
        let (mut state, mut surface) = setup();
        Operation::SetBackground(WHITE).apply(&mut state, &mut surface);
        Operation::AddBackgroundRect(BackgroundRect {
            x1: -1.0,
            y1: -1.0,
            x2: 0.1,
            y2: 0.1,
        })
        .apply(&mut state, &mut surface);
        figure(5.0, 5.0).apply(&mut state, &mut surface);

        assert_eq!(surface.pixel(0, 0), Some(BLACK));
        assert_eq!(surface.pixel(9, 9), Some(BLACK));
        assert_eq!(surface.pixel(10, 10), Some(WHITE));
        assert_eq!(state.figures.len(), 1);
    }

    #[test]
    fn func_receives_state_and_surface() {
        let (mut state, mut surface) = setup();
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let op = Operation::func(move |state, surface| {
            flag.store(true, Ordering::SeqCst);
            state.offset_x = 0.75;
            let bounds = surface.bounds();
            surface.fill(bounds, GREEN);
            true
        });
        assert!(op.apply(&mut state, &mut surface));
        assert!(called.load(Ordering::SeqCst));
        assert_eq!(state.offset_x, 0.75);
        assert_eq!(surface.pixel(0, 0), Some(GREEN));
        assert_eq!(state.last_operation, None);
    }

    #[test]
    fn func_operations_never_compare_equal() {
        assert_eq!(Operation::Update, Operation::Update);
        assert_ne!(Operation::func(|_, _| false), Operation::func(|_, _| false));
        assert_eq!(format!("{:?}", Operation::func(|_, _| true)), "Func(..)");
    }
}
