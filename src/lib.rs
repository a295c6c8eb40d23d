//! Tattoo try-on toolkit: gesture-driven overlay placement plus the pixel
//! operations used to prepare generated tattoo and stencil images.
//!
//! The centerpiece is [`GestureTracker`], a small state machine that turns
//! one- and two-finger touch frames into a [`Transform`] (pan, pinch-zoom and
//! twist-rotate) for an image layered over live camera video.
//!
//! # Quick Start
//!
//! ```
//! use tattoo_tryon::{GestureTracker, Point};
//!
//! let mut tracker = GestureTracker::new();
//! tracker.on_start(&[Point::new(0.0, 0.0)]);
//! let outcome = tracker.on_move(&[Point::new(5.0, 5.0)]);
//! assert!(outcome.prevent_default);
//! tracker.on_end();
//!
//! assert_eq!(
//!     tracker.transform().to_css(),
//!     "translate(5px, 5px) scale(1) rotate(0deg)"
//! );
//! ```
//!
//! # Image preparation
//!
//! Generated images come back on solid white. [`keying::remove_background`]
//! keys the white out for the overlay and [`keying::adjust_contrast`] tunes a
//! stencil's line weight.
//!
//! ```no_run
//! use tattoo_tryon::{Operation, StencilEngine};
//!
//! let engine = StencilEngine::new(Operation::Contrast { percent: 160 }).unwrap();
//! let img = image::open("stencil.png").unwrap().to_rgba8();
//! let (out, _) = engine.apply(img).unwrap();
//! out.save("stencil-bold.png").unwrap();
//! ```

#![deny(missing_docs)]

pub mod compose;
mod engine;
pub mod error;
pub mod failure;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod keying;
pub mod trace;
mod transform;
pub mod upload;

pub use engine::{
    render_preview, save_png, Operation, ProcessOptions, ProcessResult, StencilEngine,
};
pub use error::{Error, Result};
pub use failure::{friendly_message, FailureKind};
pub use geometry::Point;
pub use gesture::{GestureState, GestureTracker, MoveOutcome, SharedGestureTracker};
pub use trace::{TouchEvent, Trace};
pub use transform::Transform;
