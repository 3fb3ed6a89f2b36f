//! Human-readable dumps of `canary_stack` snapshots.
//!
//! The stack itself only produces a [`Snapshot`](canary_stack::Snapshot);
//! this crate turns one into text, optionally colored with `crossterm`.
//!
//! ```
//! use canary_stack::{provenance, Stack};
//! use stack_dump::{render, Palette};
//!
//! let mut stack: Stack = Stack::new(2, provenance!(stack)).unwrap();
//! stack.push(13).unwrap();
//!
//! let mut out = Vec::new();
//! render(&mut out, &stack.snapshot(), Palette::Plain).unwrap();
//! let text = String::from_utf8(out).unwrap();
//! assert!(text.contains("*[0] = 13"));
//! ```

mod render;

pub use render::{render, Palette};
