//! Public row and cell model.
//!
//! The decoder turns worksheet XML into these structures. Values are always
//! strings; [`CellType`] tells consumers how to interpret them.

mod cell;
mod row;

pub use cell::*;
pub use row::*;
