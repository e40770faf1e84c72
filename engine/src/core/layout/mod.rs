//! Token Layout Module
//!
//! Turns host-measured token geometry into visual rows.
//!
//! Text reflows with viewport width and scale, so keyboard navigation follows
//! visual adjacency instead of array order. The host measures rendered tokens
//! after every layout-affecting change and hands the snapshot over; nothing
//! here touches a real display.

mod geometry;
mod line_map;

pub use geometry::{GeometrySnapshot, TokenGeometry};
pub use line_map::{build_line_maps, LineMap, LineMaps, DEFAULT_ROW_TOLERANCE};
