//! Multi-criteria itinerary planner.
//!
//! Three layers: the per-mode [`CostModel`], the augmented-state Dijkstra
//! search in [`search`], and the itinerary assembly in [`itinerary`]. The
//! planner reasons over topology and generalized cost, not wall-clock
//! timetables: headways approximate waiting, and the resulting cost scalar
//! only ranks alternatives within one mode.

mod cost;
mod itinerary;
mod search;

pub use cost::{CostModel, Mode};
pub use itinerary::{FareTotal, Itinerary, RideLeg, Step, build_itinerary};
pub use search::{RawHop, RawPath, find_path};
