//! Domain types for the itinerary-planning engine.
//!
//! This module contains the validated value types the planner operates on.
//! Identifiers and coordinates enforce their invariants at construction time,
//! so code that receives these types can trust their validity. Raw schedule
//! rows (as handed over by the schedule repository) live in [`rows`] and are
//! deliberately loose: validation happens during graph construction, where
//! malformed rows are skipped rather than rejected wholesale.

mod geo;
mod ids;
pub mod rows;

pub use geo::{InvalidPoint, Point, haversine_meters};
pub use ids::{FareProductId, InvalidId, RouteId, StopId, TripId};
