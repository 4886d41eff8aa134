//! Schedule repository collaborator.
//!
//! The engine never decodes schedule feeds itself; it consumes already-decoded
//! tables through the [`ScheduleRepository`] trait. This abstraction keeps the
//! planner testable against hand-built fixtures and keeps feed parsing outside
//! the engine boundary.

mod snapshot;

pub use snapshot::{ScheduleSnapshot, SnapshotError};

use crate::domain::rows::{
    FareAttributeRow, FareRuleRow, FrequencyRow, RouteRow, StopRow, StopTimeRow, TripRow,
};

/// Source of decoded schedule tables.
///
/// Implementations must return each table in a stable order: graph
/// construction resolves ties (e.g. the first matching fare rule) by table
/// order, and two builds over identical data must produce identical graphs.
pub trait ScheduleRepository {
    fn stops(&self) -> &[StopRow];
    fn trips(&self) -> &[TripRow];
    fn stop_times(&self) -> &[StopTimeRow];
    fn routes(&self) -> &[RouteRow];
    fn fare_rules(&self) -> &[FareRuleRow];
    fn fare_attributes(&self) -> &[FareAttributeRow];
    fn frequencies(&self) -> &[FrequencyRow];
}

/// Schedule tables held in memory.
///
/// The production binary fills this from a [`ScheduleSnapshot`] file; tests
/// build it directly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pub stops: Vec<StopRow>,
    pub trips: Vec<TripRow>,
    pub stop_times: Vec<StopTimeRow>,
    pub routes: Vec<RouteRow>,
    pub fare_rules: Vec<FareRuleRow>,
    pub fare_attributes: Vec<FareAttributeRow>,
    pub frequencies: Vec<FrequencyRow>,
}

impl ScheduleRepository for InMemoryRepository {
    fn stops(&self) -> &[StopRow] {
        &self.stops
    }

    fn trips(&self) -> &[TripRow] {
        &self.trips
    }

    fn stop_times(&self) -> &[StopTimeRow] {
        &self.stop_times
    }

    fn routes(&self) -> &[RouteRow] {
        &self.routes
    }

    fn fare_rules(&self) -> &[FareRuleRow] {
        &self.fare_rules
    }

    fn fare_attributes(&self) -> &[FareAttributeRow] {
        &self.fare_attributes
    }

    fn frequencies(&self) -> &[FrequencyRow] {
        &self.frequencies
    }
}
