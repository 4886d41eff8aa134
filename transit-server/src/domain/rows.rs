//! Raw schedule-table rows as supplied by the schedule repository.
//!
//! These mirror the decoded schedule tables one-to-one and are intentionally
//! permissive: coordinates may be missing, sequence numbers arrive as raw
//! text, and references may dangle. The graph builder validates each row and
//! skips the malformed ones instead of aborting a build on partially invalid
//! source data.

use serde::{Deserialize, Serialize};

/// A physical boarding/alighting point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopRow {
    pub stop_id: String,

    /// Latitude in decimal degrees; rows without one are skipped.
    pub lat: Option<f64>,

    /// Longitude in decimal degrees; rows without one are skipped.
    pub lon: Option<f64>,

    /// Grouping of sibling stops (platforms) into one physical complex.
    #[serde(default)]
    pub parent_station: Option<String>,
}

/// One scheduled run of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRow {
    pub trip_id: String,
    pub route_id: String,
}

/// One stop visit within a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    pub stop_id: String,

    /// Ordering key within the trip, as raw text; unparsable values are
    /// skipped during graph construction.
    pub sequence: String,
}

/// A service line as displayed to riders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    pub short_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Maps a route to a fare product. First matching rule wins, in table order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareRuleRow {
    pub fare_id: String,
    pub route_id: String,
}

/// Prices a fare product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareAttributeRow {
    pub fare_id: String,
    pub price: f64,
    pub currency: String,
}

/// Headway bounds for a trip, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyRow {
    pub trip_id: String,
    #[serde(default)]
    pub min_headway_secs: Option<u32>,
    #[serde(default)]
    pub max_headway_secs: Option<u32>,
    #[serde(default)]
    pub headway_secs: Option<u32>,
}
