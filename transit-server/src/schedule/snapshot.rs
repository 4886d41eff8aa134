//! Schedule snapshot file format.
//!
//! A snapshot is one JSON document holding every schedule table. It is the
//! concrete data source for the server binary; the engine itself only ever
//! sees the resulting [`InMemoryRepository`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::rows::{
    FareAttributeRow, FareRuleRow, FrequencyRow, RouteRow, StopRow, StopTimeRow, TripRow,
};

use super::InMemoryRepository;

/// Error loading a schedule snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A decoded schedule snapshot.
///
/// Every table defaults to empty, so partial snapshots (e.g. a network
/// without fare tables) decode cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub stops: Vec<StopRow>,
    #[serde(default)]
    pub trips: Vec<TripRow>,
    #[serde(default)]
    pub stop_times: Vec<StopTimeRow>,
    #[serde(default)]
    pub routes: Vec<RouteRow>,
    #[serde(default)]
    pub fare_rules: Vec<FareRuleRow>,
    #[serde(default)]
    pub fare_attributes: Vec<FareAttributeRow>,
    #[serde(default)]
    pub frequencies: Vec<FrequencyRow>,
}

impl ScheduleSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Convert into an in-memory repository.
    pub fn into_repository(self) -> InMemoryRepository {
        InMemoryRepository {
            stops: self.stops,
            trips: self.trips,
            stop_times: self.stop_times,
            routes: self.routes,
            fare_rules: self.fare_rules,
            fare_attributes: self.fare_attributes,
            frequencies: self.frequencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schedule::ScheduleRepository;

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "stops": [
                    {{"stop_id": "S1", "lat": 40.0, "lon": -3.0}},
                    {{"stop_id": "S2", "lat": 40.001, "lon": -3.0, "parent_station": "P1"}}
                ],
                "routes": [{{"route_id": "R1", "short_name": "1"}}],
                "trips": [{{"trip_id": "T1", "route_id": "R1"}}],
                "stop_times": [
                    {{"trip_id": "T1", "stop_id": "S1", "sequence": "1"}},
                    {{"trip_id": "T1", "stop_id": "S2", "sequence": "2"}}
                ]
            }}"#
        )
        .unwrap();

        let snapshot = ScheduleSnapshot::load(file.path()).unwrap();
        let repo = snapshot.into_repository();

        assert_eq!(repo.stops().len(), 2);
        assert_eq!(repo.trips().len(), 1);
        assert_eq!(repo.stop_times().len(), 2);
        assert_eq!(repo.routes().len(), 1);
        // Absent tables decode as empty, not as an error.
        assert!(repo.fare_rules().is_empty());
        assert!(repo.frequencies().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScheduleSnapshot::load(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io(_)));
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = ScheduleSnapshot::load(file.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }
}
