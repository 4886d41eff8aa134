//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::planner::{Itinerary, Mode, Step};

/// A raw coordinate in a request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinateDto {
    pub lat: f64,
    pub lon: f64,
}

/// Request to plan a journey.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub origin: CoordinateDto,
    pub destination: CoordinateDto,

    /// Optimization mode; the engine's current mode when omitted.
    pub mode: Option<Mode>,
}

/// Query for the nearest valid stop.
#[derive(Debug, Deserialize)]
pub struct NearestStopQuery {
    pub lat: f64,
    pub lon: f64,
}

/// Nearest-stop lookup result.
#[derive(Debug, Serialize)]
pub struct NearestStopResponse {
    pub stop_id: String,
    pub distance_m: f64,
}

/// One itinerary step.
#[derive(Debug, Serialize)]
pub struct StepDto {
    /// "walk", "ride" or "transfer".
    pub kind: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_stop_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_stop_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,

    /// Human-readable step text.
    pub description: String,
}

/// One ride leg, with the boundary stops the caller resolves into drawable
/// geometry through its own shape collaborator.
#[derive(Debug, Serialize)]
pub struct RideLegDto {
    pub route_id: String,
    pub boundary_stop_ids: Vec<String>,
    pub expected_wait_secs: i64,
}

/// Total fare for an itinerary.
#[derive(Debug, Serialize)]
pub struct FareTotalDto {
    pub amount: f64,
    pub currency: String,
}

/// A planned itinerary.
#[derive(Debug, Serialize)]
pub struct ItineraryResponse {
    pub steps: Vec<StepDto>,
    pub legs: Vec<RideLegDto>,
    pub fare_total: Option<FareTotalDto>,
}

impl From<&Itinerary> for ItineraryResponse {
    fn from(itinerary: &Itinerary) -> Self {
        let steps = itinerary
            .steps
            .iter()
            .map(|step| {
                let description = step.describe();
                match step {
                    Step::Walk {
                        from_stop,
                        to_stop,
                        distance_m,
                    } => StepDto {
                        kind: "walk",
                        route_id: None,
                        from_stop_id: from_stop.as_ref().map(|s| s.as_str().to_string()),
                        to_stop_id: to_stop.as_ref().map(|s| s.as_str().to_string()),
                        distance_meters: Some(*distance_m),
                        description,
                    },
                    Step::Ride {
                        route, board, alight, ..
                    } => StepDto {
                        kind: "ride",
                        route_id: Some(route.as_str().to_string()),
                        from_stop_id: Some(board.as_str().to_string()),
                        to_stop_id: Some(alight.as_str().to_string()),
                        distance_meters: None,
                        description,
                    },
                    Step::Transfer { at } => StepDto {
                        kind: "transfer",
                        route_id: None,
                        from_stop_id: Some(at.as_str().to_string()),
                        to_stop_id: None,
                        distance_meters: None,
                        description,
                    },
                }
            })
            .collect();

        let legs = itinerary
            .legs
            .iter()
            .map(|leg| RideLegDto {
                route_id: leg.route.as_str().to_string(),
                boundary_stop_ids: leg.stops.iter().map(|s| s.as_str().to_string()).collect(),
                expected_wait_secs: leg.expected_wait.num_seconds(),
            })
            .collect();

        let fare_total = itinerary.fare_total.as_ref().map(|f| FareTotalDto {
            amount: f.amount,
            currency: f.currency.clone(),
        });

        Self {
            steps,
            legs,
            fare_total,
        }
    }
}

/// Error payload body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
