//! Web layer: HTTP facade over the planning engine.

mod dto;
mod routes;
mod state;

pub use dto::{ItineraryResponse, PlanRequest};
pub use routes::create_router;
pub use state::AppState;
