//! Per-mode cost model.
//!
//! All costs are one dimensionless "generalized cost" scalar mixing meters,
//! fixed penalty units, scaled fares and scaled seconds. The scalar is valid
//! only for ranking candidate paths within a single mode; it is never a
//! literal distance, time or price.

use serde::{Deserialize, Serialize};

use crate::graph::{FareRef, Graph, RouteRef};

/// Optimization criterion selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Fastest,
    Cheapest,
    Balanced,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Fastest => "fastest",
            Mode::Cheapest => "cheapest",
            Mode::Balanced => "balanced",
        }
    }
}

/// Cost parameters for one optimization mode.
///
/// The magnitudes are tuning knobs, not load-bearing constants: what matters
/// is their relative order (fastest punishes waiting, cheapest punishes
/// fares, balanced sits between).
#[derive(Debug, Clone)]
pub struct CostModel {
    mode: Mode,

    /// Baseline penalty for switching between two revenue routes.
    pub big: f64,

    /// Strict upper bound on route switches per itinerary.
    pub max_transfers: u32,

    /// Weight per meter ridden.
    pub transit_weight: f64,

    /// Weight per meter walked.
    pub walk_weight: f64,

    /// Extra cost for leaving transit to walk, replacing the generic
    /// transfer penalty.
    pub alight_walk_penalty: f64,

    /// Weight per fare-currency unit charged on boarding a new fare product.
    pub fare_weight: f64,

    /// Weight per second of expected wait (half the route headway).
    pub wait_weight: f64,

    /// Per-hop surcharge for consecutive walking hops beyond the first.
    pub zigzag_step: f64,

    /// Ceiling on the anti-zigzag surcharge.
    pub zigzag_cap: f64,
}

impl CostModel {
    /// The model for a mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Fastest => Self {
                mode,
                big: 400.0,
                max_transfers: 4,
                transit_weight: 1.0,
                walk_weight: 1.5,
                alight_walk_penalty: 150.0,
                fare_weight: 0.0,
                wait_weight: 1.0,
                zigzag_step: 25.0,
                zigzag_cap: 200.0,
            },
            Mode::Cheapest => Self {
                mode,
                big: 800.0,
                max_transfers: 2,
                transit_weight: 1.0,
                walk_weight: 1.2,
                alight_walk_penalty: 300.0,
                fare_weight: 400.0,
                wait_weight: 0.0,
                zigzag_step: 25.0,
                zigzag_cap: 400.0,
            },
            Mode::Balanced => Self {
                mode,
                big: 600.0,
                max_transfers: 3,
                transit_weight: 1.0,
                walk_weight: 1.3,
                alight_walk_penalty: 200.0,
                fare_weight: 150.0,
                wait_weight: 0.4,
                zigzag_step: 25.0,
                zigzag_cap: 300.0,
            },
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Cost of riding `distance_m` along the currently held route.
    pub(crate) fn ride_cost(&self, distance_m: f64) -> f64 {
        distance_m * self.transit_weight
    }

    /// Cost of one walking hop.
    ///
    /// `walk_streak` counts consecutive walking hops including this one; the
    /// first hop of a streak carries no anti-zigzag surcharge, so pure
    /// walking transfers cost exactly their weighted distance.
    pub(crate) fn walk_cost(&self, distance_m: f64, was_riding: bool, walk_streak: u32) -> f64 {
        let mut cost = distance_m * self.walk_weight;
        if was_riding {
            cost += self.alight_walk_penalty;
        }
        cost + (self.zigzag_step * walk_streak.saturating_sub(1) as f64).min(self.zigzag_cap)
    }

    /// Cost of boarding `route` while standing still, and the fare context
    /// held afterwards.
    ///
    /// Switching from another revenue route adds the baseline transfer
    /// penalty; the first boarding of an itinerary does not. The expected
    /// wait (half the route's minimum headway) is always priced; it is a
    /// no-op in modes with zero wait weight. A fare surcharge applies only
    /// when the mode weighs fares and the route's fare product differs from
    /// the one already held (an already-paid product covers further rides).
    pub(crate) fn board_cost(
        &self,
        graph: &Graph,
        current: Option<RouteRef>,
        route: RouteRef,
        held_fare: Option<FareRef>,
    ) -> (f64, Option<FareRef>) {
        let mut cost = 0.0;
        if current.is_some() {
            cost += self.big;
        }

        let info = graph.route(route);
        cost += (info.min_headway_secs as f64 / 2.0) * self.wait_weight;

        let mut fare = held_fare;
        if self.fare_weight > 0.0 {
            if let Some(product) = info.fare {
                if held_fare != Some(product) {
                    cost += graph.fare(product).price * self.fare_weight;
                    fare = Some(product);
                }
            }
        }

        (cost, fare)
    }
}
