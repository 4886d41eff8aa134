//! Itinerary assembly from a raw search path.
//!
//! Groups the hop sequence into maximal same-route ride legs, wraps them in
//! human-readable steps bracketed by the origin and destination walks, and
//! totals the fare with the integration discount (a fare product already
//! paid for covers later legs on the same product).

use std::collections::HashSet;

use chrono::Duration;

use crate::domain::{Point, RouteId, StopId, haversine_meters};
use crate::graph::{Graph, NodeId, RouteRef};

use super::search::RawPath;

/// One step of an itinerary as presented to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A walking segment. `None` endpoints are the caller's raw origin or
    /// destination coordinate rather than a stop.
    Walk {
        from_stop: Option<StopId>,
        to_stop: Option<StopId>,
        distance_m: f64,
    },

    /// A ride on one route.
    Ride {
        route: RouteId,
        route_name: String,
        board: StopId,
        alight: StopId,
        /// Number of stops ridden past, boarding stop excluded.
        stop_count: usize,
    },

    /// A change of service at a stop.
    Transfer { at: StopId },
}

impl Step {
    /// Human-readable step text.
    pub fn describe(&self) -> String {
        match self {
            Step::Walk {
                from_stop: None,
                to_stop: Some(to),
                distance_m,
            } => format!("Walk {}m to stop {to}", distance_m.round()),
            Step::Walk {
                from_stop: Some(from),
                to_stop: None,
                distance_m,
            } => format!("Walk {}m from stop {from} to your destination", distance_m.round()),
            Step::Walk {
                from_stop,
                to_stop,
                distance_m,
            } => format!(
                "Walk {}m from stop {} to stop {}",
                distance_m.round(),
                from_stop.as_ref().map_or("?", |s| s.as_str()),
                to_stop.as_ref().map_or("?", |s| s.as_str()),
            ),
            Step::Ride {
                route_name,
                board,
                alight,
                stop_count,
                ..
            } => format!(
                "Ride route {route_name} from {board} to {alight} ({stop_count} {})",
                if *stop_count == 1 { "stop" } else { "stops" }
            ),
            Step::Transfer { at } => format!("Transfer at {at}"),
        }
    }
}

/// A maximal contiguous ride on one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RideLeg {
    pub route: RouteId,

    /// Ordered stops of the leg, boarding stop first. The caller resolves
    /// these into drawable geometry through its own shape collaborator.
    pub stops: Vec<StopId>,

    /// Expected wait before boarding: half the route's minimum headway.
    pub expected_wait: Duration,
}

/// Total fare over an itinerary's legs.
#[derive(Debug, Clone, PartialEq)]
pub struct FareTotal {
    pub amount: f64,
    pub currency: String,
}

/// A complete planned itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub steps: Vec<Step>,
    pub legs: Vec<RideLeg>,

    /// `None` when the schedule carries no fare tables at all.
    pub fare_total: Option<FareTotal>,

    /// The mode-specific generalized cost of the underlying path. Only
    /// meaningful for comparing alternatives within one mode.
    pub total_cost: f64,
}

enum Item {
    Leg { route: RouteRef, nodes: Vec<NodeId> },
    Walk { from: NodeId, to: NodeId, distance_m: f64 },
}

/// Assemble an itinerary from a raw path.
///
/// The step list always begins with a walk from the raw origin to the first
/// stop and ends with a walk from the last stop to the raw destination, even
/// when those distances are tiny.
pub fn build_itinerary(
    graph: &Graph,
    origin: Point,
    destination: Point,
    path: &RawPath,
) -> Itinerary {
    let items = group_hops(path);

    let start = path.hops[0].node;
    let end = path.hops[path.hops.len() - 1].node;
    let stop_id = |node: NodeId| graph.stop(node).id.clone();

    let mut steps = Vec::new();
    steps.push(Step::Walk {
        from_stop: None,
        to_stop: Some(stop_id(start)),
        distance_m: haversine_meters(origin, graph.stop(start).point),
    });

    let mut legs: Vec<RideLeg> = Vec::new();
    let mut pending_walk: Option<(NodeId, NodeId, f64)> = None;
    let mut last_alight: Option<NodeId> = None;
    for item in &items {
        match item {
            Item::Walk { from, to, distance_m } => {
                pending_walk = Some((*from, *to, *distance_m));
            }
            Item::Leg { route, nodes } => {
                // A leg after a leg is a transfer; the notice comes before
                // any connecting walk.
                if let Some(alight) = last_alight {
                    steps.push(Step::Transfer {
                        at: stop_id(alight),
                    });
                }
                if let Some((from, to, distance_m)) = pending_walk.take() {
                    steps.push(Step::Walk {
                        from_stop: Some(stop_id(from)),
                        to_stop: Some(stop_id(to)),
                        distance_m,
                    });
                }

                let info = graph.route(*route);
                let board = nodes[0];
                let alight = nodes[nodes.len() - 1];
                steps.push(Step::Ride {
                    route: info.id.clone(),
                    route_name: info.short_name.clone(),
                    board: stop_id(board),
                    alight: stop_id(alight),
                    stop_count: nodes.len() - 1,
                });
                legs.push(RideLeg {
                    route: info.id.clone(),
                    stops: nodes.iter().map(|&n| stop_id(n)).collect(),
                    expected_wait: Duration::seconds(i64::from(info.min_headway_secs) / 2),
                });
                last_alight = Some(alight);
            }
        }
    }
    if let Some((from, to, distance_m)) = pending_walk.take() {
        steps.push(Step::Walk {
            from_stop: Some(stop_id(from)),
            to_stop: Some(stop_id(to)),
            distance_m,
        });
    }

    steps.push(Step::Walk {
        from_stop: Some(stop_id(end)),
        to_stop: None,
        distance_m: haversine_meters(graph.stop(end).point, destination),
    });

    let fare_total = compute_fare_total(graph, &items);

    Itinerary {
        steps,
        legs,
        fare_total,
        total_cost: path.total_cost,
    }
}

/// Group consecutive same-route hops into ride legs and coalesce runs of
/// walking hops into single walk items.
fn group_hops(path: &RawPath) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();
    let mut prev = path.hops[0].node;
    for hop in &path.hops[1..] {
        match hop.route {
            Some(route) => match items.last_mut() {
                Some(Item::Leg {
                    route: leg_route,
                    nodes,
                }) if *leg_route == route => nodes.push(hop.node),
                _ => items.push(Item::Leg {
                    route,
                    nodes: vec![prev, hop.node],
                }),
            },
            None => match items.last_mut() {
                Some(Item::Walk { to, distance_m, .. }) => {
                    *to = hop.node;
                    *distance_m += hop.distance_m;
                }
                _ => items.push(Item::Walk {
                    from: prev,
                    to: hop.node,
                    distance_m: hop.distance_m,
                }),
            },
        }
        prev = hop.node;
    }
    items
}

/// Sum each leg's fare product once, in leg order. `None` without fare
/// tables; zero with fare tables but no charged legs.
fn compute_fare_total(graph: &Graph, items: &[Item]) -> Option<FareTotal> {
    if !graph.has_fares() {
        return None;
    }

    let mut counted: HashSet<crate::graph::FareRef> = HashSet::new();
    let mut amount = 0.0;
    let mut currency: Option<String> = None;
    for item in items {
        let Item::Leg { route, .. } = item else {
            continue;
        };
        let Some(fare) = graph.route(*route).fare else {
            continue;
        };
        if counted.insert(fare) {
            let info = graph.fare(fare);
            amount += info.price;
            currency.get_or_insert_with(|| info.currency.clone());
        }
    }

    Some(FareTotal {
        amount,
        currency: currency.unwrap_or_else(|| graph.first_currency().unwrap_or("").to_string()),
    })
}
