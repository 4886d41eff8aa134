//! Augmented-state Dijkstra search over the stop graph.
//!
//! The unit of bookkeeping is not the bare stop but the search state
//! `(stop, riding route, held fare product)`: the optimal cost to a stop
//! differs depending on which service you are on and which fare you have
//! already paid. Transitions are the graph's physical edges plus in-place
//! route switches enumerated from the stop's routes-at-stop set; a transit
//! edge is traversable only while holding its route, so every boarding is an
//! explicit zero-distance switch carrying the transfer/fare/wait surcharges.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::graph::{FareRef, Graph, NodeId, RouteRef};

use super::cost::CostModel;

/// Visited-state key. A value-type triple, so distinct contexts can never
/// collide the way delimiter-joined string keys can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct StateKey {
    node: NodeId,
    route: Option<RouteRef>,
    fare: Option<FareRef>,
}

/// How a state was entered, for path reconstruction.
#[derive(Debug, Clone, Copy)]
enum Move {
    /// Rode a transit edge.
    Ride(RouteRef, f64),
    /// Walked a non-revenue edge.
    Walk(f64),
    /// Boarded in place; no physical movement.
    Board,
}

#[derive(Debug, Clone, Copy)]
struct Record {
    cost: f64,
    transfers: u32,
    walk_streak: u32,
    prev: Option<(StateKey, Move)>,
}

struct HeapEntry {
    cost: f64,
    key: StateKey,
}

// Min-heap ordering by cost, with the state key as a deterministic
// tie-break so equal-cost candidates always pop in the same order.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// One physical hop of a found path.
#[derive(Debug, Clone, Copy)]
pub struct RawHop {
    pub node: NodeId,

    /// The route ridden into this stop; `None` for the start hop and for
    /// walking hops.
    pub route: Option<RouteRef>,

    /// Length of the traversed edge in meters.
    pub distance_m: f64,

    /// Accumulated generalized cost on arrival at this hop.
    pub cost: f64,
}

/// A found path as an ordered hop sequence, start hop first.
#[derive(Debug, Clone)]
pub struct RawPath {
    pub hops: Vec<RawHop>,
    pub total_cost: f64,
}

impl RawPath {
    /// The degenerate path that never leaves `node`.
    pub fn at(node: NodeId) -> Self {
        Self {
            hops: vec![RawHop {
                node,
                route: None,
                distance_m: 0.0,
                cost: 0.0,
            }],
            total_cost: 0.0,
        }
    }
}

/// Find the cheapest path from `start` to `goal` under `model`.
///
/// Returns `None` when the goal is unreachable within the model's transfer
/// bound. Dijkstra with lazy deletion: stale heap entries are discarded on
/// pop. All transition costs are non-negative, so the first pop of any state
/// at the goal stop is optimal regardless of its route/fare context.
pub fn find_path(graph: &Graph, model: &CostModel, start: NodeId, goal: NodeId) -> Option<RawPath> {
    let start_key = StateKey {
        node: start,
        route: None,
        fare: None,
    };

    let mut best: HashMap<StateKey, Record> = HashMap::new();
    best.insert(
        start_key,
        Record {
            cost: 0.0,
            transfers: 0,
            walk_streak: 0,
            prev: None,
        },
    );

    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry {
        cost: 0.0,
        key: start_key,
    });

    let mut relaxations = 0usize;

    while let Some(entry) = heap.pop() {
        let record = best[&entry.key];
        if entry.cost > record.cost {
            // Lazy deletion: a cheaper entry for this state was already
            // processed.
            continue;
        }

        if entry.key.node == goal {
            debug!(relaxations, cost = record.cost, "search reached goal");
            return Some(reconstruct(&best, entry.key));
        }

        let key = entry.key;

        let mut relax = |best: &mut HashMap<StateKey, Record>,
                         heap: &mut BinaryHeap<HeapEntry>,
                         next: StateKey,
                         candidate: Record| {
            relaxations += 1;
            let improved = best
                .get(&next)
                .is_none_or(|existing| candidate.cost < existing.cost);
            if improved {
                best.insert(next, candidate);
                heap.push(HeapEntry {
                    cost: candidate.cost,
                    key: next,
                });
            }
        };

        for edge in graph.edges(key.node) {
            match edge.route {
                Some(route) => {
                    // Transit edges require holding the edge's route.
                    if key.route != Some(route) {
                        continue;
                    }
                    relax(
                        &mut best,
                        &mut heap,
                        StateKey {
                            node: edge.to,
                            route: Some(route),
                            fare: key.fare,
                        },
                        Record {
                            cost: record.cost + model.ride_cost(edge.distance_m),
                            transfers: record.transfers,
                            walk_streak: 0,
                            prev: Some((key, Move::Ride(route, edge.distance_m))),
                        },
                    );
                }
                None => {
                    let streak = record.walk_streak + 1;
                    relax(
                        &mut best,
                        &mut heap,
                        StateKey {
                            node: edge.to,
                            route: None,
                            fare: key.fare,
                        },
                        Record {
                            cost: record.cost
                                + model.walk_cost(edge.distance_m, key.route.is_some(), streak),
                            transfers: record.transfers,
                            walk_streak: streak,
                            prev: Some((key, Move::Walk(edge.distance_m))),
                        },
                    );
                }
            }
        }

        // In-place route switches at this stop.
        for &route in graph.routes_at(key.node) {
            if key.route == Some(route) {
                continue;
            }
            let transfers = record.transfers + u32::from(key.route.is_some());
            if transfers > model.max_transfers {
                continue;
            }
            let (delta, fare) = model.board_cost(graph, key.route, route, key.fare);
            relax(
                &mut best,
                &mut heap,
                StateKey {
                    node: key.node,
                    route: Some(route),
                    fare,
                },
                Record {
                    cost: record.cost + delta,
                    transfers,
                    walk_streak: 0,
                    prev: Some((key, Move::Board)),
                },
            );
        }
    }

    debug!(relaxations, "search exhausted without reaching goal");
    None
}

/// Rebuild the hop sequence by following predecessor links from the goal
/// state. In-place boards move nothing, so they produce no hop; their cost
/// still shows up in the next hop's accumulated value.
fn reconstruct(best: &HashMap<StateKey, Record>, goal: StateKey) -> RawPath {
    let total_cost = best[&goal].cost;

    let mut chain: Vec<(StateKey, Option<(StateKey, Move)>)> = Vec::new();
    let mut current = goal;
    loop {
        let record = best[&current];
        chain.push((current, record.prev));
        match record.prev {
            Some((prev, _)) => current = prev,
            None => break,
        }
    }
    chain.reverse();

    let mut hops = Vec::with_capacity(chain.len());
    hops.push(RawHop {
        node: chain[0].0.node,
        route: None,
        distance_m: 0.0,
        cost: 0.0,
    });
    for (key, prev) in &chain[1..] {
        let Some((_, mv)) = prev else { continue };
        let cost = best[key].cost;
        match *mv {
            Move::Ride(route, distance_m) => hops.push(RawHop {
                node: key.node,
                route: Some(route),
                distance_m,
                cost,
            }),
            Move::Walk(distance_m) => hops.push(RawHop {
                node: key.node,
                route: None,
                distance_m,
                cost,
            }),
            Move::Board => {}
        }
    }

    RawPath { hops, total_cost }
}
