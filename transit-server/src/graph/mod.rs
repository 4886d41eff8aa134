//! Immutable stop graph.
//!
//! The graph is a directed multigraph over valid stops: transit edges from
//! consecutive stop-time pairs, symmetric sibling-transfer edges within a
//! parent station, and capped walking edges between nearby stops. It is built
//! once per schedule snapshot and never mutated afterwards; a schedule reload
//! replaces it wholesale. String identifiers are interned to dense `u32`
//! indices at build time, so search bookkeeping works on small value-type
//! keys instead of composite strings.

mod builder;
mod spatial;

pub use builder::build_graph;
pub use spatial::SpatialIndex;

use std::collections::HashMap;

use crate::domain::{FareProductId, Point, RouteId, StopId, haversine_meters};

/// Dense index of a stop in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a route in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteRef(pub(crate) u32);

/// Dense index of a fare product in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FareRef(pub(crate) u32);

/// A directed edge. `route` is `None` for non-revenue (walking or
/// sibling-transfer) edges.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub to: NodeId,
    pub route: Option<RouteRef>,
    pub distance_m: f64,
}

/// A valid stop in the graph.
#[derive(Debug, Clone)]
pub struct StopNode {
    pub id: StopId,
    pub point: Point,
    pub parent_station: Option<StopId>,
}

/// A route with its resolved fare product and headway.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub id: RouteId,
    pub short_name: String,
    pub color: Option<String>,

    /// First fare rule matched in table order, if any.
    pub fare: Option<FareRef>,

    /// Minimum across all headway fields of the route's frequency rows,
    /// defaulted when the route has none.
    pub min_headway_secs: u32,
}

/// A priced fare product.
#[derive(Debug, Clone)]
pub struct FareInfo {
    pub product: FareProductId,
    pub price: f64,
    pub currency: String,
}

/// The immutable stop graph. See the module docs for its construction rules.
#[derive(Debug, Default)]
pub struct Graph {
    pub(crate) stops: Vec<StopNode>,
    pub(crate) node_of: HashMap<StopId, NodeId>,
    pub(crate) adjacency: Vec<Vec<Edge>>,
    pub(crate) routes_at_stop: Vec<Vec<RouteRef>>,
    pub(crate) routes: Vec<RouteInfo>,
    pub(crate) fares: Vec<FareInfo>,
}

impl Graph {
    /// Number of valid stops.
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Whether the valid-stop set is empty.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Look up a stop's node by identifier.
    pub fn node(&self, id: &StopId) -> Option<NodeId> {
        self.node_of.get(id).copied()
    }

    /// The stop behind a node.
    pub fn stop(&self, node: NodeId) -> &StopNode {
        &self.stops[node.index()]
    }

    /// All node ids, in interning order (lexicographic by stop id).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.stops.len() as u32).map(NodeId)
    }

    /// Outgoing edges of a node.
    pub fn edges(&self, node: NodeId) -> &[Edge] {
        &self.adjacency[node.index()]
    }

    /// Routes calling at a stop, sorted by route ref.
    pub fn routes_at(&self, node: NodeId) -> &[RouteRef] {
        &self.routes_at_stop[node.index()]
    }

    /// Route metadata.
    pub fn route(&self, route: RouteRef) -> &RouteInfo {
        &self.routes[route.0 as usize]
    }

    /// Fare product metadata.
    pub fn fare(&self, fare: FareRef) -> &FareInfo {
        &self.fares[fare.0 as usize]
    }

    /// Whether the schedule carried any fare tables at all.
    pub fn has_fares(&self) -> bool {
        !self.fares.is_empty()
    }

    /// Currency of the first fare product, when fare tables exist.
    pub fn first_currency(&self) -> Option<&str> {
        self.fares.first().map(|f| f.currency.as_str())
    }

    /// The valid stop closest to a coordinate, with its distance in meters.
    ///
    /// There is deliberately no distance ceiling: as long as one valid stop
    /// exists, the closest one is returned however far away it is. Returns
    /// `None` only for an empty graph. Ties break on stop id.
    pub fn nearest_stop(&self, point: Point) -> Option<(NodeId, f64)> {
        self.nodes()
            .map(|node| (node, haversine_meters(point, self.stop(node).point)))
            .min_by(|a, b| {
                a.1.total_cmp(&b.1)
                    .then_with(|| self.stop(a.0).id.cmp(&self.stop(b.0).id))
            })
    }
}
