//! Graph construction from schedule tables.
//!
//! Building is a pure function of the repository's tables: identical inputs
//! always produce an identical graph, with lexicographic stop-id tie-breaks
//! wherever table data leaves the order ambiguous. Malformed rows (missing
//! coordinates, unparsable sequence numbers, dangling references) are skipped
//! row by row; a partially invalid feed degrades the graph, it never aborts
//! the build.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::domain::{FareProductId, RouteId, StopId, TripId, haversine_meters};
use crate::schedule::ScheduleRepository;

use super::{Edge, FareInfo, FareRef, Graph, NodeId, RouteInfo, RouteRef, SpatialIndex, StopNode};

/// Walking edges connect stops within this radius.
const WALK_RADIUS_M: f64 = 250.0;

/// At most this many outgoing walking edges per stop.
const WALK_NEIGHBOR_LIMIT: usize = 3;

/// Headway assumed for routes without any frequency row.
const DEFAULT_HEADWAY_SECS: u32 = 900;

/// Build the immutable stop graph from a schedule repository.
pub fn build_graph(repo: &impl ScheduleRepository) -> Graph {
    let mut routes: Vec<RouteInfo> = Vec::new();
    let mut route_refs: HashMap<RouteId, RouteRef> = HashMap::new();
    for row in repo.routes() {
        let Ok(id) = RouteId::parse(&row.route_id) else {
            debug!(route_id = %row.route_id, "skipping route row with invalid id");
            continue;
        };
        if route_refs.contains_key(&id) {
            continue;
        }
        route_refs.insert(id.clone(), RouteRef(routes.len() as u32));
        routes.push(RouteInfo {
            id,
            short_name: row.short_name.clone(),
            color: row.color.clone(),
            fare: None,
            min_headway_secs: DEFAULT_HEADWAY_SECS,
        });
    }

    let mut fares: Vec<FareInfo> = Vec::new();
    let mut fare_refs: HashMap<FareProductId, FareRef> = HashMap::new();
    for row in repo.fare_attributes() {
        let Ok(product) = FareProductId::parse(&row.fare_id) else {
            debug!(fare_id = %row.fare_id, "skipping fare attribute with invalid id");
            continue;
        };
        if !row.price.is_finite() || row.price < 0.0 {
            debug!(fare_id = %row.fare_id, price = row.price, "skipping fare attribute with invalid price");
            continue;
        }
        if fare_refs.contains_key(&product) {
            continue;
        }
        fare_refs.insert(product.clone(), FareRef(fares.len() as u32));
        fares.push(FareInfo {
            product,
            price: row.price,
            currency: row.currency.clone(),
        });
    }

    // A route's fare product is the first rule matched, in table order.
    for row in repo.fare_rules() {
        let (Ok(route_id), Ok(product)) = (
            RouteId::parse(&row.route_id),
            FareProductId::parse(&row.fare_id),
        ) else {
            continue;
        };
        let (Some(&route), Some(&fare)) = (route_refs.get(&route_id), fare_refs.get(&product))
        else {
            debug!(route_id = %row.route_id, fare_id = %row.fare_id, "skipping dangling fare rule");
            continue;
        };
        let info = &mut routes[route.0 as usize];
        if info.fare.is_none() {
            info.fare = Some(fare);
        }
    }

    let mut trip_routes: HashMap<TripId, RouteRef> = HashMap::new();
    for row in repo.trips() {
        let Ok(trip_id) = TripId::parse(&row.trip_id) else {
            debug!(trip_id = %row.trip_id, "skipping trip row with invalid id");
            continue;
        };
        let Some(&route) = RouteId::parse(&row.route_id)
            .ok()
            .and_then(|id| route_refs.get(&id))
        else {
            debug!(trip_id = %row.trip_id, route_id = %row.route_id, "skipping trip with dangling route");
            continue;
        };
        trip_routes.entry(trip_id).or_insert(route);
    }

    let mut located: HashMap<StopId, StopNode> = HashMap::new();
    for row in repo.stops() {
        let Ok(id) = StopId::parse(&row.stop_id) else {
            debug!(stop_id = %row.stop_id, "skipping stop row with invalid id");
            continue;
        };
        let point = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => match crate::domain::Point::new(lat, lon) {
                Ok(p) => p,
                Err(err) => {
                    debug!(stop_id = %id, %err, "skipping stop row");
                    continue;
                }
            },
            _ => {
                debug!(stop_id = %id, "skipping stop row without coordinates");
                continue;
            }
        };
        let parent_station = row
            .parent_station
            .as_deref()
            .and_then(|p| StopId::parse(p).ok());
        located.entry(id.clone()).or_insert(StopNode {
            id,
            point,
            parent_station,
        });
    }

    // A stop is valid iff it appears in at least one stop-time row whose trip
    // resolves; the same pass collects the routes calling at each stop and
    // the per-trip visit sequences.
    let mut valid: BTreeSet<StopId> = BTreeSet::new();
    let mut routes_by_stop: HashMap<StopId, BTreeSet<RouteRef>> = HashMap::new();
    let mut trip_visits: HashMap<TripId, Vec<(u32, StopId)>> = HashMap::new();
    for row in repo.stop_times() {
        let Some((trip_id, &route)) = TripId::parse(&row.trip_id)
            .ok()
            .and_then(|id| trip_routes.get_key_value(&id))
        else {
            debug!(trip_id = %row.trip_id, "skipping stop time with dangling trip");
            continue;
        };
        let Some(stop_id) = StopId::parse(&row.stop_id)
            .ok()
            .filter(|id| located.contains_key(id))
        else {
            debug!(stop_id = %row.stop_id, "skipping stop time with unknown stop");
            continue;
        };
        let Ok(sequence) = row.sequence.trim().parse::<u32>() else {
            debug!(trip_id = %row.trip_id, sequence = %row.sequence, "skipping stop time with unparsable sequence");
            continue;
        };
        valid.insert(stop_id.clone());
        routes_by_stop.entry(stop_id.clone()).or_default().insert(route);
        trip_visits
            .entry(trip_id.clone())
            .or_default()
            .push((sequence, stop_id));
    }

    // Intern valid stops in lexicographic id order.
    let stops: Vec<StopNode> = valid.iter().map(|id| located[id].clone()).collect();
    let node_of: HashMap<StopId, NodeId> = stops
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.clone(), NodeId(i as u32)))
        .collect();

    // Per-route headway: minimum across every headway field of every
    // frequency row belonging to the route.
    for row in repo.frequencies() {
        let Some(&route) = TripId::parse(&row.trip_id)
            .ok()
            .and_then(|id| trip_routes.get(&id))
        else {
            debug!(trip_id = %row.trip_id, "skipping frequency with dangling trip");
            continue;
        };
        let bounds = [row.min_headway_secs, row.max_headway_secs, row.headway_secs];
        let Some(headway) = bounds.into_iter().flatten().min() else {
            continue;
        };
        let info = &mut routes[route.0 as usize];
        info.min_headway_secs = info.min_headway_secs.min(headway);
    }

    let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); stops.len()];
    let mut seen: HashSet<(NodeId, NodeId, Option<RouteRef>)> = HashSet::new();
    let mut add_edge = |from: NodeId, edge: Edge| {
        if seen.insert((from, edge.to, edge.route)) {
            adjacency[from.index()].push(edge);
        }
    };

    // Directed transit edges: consecutive visit pairs within each trip,
    // ordered by sequence number. No implicit reverse edge.
    let mut built_trips: HashSet<TripId> = HashSet::new();
    for row in repo.trips() {
        let Ok(trip_id) = TripId::parse(&row.trip_id) else {
            continue;
        };
        if !built_trips.insert(trip_id.clone()) {
            continue;
        }
        let (Some(&route), Some(visits)) =
            (trip_routes.get(&trip_id), trip_visits.get_mut(&trip_id))
        else {
            continue;
        };
        visits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        for pair in visits.windows(2) {
            let (from, to) = (&pair[0].1, &pair[1].1);
            if from == to {
                continue;
            }
            let (from, to) = (node_of[from], node_of[to]);
            add_edge(
                from,
                Edge {
                    to,
                    route: Some(route),
                    distance_m: haversine_meters(stops[from.index()].point, stops[to.index()].point),
                },
            );
        }
    }

    // Sibling transfer edges: both directions within every parent-station
    // group, zero distance (siblings are the same physical complex).
    let mut siblings: BTreeMap<StopId, Vec<NodeId>> = BTreeMap::new();
    for (i, stop) in stops.iter().enumerate() {
        if let Some(parent) = &stop.parent_station {
            siblings.entry(parent.clone()).or_default().push(NodeId(i as u32));
        }
    }
    for group in siblings.values() {
        for &a in group {
            for &b in group {
                if a != b {
                    add_edge(
                        a,
                        Edge {
                            to: b,
                            route: None,
                            distance_m: 0.0,
                        },
                    );
                }
            }
        }
    }

    // Walking edges: up to 3 nearest valid stops within 250 m, per source
    // stop independently. Not mirrored; symmetry only arises when the other
    // stop finds this one among its own nearest.
    let index = SpatialIndex::build(
        stops
            .iter()
            .enumerate()
            .map(|(i, s)| (NodeId(i as u32), s.point)),
    );
    for (i, stop) in stops.iter().enumerate() {
        let from = NodeId(i as u32);
        for (to, distance_m) in index.neighbors(from, stop.point, WALK_RADIUS_M, WALK_NEIGHBOR_LIMIT)
        {
            add_edge(
                from,
                Edge {
                    to,
                    route: None,
                    distance_m,
                },
            );
        }
    }

    let routes_at_stop: Vec<Vec<RouteRef>> = stops
        .iter()
        .map(|s| {
            routes_by_stop
                .get(&s.id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        })
        .collect();

    let graph = Graph {
        stops,
        node_of,
        adjacency,
        routes_at_stop,
        routes,
        fares,
    };
    info!(
        stops = graph.stop_count(),
        edges = graph.edge_count(),
        routes = graph.routes.len(),
        fares = graph.fares.len(),
        "built stop graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rows::*;
    use crate::schedule::InMemoryRepository;

    fn stop(id: &str, lat: f64, lon: f64) -> StopRow {
        StopRow {
            stop_id: id.to_string(),
            lat: Some(lat),
            lon: Some(lon),
            parent_station: None,
        }
    }

    fn child_stop(id: &str, lat: f64, lon: f64, parent: &str) -> StopRow {
        StopRow {
            parent_station: Some(parent.to_string()),
            ..stop(id, lat, lon)
        }
    }

    fn trip(id: &str, route: &str) -> TripRow {
        TripRow {
            trip_id: id.to_string(),
            route_id: route.to_string(),
        }
    }

    fn stop_time(trip: &str, stop: &str, seq: &str) -> StopTimeRow {
        StopTimeRow {
            trip_id: trip.to_string(),
            stop_id: stop.to_string(),
            sequence: seq.to_string(),
        }
    }

    fn route(id: &str, name: &str) -> RouteRow {
        RouteRow {
            route_id: id.to_string(),
            short_name: name.to_string(),
            color: None,
        }
    }

    /// Three stops on one route, far enough apart that no walking edges form.
    fn linear_repo() -> InMemoryRepository {
        InMemoryRepository {
            stops: vec![
                stop("A", 40.00, -3.00),
                stop("B", 40.01, -3.00),
                stop("C", 40.02, -3.00),
            ],
            routes: vec![route("R1", "1")],
            trips: vec![trip("T1", "R1")],
            stop_times: vec![
                stop_time("T1", "A", "1"),
                stop_time("T1", "B", "2"),
                stop_time("T1", "C", "3"),
            ],
            ..Default::default()
        }
    }

    fn node(graph: &Graph, id: &str) -> NodeId {
        graph.node(&StopId::parse(id).unwrap()).unwrap()
    }

    #[test]
    fn transit_edges_follow_sequence_order() {
        let graph = build_graph(&linear_repo());
        assert_eq!(graph.stop_count(), 3);

        let a = node(&graph, "A");
        let b = node(&graph, "B");
        let c = node(&graph, "C");

        assert_eq!(graph.edges(a).len(), 1);
        assert_eq!(graph.edges(a)[0].to, b);
        assert!(graph.edges(a)[0].route.is_some());
        assert_eq!(graph.edges(b)[0].to, c);

        // Directional: no reverse edges.
        assert!(graph.edges(c).is_empty());
        assert!(!graph.edges(b).iter().any(|e| e.to == a));
    }

    #[test]
    fn stop_without_stop_times_is_invalid() {
        let mut repo = linear_repo();
        repo.stops.push(stop("ORPHAN", 41.0, -3.0));

        let graph = build_graph(&repo);
        assert_eq!(graph.stop_count(), 3);
        assert!(graph.node(&StopId::parse("ORPHAN").unwrap()).is_none());
    }

    #[test]
    fn every_edge_endpoint_is_a_valid_stop() {
        let mut repo = linear_repo();
        repo.stops.push(child_stop("A1", 40.0, -3.0001, "P"));
        repo.stops.push(child_stop("A2", 40.0, -3.0002, "P"));
        repo.trips.push(trip("T2", "R1"));
        repo.stop_times.push(stop_time("T2", "A1", "1"));
        repo.stop_times.push(stop_time("T2", "A2", "2"));

        let graph = build_graph(&repo);
        for from in graph.nodes() {
            for edge in graph.edges(from) {
                // Indexing panics (failing the test) if the endpoint is bogus.
                let endpoint = graph.stop(edge.to);
                assert!(graph.node(&endpoint.id).is_some());
            }
        }
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let mut repo = linear_repo();
        // Stop without coordinates.
        repo.stops.push(StopRow {
            stop_id: "NOCOORD".to_string(),
            lat: None,
            lon: None,
            parent_station: None,
        });
        // Unparsable sequence number.
        repo.stop_times.push(stop_time("T1", "A", "first"));
        // Stop time against an unknown trip.
        repo.stop_times.push(stop_time("GHOST", "A", "1"));
        // Trip against an unknown route.
        repo.trips.push(trip("T9", "NO_SUCH_ROUTE"));
        repo.stop_times.push(stop_time("T9", "B", "1"));

        let graph = build_graph(&repo);
        assert_eq!(graph.stop_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn sibling_transfer_edges_are_symmetric() {
        let mut repo = linear_repo();
        repo.stops.push(child_stop("P1", 40.05, -3.0, "HUB"));
        repo.stops.push(child_stop("P2", 40.05, -3.0001, "HUB"));
        repo.stops.push(child_stop("P3", 40.05, -3.0002, "HUB"));
        repo.trips.push(trip("T2", "R1"));
        repo.stop_times.push(stop_time("T2", "P1", "1"));
        repo.stop_times.push(stop_time("T2", "P2", "2"));
        repo.stop_times.push(stop_time("T2", "P3", "3"));

        let graph = build_graph(&repo);
        for a in graph.nodes() {
            for edge in graph.edges(a) {
                if edge.route.is_none() && edge.distance_m == 0.0 {
                    assert!(
                        graph
                            .edges(edge.to)
                            .iter()
                            .any(|back| back.to == a && back.route.is_none()),
                        "sibling edge {a:?} -> {:?} has no mirror",
                        edge.to
                    );
                }
            }
        }
    }

    #[test]
    fn walking_edges_respect_radius_and_fanout() {
        // A cluster of five stops within ~120 m of each other, plus one far away.
        let mut repo = linear_repo();
        for (i, d_lon) in [0.0004, 0.0006, 0.0008, 0.001, 0.0012].iter().enumerate() {
            let id = format!("W{i}");
            repo.stops.push(stop(&id, 40.0, -3.0 - d_lon));
            repo.trips.push(trip(&format!("TW{i}"), "R1"));
            repo.stop_times.push(stop_time(&format!("TW{i}"), &id, "1"));
            repo.stop_times.push(stop_time(&format!("TW{i}"), "C", "2"));
        }

        let graph = build_graph(&repo);
        for from in graph.nodes() {
            let walking: Vec<_> = graph
                .edges(from)
                .iter()
                .filter(|e| e.route.is_none())
                .collect();
            assert!(walking.len() <= WALK_NEIGHBOR_LIMIT);
            for edge in walking {
                assert!(edge.distance_m <= WALK_RADIUS_M);
            }
        }
    }

    #[test]
    fn fare_rule_first_match_wins() {
        let mut repo = linear_repo();
        repo.fare_attributes = vec![
            FareAttributeRow {
                fare_id: "zone1".to_string(),
                price: 1.50,
                currency: "EUR".to_string(),
            },
            FareAttributeRow {
                fare_id: "zone2".to_string(),
                price: 2.50,
                currency: "EUR".to_string(),
            },
        ];
        repo.fare_rules = vec![
            FareRuleRow {
                fare_id: "zone1".to_string(),
                route_id: "R1".to_string(),
            },
            FareRuleRow {
                fare_id: "zone2".to_string(),
                route_id: "R1".to_string(),
            },
        ];

        let graph = build_graph(&repo);
        let r1 = graph.routes_at(node(&graph, "A"))[0];
        let fare = graph.route(r1).fare.expect("fare resolved");
        assert_eq!(graph.fare(fare).product.as_str(), "zone1");
        assert_eq!(graph.fare(fare).price, 1.50);
    }

    #[test]
    fn headway_is_minimum_across_all_fields() {
        let mut repo = linear_repo();
        repo.frequencies = vec![
            FrequencyRow {
                trip_id: "T1".to_string(),
                min_headway_secs: Some(600),
                max_headway_secs: Some(1200),
                headway_secs: None,
            },
            FrequencyRow {
                trip_id: "T1".to_string(),
                min_headway_secs: None,
                max_headway_secs: None,
                headway_secs: Some(300),
            },
        ];

        let graph = build_graph(&repo);
        let r1 = graph.routes_at(node(&graph, "A"))[0];
        assert_eq!(graph.route(r1).min_headway_secs, 300);
    }

    #[test]
    fn headway_defaults_without_frequencies() {
        let graph = build_graph(&linear_repo());
        let r1 = graph.routes_at(node(&graph, "A"))[0];
        assert_eq!(graph.route(r1).min_headway_secs, DEFAULT_HEADWAY_SECS);
    }

    #[test]
    fn build_is_deterministic() {
        let mut repo = linear_repo();
        repo.stops.push(child_stop("P1", 40.05, -3.0, "HUB"));
        repo.stops.push(child_stop("P2", 40.05, -3.0001, "HUB"));
        repo.trips.push(trip("T2", "R1"));
        repo.stop_times.push(stop_time("T2", "P1", "1"));
        repo.stop_times.push(stop_time("T2", "P2", "2"));

        let first = build_graph(&repo);
        let second = build_graph(&repo);

        assert_eq!(first.stop_count(), second.stop_count());
        for node in first.nodes() {
            assert_eq!(first.stop(node).id, second.stop(node).id);
            let a: Vec<_> = first
                .edges(node)
                .iter()
                .map(|e| (e.to, e.route, e.distance_m.to_bits()))
                .collect();
            let b: Vec<_> = second
                .edges(node)
                .iter()
                .map(|e| (e.to, e.route, e.distance_m.to_bits()))
                .collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_repository_builds_empty_graph() {
        let graph = build_graph(&InMemoryRepository::default());
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.nearest_stop(crate::domain::Point::new(0.0, 0.0).unwrap()).is_none());
    }
}
