//! Planning engine facade.
//!
//! Owns the injected schedule repository, the active optimization mode, and
//! the current immutable graph snapshot. Collaborators are handed in at
//! construction; the engine never reaches into shared global state. A graph
//! rebuild swaps the `Arc` snapshot atomically, so concurrent planning calls
//! either finish against the previous snapshot or see the new one, never a
//! half-built graph.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::domain::{Point, StopId};
use crate::graph::{Graph, build_graph};
use crate::planner::{CostModel, Itinerary, Mode, RawPath, build_itinerary, find_path};
use crate::schedule::ScheduleRepository;

/// Recoverable planning failure. None of these are process-fatal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// `plan` was invoked before `build_graph` completed. Callers should
    /// retry once a graph exists.
    #[error("graph not built yet")]
    GraphNotBuilt,

    /// The current graph has an empty valid-stop set, so no coordinate can
    /// resolve to a stop.
    #[error("no valid stop exists near ({}, {})", .0.lat(), .0.lon())]
    NoValidStopNear(Point),

    /// Search exhausted without reaching the goal within the active mode's
    /// transfer bound.
    #[error("no path found from {from} to {to}")]
    NoPathFound { from: StopId, to: StopId },
}

/// Sequence token identifying one planning request.
///
/// Tokens increase monotonically; any asynchronous follow-up (the caller's
/// external geometry lookups, for instance) must check its token is still
/// current before applying its result, and discard it otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// The itinerary-planning engine.
pub struct Engine<R> {
    repository: R,
    graph: RwLock<Option<Arc<Graph>>>,
    mode: RwLock<Mode>,
    latest_token: AtomicU64,
}

impl<R: ScheduleRepository> Engine<R> {
    /// Create an engine over an injected schedule repository.
    ///
    /// No graph exists yet; call [`Engine::build_graph`] before planning.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            graph: RwLock::new(None),
            mode: RwLock::new(Mode::Balanced),
            latest_token: AtomicU64::new(0),
        }
    }

    /// (Re)build the graph from the repository's current tables and install
    /// it as the active snapshot.
    pub fn build_graph(&self) -> Arc<Graph> {
        let graph = Arc::new(build_graph(&self.repository));
        let mut slot = self
            .graph
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(graph.clone());
        graph
    }

    /// The current graph snapshot, if one has been built.
    pub fn snapshot(&self) -> Option<Arc<Graph>> {
        self.graph
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Select the optimization mode for subsequent `plan` calls.
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// The active optimization mode.
    pub fn mode(&self) -> Mode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plan a cost-optimal itinerary between two raw coordinates.
    ///
    /// Referentially transparent given an unchanged graph snapshot and mode.
    pub fn plan(&self, origin: Point, destination: Point) -> Result<Itinerary, PlanError> {
        let graph = self.snapshot().ok_or(PlanError::GraphNotBuilt)?;
        let model = CostModel::for_mode(self.mode());
        plan_on(&graph, &model, origin, destination)
    }

    /// Issue the token for a new planning request, superseding all earlier
    /// ones.
    pub fn next_token(&self) -> RequestToken {
        RequestToken(self.latest_token.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether a token still identifies the latest request.
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest_token.load(Ordering::SeqCst)
    }

    /// Invalidate every outstanding request token, so any late asynchronous
    /// follow-up is discarded on arrival.
    pub fn cancel_pending(&self) {
        self.latest_token.fetch_add(1, Ordering::SeqCst);
    }
}

/// Plan against one immutable graph snapshot.
///
/// Nearest-stop resolution has no distance ceiling: the closest valid stop
/// is used however far away it is, and only an empty valid-stop set fails.
pub fn plan_on(
    graph: &Graph,
    model: &CostModel,
    origin: Point,
    destination: Point,
) -> Result<Itinerary, PlanError> {
    let (start, _) = graph
        .nearest_stop(origin)
        .ok_or(PlanError::NoValidStopNear(origin))?;
    let (goal, _) = graph
        .nearest_stop(destination)
        .ok_or(PlanError::NoValidStopNear(destination))?;

    let path = if start == goal {
        RawPath::at(start)
    } else {
        find_path(graph, model, start, goal).ok_or_else(|| PlanError::NoPathFound {
            from: graph.stop(start).id.clone(),
            to: graph.stop(goal).id.clone(),
        })?
    };

    let itinerary = build_itinerary(graph, origin, destination, &path);
    info!(
        mode = model.mode().as_str(),
        from = %graph.stop(start).id,
        to = %graph.stop(goal).id,
        steps = itinerary.steps.len(),
        legs = itinerary.legs.len(),
        cost = itinerary.total_cost,
        "planned itinerary"
    );
    Ok(itinerary)
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

    fn repo() -> InMemoryRepository {
        InMemoryRepository {
            stops: vec![stop("A", 40.00, -3.0), stop("B", 40.01, -3.0)],
            routes: vec![RouteRow {
                route_id: "R1".into(),
                short_name: "1".into(),
                color: None,
            }],
            trips: vec![TripRow {
                trip_id: "T1".into(),
                route_id: "R1".into(),
            }],
            stop_times: vec![
                StopTimeRow {
                    trip_id: "T1".into(),
                    stop_id: "A".into(),
                    sequence: "1".into(),
                },
                StopTimeRow {
                    trip_id: "T1".into(),
                    stop_id: "B".into(),
                    sequence: "2".into(),
                },
            ],
            ..Default::default()
        }
    }

    fn point(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn plan_before_build_is_graph_not_built() {
        let engine = Engine::new(repo());
        let err = engine.plan(point(40.0, -3.0), point(40.01, -3.0)).unwrap_err();
        assert!(matches!(err, PlanError::GraphNotBuilt));
    }

    #[test]
    fn plan_after_build_succeeds() {
        let engine = Engine::new(repo());
        engine.build_graph();

        let itinerary = engine.plan(point(40.0, -3.0), point(40.01, -3.0)).unwrap();
        assert_eq!(itinerary.legs.len(), 1);
    }

    #[test]
    fn empty_graph_reports_no_valid_stop() {
        let engine = Engine::new(InMemoryRepository::default());
        engine.build_graph();

        let err = engine.plan(point(40.0, -3.0), point(40.01, -3.0)).unwrap_err();
        assert!(matches!(err, PlanError::NoValidStopNear(_)));
    }

    #[test]
    fn nearest_stop_has_no_distance_ceiling() {
        let engine = Engine::new(repo());
        engine.build_graph();

        // Origin and destination hundreds of kilometers away still resolve.
        let itinerary = engine.plan(point(35.0, -3.0), point(45.0, -3.0)).unwrap();
        assert!(!itinerary.steps.is_empty());
    }

    #[test]
    fn plan_is_idempotent() {
        let engine = Engine::new(repo());
        engine.build_graph();

        let origin = point(40.0001, -3.0);
        let destination = point(40.0099, -3.0);
        let first = engine.plan(origin, destination).unwrap();
        let second = engine.plan(origin, destination).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rebuild_replaces_snapshot_atomically() {
        let engine = Engine::new(repo());
        let before = engine.build_graph();
        let held = engine.snapshot().unwrap();
        let after = engine.build_graph();

        // The held snapshot is the old graph, untouched by the rebuild.
        assert!(Arc::ptr_eq(&before, &held));
        assert!(!Arc::ptr_eq(&held, &after));
        assert!(Arc::ptr_eq(&after, &engine.snapshot().unwrap()));
    }

    #[test]
    fn mode_affects_subsequent_plans_only() {
        let engine = Engine::new(repo());
        engine.build_graph();
        assert_eq!(engine.mode(), Mode::Balanced);

        engine.set_mode(Mode::Cheapest);
        assert_eq!(engine.mode(), Mode::Cheapest);
    }

    #[test]
    fn tokens_supersede_and_cancel() {
        let engine = Engine::new(repo());

        let first = engine.next_token();
        assert!(engine.is_current(first));

        let second = engine.next_token();
        assert!(!engine.is_current(first));
        assert!(engine.is_current(second));

        engine.cancel_pending();
        assert!(!engine.is_current(second));
    }
}
