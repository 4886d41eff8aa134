//! Multi-modal itinerary planner for a fixed-route transit network.
//!
//! Given two raw coordinates and a schedule snapshot (stops, trips, stop
//! times, routes, fares, frequencies), the engine builds an immutable stop
//! graph, runs an augmented-state Dijkstra search under a caller-selected
//! optimization mode, and returns an itinerary of walking segments, rides
//! and transfers.

pub mod domain;
pub mod engine;
pub mod graph;
pub mod planner;
pub mod schedule;
pub mod web;
