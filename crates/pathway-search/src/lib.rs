//! # pathway-search
//!
//! Spatial waypoint graph and shortest-path search.
//!
//! - [`PathSearch`]: the capability contract sessions program against
//!   (create/destroy node, link/unlink, cost evaluation, search)
//! - [`AStarEngine`]: arena-backed implementation with generation-checked
//!   [`NodeHandle`]s and an A* search driven by a [`CostModel`]
//! - [`Euclidean`]: straight-line distance, used both as exact edge cost and
//!   as the (admissible, consistent) search heuristic

#![deny(unsafe_code)]

pub mod astar;
pub mod engine;
pub mod errors;
pub mod geometry;

pub use astar::AStarEngine;
pub use engine::{NodeHandle, PathSearch, SearchPath};
pub use errors::{Result, SearchError};
pub use geometry::{CostModel, Euclidean, Position};
