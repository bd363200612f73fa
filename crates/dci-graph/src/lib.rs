//! Service call graph and relative coupling measurement.
//!
//! Folds observed caller → callee records into a [`graph::CallGraph`] that
//! keeps a census of every service seen, then scores each service's coupling
//! relative to the size of that census with [`coupling::compute_coupling`].
//! [`coupling::CouplingLevel::classify`] is the single place where scores are
//! mapped to coupling tiers.

pub mod coupling;
pub mod graph;

pub use coupling::{
    compute_coupling, coupling_details, CouplingLevel, CouplingScores, ServiceCoupling,
};
pub use graph::{CallGraph, CallRow};
