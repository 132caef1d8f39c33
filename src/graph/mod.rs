//! Environment promotion graph
//!
//! Built on petgraph once per catalog load; every promotion query goes through it.

pub mod promotion_graph;

pub use promotion_graph::PromotionGraph;
