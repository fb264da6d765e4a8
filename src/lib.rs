//! SwarmForge: A Rust CLI application for customer segmentation using
//! particle swarm optimization
//!
//! This library provides functionality for RFM (Recency, Frequency, Monetary)
//! analysis on customer transaction data. Cluster centers are found by a
//! particle swarm rather than Lloyd's algorithm: each particle carries a full
//! candidate set of centers, and the swarm minimizes the sum of squared
//! distances from customers to their nearest center.

pub mod cli;
pub mod data;
pub mod report;
pub mod swarm;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_records, RfmRecord};
pub use swarm::{evaluate_fitness, ClusterCenter, Particle, ParticleSwarm, Swarm};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
