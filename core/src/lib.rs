//! Synthetic direct-marketing funnel data.
//!
//! Builds products, channels, campaigns, visitors and customers, scores
//! every campaign × visitor pairing, then drives each pairing through a
//! click and loan-application funnel. Output is handed to an EntitySink;
//! SimStore is the SQLite implementation.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod funnel;
pub mod funnel_simulator;
pub mod ids;
pub mod reference_generator;
pub mod rng;
pub mod sink;
pub mod store;
pub mod target_generator;
pub mod types;
