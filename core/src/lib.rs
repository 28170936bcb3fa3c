//! Core library for the platter meal planner: domain models, in-memory
//! stores, pure aggregation, the planner drag state machine, and SQLite
//! persistence behind a storage trait.

pub mod aggregate;
pub mod board;
pub mod db;
pub mod models;
pub mod service;
pub mod store;
