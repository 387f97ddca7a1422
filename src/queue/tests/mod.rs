//! Test modules for the priority queue system
//!
//! Tests are organized by functional area.

mod edge_cases;
mod fake_handler;
mod manager;
