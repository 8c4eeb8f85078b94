//! Core domain types and logic.

pub mod allocation;
pub mod cadence;
pub mod calendar;
pub mod config_validation;
pub mod enrichment;
pub mod error;
pub mod order;
pub mod scheduler;
pub mod score;
pub mod security;
pub mod weights;
