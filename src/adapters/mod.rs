//! Concrete adapter implementations for ports.

pub mod csv_price_adapter;
pub mod file_config_adapter;
pub mod security_csv;
pub mod sharesight;
pub mod yahoo_adapter;
