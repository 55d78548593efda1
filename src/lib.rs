//! PulseView: civic issue feedback collection with sentiment aggregation
//! and CSV/PDF reporting.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod csv_export;
pub mod db;
pub mod error;
pub mod models;
pub mod pdf;
pub mod pdf_export;
pub mod report;
pub mod sentiment;
pub mod store;
pub mod submission;
