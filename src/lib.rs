pub mod auth;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod diagnostics;
pub mod filters;
pub mod metrics;
pub mod utils;
pub mod web;
