pub mod analyzer;
pub mod config;
pub mod features;
pub mod input;
pub mod models;
pub mod report;
pub mod segments;

/// Application name for XDG paths
pub const APP_NAME: &str = "songscope";
