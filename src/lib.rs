//! codegauge - runs static analyzers over a project tree, normalizes their
//! findings and scores the project per category.

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod output;
pub mod runner;
pub mod sandbox;
pub mod scoring;
pub mod tools;
pub mod utils;
