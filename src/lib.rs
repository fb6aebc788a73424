// Library exports for testing and benchmarking

pub mod auth;
pub mod config;
pub mod gate;
pub mod models;
pub mod monitoring;
pub mod shell;
pub mod simulate;
pub mod web;

#[cfg(test)]
pub mod test_utils;
