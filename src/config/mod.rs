// Configuration loading and persistence

pub mod config;

pub use config::Config;
