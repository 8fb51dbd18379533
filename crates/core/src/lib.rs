pub mod classifier;
pub mod config;
pub mod controller;
pub mod delay;
pub mod failure;
pub mod logger;
pub mod orchestrator;
pub mod platform;
pub mod reactor;
pub mod types;
