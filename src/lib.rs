pub mod adapter;
pub mod app;
pub mod config;
pub mod error;
pub mod inputs;
pub mod invocation;
pub mod job;
pub mod metadata;
pub mod report;
pub mod runner;
pub mod shared;
