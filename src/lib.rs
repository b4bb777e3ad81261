// Library for the binary, demos and tests

pub mod alerts;
pub mod config;
pub mod derived;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod history;
pub mod maintenance;
pub mod models;
pub mod sampler;
pub mod sink;
pub mod source;
pub mod supervisor;
pub mod version;

pub use supervisor::MonitorSupervisor;
