// Scheduler module: binds one recurring trigger per validated job

pub mod engine;

pub use engine::SchedulerEngine;
