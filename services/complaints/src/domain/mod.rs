pub mod lifecycle;
pub mod repository;
pub mod types;
pub mod workload;
