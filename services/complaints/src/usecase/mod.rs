pub mod analytics;
pub mod assignment;
pub mod autofill;
pub mod complaint;
pub mod edit;
pub mod lifecycle;
pub mod listing;
pub mod locks;
pub mod mail;
pub mod update_log;
pub mod user;
