//! sea-orm entities for the complaints service tables.

pub mod complaint_updates;
pub mod complaints;
pub mod users;
