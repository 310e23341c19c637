//! Auth types shared across civic services.
//!
//! Session handling lives in the gateway; services only see the identity it injects.

pub mod identity;
