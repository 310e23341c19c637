//! Domain types shared across the civic complaint services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod complaint;
pub mod geo;
pub mod pagination;
pub mod user;
