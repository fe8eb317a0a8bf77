// Job applications: document repository, per-session mirror and HTTP handlers.
// Ownership is enforced by the repository through `OwnerScope`.

pub mod cache;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod ownership;
pub mod repository;
pub mod stats;
