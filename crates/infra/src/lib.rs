//! Infrastructure layer: state store, config, external collaborators and the
//! signup reconciler with its controller loop.

pub mod config;
pub mod external;
pub mod reconciler;
pub mod store;
pub mod watch;
pub mod workers;

#[cfg(test)]
mod integration_tests;
