mod cycle;
mod poller;
mod registry;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use registry::{PollerDeps, PollerRegistry};
