//! Test harness utilities for the bootstrap behavioural suite.

mod config_loader;
mod reporter;
mod transport_provider;
mod world;

pub use config_loader::TestConfigLoader;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use transport_provider::RecordingTransportProvider;
pub use world::{TestWorld, world};
