// Adapters layer: concrete implementations for external systems.

pub mod secrets;

pub use secrets::KeyringStore;
