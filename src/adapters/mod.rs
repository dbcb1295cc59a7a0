// Adapters layer: concrete implementations of domain ports against the host.

pub mod sandbox;

pub use sandbox::{Preopen, Sandbox, SandboxError};
