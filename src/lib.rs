// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod credential;
pub mod error;
pub mod fragments;
pub mod observability;
pub mod persona;
pub mod render;
pub mod sse;
pub mod types;
pub mod web;

// Re-exports
pub use client::{GenerativeAi, ResponseStream};
pub use client_logger::{ClientLogger, TracingLogger};
pub use credential::{Credential, CredentialSource};
pub use error::{Error, ErrorKind, Result};
pub use fragments::FragmentStream;
pub use observability::register_biometrics;
pub use persona::Persona;
pub use types::*;
