//! Multi-endpoint resolution, shape normalization and deterministic
//! fallback for the renewable-energy dashboard API.

pub mod collation;
pub mod endpoints;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod resolver;
pub mod service;
pub mod state;
pub mod stats;
pub mod transport;

pub use error::{EndpointFailure, ResolveError, TransportError};
pub use models::{Resolution, ResolutionResult, Resource, Source};
pub use notify::{Notifier, Severity};
pub use service::Dashboard;
pub use state::Config;
