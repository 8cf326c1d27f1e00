//! # Lariat Client
//!
//! The streaming HTTP side of Lariat: a thin transport that opens the
//! form-encoded POST and classifies HTTP statuses, and the request
//! coordinator that owns conversation state, single-flight discipline, and
//! the two cancellation domains.

pub mod catalog;
pub mod coordinator;
pub mod transport;

pub use catalog::ModelCatalog;
pub use coordinator::RequestCoordinator;
pub use transport::{ChunkStream, HttpTransport, StreamTransport};
