// Application layer: the ledger service, its error taxonomy, and the shared
// report aggregation consumed by every renderer.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
