//! Formula 1 data access.
//!
//! Fetches season calendars, session timing and circuit layouts from public
//! sources, normalizes them into small tables, and memoizes each operation
//! for an hour.
//!
//! [`F1DataService`] is the entry point. Its operations return
//! `Result<_, FetchError>`; [`or_empty`] turns a failure into a logged,
//! empty result for callers that just want something to render.

pub mod cache;
pub mod circuits;
pub mod error;
pub mod format;
pub mod layouts;
pub mod mock;
pub mod openf1;
pub mod service;
pub mod session;
pub mod source;

pub use circuits::{CircuitRecord, CircuitTable};
pub use error::{ErrorKind, FetchError, or_empty};
pub use layouts::{CircuitGeometry, CircuitGeometryTable};
pub use service::{F1DataService, ServiceConfig};
pub use session::{Session, SessionKey, SessionType};
