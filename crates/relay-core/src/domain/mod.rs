//! Domain model (request, cancellation, errors, ids).

pub mod cancel;
pub mod errors;
pub mod ids;
pub mod request;

pub use self::cancel::{CancellationSignal, CancellationSource};
pub use self::errors::{BoxError, DispatchError, ErrorKind, FactoryError};
pub use self::ids::DispatchId;
pub use self::request::{AnyRequest, AnyResponse, Request};
