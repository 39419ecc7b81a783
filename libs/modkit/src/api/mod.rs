//! HTTP boundary of the request pipeline: the error envelope, failure translation,
//! response helpers and per-request cancellation.

pub mod cancel;
pub mod error_layer;
pub mod problem;
pub mod response;

pub use cancel::RequestCancellation;
pub use error_layer::{
    handle_panic, map_dispatch_error, map_json_rejection, map_transport_status,
    translate_transport_errors,
};
