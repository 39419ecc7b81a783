// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model::User;

// === MODULE WIRING ===
pub mod module;
pub use module::{register_requests, UsersModule};

// === INTERNAL MODULES ===
// Exposed for integration tests; consumers go through `contract` and `module`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
