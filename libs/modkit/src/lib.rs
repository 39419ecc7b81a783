//! # ModKit - request pipeline kit
//!
//! Building blocks shared by every feature module:
//!
//! - **Dispatch**: typed requests routed to exactly one registered handler
//! - **Validation**: field-level rules evaluated in full before any handler runs
//! - **Problem envelope**: the stable JSON shape of every failed request
//! - **Error layer**: the single place where failures become HTTP status codes
//!
//! ## Example
//!
//! ```rust,ignore
//! use modkit::{Dispatcher, Request, RequestHandler};
//!
//! let dispatcher = Dispatcher::builder()
//!     .handler::<CreateUser, _>(CreateUserHandler)?
//!     .validator::<CreateUser, _>(CreateUserValidator)
//!     .build();
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod dispatch;
pub mod validation;

pub use api::problem::{internal_error, Problem, ProblemResponse};
pub use api::RequestCancellation;
pub use dispatch::{
    DispatchError, Dispatcher, DispatcherBuilder, RegistryError, Request, RequestHandler,
};
pub use validation::{RuleSet, Validator, Violation, Violations};
