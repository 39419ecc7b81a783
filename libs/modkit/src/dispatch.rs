//! In-process request dispatch.
//!
//! A [`Dispatcher`] routes a typed [`Request`] to the single [`RequestHandler`] registered
//! for its type. Before the handler runs, every [`Validator`] registered for that type is
//! evaluated and all of their violations are collected; a non-empty set aborts the call.
//!
//! Registration happens once at startup through [`DispatcherBuilder`]. The built dispatcher
//! is immutable, so it is shared behind an `Arc` without any locking.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::builder()
//!     .handler::<GetUsers, _>(GetUsersHandler::new(repo))?
//!     .build();
//! let users = dispatcher.send(GetUsers, &cancel).await?;
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::validation::{Validator, Violations};

/// A command or query. Each request type names the response its handler produces.
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// Business logic for one request type.
///
/// Handlers receive requests that already passed validation and must not report
/// validation failures themselves.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    async fn handle(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, DispatchError>;
}

/// Failure of a single `send`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The request broke one or more validation rules; the handler was not invoked.
    #[error("request validation failed: {0}")]
    Validation(Violations),

    /// No handler was registered for the request type.
    #[error("no handler registered for request type `{request}`")]
    NoHandler { request: &'static str },

    /// The caller went away before the work completed.
    #[error("request cancelled")]
    Cancelled,

    /// Unexpected fault inside a handler.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Startup-time registration failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate handler registered for request type `{request}`")]
    DuplicateHandler { request: &'static str },

    #[error("no handler registered for request type `{request}`")]
    MissingHandler { request: &'static str },
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Type-erased registry slot. `value` holds `Arc<dyn RequestHandler<R>>` for handlers and
/// `Vec<Arc<dyn Validator<R>>>` for validator chains.
struct Slot {
    request: &'static str,
    value: Boxed,
}

/// Collects handlers and validators, then freezes them into a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<TypeId, Slot>,
    validators: HashMap<TypeId, Slot>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `R`. A second handler for the same type is rejected.
    pub fn handler<R, H>(mut self, handler: H) -> Result<Self, RegistryError>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let key = TypeId::of::<R>();
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::DuplicateHandler {
                request: type_name::<R>(),
            });
        }
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.handlers.insert(
            key,
            Slot {
                request: type_name::<R>(),
                value: Box::new(handler),
            },
        );
        Ok(self)
    }

    /// Append a validator to the chain for `R`. Validators run in registration order.
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R>,
    {
        let slot = self.validators.entry(TypeId::of::<R>()).or_insert_with(|| Slot {
            request: type_name::<R>(),
            value: Box::new(Vec::<Arc<dyn Validator<R>>>::new()),
        });
        if let Some(chain) = slot.value.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            chain.push(Arc::new(validator));
        }
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            handlers: self.handlers,
            validators: self.validators,
        }
    }
}

/// Routes requests to their handlers. Stateless per call.
pub struct Dispatcher {
    handlers: HashMap<TypeId, Slot>,
    validators: HashMap<TypeId, Slot>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn has_handler<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Fail fast at startup when an endpoint depends on a request nobody handles.
    pub fn ensure_handler<R: Request>(&self) -> Result<(), RegistryError> {
        if self.has_handler::<R>() {
            Ok(())
        } else {
            Err(RegistryError::MissingHandler {
                request: type_name::<R>(),
            })
        }
    }

    /// Run every validator registered for `R` and collect all violations.
    pub fn validate<R: Request>(&self, request: &R) -> Violations {
        let mut violations = Violations::new();
        let chain = self
            .validators
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.value.downcast_ref::<Vec<Arc<dyn Validator<R>>>>());
        if let Some(chain) = chain {
            for validator in chain {
                violations.extend(validator.validate(request));
            }
        }
        violations
    }

    /// Validate `request` in full, then hand it to its handler exactly once.
    #[instrument(name = "dispatch", skip_all, fields(request = short_type_name::<R>()))]
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, DispatchError> {
        let handler = self.resolve::<R>()?;

        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        let violations = self.validate(&request);
        if !violations.is_empty() {
            debug!(violations = violations.len(), "request rejected by validation");
            return Err(DispatchError::Validation(violations));
        }

        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        debug!("request validated, invoking handler");
        handler.handle(request, cancel).await
    }

    fn resolve<R: Request>(&self) -> Result<Arc<dyn RequestHandler<R>>, DispatchError> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.value.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
            .ok_or(DispatchError::NoHandler {
                request: type_name::<R>(),
            })
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&str> = self.handlers.values().map(|s| s.request).collect();
        handlers.sort_unstable();
        let mut validated: Vec<&str> = self.validators.values().map(|s| s.request).collect();
        validated.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("handlers", &handlers)
            .field("validated", &validated)
            .finish()
    }
}

/// Last path segment of a type name: "users::domain::requests::CreateUser" -> "CreateUser".
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
