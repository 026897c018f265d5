//! Command registry and dispatch.
//!
//! Every CLI command is a handler registered under its name. A handler is
//! either public or authenticated; authenticated handlers are run through
//! [`logged_in`](crate::auth::logged_in) and receive the current user as
//! an extra argument.

mod aggregate;
mod feeds;
mod follows;
mod posts;
mod users;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::auth::{logged_in, Session};
use crate::db::{Store, User};
use crate::shutdown::Shutdown;
use crate::{GatorError, Result};

/// A parsed command line: the command name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<String>,
}

impl Command {
    /// Create a new command.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Argument at `index`, or a validation error naming what is missing.
    fn required(&self, index: usize, what: &str) -> Result<&str> {
        self.arg(index)
            .ok_or_else(|| GatorError::Validation(format!("must provide {what}")))
    }
}

/// Everything a handler can reach.
pub struct Context {
    /// Persistent storage.
    pub store: Arc<dyn Store>,
    /// Configuration and current user.
    pub session: Session,
    /// Fires when the process is asked to stop.
    pub shutdown: Shutdown,
    /// Where command output goes.
    pub out: Box<dyn Write + Send>,
}

impl Context {
    /// Create a context writing to stdout that is never shut down.
    pub fn new(store: Arc<dyn Store>, session: Session) -> Self {
        Self {
            store,
            session,
            shutdown: Shutdown::never(),
            out: Box::new(std::io::stdout()),
        }
    }

    /// Redirect command output.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    /// Use the given shutdown signal.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Future returned by handlers.
pub type HandlerFuture<'a> = BoxFuture<'a, Result<()>>;

/// A handler that runs without a current user.
pub type PublicHandler = for<'a> fn(&'a mut Context, &'a Command) -> HandlerFuture<'a>;

/// A handler that runs as the current user.
pub type AuthedHandler = for<'a> fn(&'a mut Context, &'a Command, User) -> HandlerFuture<'a>;

/// A registered handler.
#[derive(Clone, Copy)]
pub enum Handler {
    /// Runs for anyone.
    Public(PublicHandler),
    /// Requires a logged-in user.
    Authenticated(AuthedHandler),
}

impl Handler {
    /// Whether the handler requires a current user.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Handler::Authenticated(_))
    }
}

/// Name-to-handler mapping.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, Handler>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every gator command.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("login", Handler::Public(users::login));
        registry.register("register", Handler::Public(users::register));
        registry.register("reset", Handler::Public(users::reset));
        registry.register("users", Handler::Public(users::list));
        registry.register("agg", Handler::Public(aggregate::agg));
        registry.register("addfeed", Handler::Authenticated(feeds::add));
        registry.register("feeds", Handler::Public(feeds::list));
        registry.register("follow", Handler::Authenticated(follows::follow));
        registry.register("following", Handler::Authenticated(follows::following));
        registry.register("unfollow", Handler::Authenticated(follows::unfollow));
        registry.register("browse", Handler::Authenticated(posts::browse));
        registry
    }

    /// Register `handler` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look a handler up by name.
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch `cmd`.
    ///
    /// Unknown names fail with [`GatorError::NotFound`] before anything
    /// else happens. Handler errors are returned unchanged.
    pub async fn run(&self, ctx: &mut Context, cmd: &Command) -> Result<()> {
        let handler = self
            .get(&cmd.name)
            .ok_or_else(|| GatorError::NotFound(format!("command {}", cmd.name)))?;

        debug!(command = %cmd.name, args = ?cmd.args, "Dispatching command");
        match handler {
            Handler::Public(handler) => handler(ctx, cmd).await,
            Handler::Authenticated(handler) => logged_in(handler, ctx, cmd).await,
        }
    }
}
