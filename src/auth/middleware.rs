//! Authentication middleware for commands.
//!
//! Handlers registered as authenticated never run unless the session's
//! current user resolves to a stored user; the resolved record is passed
//! to them as an extra argument.

use tracing::debug;

use super::Session;
use crate::commands::{AuthedHandler, Command, Context};
use crate::db::{Store, User};
use crate::{GatorError, Result};

/// Resolve the session's current user against the store.
///
/// Fails with [`GatorError::NotFound`] when nobody is logged in (without
/// querying the store) or when the named user no longer exists.
pub async fn current_user(store: &dyn Store, session: &Session) -> Result<User> {
    let name = session
        .current_user_name()
        .ok_or_else(|| GatorError::NotFound("current user".to_string()))?;

    store
        .get_user(name)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("user {name}")))
}

/// Run `handler` as the current user.
pub async fn logged_in(handler: AuthedHandler, ctx: &mut Context, cmd: &Command) -> Result<()> {
    let user = current_user(ctx.store.as_ref(), &ctx.session).await?;
    debug!(user = %user.name, command = %cmd.name, "Authenticated");
    handler(ctx, cmd, user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{Database, NewUser, SqlStore};

    async fn setup_store() -> SqlStore {
        SqlStore::new(Database::open_in_memory().await.unwrap())
    }

    fn session_for(name: &str) -> Session {
        let mut config = Config::default();
        config.current_user_name = name.to_string();
        Session::ephemeral(config)
    }

    #[tokio::test]
    async fn test_current_user_resolves() {
        let store = setup_store().await;
        let alice = store.create_user(&NewUser::new("alice")).await.unwrap();

        let user = current_user(&store, &session_for("alice")).await.unwrap();
        assert_eq!(user, alice);
    }

    #[tokio::test]
    async fn test_current_user_not_logged_in() {
        let store = setup_store().await;
        let result = current_user(&store, &session_for("")).await;

        match result {
            Err(GatorError::NotFound(what)) => assert_eq!(what, "current user"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_current_user_deleted() {
        let store = setup_store().await;
        store.create_user(&NewUser::new("alice")).await.unwrap();
        store.reset().await.unwrap();

        let result = current_user(&store, &session_for("alice")).await;
        match result {
            Err(GatorError::NotFound(what)) => assert_eq!(what, "user alice"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
