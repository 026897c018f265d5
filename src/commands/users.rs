//! User commands: `login`, `register`, `reset`, `users`.

use std::io::Write;

use tracing::info;

use super::{Command, Context, HandlerFuture};
use crate::db::NewUser;
use crate::{GatorError, Result};

pub(super) fn login<'a>(ctx: &'a mut Context, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_login(ctx, cmd))
}

pub(super) fn register<'a>(ctx: &'a mut Context, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_register(ctx, cmd))
}

pub(super) fn reset<'a>(ctx: &'a mut Context, _cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_reset(ctx))
}

pub(super) fn list<'a>(ctx: &'a mut Context, _cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_list(ctx))
}

async fn handle_login(ctx: &mut Context, cmd: &Command) -> Result<()> {
    let name = cmd.required(0, "username")?;

    let user = ctx
        .store
        .get_user(name)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("user {name}")))?;

    ctx.session.set_current_user(&user.name)?;
    writeln!(ctx.out, "user {} has been set", user.name)?;
    Ok(())
}

async fn handle_register(ctx: &mut Context, cmd: &Command) -> Result<()> {
    let name = cmd.required(0, "username")?;

    let user = ctx
        .store
        .create_user(&NewUser::new(name))
        .await
        .map_err(|e| match e {
            GatorError::Conflict(_) => GatorError::Conflict(format!("user {name} already exists")),
            other => other,
        })?;
    info!(user = %user.name, id = %user.id, "Registered user");

    ctx.session.set_current_user(&user.name)?;
    writeln!(ctx.out, "user {} has been created", user.name)?;
    writeln!(ctx.out, "  id:         {}", user.id)?;
    writeln!(ctx.out, "  created_at: {}", user.created_at.to_rfc3339())?;
    Ok(())
}

async fn handle_reset(ctx: &mut Context) -> Result<()> {
    ctx.store.reset().await?;
    info!("Deleted all users, feeds, follows and posts");
    writeln!(ctx.out, "Deletion successful")?;
    Ok(())
}

async fn handle_list(ctx: &mut Context) -> Result<()> {
    let users = ctx.store.list_users().await?;
    let current = ctx.session.current_user_name();

    for user in &users {
        if Some(user.name.as_str()) == current {
            writeln!(ctx.out, "* {} (current)", user.name)?;
        } else {
            writeln!(ctx.out, "* {}", user.name)?;
        }
    }
    Ok(())
}
