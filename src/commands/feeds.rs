//! Feed commands: `addfeed`, `feeds`.

use std::io::Write;

use tracing::info;

use super::{Command, Context, HandlerFuture};
use crate::db::User;
use crate::rss::{validate_url, NewFeed, NewFeedFollow};
use crate::{GatorError, Result};

pub(super) fn add<'a>(ctx: &'a mut Context, cmd: &'a Command, user: User) -> HandlerFuture<'a> {
    Box::pin(handle_add(ctx, cmd, user))
}

pub(super) fn list<'a>(ctx: &'a mut Context, _cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_list(ctx))
}

async fn handle_add(ctx: &mut Context, cmd: &Command, user: User) -> Result<()> {
    let (Some(name), Some(url)) = (cmd.arg(0), cmd.arg(1)) else {
        return Err(GatorError::Validation(
            "must provide both a name and a url".to_string(),
        ));
    };
    validate_url(url)?;

    let feed = ctx
        .store
        .create_feed(&NewFeed::new(name, url).with_owner(user.id))
        .await
        .map_err(|e| match e {
            GatorError::Conflict(_) => GatorError::Conflict(format!("feed {url} already exists")),
            other => other,
        })?;
    ctx.store
        .create_feed_follow(&NewFeedFollow::new(user.id, feed.id))
        .await?;
    info!(feed_id = %feed.id, url = %feed.url, user = %user.name, "Added feed");

    writeln!(ctx.out, "feed {} has been added", feed.name)?;
    writeln!(ctx.out, "  id:   {}", feed.id)?;
    writeln!(ctx.out, "  url:  {}", feed.url)?;
    writeln!(ctx.out, "  user: {}", user.name)?;
    Ok(())
}

async fn handle_list(ctx: &mut Context) -> Result<()> {
    let feeds = ctx.store.list_feeds().await?;

    for feed in &feeds {
        match &feed.owner {
            Some(owner) => writeln!(ctx.out, "* {} ({}) added by {}", feed.name, feed.url, owner)?,
            None => writeln!(ctx.out, "* {} ({})", feed.name, feed.url)?,
        }
    }
    Ok(())
}
