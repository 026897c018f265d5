//! Follow commands: `follow`, `following`, `unfollow`.

use std::io::Write;

use super::{Command, Context, HandlerFuture};
use crate::db::User;
use crate::rss::NewFeedFollow;
use crate::{GatorError, Result};

pub(super) fn follow<'a>(ctx: &'a mut Context, cmd: &'a Command, user: User) -> HandlerFuture<'a> {
    Box::pin(handle_follow(ctx, cmd, user))
}

pub(super) fn following<'a>(
    ctx: &'a mut Context,
    _cmd: &'a Command,
    user: User,
) -> HandlerFuture<'a> {
    Box::pin(handle_following(ctx, user))
}

pub(super) fn unfollow<'a>(
    ctx: &'a mut Context,
    cmd: &'a Command,
    user: User,
) -> HandlerFuture<'a> {
    Box::pin(handle_unfollow(ctx, cmd, user))
}

async fn handle_follow(ctx: &mut Context, cmd: &Command, user: User) -> Result<()> {
    let url = cmd.required(0, "url")?;

    let feed = ctx
        .store
        .get_feed_by_url(url)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("feed {url}")))?;

    let follow = ctx
        .store
        .create_feed_follow(&NewFeedFollow::new(user.id, feed.id))
        .await?;

    writeln!(
        ctx.out,
        "feed name: {}, feed user: {}",
        follow.feed_name, follow.user_name
    )?;
    Ok(())
}

async fn handle_following(ctx: &mut Context, user: User) -> Result<()> {
    let follows = ctx.store.list_feed_follows(&user.name).await?;
    for follow in &follows {
        writeln!(ctx.out, "{}", follow.feed_name)?;
    }
    Ok(())
}

async fn handle_unfollow(ctx: &mut Context, cmd: &Command, user: User) -> Result<()> {
    let url = cmd.required(0, "a feed url")?;

    if !ctx.store.delete_feed_follow(user.id, url).await? {
        return Err(GatorError::NotFound(format!("follow of {url}")));
    }

    writeln!(ctx.out, "{} unfollowed {}", user.name, url)?;
    Ok(())
}
