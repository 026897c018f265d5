//! `browse`: recent posts from followed feeds.

use std::io::Write;

use super::{Command, Context, HandlerFuture};
use crate::datetime::format_utc_datetime;
use crate::db::User;
use crate::{GatorError, Result};

/// Number of posts shown when no limit is given.
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M %Z";

pub(super) fn browse<'a>(ctx: &'a mut Context, cmd: &'a Command, user: User) -> HandlerFuture<'a> {
    Box::pin(handle_browse(ctx, cmd, user))
}

/// Parse the optional post-count argument.
fn parse_limit(arg: Option<&str>) -> Result<i64> {
    let Some(arg) = arg else {
        return Ok(DEFAULT_BROWSE_LIMIT);
    };
    match arg.trim().parse::<i64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        Ok(_) => Err(GatorError::Validation(format!(
            "limit must be positive, got {arg}"
        ))),
        Err(_) => Err(GatorError::Validation(format!("invalid limit: {arg}"))),
    }
}

async fn handle_browse(ctx: &mut Context, cmd: &Command, user: User) -> Result<()> {
    let limit = parse_limit(cmd.arg(0))?;
    let posts = ctx.store.list_posts_for_user(user.id, limit).await?;
    let timezone = ctx.session.config().display.timezone.clone();

    writeln!(ctx.out, "Found {} posts for user {}:", posts.len(), user.name)?;
    for post in &posts {
        let published = post
            .published_at
            .map(|dt| format_utc_datetime(&dt, &timezone, DATE_FORMAT))
            .unwrap_or_else(|| "unknown date".to_string());

        writeln!(ctx.out, "{} from {}", published, post.feed_name)?;
        writeln!(ctx.out, "--- {} ---", post.title)?;
        if let Some(description) = &post.description {
            writeln!(ctx.out, "    {description}")?;
        }
        writeln!(ctx.out, "Link: {}", post.url)?;
        writeln!(ctx.out, "=====================================")?;
    }
    Ok(())
}
