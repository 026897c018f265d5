//! `agg`: run the aggregation loop in the foreground.

use std::io::Write;

use super::{Command, Context, HandlerFuture};
use crate::datetime::{format_interval, parse_interval};
use crate::rss::{Aggregator, FeedFetcher, IngestionScheduler};
use crate::Result;

pub(super) fn agg<'a>(ctx: &'a mut Context, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_agg(ctx, cmd))
}

async fn handle_agg(ctx: &mut Context, cmd: &Command) -> Result<()> {
    let interval = parse_interval(cmd.required(0, "a scrape duration")?)?;
    let config = ctx.session.config();

    let fetcher = FeedFetcher::new(&config.fetch)?;
    let scheduler = IngestionScheduler::new(ctx.store.clone(), fetcher);
    let aggregator =
        Aggregator::new(scheduler, interval).with_policy(config.aggregate.on_fetch_error);

    writeln!(ctx.out, "Collecting feeds every {}", format_interval(interval))?;
    ctx.out.flush()?;

    aggregator.run(&ctx.shutdown).await
}
