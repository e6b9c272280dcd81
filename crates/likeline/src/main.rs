mod cli;
mod view;

use std::io;
use std::sync::Arc;

use clap::Parser;
use cli::{Opts, OptsCmd};
use likeline_client::error::{ApiError, PageError, ResolveError};
use likeline_client::{
    CancelScope, LikeResult, LikesClient, LikesPaginator, RepoApi, XrpcClient,
};
use likeline_core::RecordRef;
use serde::Serialize;
use snafu::{FromString, ResultExt, Snafu, Whatever};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;
use view::{AuthorView, LikeView, LikesView, PostView};

pub const LOG_TARGET: &str = "likeline::cli";

type WhateverResult<T> = std::result::Result<T, snafu::Whatever>;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Initialization error: {source}"))]
    Init { source: ApiError },
    #[snafu(display("Loading likes failed: {source}"))]
    Page { source: PageError },
    #[snafu(display("Resolution error: {source}"))]
    Resolve { source: ResolveError },
    #[snafu(display("Output error: {source}"))]
    Output { source: serde_json::Error },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let out = handle_cmd(opts).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context(OutputSnafu)?
    );
    Ok(())
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    let api: Arc<dyn RepoApi> =
        Arc::new(XrpcClient::new(opts.global.service.clone()).context(InitSnafu)?);
    let web_app = &opts.global.web_app;

    match opts.cmd {
        OptsCmd::Likes {
            handle,
            pages,
            page_size,
            context,
        } => {
            let client = LikesClient::builder()
                .api(api)
                .page_size(page_size)
                .build();
            let paginator = LikesPaginator::new(client);

            to_value(load_likes(&paginator, &handle, pages, context, web_app).await?)
        }
        OptsCmd::Post { uri, cid } => {
            let client = LikesClient::builder().api(api).build();
            let resolved = client
                .resolve_thread(&RecordRef::new(uri, cid), &CancelScope::new())
                .await
                .context(ResolveSnafu)?;

            to_value(PostView::new(resolved, &client, web_app))
        }
        OptsCmd::Profile { repo } => {
            let client = LikesClient::builder().api(api).build();
            let profile = client.resolve_profile(&repo).await;

            to_value(AuthorView::new(&profile, web_app))
        }
    }
}

/// Load up to `pages` pages of `repo`'s likes, stopping early at the end
async fn load_likes(
    paginator: &LikesPaginator,
    repo: &str,
    pages: usize,
    context: bool,
    web_app: &Url,
) -> CliResult<LikesView> {
    let mut outcome = paginator.start(repo).await.context(PageSnafu)?;
    let mut loaded = 1;
    while loaded < pages && paginator.has_more() {
        outcome = paginator.load_more().await.context(PageSnafu)?;
        loaded += 1;
    }
    debug!(target: LOG_TARGET, ?outcome, pages = loaded, "Finished loading");

    let timeline = paginator.timeline();
    info!(
        target: LOG_TARGET,
        %repo,
        likes = timeline.items.len(),
        failed = timeline.items.iter().filter(|item| !item.is_resolved()).count(),
        "Loaded likes"
    );

    let items = if context {
        let client = paginator.client();
        let scope = CancelScope::new();
        futures::future::join_all(
            timeline
                .items
                .into_iter()
                .map(|item| expand_like(client, item, &scope, web_app)),
        )
        .await
        .into_iter()
        .collect::<CliResult<Vec<_>>>()?
    } else {
        timeline.items.into_iter().map(LikeView::Plain).collect()
    };

    Ok(LikesView {
        repo: repo.to_owned(),
        status: paginator.status(),
        items,
        cursor: timeline.cursor,
    })
}

async fn expand_like(
    client: &LikesClient,
    item: LikeResult,
    scope: &CancelScope,
    web_app: &Url,
) -> CliResult<LikeView> {
    match item {
        LikeResult::Resolved { uri, post } => {
            let resolved = client
                .expand(uri, post, scope)
                .await
                .context(ResolveSnafu)?;
            Ok(LikeView::Expanded(PostView::new(resolved, client, web_app)))
        }
        failed @ LikeResult::Failed { .. } => Ok(LikeView::Plain(failed)),
    }
}

fn to_value(out: impl Serialize) -> CliResult<serde_json::Value> {
    serde_json::to_value(out).context(OutputSnafu)
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
