use clap::{Args, Parser, Subcommand};
use likeline_core::AtUri;
use url::Url;

/// Resolve the posts a Bluesky account liked
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service hosting the repositories (PDS or AppView)
    #[arg(
        env = "LIKELINE_SERVICE",
        long,
        global = true,
        default_value = likeline_client::xrpc::DEFAULT_SERVICE
    )]
    pub service: Url,

    /// Web app used to build links to posts and profiles
    #[arg(
        env = "LIKELINE_WEB_APP",
        long,
        global = true,
        default_value = "https://bsky.app"
    )]
    pub web_app: Url,
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// List the posts liked by an account, newest like first
    Likes {
        /// Handle or DID of the account
        handle: String,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,

        #[arg(long, default_value_t = likeline_client::DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Also resolve authors, reply parents and quoted posts
        #[arg(long)]
        context: bool,
    },
    /// Resolve a single post with its author, reply parent and quoted post
    Post {
        uri: AtUri,

        /// Only accept this exact version of the record
        #[arg(long)]
        cid: Option<String>,
    },
    /// Resolve the profile of an account
    Profile {
        /// Handle or DID of the account
        repo: String,
    },
}
