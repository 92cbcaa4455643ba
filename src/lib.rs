//! Commit activity statistics for GitHub repositories.
//!
//! The library walks the paginated branch listing of every configured
//! repository, fetches each branch's recent commit history and folds the
//! per-branch counters into one [`CommitResults`] per repository. Collection
//! cycles are triggered externally through [`Collector::run_cycle`]; the
//! library performs no scheduling of its own.

mod aggregator;
mod config;
mod error;
mod fetcher;
mod link;
mod model;
mod transport;
mod walker;

pub use aggregator::{
    Collector, CycleOutcome, RepositoryFailure, RepositoryReport, collect_repository,
};
pub use config::{
    DEFAULT_API_SERVER, DEFAULT_INTERVAL, OrganizationEntry, RepositoryTarget, StatsConfig, Token, load_config,
    parse_config,
};
pub use error::{Error, io_error};
pub use fetcher::{ActivityWindow, BranchCommitFetcher, STALENESS_WINDOW_HOURS, summarize_commits};
pub use link::{PageCursor, parse_link_header};
pub use model::{Branch, BranchHead, Commit, CommitAuthor, CommitDetails, CommitResults};
pub use transport::{ApiResponse, DecodePolicy, GITHUB_V3_MEDIA_TYPE, GitHubClient, HostingApi};
pub use walker::{BRANCHES_PER_PAGE, WalkRequest, walk_branches};
