// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Branch listing traversal for a single repository.
///
/// Walks every page of the branch listing, runs the
/// [`BranchCommitFetcher`] for each branch and folds the results into one
/// [`CommitResults`]. Pages and branches are processed strictly in sequence.
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::Error,
    fetcher::BranchCommitFetcher,
    link::{PageCursor, parse_link_header},
    model::{Branch, CommitResults},
    transport::{DecodePolicy, HostingApi},
};

/// Branches requested per listing page.
pub const BRANCHES_PER_PAGE: u32 = 100;

/// Parameters of a single repository walk.
#[derive(Debug, Clone,)]
pub struct WalkRequest<'a,>
{
    /// Root of the REST API, used for follow-up pages.
    pub api_server:    &'a Url,
    /// `{api_server}/repos/{owner}/{repo}`.
    pub api_base:      &'a Url,
    /// Active interval.
    pub interval:      Duration,
    /// Handling of undecodable bodies.
    pub decode_policy: DecodePolicy,
}

/// Walks every branch of a repository and returns the folded totals.
///
/// The first page is requested from `{api_base}/branches`; its `Link` header
/// decides whether further pages are requested from
/// `{api_server}/repositories/{id}/branches`. A header that does not yield a
/// cursor limits the walk to the first page.
///
/// # Errors
///
/// The first failing listing request or branch fetch aborts the walk and is
/// returned as is. Callers must not treat the partial totals accumulated so
/// far as a result, and none are returned.
pub async fn walk_branches<A,>(api: &A, request: &WalkRequest<'_,>,) -> Result<CommitResults, Error,>
where
    A: HostingApi + ?Sized,
{
    let fetcher =
        BranchCommitFetcher::new(api, request.api_base, request.interval, request.decode_policy,);

    let mut totals = CommitResults::default();
    let mut page_url = first_page_url(request.api_base,)?;
    let mut cursor: Option<PageCursor,> = None;
    let mut first_page = true;
    let mut pages = 0u32;

    loop {
        debug!("requesting branch page {page_url}");
        let response = api.get(&page_url,).await?.ensure_success(&page_url,)?;
        pages += 1;

        if first_page {
            first_page = false;
            cursor = response.link.as_deref().and_then(parse_link_header,);
            if cursor.is_none() {
                debug!("no pagination cursor for {page_url}, treating listing as a single page");
            }
        }

        let branches: Vec<Branch,> = response.decode_list(request.decode_policy, &page_url,)?;
        for branch in &branches {
            let branch_results = fetcher.fetch(&branch.name,).await?;
            totals.fold_branch(&branch_results,);
        }

        let Some(next,) = cursor.as_mut().and_then(|cursor| {
            let collection_id = cursor.collection_id;
            cursor.advance().map(|page| (collection_id, page,),)
        },) else {
            break;
        };
        page_url = follow_up_page_url(request.api_server, next.0, next.1,)?;
    }

    totals.stamp(Utc::now(),);
    info!(
        pages,
        branches = totals.branches_count,
        commits = totals.commits,
        committers = totals.committers,
        stale_branches = totals.stale_branches_count,
        "walked branch listing"
    );
    Ok(totals,)
}

/// Builds `{api_base}/branches?per_page=100`.
fn first_page_url(api_base: &Url,) -> Result<Url, Error,>
{
    let mut url = api_base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::request_build(format!("{api_base} cannot be a base URL"),),)?
        .pop_if_empty()
        .push("branches",);
    url.query_pairs_mut().append_pair("per_page", &BRANCHES_PER_PAGE.to_string(),);
    Ok(url,)
}

/// Builds `{api_server}/repositories/{id}/branches?per_page=100&page={page}`.
fn follow_up_page_url(api_server: &Url, collection_id: u64, page: u32,) -> Result<Url, Error,>
{
    let collection = collection_id.to_string();
    let mut url = api_server.clone();
    url.path_segments_mut()
        .map_err(|_| Error::request_build(format!("{api_server} cannot be a base URL"),),)?
        .pop_if_empty()
        .extend(["repositories", collection.as_str(), "branches",],);
    url.query_pairs_mut()
        .append_pair("per_page", &BRANCHES_PER_PAGE.to_string(),)
        .append_pair("page", &page.to_string(),);
    Ok(url,)
}
