// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Per-branch commit activity.
//!
//! A single commit listing request per branch, filtered server-side to the
//! staleness window, serves both the activity counters and the staleness
//! check.

use std::{collections::HashSet, time::Duration};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use tracing::debug;
use url::Url;

use crate::{
    error::Error,
    model::{Commit, CommitResults},
    transport::{DecodePolicy, HostingApi},
};

/// Length of the staleness window in hours, roughly three months.
pub const STALENESS_WINDOW_HOURS: i64 = 2160;

/// Cutoffs used to classify the commits of one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct ActivityWindow
{
    /// Reference time.
    pub now:          DateTime<Utc,>,
    /// Commits authored strictly after this instant are active.
    pub active_since: DateTime<Utc,>,
    /// A branch with no commit strictly after this instant is stale.
    pub stale_since:  DateTime<Utc,>,
}

impl ActivityWindow
{
    /// Builds the windows ending at `now` for the given active interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `interval` is zero or too large to
    /// be represented as a calendar offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use chrono::{TimeZone, Utc};
    /// use github_stats::ActivityWindow;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0,).unwrap();
    /// let window = ActivityWindow::ending_at(now, Duration::from_secs(3600,),).unwrap();
    /// assert_eq!(window.active_since, Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0,).unwrap());
    /// ```
    pub fn ending_at(now: DateTime<Utc,>, interval: Duration,) -> Result<Self, Error,>
    {
        if interval.is_zero() {
            return Err(Error::validation("interval must be greater than zero",),);
        }
        let interval = TimeDelta::from_std(interval,)
            .map_err(|_| Error::validation("interval is out of range",),)?;
        let active_since = now
            .checked_sub_signed(interval,)
            .ok_or_else(|| Error::validation("interval is out of range",),)?;
        let stale_since = now - TimeDelta::hours(STALENESS_WINDOW_HOURS,);

        Ok(Self {
            now,
            active_since,
            stale_since,
        },)
    }
}

/// Classifies `commits`, in the order received, against `window`.
///
/// The result never sets `branches_count` or `timestamp`; both belong to
/// the repository level.
pub fn summarize_commits(commits: &[Commit], window: &ActivityWindow,) -> CommitResults
{
    let mut results = CommitResults::default();
    let mut authors: HashSet<&str,> = HashSet::new();
    let mut stale = true;

    for commit in commits {
        let authored_at = commit.authored_at();

        if authored_at > window.active_since {
            results.commits = results.commits.saturating_add(1,);
            authors.insert(commit.author_name(),);
        }

        if stale && authored_at > window.stale_since {
            stale = false;
        }
    }

    results.committers = u32::try_from(authors.len(),).unwrap_or(u32::MAX,);
    results.stale_branches_count = u32::from(stale,);
    results
}

/// Fetches and summarizes the commit history of branches in one repository.
pub struct BranchCommitFetcher<'api, A: ?Sized,>
{
    api:           &'api A,
    api_base:      &'api Url,
    interval:      Duration,
    decode_policy: DecodePolicy,
}

impl<'api, A,> BranchCommitFetcher<'api, A,>
where
    A: HostingApi + ?Sized,
{
    /// Creates a fetcher for the repository at `api_base`.
    pub fn new(
        api: &'api A,
        api_base: &'api Url,
        interval: Duration,
        decode_policy: DecodePolicy,
    ) -> Self
    {
        Self {
            api,
            api_base,
            interval,
            decode_policy,
        }
    }

    /// Summarizes `branch` against windows ending at the current time.
    ///
    /// # Errors
    ///
    /// Returns the transport, status, or decode error that aborted the
    /// request. No partial result is produced.
    pub async fn fetch(&self, branch: &str,) -> Result<CommitResults, Error,>
    {
        let window = ActivityWindow::ending_at(Utc::now(), self.interval,)?;
        self.fetch_within(branch, &window,).await
    }

    /// Summarizes `branch` against an explicit window.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn fetch_within(
        &self,
        branch: &str,
        window: &ActivityWindow,
    ) -> Result<CommitResults, Error,>
    {
        let url = commits_url(self.api_base, branch, window.stale_since,)?;
        let response = self.api.get(&url,).await?.ensure_success(&url,)?;
        let commits: Vec<Commit,> = response.decode_list(self.decode_policy, &url,)?;

        let results = summarize_commits(&commits, window,);
        debug!(
            branch,
            received = commits.len(),
            commits = results.commits,
            committers = results.committers,
            stale = results.stale_branches_count == 1,
            "summarized branch"
        );
        Ok(results,)
    }
}

/// Builds `{api_base}/commits?sha={branch}&since={since}`.
fn commits_url(api_base: &Url, branch: &str, since: DateTime<Utc,>,) -> Result<Url, Error,>
{
    let mut url = api_base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::request_build(format!("{api_base} cannot be a base URL"),),)?
        .pop_if_empty()
        .push("commits",);
    url.query_pairs_mut()
        .append_pair("sha", branch,)
        .append_pair("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true,),);
    Ok(url,)
}

#[cfg(test)]
mod tests
{
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use url::Url;

    use super::{ActivityWindow, BranchCommitFetcher, STALENESS_WINDOW_HOURS, summarize_commits};
    use crate::{
        error::Error,
        model::{Commit, CommitAuthor, CommitDetails},
        transport::{ApiResponse, DecodePolicy, fake::ScriptedApi},
    };

    fn now() -> DateTime<Utc,>
    {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0,).unwrap()
    }

    fn window() -> ActivityWindow
    {
        ActivityWindow::ending_at(now(), Duration::from_secs(3600,),).expect("valid window",)
    }

    fn commit(author: &str, date: DateTime<Utc,>,) -> Commit
    {
        Commit {
            sha:    format!("{author}-{}", date.timestamp()),
            commit: CommitDetails {
                author: CommitAuthor {
                    name: author.to_owned(), date,
                },
            },
        }
    }

    fn commits_json(commits: &[(&str, DateTime<Utc,>,)],) -> String
    {
        let entries: Vec<serde_json::Value,> = commits
            .iter()
            .enumerate()
            .map(|(index, (author, date,),)| {
                serde_json::json!({
                    "sha": format!("sha{index}"),
                    "commit": {"author": {"name": author, "date": date.to_rfc3339()}}
                })
            },)
            .collect();
        serde_json::Value::Array(entries,).to_string()
    }

    fn api_base() -> Url
    {
        Url::parse("https://api.github.com/repos/octo/repo",).expect("valid url",)
    }

    #[test]
    fn window_uses_interval_and_fixed_staleness()
    {
        let window = window();
        assert_eq!(window.active_since, now() - TimeDelta::hours(1,));
        assert_eq!(window.stale_since, now() - TimeDelta::hours(STALENESS_WINDOW_HOURS,));
    }

    #[test]
    fn window_rejects_zero_interval()
    {
        assert!(ActivityWindow::ending_at(now(), Duration::ZERO).is_err());
    }

    #[test]
    fn active_window_boundary_is_exclusive()
    {
        let window = window();
        let commits = [
            commit("at-boundary", window.active_since,),
            commit("inside", window.active_since + TimeDelta::seconds(1,),),
            commit("before", window.active_since - TimeDelta::minutes(5,),),
        ];

        let results = summarize_commits(&commits, &window,);
        assert_eq!(results.commits, 1);
        assert_eq!(results.committers, 1);
    }

    #[test]
    fn committers_are_distinct_author_names()
    {
        let window = window();
        let recent = now() - TimeDelta::minutes(10,);
        let commits = [commit("A", recent,), commit("A", recent,), commit("B", recent,)];

        let results = summarize_commits(&commits, &window,);
        assert_eq!(results.commits, 3);
        assert_eq!(results.committers, 2);
    }

    #[test]
    fn author_names_are_case_sensitive()
    {
        let window = window();
        let recent = now() - TimeDelta::minutes(1,);
        let commits = [commit("alice", recent,), commit("Alice", recent,)];

        assert_eq!(summarize_commits(&commits, &window).committers, 2);
    }

    #[test]
    fn commit_at_staleness_cutoff_leaves_branch_stale()
    {
        let window = window();
        let commits = [commit("A", window.stale_since,), commit("B", window.stale_since - TimeDelta::days(1,),)];

        let results = summarize_commits(&commits, &window,);
        assert_eq!(results.stale_branches_count, 1);
        assert_eq!(results.commits, 0);
    }

    #[test]
    fn commit_after_staleness_cutoff_marks_branch_active()
    {
        let window = window();
        let commits = [
            commit("A", window.stale_since - TimeDelta::days(3,),),
            commit("B", window.stale_since + TimeDelta::seconds(1,),),
        ];

        let results = summarize_commits(&commits, &window,);
        assert_eq!(results.stale_branches_count, 0);
        assert_eq!(results.commits, 0, "old activity is outside the active interval");
    }

    #[test]
    fn empty_history_is_stale()
    {
        let results = summarize_commits(&[], &window(),);
        assert_eq!(results.commits, 0);
        assert_eq!(results.committers, 0);
        assert_eq!(results.stale_branches_count, 1);
        assert_eq!(results.branches_count, 0);
    }

    #[tokio::test]
    async fn fetch_requests_history_since_staleness_cutoff()
    {
        let api = ScriptedApi::default();
        let recent = now() - TimeDelta::minutes(30,);
        api.respond(
            "/repos/octo/repo/commits?sha=feature%2Flogin",
            ApiResponse::ok(commits_json(&[("A", recent,), ("B", recent,)],),),
        );

        let base = api_base();
        let fetcher = BranchCommitFetcher::new(&api, &base, Duration::from_secs(3600,), DecodePolicy::Lenient,);
        let results = fetcher.fetch_within("feature/login", &window(),).await.expect("fetch succeeds",);

        assert_eq!(results.commits, 2);
        assert_eq!(results.committers, 2);
        assert_eq!(results.stale_branches_count, 0);

        let urls = api.urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0],
            "https://api.github.com/repos/octo/repo/commits?sha=feature%2Flogin&since=2024-03-03T12%3A00%3A00Z"
        );
    }

    #[tokio::test]
    async fn non_success_status_aborts_branch()
    {
        let api = ScriptedApi::default();
        api.respond(
            "/repos/octo/repo/commits?sha=main",
            ApiResponse {
                status: 409, link: None, body: "{\"message\":\"Git Repository is empty.\"}".to_owned(),
            },
        );

        let base = api_base();
        let fetcher = BranchCommitFetcher::new(&api, &base, Duration::from_secs(3600,), DecodePolicy::Lenient,);
        let error = fetcher.fetch_within("main", &window(),).await.expect_err("expected failure",);
        assert!(matches!(error, Error::HttpStatus { status: 409, .. }));
    }

    #[tokio::test]
    async fn lenient_decode_treats_malformed_history_as_empty()
    {
        let api = ScriptedApi::default();
        api.respond("/repos/octo/repo/commits?sha=main", ApiResponse::ok("{\"unexpected\":true}",),);

        let base = api_base();
        let fetcher = BranchCommitFetcher::new(&api, &base, Duration::from_secs(3600,), DecodePolicy::Lenient,);
        let results = fetcher.fetch_within("main", &window(),).await.expect("lenient fetch",);

        assert_eq!(results.commits, 0);
        assert_eq!(results.committers, 0);
        assert_eq!(results.stale_branches_count, 1);
    }

    #[tokio::test]
    async fn strict_decode_surfaces_malformed_history()
    {
        let api = ScriptedApi::default();
        api.respond("/repos/octo/repo/commits?sha=main", ApiResponse::ok("not json",),);

        let base = api_base();
        let fetcher = BranchCommitFetcher::new(&api, &base, Duration::from_secs(3600,), DecodePolicy::Strict,);
        let error = fetcher.fetch_within("main", &window(),).await.expect_err("expected decode failure",);
        assert!(matches!(error, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn fetch_uses_current_time()
    {
        let api = ScriptedApi::default();
        let recent = Utc::now() - TimeDelta::minutes(5,);
        let old = Utc::now() - TimeDelta::hours(5,);
        api.respond(
            "/repos/octo/repo/commits?sha=main",
            ApiResponse::ok(commits_json(&[("A", recent,), ("B", old,)],),),
        );

        let base = api_base();
        let fetcher = BranchCommitFetcher::new(&api, &base, Duration::from_secs(3600,), DecodePolicy::Lenient,);
        let results = fetcher.fetch("main",).await.expect("fetch succeeds",);
        assert_eq!(results.commits, 1);
        assert_eq!(results.committers, 1);
        assert_eq!(results.stale_branches_count, 0);
    }
}
