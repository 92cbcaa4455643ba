// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Data carried between the walker, the fetcher and report consumers.
//!
//! [`Branch`] and [`Commit`] mirror the fragments of the GitHub REST payloads
//! the collector reads; every other field of those payloads is ignored.
//! [`CommitResults`] is the value produced per branch and folded per
//! repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commit activity counters for a branch or a whole repository.
///
/// At repository level `commits` and `committers` are plain sums of the
/// per-branch values. A contributor active on two branches is counted twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct CommitResults
{
    /// Commits authored inside the active interval.
    pub commits:              u32,
    /// Distinct author names among those commits.
    pub committers:           u32,
    /// Branches examined. Only set at repository level.
    pub branches_count:       u32,
    /// Branches without any commit inside the staleness window.
    pub stale_branches_count: u32,
    /// Capture time in nanoseconds since the Unix epoch, `0` until set.
    pub timestamp:            i64,
}

impl CommitResults
{
    /// Folds one branch result into this running total.
    ///
    /// # Examples
    ///
    /// ```
    /// use github_stats::CommitResults;
    ///
    /// let mut total = CommitResults::default();
    /// total.fold_branch(&CommitResults {
    ///     commits: 2, committers: 1, ..CommitResults::default()
    /// },);
    /// assert_eq!((total.commits, total.branches_count), (2, 1));
    /// ```
    pub fn fold_branch(&mut self, branch: &Self,)
    {
        self.commits = self.commits.saturating_add(branch.commits,);
        self.committers = self.committers.saturating_add(branch.committers,);
        self.branches_count = self.branches_count.saturating_add(1,);
        self.stale_branches_count =
            self.stale_branches_count.saturating_add(branch.stale_branches_count,);
    }

    /// Stamps the result with the given capture time.
    pub fn stamp(&mut self, captured_at: DateTime<Utc,>,)
    {
        self.timestamp = captured_at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| captured_at.timestamp().saturating_mul(1_000_000_000,),);
    }
}

/// Branch entry returned by the branch listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct Branch
{
    /// Branch name, unique within the repository.
    pub name:   String,
    /// Head commit reference.
    #[serde(default)]
    pub commit: BranchHead,
}

/// Head commit reference of a [`Branch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize,)]
pub struct BranchHead
{
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub url: String,
}

/// Commit entry returned by the commit listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct Commit
{
    pub sha:    String,
    pub commit: CommitDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct CommitDetails
{
    pub author: CommitAuthor,
}

/// Author signature of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct CommitAuthor
{
    /// Display name, compared case-sensitively.
    pub name: String,
    /// Author timestamp.
    pub date: DateTime<Utc,>,
}

impl Commit
{
    /// Author timestamp of the commit.
    pub fn authored_at(&self,) -> DateTime<Utc,>
    {
        self.commit.author.date
    }

    /// Author display name of the commit.
    pub fn author_name(&self,) -> &str
    {
        &self.commit.author.name
    }
}
