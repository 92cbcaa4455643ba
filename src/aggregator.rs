// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Collection cycles over every configured repository.
///
/// A [`Collector`] owns one API client per repository and runs the branch
/// walker for each of them in configuration order. Repository failures are
/// logged and reported without affecting sibling repositories; results are
/// never merged across repositories.
use std::{collections::HashMap, time::Duration};

use serde::Serialize;
use tracing::{Instrument, Span, error, info, info_span};
use url::Url;

use crate::{
    config::{RepositoryTarget, StatsConfig},
    error::Error,
    model::CommitResults,
    transport::{DecodePolicy, GitHubClient, HostingApi},
    walker::{WalkRequest, walk_branches},
};

/// Statistics of one repository for one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct RepositoryReport
{
    /// Owning organization.
    pub organization: String,
    /// Repository name.
    pub repository:   String,
    /// Folded counters and capture time.
    #[serde(flatten)]
    pub results:      CommitResults,
}

/// A repository whose walk failed during a cycle.
#[derive(Debug,)]
pub struct RepositoryFailure
{
    /// Owning organization.
    pub organization: String,
    /// Repository name.
    pub repository:   String,
    /// Error that aborted the walk.
    pub error:        Error,
}

/// Reports and failures of one collection cycle, in configuration order.
#[derive(Debug, Default,)]
pub struct CycleOutcome
{
    pub reports:  Vec<RepositoryReport,>,
    pub failures: Vec<RepositoryFailure,>,
}

/// Collects statistics for one repository.
///
/// # Errors
///
/// Propagates the error that aborted the branch walk.
pub async fn collect_repository<A,>(
    api: &A,
    api_server: &Url,
    target: &RepositoryTarget,
    interval: Duration,
    decode_policy: DecodePolicy,
) -> Result<RepositoryReport, Error,>
where
    A: HostingApi + ?Sized,
{
    let request = WalkRequest {
        api_server,
        api_base: &target.api_base,
        interval,
        decode_policy,
    };
    let results = walk_branches(api, &request,).await?;

    Ok(RepositoryReport {
        organization: target.organization.clone(),
        repository: target.repository.clone(),
        results,
    },)
}

/// Runs collection cycles over a fixed set of repositories.
#[derive(Debug,)]
pub struct Collector<A,>
{
    api_server:    Url,
    interval:      Duration,
    decode_policy: DecodePolicy,
    repositories:  Vec<(RepositoryTarget, A,),>,
    cycles:        u64,
}

impl Collector<GitHubClient,>
{
    /// Builds a collector with one GitHub client per organization.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unusable repository URLs and
    /// [`Error::RequestBuild`] when a client cannot be initialized.
    pub fn from_config(config: &StatsConfig,) -> Result<Self, Error,>
    {
        let mut clients: HashMap<String, GitHubClient,> = HashMap::new();
        Self::with_clients(config, |target| {
            if let Some(client,) = clients.get(&target.organization,) {
                return Ok(client.clone(),);
            }
            let client = GitHubClient::new(&config.api_server, &target.token, config.timeout,)?;
            clients.insert(target.organization.clone(), client.clone(),);
            Ok(client,)
        },)
    }
}

impl<A,> Collector<A,>
where
    A: HostingApi,
{
    /// Builds a collector using `client_for` to obtain each repository's
    /// client.
    ///
    /// # Errors
    ///
    /// Propagates errors from target expansion and from `client_for`.
    pub fn with_clients<F,>(config: &StatsConfig, mut client_for: F,) -> Result<Self, Error,>
    where
        F: FnMut(&RepositoryTarget,) -> Result<A, Error,>,
    {
        let targets = config.targets()?;
        let mut repositories = Vec::with_capacity(targets.len(),);
        for target in targets {
            let client = client_for(&target,)?;
            repositories.push((target, client,),);
        }

        Ok(Self {
            api_server: config.api_server.clone(),
            interval: config.interval,
            decode_policy: config.decode_policy,
            repositories,
            cycles: 0,
        },)
    }

    /// Number of repositories visited per cycle.
    pub fn repository_count(&self,) -> usize
    {
        self.repositories.len()
    }

    /// Runs one collection cycle inside a fresh `collection_cycle` span.
    pub async fn run_cycle(&mut self,) -> CycleOutcome
    {
        let span = info_span!("collection_cycle", cycle = self.cycles + 1);
        self.run_cycle_in(span,).await
    }

    /// Runs one collection cycle, logging through `span`.
    ///
    /// Every repository is walked even when earlier ones fail.
    pub async fn run_cycle_in(&mut self, span: Span,) -> CycleOutcome
    {
        self.cycles += 1;
        let mut outcome = CycleOutcome::default();

        for (target, api,) in &self.repositories {
            let repository_span = info_span!(
                parent: &span,
                "repository",
                organization = %target.organization,
                repository = %target.repository
            );

            let result = collect_repository(
                api,
                &self.api_server,
                target,
                self.interval,
                self.decode_policy,
            )
            .instrument(repository_span.clone(),)
            .await;

            let _entered = repository_span.enter();
            match result {
                Ok(report,) => {
                    info!(
                        commits = report.results.commits,
                        committers = report.results.committers,
                        branches = report.results.branches_count,
                        stale_branches = report.results.stale_branches_count,
                        "collected repository statistics"
                    );
                    outcome.reports.push(report,);
                }
                Err(err,) => {
                    error!("skipping repository for this cycle: {err}");
                    outcome.failures.push(RepositoryFailure {
                        organization: target.organization.clone(),
                        repository:   target.repository.clone(),
                        error:        err,
                    },);
                }
            }
        }

        let _entered = span.enter();
        info!(
            succeeded = outcome.reports.len(),
            failed = outcome.failures.len(),
            "collection cycle finished"
        );
        outcome
    }
}
