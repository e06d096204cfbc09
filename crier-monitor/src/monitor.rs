//! The polling cycle: readiness check, destination resolution, sequential
//! per-account checks, delivery.
//!
//! One monitor instance owns all mutable state (cursors, resolved ids, the
//! destination cache) and runs as a single task, so none of it needs locks.
//! Accounts are checked in configured order and never concurrently; the feed
//! API's rate budget is shared across all of them.
use std::sync::Arc;
use std::time::Duration;

use crier_chat::{ChannelId, ChatClient, Destination};
use crier_social::{FeedClient, FeedError};
use tracing::{debug, info, warn};

use crate::cursor::CursorStore;
use crate::filter::ContentFilter;
use crate::format::format_post;
use crate::resolve::DestinationResolver;

#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("no accounts configured to monitor")]
    NoAccounts,
}

/// Knobs for one monitor instance, assembled by the binary from the
/// `[feed]`, `[chat]` and `[monitor]` configuration sections.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Handles to check, in this order.
    pub handles: Vec<String>,
    pub channel: ChannelId,
    /// Fixed sleep between cycles; cycle duration is not compensated for.
    pub interval: Duration,
    /// Posts requested per fetch.
    pub page_size: u32,
    /// Marker tag withholding a post from delivery.
    pub spoiler_tag: String,
    /// Treat the first fetch for a handle as a baseline: record the newest
    /// id and deliver nothing. Off by default, so a fresh process relays the
    /// most recent page once.
    pub skip_initial_backlog: bool,
    /// Raise per-post branch events from debug to info.
    pub verbose: bool,
}

/// Counters for one cycle, emitted as the cycle summary log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Accounts whose check ran to completion.
    pub accounts_checked: usize,
    pub posts_fetched: usize,
    pub posts_filtered: usize,
    pub posts_delivered: usize,
    /// Account-level failures plus failed deliveries.
    pub errors: usize,
}

struct MonitoredAccount {
    handle: String,
    /// Feed-internal id, cached after the first successful lookup and never
    /// invalidated within a run.
    resolved_id: Option<String>,
}

pub struct Monitor {
    feed: Arc<dyn FeedClient>,
    chat: Arc<dyn ChatClient>,
    resolver: DestinationResolver,
    accounts: Vec<MonitoredAccount>,
    cursors: CursorStore,
    filter: ContentFilter,
    interval: Duration,
    page_size: u32,
    skip_initial_backlog: bool,
    verbose: bool,
}

impl Monitor {
    /// Build a monitor over injected feed and chat clients.
    ///
    /// Fails when no handles are configured; placeholder detection happens
    /// earlier, at configuration validation.
    pub fn new(
        settings: MonitorSettings,
        feed: Arc<dyn FeedClient>,
        chat: Arc<dyn ChatClient>,
    ) -> Result<Self, MonitorError> {
        if settings.handles.is_empty() {
            return Err(MonitorError::NoAccounts);
        }
        let accounts = settings
            .handles
            .into_iter()
            .map(|handle| MonitoredAccount {
                handle,
                resolved_id: None,
            })
            .collect();
        Ok(Self {
            resolver: DestinationResolver::new(chat.clone(), settings.channel),
            feed,
            chat,
            accounts,
            cursors: CursorStore::new(),
            filter: ContentFilter::new(&settings.spoiler_tag),
            interval: settings.interval,
            page_size: settings.page_size,
            skip_initial_backlog: settings.skip_initial_backlog,
            verbose: settings.verbose,
        })
    }

    /// Current cursor for a handle, if any post has been processed.
    pub fn cursor(&self, handle: &str) -> Option<String> {
        self.cursors.get(handle)
    }

    /// Run cycles forever. There is no normal return; the process is stopped
    /// externally.
    pub async fn run(&mut self) {
        info!(
            accounts = self.accounts.len(),
            interval_secs = self.interval.as_secs(),
            "monitor.start"
        );
        loop {
            let report = self.run_cycle().await;
            info!(
                accounts = report.accounts_checked,
                fetched = report.posts_fetched,
                filtered = report.posts_filtered,
                delivered = report.posts_delivered,
                errors = report.errors,
                "monitor.cycle"
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass over all accounts. Failures never cross account boundaries;
    /// the only whole-cycle skips are an unready chat connection and a
    /// destination that cannot be resolved.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        if !self.chat.is_ready() {
            info!("monitor.chat_not_ready");
            return report;
        }

        let destination = match self.resolver.get().await {
            Ok(dest) => dest,
            Err(err) => {
                report.errors += 1;
                warn!(error = %err, "monitor.destination_unavailable");
                return report;
            }
        };

        for idx in 0..self.accounts.len() {
            match self.check_account(idx, &destination, &mut report).await {
                Ok(()) => report.accounts_checked += 1,
                Err(FeedError::RateLimited { retry_after_secs }) => {
                    report.errors += 1;
                    warn!(
                        handle = %self.accounts[idx].handle,
                        retry_after_secs = ?retry_after_secs,
                        "monitor.account_rate_limited"
                    );
                }
                Err(err) => {
                    report.errors += 1;
                    warn!(
                        handle = %self.accounts[idx].handle,
                        error = %err,
                        "monitor.account_failed"
                    );
                }
            }
        }

        report
    }

    /// Check one account: resolve its id, fetch past the cursor, filter and
    /// deliver oldest-first. Any fetch-side error aborts just this account,
    /// cursor untouched. The cursor advances per post, before the send, so a
    /// delivery failure mid-batch cannot cause a re-delivery next cycle;
    /// delivery is at most once per post id.
    async fn check_account(
        &mut self,
        idx: usize,
        destination: &Destination,
        report: &mut CycleReport,
    ) -> Result<(), FeedError> {
        let handle = self.accounts[idx].handle.clone();

        let account_id = match self.accounts[idx].resolved_id.clone() {
            Some(id) => id,
            None => {
                let id = self.feed.resolve_account_id(&handle).await?;
                if self.verbose {
                    info!(handle = %handle, account_id = %id, "monitor.account_resolved");
                } else {
                    debug!(handle = %handle, account_id = %id, "monitor.account_resolved");
                }
                self.accounts[idx].resolved_id = Some(id.clone());
                id
            }
        };

        let since = self.cursors.get(&handle);
        let posts = self
            .feed
            .posts_since(&account_id, since.as_deref(), self.page_size)
            .await?;
        report.posts_fetched += posts.len();

        if posts.is_empty() {
            if self.verbose {
                info!(handle = %handle, "monitor.account_idle");
            } else {
                debug!(handle = %handle, "monitor.account_idle");
            }
            return Ok(());
        }

        if since.is_none() && self.skip_initial_backlog {
            // Baseline mode: the backlog predates this process. Record where
            // the feed stands and deliver only what arrives from now on.
            if let Some(newest) = posts.first() {
                self.cursors.set(&handle, &newest.id);
                info!(
                    handle = %handle,
                    cursor = %newest.id,
                    skipped = posts.len(),
                    "monitor.baseline"
                );
            }
            return Ok(());
        }

        // The fetch is newest-first; deliver in posting order.
        for post in posts.iter().rev() {
            // Advance before the send so a failed delivery is never retried.
            self.cursors.set(&handle, &post.id);

            if self.filter.excludes(&post.text) {
                report.posts_filtered += 1;
                if self.verbose {
                    info!(handle = %handle, post_id = %post.id, "monitor.post_filtered");
                } else {
                    debug!(handle = %handle, post_id = %post.id, "monitor.post_filtered");
                }
                continue;
            }

            let card = format_post(&handle, post);
            match self.chat.send(destination, &card).await {
                Ok(()) => {
                    report.posts_delivered += 1;
                    info!(handle = %handle, post_id = %post.id, "monitor.post_delivered");
                }
                Err(err) => {
                    report.errors += 1;
                    warn!(
                        handle = %handle,
                        post_id = %post.id,
                        error = %err,
                        "monitor.delivery_failed"
                    );
                }
            }
        }

        Ok(())
    }
}
