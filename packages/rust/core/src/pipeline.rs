//! End-to-end run: fetch page → extract entries → publish new ones → record keys.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument};
use url::Url;

use releasebot_extractor::PageFetcher;
use releasebot_ledger::Ledger;
use releasebot_publisher::{Publisher, RELEASE_NOTE_FLAIR};
use releasebot_shared::{Entry, ReleaseBotError, Result, SourceConfig};

use crate::report::{EntryOutcome, EntryReport, RunReport};

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each entry has been handled.
    fn entry_done(&self, entry: &EntryReport, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn entry_done(&self, _entry: &EntryReport, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Fetch the release notes page and extract its entries, newest first.
#[instrument(skip_all, fields(url = %source.url))]
pub async fn fetch_entries(source: &SourceConfig) -> Result<Vec<Entry>> {
    let url = Url::parse(&source.url).map_err(|e| {
        ReleaseBotError::validation(format!("invalid source URL {}: {e}", source.url))
    })?;

    let fetcher = PageFetcher::new(Duration::from_secs(source.timeout_secs))?;
    let html = fetcher.fetch(&url).await?;

    let entries = releasebot_extractor::extract_entries(&html);
    info!(count = entries.len(), "found news entries");
    Ok(entries)
}

/// Reorder source-order (newest first) entries for publishing.
pub fn oldest_first(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.reverse();
    entries
}

/// Run the full pipeline.
///
/// 1. Fetch and extract the page
/// 2. Reverse to oldest first
/// 3. Publish each entry not yet in the ledger, recording its key on success
///
/// Only the fetch can fail the run; per-entry failures end up in the report.
#[instrument(skip_all)]
pub async fn run<P: Publisher>(
    source: &SourceConfig,
    ledger: &mut Ledger,
    publisher: &P,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();

    progress.phase("Fetching release notes");
    let entries = oldest_first(fetch_entries(source).await?);

    progress.phase("Publishing new entries");
    let reports = publish_entries(&entries, ledger, publisher, progress).await;

    let report = RunReport {
        entries: reports,
        elapsed: start.elapsed(),
    };
    progress.done(&report);
    Ok(report)
}

/// Publish `entries` in the given order. Every entry gets a report; a failure
/// never stops the loop.
pub async fn publish_entries<P: Publisher>(
    entries: &[Entry],
    ledger: &mut Ledger,
    publisher: &P,
    progress: &dyn ProgressReporter,
) -> Vec<EntryReport> {
    let total = entries.len();
    let mut reports = Vec::with_capacity(total);

    for (i, entry) in entries.iter().enumerate() {
        let outcome = publish_entry(entry, ledger, publisher).await;
        let report = EntryReport {
            key: entry.key(),
            url: entry.url.clone(),
            title: entry.post_title().to_string(),
            outcome,
        };
        progress.entry_done(&report, i + 1, total);
        reports.push(report);
    }

    reports
}

/// Handle one entry: skip if posted, else render, submit, and record.
pub async fn publish_entry<P: Publisher>(
    entry: &Entry,
    ledger: &mut Ledger,
    publisher: &P,
) -> EntryOutcome {
    let key = entry.key();
    if ledger.is_posted(key) {
        debug!(%key, url = %entry.url, "already in ledger");
        return EntryOutcome::Skipped;
    }

    let body = releasebot_markdown::render(entry);

    match publisher
        .submit(entry.post_title(), &body, RELEASE_NOTE_FLAIR)
        .await
    {
        Ok(post_id) => {
            if let Err(e) = ledger.record_posted(key) {
                // The post exists; only the next run can double-post it.
                error!(%key, url = %entry.url, error = %e, "failed to record posted key");
            }
            EntryOutcome::Posted { post_id }
        }
        Err(e) => EntryOutcome::Failed {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use releasebot_shared::{EntryKey, Headline};

    use super::*;

    /// Publisher recording every call; titles listed in `failing` are rejected.
    #[derive(Default)]
    struct FakePublisher {
        failing: Vec<String>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl FakePublisher {
        fn failing(titles: &[&str]) -> Self {
            Self {
                failing: titles.iter().map(|t| t.to_string()).collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Publisher for FakePublisher {
        async fn submit(&self, title: &str, body: &str, flair: &str) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((title.into(), body.into(), flair.into()));
            if self.failing.iter().any(|t| t == title) {
                return Err(ReleaseBotError::Publish("HTTP 500".into()));
            }
            Ok(format!("post{}", calls.len()))
        }
    }

    fn temp_ledger() -> (Ledger, PathBuf) {
        let path = std::env::temp_dir()
            .join(format!("releasebot-core-test-{}", uuid::Uuid::now_v7()))
            .join("posted_news.txt");
        (Ledger::open(&path).unwrap(), path)
    }

    fn ledger_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    fn cleanup(path: &Path) {
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    fn entry(header: &str, url: &str) -> Entry {
        Entry::new(
            header,
            url,
            None,
            vec![Headline::new("Combat Update", vec!["Fixed X".into()])],
        )
    }

    #[test]
    fn oldest_first_reverses_source_order() {
        let entries = vec![entry("new", "/3"), entry("mid", "/2"), entry("old", "/1")];
        let urls: Vec<String> = oldest_first(entries).into_iter().map(|e| e.url).collect();
        assert_eq!(urls, ["/1", "/2", "/3"]);
    }

    #[tokio::test]
    async fn posts_only_unseen_entries_in_either_order() {
        let posted = entry("2025-01-01: Old", "https://example/old");
        let fresh = entry("2025-02-02: New", "https://example/new");

        for order in [
            vec![posted.clone(), fresh.clone()],
            vec![fresh.clone(), posted.clone()],
        ] {
            let (mut ledger, path) = temp_ledger();
            ledger.record_posted(posted.key()).unwrap();
            let publisher = FakePublisher::default();

            let reports = publish_entries(&order, &mut ledger, &publisher, &SilentProgress).await;

            assert_eq!(publisher.calls().len(), 1);
            assert_eq!(publisher.calls()[0].0, "New");
            assert_eq!(
                ledger_lines(&path),
                [posted.key().to_string(), fresh.key().to_string()]
            );
            assert_eq!(
                reports
                    .iter()
                    .filter(|r| r.outcome == EntryOutcome::Skipped)
                    .count(),
                1
            );
            cleanup(&path);
        }
    }

    #[tokio::test]
    async fn failure_is_isolated_and_not_recorded() {
        let first = entry("2025-01-01: Broken", "https://example/1");
        let second = entry("2025-01-02: Fine", "https://example/2");
        let (mut ledger, path) = temp_ledger();
        let publisher = FakePublisher::failing(&["Broken"]);

        let reports = publish_entries(
            &[first.clone(), second.clone()],
            &mut ledger,
            &publisher,
            &SilentProgress,
        )
        .await;

        assert_eq!(publisher.calls().len(), 2);
        assert!(matches!(reports[0].outcome, EntryOutcome::Failed { ref reason } if reason.contains("HTTP 500")));
        assert_eq!(
            reports[1].outcome,
            EntryOutcome::Posted {
                post_id: "post2".into()
            }
        );
        assert!(!ledger.is_posted(first.key()));
        assert!(ledger.is_posted(second.key()));
        assert_eq!(ledger_lines(&path), [second.key().to_string()]);
        cleanup(&path);
    }

    #[tokio::test]
    async fn submits_rendered_body_with_fixed_flair() {
        let (mut ledger, path) = temp_ledger();
        let publisher = FakePublisher::default();
        let untitled = Entry::new("2025-04-15", "https://example/1", None, vec![]);

        let outcome = publish_entry(&untitled, &mut ledger, &publisher).await;

        assert!(matches!(outcome, EntryOutcome::Posted { .. }));
        let (title, body, flair) = publisher.calls().remove(0);
        assert_eq!(title, "2025-04-15");
        assert_eq!(body, releasebot_markdown::render(&untitled));
        assert_eq!(flair, "Release Note");
        cleanup(&path);
    }

    #[tokio::test]
    async fn duplicate_urls_in_one_run_post_once() {
        let (mut ledger, path) = temp_ledger();
        let publisher = FakePublisher::default();
        let a = entry("2025-01-01: A", "https://example/same");
        let b = entry("2025-01-02: B", "https://example/same");

        publish_entries(&[a, b], &mut ledger, &publisher, &SilentProgress).await;

        assert_eq!(publisher.calls().len(), 1);
        assert_eq!(
            ledger_lines(&path),
            [EntryKey::from_url("https://example/same").to_string()]
        );
        cleanup(&path);
    }

    #[tokio::test]
    async fn run_publishes_fixture_oldest_first() {
        let fixture = std::fs::read_to_string(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/html/releasenotes.html"),
        )
        .expect("read fixture");

        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/app_releasenotes/index.php"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(fixture))
            .mount(&server)
            .await;

        let source = SourceConfig {
            url: format!("{}/app_releasenotes/index.php?lang=en&ig=1", server.uri()),
            timeout_secs: 5,
        };
        let (mut ledger, path) = temp_ledger();
        // The newest entry was posted by an earlier run.
        ledger
            .record_posted(EntryKey::from_url(
                "https://app.ryzom.com/app_releasenotes/news.php?id=42",
            ))
            .unwrap();
        let publisher = FakePublisher::default();

        let report = run(&source, &mut ledger, &publisher, &SilentProgress)
            .await
            .unwrap();

        let titles: Vec<String> = publisher.calls().into_iter().map(|c| c.0).collect();
        assert_eq!(titles, ["2025-02-01", "Rotate Outposts and Autocomplete !"]);
        assert_eq!(report.posted(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(ledger_lines(&path).len(), 3);
        cleanup(&path);
    }

    #[tokio::test]
    async fn run_fails_when_page_is_unreachable() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = SourceConfig {
            url: server.uri(),
            timeout_secs: 5,
        };
        let (mut ledger, path) = temp_ledger();
        let publisher = FakePublisher::default();

        let result = run(&source, &mut ledger, &publisher, &SilentProgress).await;

        assert!(matches!(result, Err(ReleaseBotError::Network(_))));
        assert!(publisher.calls().is_empty());
        cleanup(&path);
    }
}
