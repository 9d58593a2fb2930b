mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{init_logging, job, shared_store, FakeRemote};
use crawldeck_client::{
    lock_store, PollSettings, Poller, RefreshOutcome, Refresher, RemoteClient, SharedStore,
};
use crawldeck_core::{CrawlStatus, JobStats};
use tokio::time::sleep;

fn refresher(fake: &Arc<FakeRemote>, store: &SharedStore) -> Arc<Refresher> {
    let client: Arc<dyn RemoteClient> = fake.clone();
    Arc::new(Refresher::new(client, store.clone(), 50))
}

fn settings() -> PollSettings {
    PollSettings {
        jobs_interval: Duration::from_secs(5),
        stats_interval: Duration::from_secs(10),
    }
}

#[tokio::test(start_paused = true)]
async fn timers_fire_immediately_then_on_their_periods() {
    init_logging();
    let fake = FakeRemote::with_jobs(vec![job("1", CrawlStatus::Completed)]);
    let store = shared_store();
    let handle = Poller::spawn(refresher(&fake, &store), settings());

    sleep(Duration::from_secs(12)).await;

    // Listing at 0s, 5s, 10s; stats at 0s, 10s.
    assert_eq!(fake.list_calls(), 3);
    assert_eq!(fake.stats_calls(), 2);
    assert!(handle.is_running());
    let store = lock_store(&store);
    assert_eq!(store.revision(), 3);
    assert_eq!(
        store.stats(),
        Some(JobStats {
            total_crawls: 1,
            completed_crawls: 1,
            ..JobStats::default()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn ticks_are_skipped_while_a_slow_fetch_is_outstanding() {
    init_logging();
    let fake = FakeRemote::with_jobs(vec![job("1", CrawlStatus::Running)]);
    fake.delay_listing(Duration::from_secs(12));
    let store = shared_store();
    let _handle = Poller::spawn(refresher(&fake, &store), settings());

    sleep(Duration::from_secs(11)).await;
    assert_eq!(fake.list_calls(), 1);
    assert_eq!(lock_store(&store).revision(), 0);

    // The first fetch lands at 12s; the 15s tick starts the next one.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fake.list_calls(), 2);
    assert_eq!(lock_store(&store).revision(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_discards_in_flight_results() {
    init_logging();
    let fake = FakeRemote::with_jobs(vec![job("1", CrawlStatus::Queued)]);
    fake.delay_listing(Duration::from_secs(3));
    let store = shared_store();
    let refresher = refresher(&fake, &store);
    let handle = Poller::spawn(refresher.clone(), settings());

    sleep(Duration::from_secs(1)).await;
    handle.stop();
    assert!(!refresher.is_alive());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(fake.list_calls(), 1);
    assert_eq!(lock_store(&store).revision(), 0);
    assert_eq!(lock_store(&store).freshness().last_refreshed_at, None);
}

#[tokio::test(start_paused = true)]
async fn command_refresh_during_a_poll_fetches_again_afterwards() {
    init_logging();
    let fake = FakeRemote::with_jobs(vec![job("1", CrawlStatus::Queued)]);
    fake.delay_listing(Duration::from_secs(2));
    let store = shared_store();
    let refresher = refresher(&fake, &store);

    let poll = tokio::spawn({
        let refresher = refresher.clone();
        async move { refresher.poll_jobs().await }
    });
    sleep(Duration::from_millis(100)).await;
    assert_eq!(fake.list_calls(), 1);

    assert_eq!(refresher.refresh_jobs().await, RefreshOutcome::Coalesced);
    assert_eq!(refresher.poll_jobs().await, RefreshOutcome::Skipped);

    assert_eq!(poll.await.unwrap(), RefreshOutcome::Applied);
    assert_eq!(fake.list_calls(), 2);
    assert_eq!(lock_store(&store).revision(), 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_after_teardown_is_discarded() {
    init_logging();
    let fake = FakeRemote::with_jobs(vec![job("1", CrawlStatus::Queued)]);
    let store = shared_store();
    let refresher = refresher(&fake, &store);

    refresher.shut_down();

    assert_eq!(refresher.refresh_jobs().await, RefreshOutcome::Discarded);
    assert_eq!(refresher.poll_stats().await, RefreshOutcome::Discarded);
    assert_eq!(lock_store(&store).revision(), 0);
    assert_eq!(lock_store(&store).stats(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn command_refresh_racing_a_poll_always_lands() {
    init_logging();
    let fake = FakeRemote::with_jobs(Vec::new());
    let store = shared_store();
    let refresher = refresher(&fake, &store);

    for round in 0..200 {
        let poll = tokio::spawn({
            let refresher = refresher.clone();
            async move { refresher.poll_jobs().await }
        });
        let command = tokio::spawn({
            let refresher = refresher.clone();
            let fake = fake.clone();
            async move {
                let created = fake
                    .submit_url(&format!("https://round{round}.example.com"))
                    .await
                    .unwrap();
                refresher.refresh_jobs().await;
                created.id
            }
        });
        poll.await.unwrap();
        let id = command.await.unwrap();

        assert!(
            lock_store(&store).get(&id).is_some(),
            "job submitted in round {round} missing after its refresh"
        );
    }
}
