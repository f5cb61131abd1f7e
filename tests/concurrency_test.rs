//! Concurrency tests for the notifier.
//!
//! Tests:
//! - Many producers: every accepted add is delivered on a graceful stop
//! - Producers racing a stop: delivered count equals accepted count
//! - Force stop under load never over-delivers
//! - Several readers share one stream without duplicating signals

mod common;

use common::{count_until_closed, WAIT};
use doorbell::Notifier;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_producers_all_delivered() {
    let notifier = Notifier::new();
    let ready = notifier.ready();

    let num_producers = 8;
    let adds_per_producer = 500;

    let consumer = tokio::spawn(async move { count_until_closed(&ready).await });

    let handles: Vec<_> = (0..num_producers)
        .map(|_| {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                for _ in 0..adds_per_producer {
                    notifier.add().expect("add failed");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("producer task failed");
    }
    notifier.stop();

    let delivered = consumer.await.expect("consumer task failed");
    assert_eq!(delivered, num_producers * adds_per_producer);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_producers_racing_stop() {
    let notifier = Notifier::new();
    let ready = notifier.ready();
    let accepted = Arc::new(AtomicUsize::new(0));

    let consumer = tokio::spawn(async move { count_until_closed(&ready).await });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let notifier = notifier.clone();
            let accepted = Arc::clone(&accepted);
            tokio::spawn(async move {
                loop {
                    if notifier.add().is_err() {
                        break;
                    }
                    accepted.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    notifier.stop();

    for handle in handles {
        handle.await.expect("producer task failed");
    }

    let delivered = consumer.await.expect("consumer task failed");
    assert_eq!(delivered, accepted.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_force_stop_under_load_never_over_delivers() {
    let notifier = Notifier::new();
    let ready = notifier.ready();

    for _ in 0..1000 {
        notifier.add().expect("add failed");
    }

    let consumer = tokio::spawn(async move { count_until_closed(&ready).await });

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    notifier.force_stop();

    let delivered = consumer.await.expect("consumer task failed");
    assert!(delivered <= 1000, "delivered {delivered} of 1000");

    tokio::time::timeout(WAIT, notifier.closed())
        .await
        .expect("notifier did not close");
    assert_eq!(notifier.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_share_the_stream() {
    let notifier = Notifier::new();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ready = notifier.ready();
            tokio::spawn(async move { count_until_closed(&ready).await })
        })
        .collect();

    for _ in 0..400 {
        notifier.add().expect("add failed");
    }
    notifier.stop();

    let mut total = 0;
    for reader in readers {
        total += reader.await.expect("reader task failed");
    }
    assert_eq!(total, 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stop_calls() {
    let notifier = Notifier::new();
    let ready = notifier.ready();

    for _ in 0..10 {
        notifier.add().expect("add failed");
    }

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    notifier.stop();
                } else {
                    notifier.force_stop();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("stop task failed");
    }

    let delivered = count_until_closed(&ready).await;
    assert!(delivered <= 10);
    tokio::time::timeout(WAIT, notifier.closed())
        .await
        .expect("notifier did not close");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_force_stop_accounts_every_accepted_add() {
    for round in 0..20 {
        let notifier = Notifier::new();
        let accepted = 200;
        for _ in 0..accepted {
            notifier.add().expect("add failed");
        }

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let ready = notifier.ready();
                tokio::spawn(async move { count_until_closed(&ready).await })
            })
            .collect();

        // Vary how far the readers get before the stop lands
        tokio::time::sleep(std::time::Duration::from_micros(200 * round)).await;
        notifier.force_stop();

        let mut received = 0;
        for reader in readers {
            received += reader.await.expect("reader task failed") as u64;
        }
        assert!(notifier.is_closed(), "stream ended before the coordinator exited");

        assert_eq!(received, notifier.delivered(), "round {round}");
        assert_eq!(
            received + notifier.discarded(),
            accepted,
            "round {round}: taken and withdrawn signals must partition the accepted adds"
        );
    }
}
