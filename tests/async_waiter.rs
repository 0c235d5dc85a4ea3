use condwait::{WaitError, Waiter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test]
async fn test_async_wait_sees_flag_set_by_task() {
    let flag = Arc::new(AtomicBool::new(false));
    let setter = {
        let flag = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, Ordering::SeqCst);
        })
    };

    let satisfied = Waiter::with_timeout(Duration::from_secs(5))
        .wait_for_async(|| flag.load(Ordering::SeqCst))
        .await;
    setter.await.unwrap();

    assert!(satisfied);
}

#[tokio::test(start_paused = true)]
async fn test_many_concurrent_async_waits() {
    let waits = (0..8u64).map(|i| async move {
        let waiter = Waiter::with_timeout(Duration::from_secs(i));
        let start = tokio::time::Instant::now();
        let satisfied = waiter.wait_for_async(|| i % 2 == 0).await;
        (i, satisfied, start.elapsed())
    });

    for handle in waits.map(tokio::spawn).collect::<Vec<_>>() {
        let (i, satisfied, elapsed) = handle.await.unwrap();
        assert_eq!(satisfied, i % 2 == 0);
        if !satisfied {
            assert!(elapsed >= Duration::from_secs(i));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_is_a_failure_not_a_timeout() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let waiter = Waiter::with_timeout(Duration::from_secs(30));

    let wait =
        tokio::spawn(async move { waiter.wait_for_until_shutdown(|| false, shutdown_rx).await });
    tokio::time::sleep(Duration::from_millis(1200)).await;
    shutdown_tx.send(true).unwrap();

    match wait.await.unwrap() {
        Err(WaitError::Interrupted) => {}
        other => panic!("Expected Interrupted, got {other:?}"),
    }
}
