//! Probes evaluated through the waiter, the way the `condwait` binary uses them.

mod common;

use common::{fast_waiter, timed};
use condwait::{Probe, WaitError, WaitSpec, Waiter};
use std::fs;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

const CHECK_BUDGET: Duration = Duration::from_secs(1);

#[test]
fn test_file_probe_sees_file_created_mid_wait() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ready");
    let probe = Probe::parse("file", path.to_str().unwrap(), &[]).unwrap();

    let writer = {
        let path = path.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            fs::write(path, b"ok").unwrap();
        })
    };

    let outcome = fast_waiter(Duration::from_secs(5))
        .try_wait_for_outcome(|| probe.check(CHECK_BUDGET))
        .unwrap();
    writer.join().unwrap();

    assert!(outcome.satisfied);
    assert!(outcome.evaluations > 1);
}

#[test]
fn test_file_probe_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let probe = Probe::FileExists(dir.path().join("never"));

    let satisfied = fast_waiter(Duration::from_millis(100))
        .try_wait_for(|| probe.check(CHECK_BUDGET))
        .unwrap();
    assert!(!satisfied);
}

#[test]
fn test_tcp_probe_reaches_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let probe = Probe::tcp(&address, Duration::from_millis(200)).unwrap();

    let satisfied = fast_waiter(Duration::from_secs(2))
        .try_wait_for(|| probe.check(CHECK_BUDGET))
        .unwrap();
    assert!(satisfied);
}

#[cfg(unix)]
#[test]
fn test_command_probe_exit_status() {
    let ok = Probe::parse("cmd", "true", &[]).unwrap();
    assert!(fast_waiter(Duration::from_millis(100))
        .try_wait_for(|| ok.check(CHECK_BUDGET))
        .unwrap());

    let fails = Probe::parse("cmd", "false", &[]).unwrap();
    assert!(!fast_waiter(Duration::from_millis(100))
        .try_wait_for(|| fails.check(CHECK_BUDGET))
        .unwrap());
}

#[cfg(unix)]
#[test]
fn test_slow_command_does_not_extend_wait() {
    let timeout = Duration::from_millis(300);
    let interval = Duration::from_millis(100);
    let waiter = Waiter::new(WaitSpec::new(timeout).with_poll_interval(interval).unwrap());
    let probe = Probe::parse("cmd", "sleep", &["3".to_string()]).unwrap();

    let (outcome, elapsed) = timed(|| {
        waiter
            .try_wait_for_outcome(|| probe.check(waiter.spec().poll_interval()))
            .unwrap()
    });

    assert!(!outcome.satisfied);
    assert!(outcome.evaluations > 1);
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + interval + Duration::from_millis(400));
}

#[test]
fn test_missing_program_error_is_propagated() {
    let probe = Probe::parse("cmd", "condwait-no-such-program-7c1f", &[]).unwrap();

    let mut calls = 0;
    let result = fast_waiter(Duration::from_secs(5)).try_wait_for(|| {
        calls += 1;
        probe.check(CHECK_BUDGET)
    });

    match result {
        Err(WaitError::Probe(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("Expected Probe error, got {other:?}"),
    }
    assert_eq!(calls, 1);
}
