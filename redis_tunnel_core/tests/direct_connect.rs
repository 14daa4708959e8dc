use std::cell::Cell;
use std::time::Duration;

use log::Level;
use redis_tunnel_core::core::clock::SystemClock;
use redis_tunnel_core::{Callbacks, ConnectionConfig, Language, OnError, OnSuccess};

mod common;
use common::fakes::{harness, FakeHandle, Recorder, SshMode, StoreMode};

fn local_config() -> ConnectionConfig {
    ConnectionConfig::direct("127.0.0.1", 6379)
}

#[test]
fn healthy_store_calls_on_success_once() {
    let h = harness(StoreMode::Healthy, SshMode::Healthy);
    let mut recorder = Recorder::new(&h.events);

    h.connector.connect(&local_config(), &mut recorder);

    assert_eq!(recorder.successes, 1);
    assert_eq!(recorder.errors, 0);
    let handle = recorder.handle.expect("handle handed to the callback");
    assert_eq!((handle.host.as_str(), handle.port, handle.db), ("127.0.0.1", 6379, 0));
    assert_eq!(handle.password, "");
    assert_eq!(
        h.events.all(),
        vec!["store-open 127.0.0.1:6379/0", "probe", "on_success"]
    );
}

#[test]
fn direct_path_never_touches_ssh() {
    let h = harness(StoreMode::Healthy, SshMode::ConnectFails);
    h.connector.connect(&local_config(), ());

    assert_eq!(h.events.count("ssh-"), 0);
    assert!(h.ssh.rules().is_empty());
}

#[test]
fn failing_probe_calls_on_error_and_logs_one_error() {
    let h = harness(StoreMode::ProbeFails, SshMode::Healthy);
    let mut recorder = Recorder::new(&h.events);

    h.connector.connect(&local_config(), &mut recorder);

    assert_eq!(recorder.successes, 0);
    assert_eq!(recorder.errors, 1);
    let errors = h.logger.at(Level::Error);
    assert_eq!(
        errors,
        vec!["Unable to connect to Redis: NOAUTH Authentication required."]
    );
}

#[test]
fn failing_client_construction_is_reported_like_a_probe_failure() {
    let h = harness(StoreMode::OpenFails, SshMode::Healthy);
    let mut recorder = Recorder::new(&h.events);

    h.connector.connect(&local_config(), &mut recorder);

    assert_eq!((recorder.successes, recorder.errors), (0, 1));
    assert_eq!(h.events.count("probe"), 0);
    assert_eq!(h.logger.at(Level::Error).len(), 1);
}

#[test]
fn debug_flag_controls_timing_logs() {
    let quiet = harness(StoreMode::Healthy, SshMode::Healthy);
    quiet.connector.connect(&local_config(), ());
    assert!(quiet.logger.lines().is_empty());

    let chatty = harness(StoreMode::Healthy, SshMode::Healthy);
    let config = ConnectionConfig {
        debug: true,
        ..local_config()
    };
    chatty.connector.connect(&config, ());
    assert_eq!(
        chatty.logger.at(Level::Info),
        vec![
            "Connected Redis Successfully (Spent 0ms)",
            "Task Completed (Spent 0ms)"
        ]
    );
}

#[test]
fn language_selects_the_message_catalog() {
    let h = harness(StoreMode::ProbeFails, SshMode::Healthy);
    let config = ConnectionConfig {
        language: Language::Chinese,
        ..local_config()
    };
    h.connector.connect(&config, ());

    assert_eq!(
        h.logger.at(Level::Error),
        vec!["无法连接Redis: NOAUTH Authentication required."]
    );
}

#[test]
fn invalid_port_is_rejected_before_any_client_is_built() {
    let h = harness(StoreMode::Healthy, SshMode::Healthy);
    let mut recorder = Recorder::new(&h.events);

    h.connector
        .connect(&ConnectionConfig::direct("127.0.0.1", 0), &mut recorder);

    assert_eq!((recorder.successes, recorder.errors), (0, 1));
    assert!(h.events.all().iter().all(|e| !e.starts_with("store-open")));
    assert_eq!(h.logger.at(Level::Error).len(), 1);
}

#[test]
fn repeated_calls_give_the_same_outcome() {
    for mode in [StoreMode::Healthy, StoreMode::ProbeFails] {
        let h = harness(mode, SshMode::Healthy);
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            let mut recorder = Recorder::new(&h.events);
            h.connector.connect(&local_config(), &mut recorder);
            outcomes.push((recorder.successes, recorder.errors));
        }
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]), "{outcomes:?}");
    }
}

#[test]
fn real_clock_does_not_change_routing() {
    let h = harness(StoreMode::ProbeFails, SshMode::Healthy);
    let connector = h.connector.with_clock(SystemClock::new());
    let mut recorder = Recorder::new(&h.events);

    connector.connect(&local_config(), &mut recorder);

    assert_eq!((recorder.successes, recorder.errors), (0, 1));
}

#[test]
fn closure_adapters_fire_the_matching_side() {
    let h = harness(StoreMode::Healthy, SshMode::Healthy);
    let hits = Cell::new(0);
    let misses = Cell::new(0);

    h.connector.connect(
        &local_config(),
        Callbacks::new(|_handle: FakeHandle| hits.set(hits.get() + 1), || misses.set(misses.get() + 1)),
    );
    h.connector
        .connect(&local_config(), OnSuccess::new(|_handle: FakeHandle| hits.set(hits.get() + 1)));
    // A success with only an error callback is silently accepted.
    h.connector
        .connect(&local_config(), OnError::new(|| misses.set(misses.get() + 1)));

    assert_eq!((hits.get(), misses.get()), (2, 0));

    let failing = harness(StoreMode::ProbeFails, SshMode::Healthy);
    failing
        .connector
        .connect(&local_config(), OnError::new(|| misses.set(misses.get() + 1)));
    assert_eq!(misses.get(), 1);
}

#[test]
fn success_callback_duration_is_measured_separately() {
    let h = harness(StoreMode::Healthy, SshMode::Healthy);
    let connector = h.connector.with_clock(SystemClock::new());
    let config = ConnectionConfig {
        debug: true,
        ..local_config()
    };

    connector.connect(
        &config,
        OnSuccess::new(|_handle: FakeHandle| std::thread::sleep(Duration::from_millis(20))),
    );

    let info = h.logger.at(Level::Info);
    assert_eq!(info.len(), 2);
    let task_ms: u128 = info[1]
        .trim_start_matches("Task Completed (Spent ")
        .trim_end_matches("ms)")
        .parse()
        .unwrap();
    assert!(task_ms >= 20, "{}", info[1]);
}
