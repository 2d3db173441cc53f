//! Integration tests for HeatSync
//!
//! These tests run the central and externals against each other over
//! loopback TCP.

use std::time::Duration;

use heatsync::config::Config;
use heatsync::coordinator::{CollectMode, Coordinator, CoordinatorConfig, ExternalEndpoint};
use heatsync::net::{accept_externals, bind_listener, connect, receive_message, send_message};
use heatsync::{DEFAULT_EPSILON, Message, MessageKind, SyncError, blend_external, simulate};
use tokio::net::TcpListener;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

async fn loopback_listener(externals: usize) -> TcpListener {
    bind_listener("127.0.0.1:0".parse().unwrap(), externals as u32).expect("Failed to bind listener")
}

/// Minimal external that records every message the central sends it
async fn scripted_external(addr: std::net::SocketAddr, index: u32, initial: f32) -> Vec<Message> {
    let mut stream = connect(addr, CONNECT_TIMEOUT).await.expect("Failed to connect");
    let mut temperature = initial;
    let mut seen = Vec::new();

    send_message(&mut stream, &Message::report(index, temperature)).await.unwrap();
    loop {
        let message = receive_message(&mut stream).await.unwrap();
        seen.push(message);
        if message.kind == MessageKind::Done {
            return seen;
        }
        temperature = blend_external(temperature, message.value);
        send_message(&mut stream, &Message::report(index, temperature)).await.unwrap();
    }
}

// =============================================================================
// Full Protocol Tests
// =============================================================================

#[tokio::test]
async fn test_end_to_end_converges() {
    let report = simulate(&Config::default(), 100.0, &[0.0, 0.0, 0.0, 0.0]).await.unwrap();

    assert!(report.central.iterations > 1, "A hot central should need several rounds");
    assert_eq!(report.central.rounds.len() as u32, report.central.iterations);
    assert!(report.central.rounds.last().unwrap().stable);
    assert!(report.central.rounds.iter().rev().skip(1).all(|round| !round.stable));

    // (2 * 100 + 0) / 6 weighs the central twice
    assert!((report.central.rounds[0].central_after - 33.333_332).abs() < 1e-4);

    let spread = report.central.spread();
    assert!(spread < DEFAULT_EPSILON, "All five values should agree within epsilon, spread {}", spread);
    for summary in &report.externals {
        assert_eq!(summary.final_central, report.central.final_central);
        // The terminal DONE is not an update round for the external
        assert_eq!(summary.iterations + 1, report.central.iterations);
    }
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let seeds = [3.5, -7.25, 40.0];
    let first = simulate(&Config::default(), 12.0, &seeds).await.unwrap();
    let second = simulate(&Config::default(), 12.0, &seeds).await.unwrap();

    assert_eq!(first.central.rounds, second.central.rounds);
    assert_eq!(first.central.final_central.to_bits(), second.central.final_central.to_bits());
}

#[tokio::test]
async fn test_every_external_sees_exactly_one_done() {
    let listener = loopback_listener(4).await;
    let addr = listener.local_addr().unwrap();

    let externals: Vec<_> = (1..=4u32)
        .map(|index| tokio::spawn(scripted_external(addr, index, 0.0)))
        .collect();

    let streams = accept_externals(&listener, 4, Some(CONNECT_TIMEOUT)).await.unwrap();
    let coordinator = Coordinator::new(CoordinatorConfig::default(), 100.0).unwrap();
    let summary = coordinator.run(ExternalEndpoint::enumerate(streams)).await.unwrap();

    let mut transcripts = Vec::new();
    for external in externals {
        transcripts.push(external.await.unwrap());
    }

    for transcript in &transcripts {
        let done_count = transcript.iter().filter(|m| m.kind == MessageKind::Done).count();
        assert_eq!(done_count, 1);
        assert_eq!(transcript.last().unwrap().kind, MessageKind::Done);
        assert_eq!(transcript.len() as u32, summary.iterations);
        assert!(transcript.iter().all(|m| m.source_index == 0));
    }

    // All externals received the same broadcast sequence
    for transcript in &transcripts[1..] {
        assert!(transcript.iter().zip(&transcripts[0]).all(|(a, b)| a.same_bits(b)));
    }
    assert_eq!(transcripts[0].last().unwrap().value, summary.final_central);
    assert!(summary.spread() < DEFAULT_EPSILON);
}

#[tokio::test]
async fn test_concurrent_collect_matches_sequential() {
    let mut concurrent = Config::default();
    concurrent.protocol.collect = CollectMode::Concurrent;

    let seeds = [0.0, 25.0, 50.0];
    let sequential = simulate(&Config::default(), 80.0, &seeds).await.unwrap();
    let concurrent = simulate(&concurrent, 80.0, &seeds).await.unwrap();

    assert_eq!(sequential.central.rounds, concurrent.central.rounds);
}

#[tokio::test]
async fn test_settled_system_stops_on_second_round() {
    let report = simulate(&Config::default(), 20.0, &[20.0, 20.0]).await.unwrap();
    assert_eq!(report.central.iterations, 2);
    assert_eq!(report.central.final_central, 20.0);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_external_hangup_aborts_central() {
    let listener = loopback_listener(2).await;
    let addr = listener.local_addr().unwrap();

    let healthy = tokio::spawn(async move {
        let mut stream = connect(addr, CONNECT_TIMEOUT).await.unwrap();
        // The central may already be gone, so only the receive is checked
        let _ = send_message(&mut stream, &Message::report(1, 5.0)).await;
        receive_message(&mut stream).await
    });
    let quitter = tokio::spawn(async move {
        let stream = connect(addr, CONNECT_TIMEOUT).await.unwrap();
        drop(stream);
    });

    let streams = accept_externals(&listener, 2, Some(CONNECT_TIMEOUT)).await.unwrap();
    quitter.await.unwrap();

    let coordinator = Coordinator::new(CoordinatorConfig::default().with_externals(2), 10.0).unwrap();
    let err = coordinator.run(ExternalEndpoint::enumerate(streams)).await.unwrap_err();
    assert!(err.is_channel_failure(), "Unexpected error: {}", err);

    let after = healthy.await.unwrap();
    assert!(after.unwrap_err().is_channel_failure());
}

#[tokio::test]
async fn test_non_finite_report_aborts_central() {
    let listener = loopback_listener(1).await;
    let addr = listener.local_addr().unwrap();

    let external = tokio::spawn(async move {
        let mut stream = connect(addr, CONNECT_TIMEOUT).await.unwrap();
        send_message(&mut stream, &Message::report(1, f32::NAN)).await.unwrap();
        receive_message(&mut stream).await
    });

    let streams = accept_externals(&listener, 1, Some(CONNECT_TIMEOUT)).await.unwrap();
    let coordinator = Coordinator::new(CoordinatorConfig::default().with_externals(1), 10.0).unwrap();
    let err = coordinator.run(ExternalEndpoint::enumerate(streams)).await.unwrap_err();
    assert!(err.is_protocol_violation());
    assert!(matches!(err, SyncError::NonFiniteTemperature { source_index: 1, .. }));

    // No broadcast went out before the abort
    assert!(external.await.unwrap().unwrap_err().is_channel_failure());
}

#[tokio::test]
async fn test_huge_seed_aborts_instead_of_spinning() {
    let outcome = tokio::time::timeout(CONNECT_TIMEOUT, simulate(&Config::default(), 3.0e38, &[])).await;
    assert!(outcome.expect("Run should end promptly").is_err());
}

#[tokio::test]
async fn test_accept_times_out_when_externals_missing() {
    let listener = loopback_listener(3).await;
    let addr = listener.local_addr().unwrap();

    let only = tokio::spawn(async move { connect(addr, CONNECT_TIMEOUT).await.unwrap() });
    let err = accept_externals(&listener, 3, Some(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(err.is_startup());
    drop(only.await.unwrap());
}
