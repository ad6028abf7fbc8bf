//! Signal-driven cancellation.
//!
//! Lives in its own test binary: the signals are sent to this whole process.

#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use tokio::time::{sleep, timeout};

fn send(signal: &str) {
    let status = Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(std::process::id().to_string())
        .status()
        .expect("failed to run kill");
    assert!(status.success());
}

// One test on purpose: both signals hit every token alive in the process.
#[tokio::test]
async fn interrupt_and_terminate_cancel_the_token() {
    for signal in ["INT", "TERM"] {
        let token = waypost::wait_for_signal().unwrap();

        sleep(Duration::from_millis(50)).await;
        assert!(!token.is_cancelled(), "cancelled before SIG{signal}");

        send(signal);
        timeout(Duration::from_secs(2), token.cancelled())
            .await
            .unwrap_or_else(|_| panic!("not cancelled after SIG{signal}"));

        // One-shot: stays cancelled.
        sleep(Duration::from_millis(20)).await;
        assert!(token.is_cancelled());
    }
}
