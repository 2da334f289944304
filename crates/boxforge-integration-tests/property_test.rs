//! Property-based tests over the broker's routing behavior: arbitrary
//! payloads survive a round trip, and per-sender event ordering is
//! preserved across the fan-out path. Each property spins up its own
//! `Runtime` over `InMemorySandbox`, so cases are independent and fast
//! enough for proptest's default case count.

#[path = "support.rs"]
mod support;

use boxforge_proto::{Frame, Outcome};
use boxforge_runtime::InMemorySandbox;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use support::{read_frame, split, test_runtime, write_frame};
use tokio::sync::Mutex;

fn run<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

async fn echo_round_trip_case(payload: Value) -> Value {
    let sandbox = Arc::new(InMemorySandbox::new());
    sandbox
        .register(
            "b-guest",
            Arc::new(|stream| {
                Box::pin(async move {
                    let (mut read, mut write) = split(stream);
                    if let Some(Frame::Message { data, request_id, .. }) = read_frame(&mut read).await {
                        write_frame(
                            &mut write,
                            &Frame::Response {
                                request_id,
                                outcome: Outcome::Result(data),
                            },
                        )
                        .await;
                    }
                })
            }),
        )
        .await;

    let runtime = test_runtime(sandbox);
    let box_b = runtime
        .create_box("b", vec!["b-guest".to_string()], Default::default())
        .await
        .unwrap();
    box_b.on_message("echo").await;
    runtime.run_box("b", Default::default()).await.unwrap();

    let result = runtime.deliver("b", "a", payload).await.unwrap();
    runtime.shutdown().await;
    result
}

async fn ordering_case(values: Vec<i64>) -> Vec<i64> {
    let sandbox = Arc::new(InMemorySandbox::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let expected_count = values.len();

    let seen_clone = Arc::clone(&seen);
    sandbox
        .register(
            "sub-guest",
            Arc::new(move |stream| {
                let seen = Arc::clone(&seen_clone);
                Box::pin(async move {
                    let (mut read, _write) = split(stream);
                    while seen.lock().await.len() < expected_count {
                        match read_frame(&mut read).await {
                            Some(Frame::Event { data, .. }) => {
                                seen.lock().await.push(data);
                            }
                            Some(Frame::Shutdown) | None => break,
                            _ => {}
                        }
                    }
                })
            }),
        )
        .await;

    let runtime = test_runtime(sandbox);
    let sub = runtime
        .create_box("sub", vec!["sub-guest".to_string()], Default::default())
        .await
        .unwrap();
    sub.on_event("tick", "record").await;
    runtime.run_box("sub", Default::default()).await.unwrap();

    for v in &values {
        runtime.broadcast("tick", json!(v), "publisher").await;
    }
    let _ = sub.wait().await;
    runtime.shutdown().await;

    seen.lock()
        .await
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

proptest! {
    #[test]
    fn echo_preserves_arbitrary_json_numbers(n in proptest::num::i64::ANY) {
        let payload = json!({"n": n});
        let result = run(echo_round_trip_case(payload.clone()));
        prop_assert_eq!(result, payload);
    }

    #[test]
    fn echo_preserves_arbitrary_strings(s in "\\PC{0,64}") {
        let payload = json!({"s": s});
        let result = run(echo_round_trip_case(payload.clone()));
        prop_assert_eq!(result, payload);
    }

    #[test]
    fn events_from_one_sender_arrive_in_order(values in proptest::collection::vec(proptest::num::i64::ANY, 1..8)) {
        let observed = run(ordering_case(values.clone()));
        prop_assert_eq!(observed, values);
    }
}
