//! Shared helpers for the scenario/property test binaries in this crate.
//! Included via `#[path = "support.rs"] mod support;` in each, since every
//! `[[test]]` entry compiles as its own crate and cannot share a lib target.
//!
//! Every "guest" here is a hand-written async closure speaking the wire
//! protocol directly over an [`InMemorySandbox`] duplex pipe, the same way
//! `boxforge_runtime::sandbox`'s own unit tests do. A real guest binary would
//! instead link `boxforge-guest` and let its manifest-driven bootstrap and
//! blocking stdio take care of this; these tests exercise the broker side
//! of the protocol without paying for a real process per scenario.

#![allow(dead_code)]

use boxforge_proto::{decode_line, encode_line, Frame};
use boxforge_runtime::{BoxOptions, InMemorySandbox, Runtime};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};

pub fn test_runtime(sandbox: Arc<InMemorySandbox>) -> Arc<Runtime> {
    Runtime::new(sandbox, Duration::from_secs(30))
}

pub fn options_with_timeout(timeout: Duration) -> BoxOptions {
    BoxOptions {
        timeout: Some(timeout),
        ..Default::default()
    }
}

pub async fn read_frame(reader: &mut (impl AsyncBufRead + Unpin)) -> Option<Frame> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await.ok()?;
        if n == 0 {
            return None;
        }
        if let Some(frame) = decode_line(line.trim()) {
            return Some(frame);
        }
        if line.trim().is_empty() {
            continue;
        }
    }
}

pub async fn write_frame(writer: &mut (impl AsyncWrite + Unpin), frame: &Frame) {
    let line = encode_line(frame).expect("frame encodes");
    writer.write_all(line.as_bytes()).await.expect("write frame");
    writer.flush().await.expect("flush frame");
}

pub fn split(stream: DuplexStream) -> (tokio::io::BufReader<tokio::io::ReadHalf<DuplexStream>>, tokio::io::WriteHalf<DuplexStream>) {
    let (read, write) = tokio::io::split(stream);
    (tokio::io::BufReader::new(read), write)
}
