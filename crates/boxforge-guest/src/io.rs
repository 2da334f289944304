//! Raw line I/O against the guest's stdin/stdout. A guest process's stdout is
//! the wire protocol, so nothing else in the process may write to it; any
//! conventional logging a guest program wants goes to stderr instead.

use boxforge_proto::{decode_line, encode_line, Frame};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

static STDOUT_LOCK: Mutex<()> = Mutex::new(());

/// Encode and write one frame to stdout, flushing immediately. The host reads
/// line-by-line and will not see a frame until it is flushed.
pub(crate) fn write_frame(frame: &Frame) {
    let line = encode_line(frame).expect("frame always serializes");
    let _guard = STDOUT_LOCK.lock().expect("stdout lock poisoned");
    let mut stdout = io::stdout();
    if stdout.write_all(line.as_bytes()).is_ok() {
        let _ = stdout.flush();
    }
}

/// Block for the next line of stdin and decode it, skipping lines that don't
/// decode to a frame. Returns `None` on EOF (the host closed the pipe).
pub(crate) fn read_frame(stdin: &mut impl BufRead) -> Option<Frame> {
    loop {
        let mut line = String::new();
        let n = stdin.read_line(&mut line).ok()?;
        if n == 0 {
            return None;
        }
        if let Some(frame) = decode_line(&line) {
            return Some(frame);
        }
        // blank line or undecodable frame: keep reading
    }
}
