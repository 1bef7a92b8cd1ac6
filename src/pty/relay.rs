//! The two copy loops bridging the PTY to the outside world.
//!
//! Each loop owns exactly one direction of the PTY: `pump_output` the
//! read side, `pump_input` the write side. They run as blocking tasks
//! and terminate on end-of-stream of their respective source. Mid-stream
//! I/O failures end the affected loop only; the child and the sibling
//! loop keep going.

use std::io::{Read, Write};

use tokio::sync::mpsc;

const READ_BUFFER_SIZE: usize = 8192;

/// Copy raw bytes from the PTY's read side into the sink until
/// end-of-stream.
///
/// The child exiting closes its side of the terminal, which surfaces
/// here as `Ok(0)` or, on Linux, an `EIO` read error; both end the loop.
/// Returns the number of bytes relayed.
pub(crate) fn pump_output(
    mut reader: Box<dyn Read + Send>,
    mut sink: Box<dyn Write + Send>,
) -> u64 {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) => {
                tracing::debug!("pty read ended: {err}");
                break;
            }
        };

        if let Err(err) = sink.write_all(&buffer[..count]) {
            tracing::warn!("output sink write failed: {err}");
            break;
        }
        if let Err(err) = sink.flush() {
            tracing::warn!("output sink flush failed: {err}");
            break;
        }

        total += count as u64;
    }

    total
}

/// Copy injected bytes from the input channel into the PTY's write side
/// until the channel closes.
///
/// Channel closure is the clean shutdown path: the write end is dropped
/// by whichever actor finished emitting the script. Write failures (the
/// child is gone) end the loop without escalating. Returns the number of
/// bytes relayed.
pub(crate) fn pump_input(
    mut rx: mpsc::Receiver<Vec<u8>>,
    mut writer: Box<dyn Write + Send>,
) -> u64 {
    let mut total = 0u64;

    while let Some(chunk) = rx.blocking_recv() {
        if let Err(err) = writer.write_all(&chunk) {
            tracing::warn!("pty write failed: {err}");
            break;
        }
        if let Err(err) = writer.flush() {
            tracing::warn!("pty flush failed: {err}");
            break;
        }
        total += chunk.len() as u64;
    }

    total
}
