// ABOUTME: Line relay from the child's stderr pipe to the real stderr.
// ABOUTME: Suppressed lines are dropped; every other line is written and flushed as it arrives.

use crate::filter::SuppressionFilter;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;

/// Counters for one relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub forwarded: u64,
    pub suppressed: u64,
    /// The pipe was still open but silent for the idle limit after the
    /// child exited, so the relay stopped before EOF.
    pub abandoned: bool,
}

/// When to stop waiting on a pipe that outlives the child.
///
/// Once `exited` reads `true`, each read may wait at most `idle` for the
/// next line. Writes to the destination are never cut short.
#[derive(Debug, Clone)]
pub struct Drain {
    pub exited: watch::Receiver<bool>,
    pub idle: Duration,
}

/// Copy lines from `reader` to `writer` until EOF, dropping suppressed ones.
///
/// Lines are split on `\n` and written byte-for-byte, terminator included.
/// A final line without a terminator is tested and written as-is. The
/// writer is flushed after each line so output keeps line granularity.
pub async fn relay_lines<R, W>(
    reader: R,
    writer: &mut W,
    filter: &SuppressionFilter,
) -> std::io::Result<RelayStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    copy_lines(reader, writer, filter, None).await
}

/// Like [`relay_lines`], but gives up on a pipe held open by someone other
/// than the exited child once it has been idle for `drain.idle`.
pub async fn relay_with_drain<R, W>(
    reader: R,
    writer: &mut W,
    filter: &SuppressionFilter,
    drain: Drain,
) -> std::io::Result<RelayStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    copy_lines(reader, writer, filter, Some(drain)).await
}

async fn copy_lines<R, W>(
    reader: R,
    writer: &mut W,
    filter: &SuppressionFilter,
    mut drain: Option<Drain>,
) -> std::io::Result<RelayStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(256);
    let mut stats = RelayStats::default();

    loop {
        line.clear();
        let eof = match drain.as_mut() {
            None => reader.read_until(b'\n', &mut line).await? == 0,
            Some(drain) => match read_line_or_idle(&mut reader, &mut line, drain).await? {
                Some(n) => n == 0,
                None => {
                    stats.abandoned = true;
                    true
                }
            },
        };

        // A cancelled read keeps its partial bytes in `line`.
        if !line.is_empty() {
            if filter.is_suppressed(&line) {
                stats.suppressed += 1;
                tracing::trace!(len = line.len(), "suppressed stderr line");
            } else {
                writer.write_all(&line).await?;
                writer.flush().await?;
                stats.forwarded += 1;
            }
        }

        if eof {
            break;
        }
    }

    Ok(stats)
}

/// Read one line. `Ok(None)` means the child has exited and nothing
/// completed a line within the idle limit.
async fn read_line_or_idle<R>(
    reader: &mut BufReader<R>,
    line: &mut Vec<u8>,
    drain: &mut Drain,
) -> std::io::Result<Option<usize>>
where
    R: AsyncRead + Unpin,
{
    loop {
        if *drain.exited.borrow() {
            return match tokio::time::timeout(drain.idle, reader.read_until(b'\n', line)).await {
                Ok(read) => read.map(Some),
                Err(_) => Ok(None),
            };
        }

        tokio::select! {
            read = reader.read_until(b'\n', line) => return read.map(Some),
            changed = drain.exited.changed() => {
                if changed.is_err() {
                    // Sender dropped without reporting an exit; treat as exited.
                    let (_, rx) = watch::channel(true);
                    drain.exited = rx;
                }
            }
        }
    }
}
