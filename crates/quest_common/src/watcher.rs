//! Transcript event source.
//!
//! Finds the newest transcript for a project and either live-tails it or
//! replays it at a fixed pace. Parsed events go through a bounded channel;
//! the frame loop drains it with `try_next` and never waits.
//!
//! The tail only advances its offset past complete lines. A partially
//! written line stays in the file and is read again on the next poll.

use crate::config::WatcherConfig;
use crate::error::{QuestError, Result};
use crate::event::{Event, EventKind};
use crate::transcript::TranscriptParser;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

// ============================================================================
// Transcript discovery
// ============================================================================

/// `/home/u/proj` -> `-home-u-proj`
pub fn encode_project_dir(dir: &Path) -> String {
    dir.to_string_lossy().replace('/', "-")
}

/// Transcript directory for `project_dir` under `root`
pub fn project_transcript_dir(root: &Path, project_dir: &Path) -> Result<PathBuf> {
    let absolute = if project_dir.is_absolute() {
        project_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(project_dir)
    };
    Ok(root.join(encode_project_dir(&absolute)))
}

/// Most recently modified `*.jsonl` in `dir`, skipping sub-agent transcripts
pub fn find_newest_transcript(dir: &Path) -> Result<(PathBuf, SystemTime)> {
    let entries = fs::read_dir(dir).map_err(|e| {
        QuestError::NotFound(format!("transcript directory {}: {}", dir.display(), e))
    })?;

    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(".jsonl") || name.starts_with("agent-") {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let is_newer = match &newest {
            Some((_, best)) => modified > *best,
            None => true,
        };
        if is_newer {
            newest = Some((entry.path(), modified));
        }
    }

    newest.ok_or_else(|| QuestError::NotFound(format!("no transcripts in {}", dir.display())))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Tail
// ============================================================================

/// Offset-tracking reader over one transcript
#[derive(Debug)]
pub struct TranscriptTail {
    path: PathBuf,
    offset: u64,
    parser: TranscriptParser,
}

impl TranscriptTail {
    /// Start after the last complete line; only lines finished later are read.
    /// A line still being written when the tail starts is read whole once
    /// its newline lands.
    pub fn at_end(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = File::open(&path)?;
        let len = file.metadata()?.len();
        let offset = last_line_start(&mut file, len)?;
        Ok(Self { path, offset, parser: TranscriptParser::new() })
    }

    pub fn from_start(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), offset: 0, parser: TranscriptParser::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far. Sits just after a newline (or at 0).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read complete lines appended since the last poll
    pub fn poll(&mut self) -> Result<Vec<Event>> {
        let len = fs::metadata(&self.path)?.len();
        if len < self.offset {
            warn!(
                "{} shrank from {} to {} bytes, reading from the start",
                self.path.display(),
                self.offset,
                len
            );
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        file.take(len - self.offset).read_to_end(&mut buf)?;

        let complete = match buf.iter().rposition(|b| *b == b'\n') {
            Some(last_newline) => &buf[..=last_newline],
            None => return Ok(Vec::new()),
        };
        self.offset += complete.len() as u64;

        let mut events = Vec::new();
        for line in complete.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            let text = String::from_utf8_lossy(line);
            events.extend(self.parser.parse_line(text.trim_end_matches('\r')));
        }
        Ok(events)
    }

    /// Follow a different transcript from its first byte
    pub fn switch_to(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.offset = 0;
        self.parser = TranscriptParser::new();
    }
}

/// Offset just past the last `\n` in the first `len` bytes, scanning
/// backwards in chunks
fn last_line_start(file: &mut File, len: u64) -> std::io::Result<u64> {
    let mut buf = [0u8; 4096];
    let mut end = len;
    while end > 0 {
        let start = end.saturating_sub(buf.len() as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(i) = chunk.iter().rposition(|b| *b == b'\n') {
            return Ok(start + i as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

// ============================================================================
// Event source
// ============================================================================

/// Handle to a running watch or replay task
pub struct EventSource {
    rx: mpsc::Receiver<Event>,
    task: JoinHandle<()>,
    path: PathBuf,
}

impl EventSource {
    /// Live-tail the newest transcript of `project_dir`, switching to newer
    /// transcripts as they appear. Must be called inside a tokio runtime.
    pub fn start_live_watch(project_dir: &Path, config: &WatcherConfig) -> Result<Self> {
        let dir = project_transcript_dir(&config.effective_transcripts_root(), project_dir)?;
        let (path, _) = find_newest_transcript(&dir)?;
        Self::spawn_live(path, Some(dir), config)
    }

    /// Live-tail one specific transcript file
    pub fn start_live_file(path: impl Into<PathBuf>, config: &WatcherConfig) -> Result<Self> {
        Self::spawn_live(path.into(), None, config)
    }

    fn spawn_live(path: PathBuf, dir: Option<PathBuf>, config: &WatcherConfig) -> Result<Self> {
        let tail = TranscriptTail::at_end(&path)?;
        let (tx, rx) = mpsc::channel(config.effective_queue_capacity());
        info!("Watching {}", path.display());

        let task = tokio::spawn(live_loop(
            tail,
            dir,
            tx,
            config.poll_interval(),
            config.rescan_every_polls,
        ));
        Ok(Self { rx, task, path })
    }

    /// Replay a transcript from the start with `delay` between events
    pub fn start_replay(path: impl Into<PathBuf>, delay: Duration, capacity: usize) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(QuestError::NotFound(format!("transcript {}", path.display())));
        }
        let (tx, rx) = mpsc::channel(capacity.max(1));
        info!("Replaying {}", path.display());

        let task = tokio::spawn(replay_loop(path.clone(), tx, delay));
        Ok(Self { rx, task, path })
    }

    /// Transcript the source started on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next queued event, if any. Never blocks.
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event. `None` once the task is done and the queue
    /// is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Background task exited (replay finished, or stopped)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the background task. Events still queued may be lost.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn live_loop(
    mut tail: TranscriptTail,
    dir: Option<PathBuf>,
    tx: mpsc::Sender<Event>,
    poll_interval: Duration,
    rescan_every: u32,
) {
    let start = Event::new(EventKind::SessionStart, format!("Watching: {}", file_label(tail.path())));
    if tx.send(start).await.is_err() {
        return;
    }

    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls: u32 = 0;

    loop {
        interval.tick().await;
        polls = polls.wrapping_add(1);

        match tail.poll() {
            Ok(events) => {
                for event in events {
                    if tx.send(event).await.is_err() {
                        debug!("Event consumer gone, stopping watch");
                        return;
                    }
                }
            }
            Err(e) => debug!("Poll of {} failed: {}", tail.path().display(), e),
        }

        let dir = match &dir {
            Some(dir) if rescan_every > 0 && polls % rescan_every == 0 => dir,
            _ => continue,
        };
        match find_newest_transcript(dir) {
            Ok((newest, _)) if newest != tail.path() => {
                info!("Switching to newer transcript {}", newest.display());
                let label = file_label(&newest);
                tail.switch_to(newest);
                let event = Event::new(EventKind::SessionStart, format!("Switched: {}", label));
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => debug!("Rescan failed: {}", e),
        }
    }
}

async fn replay_loop(path: PathBuf, tx: mpsc::Sender<Event>, delay: Duration) {
    let start = Event::new(EventKind::SessionStart, format!("Replaying: {}", file_label(&path)));
    if tx.send(start).await.is_err() {
        return;
    }

    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            let _ = tx.send(Event::error(format!("Replay failed: {}", e))).await;
            return;
        }
    };

    let mut parser = TranscriptParser::new();
    for line in content.split(|b| *b == b'\n') {
        if line.is_empty() {
            continue;
        }
        // invalid UTF-8 only spoils its own line
        let text = String::from_utf8_lossy(line);
        for event in parser.parse_line(text.trim_end_matches('\r')) {
            if tx.send(event).await.is_err() {
                return;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    let _ = tx.send(Event::new(EventKind::Success, "Replay complete")).await;
    debug!("Replay of {} finished", path.display());
}
