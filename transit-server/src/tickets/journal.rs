//! Durable record of ticket transitions.
//!
//! A transition is only applied in memory after the journal confirms the
//! write, so a ticket's state can always be rebuilt by replaying its events.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{error, warn};

use super::{JournalError, TicketEvent};

/// Where ticket events are written.
pub trait TicketJournal: Send + Sync {
    /// Write an event. Must not return until the write is durable.
    fn append(&self, event: &TicketEvent) -> Result<(), JournalError>;
}

/// Keeps events in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    events: Mutex<Vec<TicketEvent>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event written so far.
    pub fn events(&self) -> Vec<TicketEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TicketJournal for MemoryJournal {
    fn append(&self, event: &TicketEvent) -> Result<(), JournalError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file, syncing after each write.
///
/// A write that fails partway is cut back off the file. A sync that fails
/// leaves the event's durability unknown, so the journal refuses every
/// later write until it is reopened and replayed.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    file: File,
    /// Length of the file up to the end of the last complete line.
    len: u64,
    poisoned: bool,
}

impl FileJournal {
    /// Open a journal file for appending, creating it and its parent
    /// directories if needed.
    ///
    /// A torn final line left by an interrupted write is removed, or
    /// terminated if it still holds a whole event.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let len = repair_tail(&mut file, &path)?;

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                len,
                poisoned: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every event in a journal file, in order.
    ///
    /// A missing file is an empty journal. Blank lines are skipped. An
    /// unterminated final line that doesn't parse is the remains of an
    /// interrupted write and is dropped; any other bad line is an error.
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<TicketEvent>, JournalError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let terminated = bytes.last().is_none_or(|&b| b == b'\n');
        let lines: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
        let last = lines.len() - 1;

        let mut events = Vec::new();
        for (i, line) in lines.into_iter().enumerate() {
            if line.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice(line) {
                Ok(event) => events.push(event),
                Err(source) if i == last && !terminated => {
                    warn!(
                        path = %path.display(),
                        line = i + 1,
                        %source,
                        "Dropping torn journal line"
                    );
                }
                Err(source) => return Err(JournalError::Corrupt { line: i + 1, source }),
            }
        }
        Ok(events)
    }

    fn write_line(
        &self,
        line: &[u8],
        sync: impl FnOnce(&File) -> std::io::Result<()>,
    ) -> Result<(), JournalError> {
        let mut inner = self.inner.lock();
        if inner.poisoned {
            return Err(JournalError::Poisoned);
        }

        if let Err(e) = inner.file.write_all(line) {
            // Cut off whatever part of the line landed
            if let Err(truncate) = inner.file.set_len(inner.len) {
                error!(
                    path = %self.path.display(),
                    %truncate,
                    "Failed to roll back torn journal write"
                );
                inner.poisoned = true;
            }
            return Err(e.into());
        }

        if let Err(e) = sync(&inner.file) {
            error!(
                path = %self.path.display(),
                error = %e,
                "Journal sync failed; refusing further writes"
            );
            inner.poisoned = true;
            return Err(e.into());
        }

        inner.len += line.len() as u64;
        Ok(())
    }
}

/// Removes or terminates a partial last line. Returns the repaired length.
fn repair_tail(file: &mut File, path: &Path) -> Result<u64, JournalError> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;

    if bytes.last().is_none_or(|&b| b == b'\n') {
        return Ok(bytes.len() as u64);
    }

    let start = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    let tail = &bytes[start..];

    if serde_json::from_slice::<TicketEvent>(tail).is_ok() {
        file.write_all(b"\n")?;
        file.sync_data()?;
        return Ok(bytes.len() as u64 + 1);
    }

    warn!(path = %path.display(), bytes = tail.len(), "Truncating torn journal line");
    file.set_len(start as u64)?;
    file.sync_data()?;
    Ok(start as u64)
}

impl TicketJournal for FileJournal {
    fn append(&self, event: &TicketEvent) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        self.write_line(&line, File::sync_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketId;
    use crate::tickets::ticket::tests::t0;
    use tempfile::TempDir;

    fn used(id: &str) -> TicketEvent {
        TicketEvent::Used {
            id: TicketId::parse(id).unwrap(),
            at: t0(),
        }
    }

    #[test]
    fn memory_journal_keeps_events() {
        let journal = MemoryJournal::new();
        assert!(journal.is_empty());

        journal.append(&used("AAAAAAAAAAAA")).unwrap();
        journal.append(&used("BBBBBBBBBBBB")).unwrap();

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.events()[1], used("BBBBBBBBBBBB"));
    }

    #[test]
    fn file_journal_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tickets.jsonl");

        {
            let journal = FileJournal::open(&path).unwrap();
            journal.append(&used("AAAAAAAAAAAA")).unwrap();
        }
        {
            // Reopening appends rather than truncating
            let journal = FileJournal::open(&path).unwrap();
            journal.append(&used("BBBBBBBBBBBB")).unwrap();
        }

        let events = FileJournal::replay(&path).unwrap();
        assert_eq!(events, vec![used("AAAAAAAAAAAA"), used("BBBBBBBBBBBB")]);
    }

    #[test]
    fn missing_file_replays_empty() {
        let dir = TempDir::new().unwrap();
        let events = FileJournal::replay(dir.path().join("absent.jsonl")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn corrupt_line_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.jsonl");
        let good = serde_json::to_string(&used("AAAAAAAAAAAA")).unwrap();
        std::fs::write(&path, format!("{good}\n\n{{not json\n")).unwrap();

        let err = FileJournal::replay(&path).unwrap_err();
        assert!(matches!(err, JournalError::Corrupt { line: 3, .. }));
    }

    #[test]
    fn torn_final_line_is_dropped_on_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.jsonl");
        let good = serde_json::to_string(&used("AAAAAAAAAAAA")).unwrap();
        std::fs::write(&path, format!("{good}\n{{\"event\":\"used\",\"id\":\"BBBB")).unwrap();

        let events = FileJournal::replay(&path).unwrap();
        assert_eq!(events, vec![used("AAAAAAAAAAAA")]);
    }

    #[test]
    fn reopening_cuts_off_torn_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.jsonl");
        {
            let journal = FileJournal::open(&path).unwrap();
            journal.append(&used("AAAAAAAAAAAA")).unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"event":"used","id":"BBBB"#).unwrap();
        drop(file);

        let journal = FileJournal::open(&path).unwrap();
        journal.append(&used("CCCCCCCCCCCC")).unwrap();

        let events = FileJournal::replay(&path).unwrap();
        assert_eq!(events, vec![used("AAAAAAAAAAAA"), used("CCCCCCCCCCCC")]);
    }

    #[test]
    fn reopening_terminates_whole_unterminated_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.jsonl");
        let good = serde_json::to_string(&used("AAAAAAAAAAAA")).unwrap();
        std::fs::write(&path, &good).unwrap();

        let journal = FileJournal::open(&path).unwrap();
        journal.append(&used("BBBBBBBBBBBB")).unwrap();

        let events = FileJournal::replay(&path).unwrap();
        assert_eq!(events, vec![used("AAAAAAAAAAAA"), used("BBBBBBBBBBBB")]);
    }

    #[test]
    fn failed_sync_refuses_later_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.jsonl");
        let journal = FileJournal::open(&path).unwrap();

        let mut line = serde_json::to_vec(&used("AAAAAAAAAAAA")).unwrap();
        line.push(b'\n');
        let err = journal
            .write_line(&line, |_| Err(std::io::Error::other("sync failed")))
            .unwrap_err();
        assert!(matches!(err, JournalError::Io(_)));

        // The event may be on disk, so nothing else may be written after it
        assert!(matches!(
            journal.append(&used("BBBBBBBBBBBB")),
            Err(JournalError::Poisoned)
        ));
        assert_eq!(
            FileJournal::replay(&path).unwrap(),
            vec![used("AAAAAAAAAAAA")]
        );

        // Reopening starts from what the file actually holds
        let journal = FileJournal::open(&path).unwrap();
        journal.append(&used("BBBBBBBBBBBB")).unwrap();
        assert_eq!(FileJournal::replay(&path).unwrap().len(), 2);
    }
}
