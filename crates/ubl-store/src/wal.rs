use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::batch::CommitRecord;
use crate::error::{StoreError, StoreResult};

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

/// Flush/sync strategy for the commit log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every commit (safest, highest latency).
    #[default]
    EveryWrite,
    /// Flush to the OS and rely on page-cache buffering.
    OsDefault,
}

/// Destination of commit log frames.
///
/// A file in practice; tests substitute one that fails part-way.
trait LogFile: Write + Send {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

struct LogWriter {
    file: Box<dyn LogFile>,
    offset: u64,
    /// Set when a failed append could not be cut off; no further appends.
    failed: bool,
}

/// Append-only log of committed batches.
///
/// On-disk format, one frame per commit:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized CommitRecord)]
/// ```
///
/// A frame is appended before its batch becomes visible. If the append
/// fails, whatever part of the frame reached the file is cut off again, so
/// a rejected batch never reappears on replay. A torn final frame (short,
/// or failing its CRC) is what a crash mid-append leaves behind; it is cut
/// off when the log is opened. A bad frame followed by more data is
/// corruption and fails the open.
pub struct CommitLog {
    path: PathBuf,
    writer: Mutex<LogWriter>,
    sync_mode: SyncMode,
}

impl CommitLog {
    /// Open (or create) the log file at `path`, trimming any torn tail.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let file_len = file.metadata()?.len();

        let (frames, valid_len) = read_frames(path)?;
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "torn commit log tail; truncating"
            );
            file.set_len(valid_len)?;
        }
        debug!(path = %path.display(), records = frames.len(), "commit log opened");

        Ok(Self::from_parts(path, Box::new(file), valid_len, sync_mode))
    }

    fn from_parts(path: &Path, file: Box<dyn LogFile>, offset: u64, sync_mode: SyncMode) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LogWriter {
                file,
                offset,
                failed: false,
            }),
            sync_mode,
        }
    }

    /// Read every intact record in the log at `path` without modifying it.
    ///
    /// A torn tail is skipped, not trimmed. A missing file reads as empty.
    pub fn scan(path: &Path) -> StoreResult<Vec<CommitRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(read_frames(path)?
            .0
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// Append one record. Returns the byte offset of its frame.
    pub fn append(&self, record: &CommitRecord) -> StoreResult<u64> {
        let payload =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len()).map_err(|_| {
            StoreError::Serialization(format!("commit record too large: {} bytes", payload.len()))
        })?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut w = self
            .writer
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let frame_offset = w.offset;
        if w.failed {
            return Err(StoreError::LogFailed {
                offset: frame_offset,
            });
        }

        if let Err(e) = write_frame(w.file.as_mut(), &frame, self.sync_mode) {
            match w.file.truncate(frame_offset) {
                Ok(()) => warn!(
                    offset = frame_offset,
                    error = %e,
                    "commit log append failed; frame discarded"
                ),
                Err(cut) => {
                    w.failed = true;
                    error!(
                        offset = frame_offset,
                        error = %e,
                        truncate_error = %cut,
                        "commit log append failed and could not be rolled back"
                    );
                }
            }
            return Err(e.into());
        }

        w.offset += frame.len() as u64;

        debug!(
            offset = frame_offset,
            height = record.height,
            len = payload.len(),
            "commit log append"
        );
        Ok(frame_offset)
    }

    /// Every record with the offset of its frame, oldest first.
    pub(crate) fn frames(&self) -> StoreResult<Vec<(u64, CommitRecord)>> {
        // Hold the writer lock so a concurrent append cannot look torn.
        let _guard = self
            .writer
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(read_frames(&self.path)?.0)
    }
}

impl std::fmt::Debug for CommitLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitLog")
            .field("path", &self.path)
            .field("sync_mode", &self.sync_mode)
            .finish()
    }
}

fn write_frame(file: &mut dyn LogFile, frame: &[u8], sync_mode: SyncMode) -> io::Result<()> {
    file.write_all(frame)?;
    file.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        file.sync()?;
    }
    Ok(())
}

/// Decode all intact frames. Returns each record with its frame offset, and
/// the byte length they cover; anything past that length is a torn tail.
fn read_frames(path: &Path) -> StoreResult<(Vec<(u64, CommitRecord)>, u64)> {
    let mut file = BufReader::new(File::open(path)?);
    let file_len = file.get_ref().metadata()?.len();
    let mut records = Vec::new();
    let mut offset: u64 = 0;

    while offset + HEADER_SIZE <= file_len {
        let mut header = [0u8; HEADER_SIZE as usize];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let frame_end = offset + HEADER_SIZE + u64::from(length);

        if length == 0 || frame_end > file_len {
            warn!(offset, length, file_len, "short commit log frame; stopping recovery");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        file.read_exact(&mut payload)?;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            if frame_end == file_len {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch on final frame; stopping recovery"
                );
                break;
            }
            return Err(StoreError::CorruptLog {
                offset,
                reason: format!("CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"),
            });
        }

        let record = bincode::deserialize::<CommitRecord>(&payload).map_err(|e| {
            StoreError::CorruptLog {
                offset,
                reason: e.to_string(),
            }
        })?;
        records.push((offset, record));
        offset = frame_end;
    }

    debug!(recovered = records.len(), "commit log scan complete");
    Ok((records, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{InvocationId, WriteOp};
    use chrono::Utc;

    fn make_record(height: u64) -> CommitRecord {
        CommitRecord {
            height,
            invocation: InvocationId::new(),
            committed_at: Utc::now(),
            writes: vec![WriteOp::Put {
                key: format!("user:u{height}"),
                value: b"{}".to_vec(),
            }],
        }
    }

    fn file_len(path: &Path) -> u64 {
        fs::metadata(path).unwrap().len()
    }

    /// A log file that accepts `budget` bytes, then fails like a full disk.
    struct FaultyFile {
        inner: File,
        budget: usize,
        fail_sync: bool,
        fail_truncate: bool,
    }

    impl FaultyFile {
        fn open(path: &Path, budget: usize) -> Self {
            Self {
                inner: OpenOptions::new().append(true).open(path).unwrap(),
                budget,
                fail_sync: false,
                fail_truncate: false,
            }
        }
    }

    impl Write for FaultyFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::other("no space left on device"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl LogFile for FaultyFile {
        fn sync(&mut self) -> io::Result<()> {
            if self.fail_sync {
                return Err(io::Error::other("sync failed"));
            }
            self.inner.sync_data()
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.fail_truncate {
                return Err(io::Error::other("truncate failed"));
            }
            self.inner.set_len(len)
        }
    }

    /// A log at `path` holding one record, and its length in bytes.
    fn one_record_log(path: &Path) -> (CommitRecord, u64) {
        let log = CommitLog::open(path, SyncMode::EveryWrite).unwrap();
        let record = make_record(1);
        log.append(&record).unwrap();
        (record, file_len(path))
    }

    #[test]
    fn append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit.log");
        let log = CommitLog::open(&path, SyncMode::EveryWrite).unwrap();

        let r1 = make_record(1);
        let r2 = make_record(2);
        assert_eq!(log.append(&r1).unwrap(), 0);
        let second = log.append(&r2).unwrap();

        assert_eq!(CommitLog::scan(&path).unwrap(), vec![r1.clone(), r2.clone()]);
        assert_eq!(log.frames().unwrap(), vec![(0, r1), (second, r2)]);
    }

    #[test]
    fn empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        let log = CommitLog::open(&path, SyncMode::OsDefault).unwrap();
        assert!(log.frames().unwrap().is_empty());
        assert_eq!(file_len(&path), 0);
    }

    #[test]
    fn scan_of_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.log");
        assert!(CommitLog::scan(&path).unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/commit.log");
        CommitLog::open(&path, SyncMode::OsDefault).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn torn_tail_is_trimmed_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torn.log");
        let (_, good_len) = one_record_log(&path);
        let log = CommitLog::open(&path, SyncMode::EveryWrite).unwrap();
        log.append(&make_record(2)).unwrap();
        drop(log);

        // Chop the second frame in half.
        let full = file_len(&path);
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(good_len + (full - good_len) / 2).unwrap();
        drop(file);

        let log = CommitLog::open(&path, SyncMode::EveryWrite).unwrap();
        assert_eq!(log.frames().unwrap().len(), 1);
        assert_eq!(file_len(&path), good_len);

        // Appends continue cleanly after the trimmed tail.
        log.append(&make_record(2)).unwrap();
        assert_eq!(log.frames().unwrap().len(), 2);
    }

    #[test]
    fn scan_skips_torn_tail_without_trimming() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torn.log");
        let (record, good_len) = one_record_log(&path);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[7, 0, 0, 0, 1, 2]).unwrap();
        drop(file);

        assert_eq!(CommitLog::scan(&path).unwrap(), vec![record]);
        assert_eq!(file_len(&path), good_len + 6);
    }

    #[test]
    fn corrupt_middle_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.log");
        let log = CommitLog::open(&path, SyncMode::EveryWrite).unwrap();
        log.append(&make_record(1)).unwrap();
        log.append(&make_record(2)).unwrap();
        drop(log);

        let mut bytes = fs::read(&path).unwrap();
        bytes[HEADER_SIZE as usize + 2] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let err = CommitLog::open(&path, SyncMode::EveryWrite).unwrap_err();
        assert!(matches!(err, StoreError::CorruptLog { offset: 0, .. }));
    }

    // -----------------------------------------------------------------------
    // Failed appends
    // -----------------------------------------------------------------------

    #[test]
    fn partial_frame_is_cut_off_after_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit.log");
        let (r1, good_len) = one_record_log(&path);

        let faulty = FaultyFile::open(&path, 5);
        let log = CommitLog::from_parts(&path, Box::new(faulty), good_len, SyncMode::EveryWrite);
        assert!(matches!(log.append(&make_record(2)), Err(StoreError::Io(_))));
        assert_eq!(file_len(&path), good_len);
        drop(log);

        // The log reopens cleanly and the next append lands right after r1.
        let log = CommitLog::open(&path, SyncMode::EveryWrite).unwrap();
        let r2 = make_record(2);
        assert_eq!(log.append(&r2).unwrap(), good_len);
        assert_eq!(CommitLog::scan(&path).unwrap(), vec![r1, r2]);
    }

    #[test]
    fn complete_frame_is_cut_off_after_failed_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit.log");
        let (r1, good_len) = one_record_log(&path);

        let mut faulty = FaultyFile::open(&path, usize::MAX);
        faulty.fail_sync = true;
        let log = CommitLog::from_parts(&path, Box::new(faulty), good_len, SyncMode::EveryWrite);
        assert!(log.append(&make_record(2)).is_err());
        assert_eq!(file_len(&path), good_len);
        assert_eq!(CommitLog::scan(&path).unwrap(), vec![r1]);
    }

    #[test]
    fn log_refuses_appends_when_rollback_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit.log");
        let (_, good_len) = one_record_log(&path);

        let mut faulty = FaultyFile::open(&path, 5);
        faulty.fail_truncate = true;
        let log = CommitLog::from_parts(&path, Box::new(faulty), good_len, SyncMode::EveryWrite);
        assert!(matches!(log.append(&make_record(2)), Err(StoreError::Io(_))));

        let err = log.append(&make_record(2)).unwrap_err();
        assert!(matches!(err, StoreError::LogFailed { offset } if offset == good_len));
    }
}
