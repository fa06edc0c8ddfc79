//! File-backed key-value store.
//!
//! Layout inside the store directory:
//!   <key>.record  the record value, replaced atomically (write + rename)
//!   <key>.log     list values as length-prefixed protobuf frames
//!                  [4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - List logs are strict append only, fsync after every push
//!   - Frame sequence strictly increasing (validated on read)
//!   - The last sequence per list is read once, then kept in memory
//!   - A torn final frame (crash mid-push) is cut off before the next push
//!   - One process owns a directory; writers inside it are serialized

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use prost::Message;
use tracing::warn;

use crate::proto_types::ProtoListEntry;
use crate::store::{resolve_range, validate_key, KeyValueStore, StoreError};

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Result of scanning a list log front to back.
struct LogScan {
    entries: Vec<ProtoListEntry>,
    /// Byte length of the intact frames.
    valid_len: u64,
    /// Bytes past `valid_len` that do not form a whole frame.
    torn_tail: bool,
}

pub struct FileStore {
    dir: PathBuf,
    /// Last sequence per list key. Also serializes writers.
    sequences: Mutex<HashMap<String, u64>>,
}

impl FileStore {
    /// Open or create a store rooted at `dir`.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            sequences: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.record", key))
    }

    fn log_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.log", key))
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, u64>>, StoreError> {
        self.sequences.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read_record(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, fsync, then rename over the record.
    fn write_record(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.record_path(key);
        let tmp = self.dir.join(format!("{}.record.tmp", key));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Read every frame of a list log in push order.
    fn read_log(path: &Path) -> Result<Vec<ProtoListEntry>, StoreError> {
        let scan = Self::scan_log(path)?;
        if scan.torn_tail {
            return Err(StoreError::Corrupt(format!(
                "truncated frame in {} after byte {}",
                path.display(),
                scan.valid_len
            )));
        }
        Ok(scan.entries)
    }

    fn scan_log(path: &Path) -> Result<LogScan, StoreError> {
        let mut scan = LogScan {
            entries: Vec::new(),
            valid_len: 0,
            torn_tail: false,
        };
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(scan),
            Err(e) => return Err(e.into()),
        };
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut len_buf = [0u8; 4];

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(StoreError::Corrupt(format!("invalid frame length: {}", len)));
            }

            let mut frame = vec![0u8; len];
            match reader.read_exact(&mut frame) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let entry = ProtoListEntry::decode(frame.as_slice())
                .map_err(|e| StoreError::Corrupt(format!("protobuf decode error: {}", e)))?;

            let expected = scan.entries.len() as u64 + 1;
            if entry.sequence != expected {
                return Err(StoreError::Corrupt(format!(
                    "sequence violation in {}: expected {}, got {}",
                    path.display(),
                    expected,
                    entry.sequence
                )));
            }
            scan.entries.push(entry);
            scan.valid_len += 4 + len as u64;
        }

        scan.torn_tail = scan.valid_len < file_len;
        Ok(scan)
    }

    /// Last sequence of a list, scanning its log on first use.
    fn last_sequence(
        &self,
        sequences: &mut HashMap<String, u64>,
        key: &str,
    ) -> Result<u64, StoreError> {
        if let Some(last) = sequences.get(key) {
            return Ok(*last);
        }

        let path = self.log_path(key);
        let scan = Self::scan_log(&path)?;
        if scan.torn_tail {
            warn!(
                path = %path.display(),
                valid_len = scan.valid_len,
                "cutting torn frame off list log"
            );
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
        }

        let last = scan.entries.len() as u64;
        sequences.insert(key.to_string(), last);
        Ok(last)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        self.read_record(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let _guard = self.guard()?;
        self.write_record(key, value)
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, StoreError> {
        validate_key(key)?;
        let _guard = self.guard()?;
        if self.read_record(key)?.as_deref() != expected {
            return Ok(false);
        }
        self.write_record(key, value)?;
        Ok(true)
    }

    fn lpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut sequences = self.guard()?;
        let sequence = self.last_sequence(&mut sequences, key)? + 1;
        let path = self.log_path(key);

        let buf = ProtoListEntry {
            sequence,
            value: value.to_string(),
        }
        .encode_to_vec();
        let len = u32::try_from(buf.len())
            .map_err(|_| StoreError::Corrupt(format!("value too large: {} bytes", buf.len())))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        sequences.insert(key.to_string(), sequence);
        Ok(())
    }

    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>, StoreError> {
        validate_key(key)?;
        let mut values: Vec<String> = Self::read_log(&self.log_path(key))?
            .into_iter()
            .map(|entry| entry.value)
            .collect();
        // The log is in push order; lists are read head (newest) first.
        values.reverse();
        Ok(match resolve_range(values.len(), start, end) {
            Some((from, to)) => values.drain(from..to).collect(),
            None => Vec::new(),
        })
    }
}
