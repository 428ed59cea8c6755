//! Append-only ledger of posted entry keys.
//!
//! The [`Ledger`] wraps a text file holding one signed decimal [`EntryKey`]
//! per line. It is read fully when opened and only ever appended to, so the
//! in-memory set and the file agree for the rest of the run.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use releasebot_shared::{EntryKey, ReleaseBotError, Result};
use tracing::{info, warn};

/// A ledger line that did not parse as a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line_no: usize,
    pub content: String,
}

/// Keys read from ledger text, plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct ParsedLedger {
    pub keys: HashSet<EntryKey>,
    pub malformed: Vec<MalformedLine>,
}

/// Parse ledger text. Blank lines are ignored; other unparseable lines are
/// collected in [`ParsedLedger::malformed`].
pub fn parse_ledger(content: &str) -> ParsedLedger {
    let mut parsed = ParsedLedger::default();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<EntryKey>() {
            Ok(key) => {
                parsed.keys.insert(key);
            }
            Err(_) => parsed.malformed.push(MalformedLine {
                line_no: idx + 1,
                content: line.to_string(),
            }),
        }
    }

    parsed
}

/// File-backed set of posted keys.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    keys: HashSet<EntryKey>,
    /// The file is non-empty and its last line has no `\n`.
    unterminated: bool,
}

impl Ledger {
    /// Open the ledger at `path`, creating an empty file (and its parent
    /// directory) if none exists.
    ///
    /// Malformed lines, including ones that are not valid UTF-8, are logged
    /// and skipped.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| ReleaseBotError::io(parent, e))?;
                }
            }
            std::fs::File::create(path).map_err(|e| ReleaseBotError::io(path, e))?;
            info!(?path, "ledger file not found, created an empty one");
        }

        let bytes = std::fs::read(path).map_err(|e| ReleaseBotError::io(path, e))?;
        let unterminated = bytes.last().is_some_and(|&b| b != b'\n');
        let parsed = parse_ledger(&String::from_utf8_lossy(&bytes));

        for bad in &parsed.malformed {
            warn!(
                ?path,
                line = bad.line_no,
                content = %bad.content,
                "invalid key in ledger, skipped"
            );
        }
        info!(?path, keys = parsed.keys.len(), "loaded ledger");

        Ok(Self {
            path: path.to_path_buf(),
            keys: parsed.keys,
            unterminated,
        })
    }

    /// Whether `key` was already posted.
    pub fn is_posted(&self, key: EntryKey) -> bool {
        self.keys.contains(&key)
    }

    /// Append `key` to the file and to the in-memory set.
    ///
    /// The key is added to the set even when the append fails, so it is not
    /// posted twice within this run. An unterminated last line is closed
    /// first so the key lands on a line of its own.
    pub fn record_posted(&mut self, key: EntryKey) -> Result<()> {
        self.keys.insert(key);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ReleaseBotError::io(&self.path, e))?;

        let line = if self.unterminated {
            format!("\n{key}\n")
        } else {
            format!("{key}\n")
        };

        file.write_all(line.as_bytes()).map_err(|e| {
            ReleaseBotError::Ledger(format!(
                "failed to append key {key} to {}: {e}",
                self.path.display()
            ))
        })?;
        self.unterminated = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
