use super::record::{LatestProgress, ProgressLine};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Only the tail of very long logs is scanned.
const MAX_TAIL_BYTES: u64 = 1024 * 1024;

/// The line-oriented progress stream of one job.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create or truncate the log for writing.
    pub fn open(&self) -> io::Result<ProgressWriter> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(ProgressWriter { file })
    }

    /// Latest progress in the log.
    ///
    /// Lines are split on both `\n` and `\r` since percent updates redraw
    /// the current terminal row. Scanning runs from the end and stops at
    /// the newest step line; the newest percent line seen before it wins
    /// over the step's own percentage. A missing log yields no progress.
    pub fn tail_latest(&self) -> io::Result<LatestProgress> {
        let content = match read_tail(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(LatestProgress::default())
            }
            Err(e) => return Err(e),
        };
        Ok(latest_in(&content))
    }
}

/// Scan `content` for the latest progress.
pub(crate) fn latest_in(content: &str) -> LatestProgress {
    let mut latest = LatestProgress::default();

    for line in content.split(|c| c == '\n' || c == '\r').rev() {
        match ProgressLine::parse(line) {
            Some(ProgressLine::Step(mut step)) => {
                if let Some(percent) = &latest.percent {
                    step.percent = percent.percent.clone();
                }
                latest.step = Some(step);
                break;
            }
            Some(ProgressLine::Percent(percent)) if latest.percent.is_none() => {
                latest.percent = Some(percent);
            }
            _ => {}
        }
    }

    latest
}

fn read_tail(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut bytes = Vec::new();

    if len > MAX_TAIL_BYTES {
        file.seek(SeekFrom::Start(len - MAX_TAIL_BYTES))?;
        file.read_to_end(&mut bytes)?;
        // Drop the partial first line.
        if let Some(pos) = bytes.iter().position(|b| *b == b'\n' || *b == b'\r') {
            bytes.drain(..=pos);
        }
    } else {
        file.read_to_end(&mut bytes)?;
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes progress lines in the format [`ProgressLog::tail_latest`] reads.
#[derive(Debug)]
pub struct ProgressWriter {
    file: File,
}

impl ProgressWriter {
    /// A second handle to the log for a child's stdout or stderr.
    pub fn try_clone_file(&self) -> io::Result<File> {
        self.file.try_clone()
    }

    pub fn into_file(self) -> File {
        self.file
    }
}
