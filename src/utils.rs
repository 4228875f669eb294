use crate::instance::InstanceKind;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{trace, warn};
use walkdir::WalkDir;

/// Timestamp format of report headers and footers
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How many leading bytes are inspected to tell a graph from other text.
const SNIFF_LENGTH: u64 = 1000;

pub fn system_time_to_date_time(t: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(t)
}

pub fn current_date_time() -> DateTime<Local> {
    system_time_to_date_time(SystemTime::now())
}

pub fn timestamp() -> String {
    current_date_time().format(TIMESTAMP_FORMAT).to_string()
}

/// All instance files of `kind` under `dir`, recursively, in sorted order.
/// Symbolic links are not followed. Graph candidates must look like DIMACS
/// near their beginning. Unreadable entries below `dir` are passed over;
/// only an unreadable `dir` itself is an error.
pub fn find_instance_files(dir: &Path, kind: InstanceKind) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!("skipping {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if has_extension(path, kind) && looks_like(path, kind) {
            found.push(path.to_path_buf());
        } else {
            trace!("not an instance: {}", path.display());
        }
    }
    found.sort();
    Ok(found)
}

fn has_extension(path: &Path, kind: InstanceKind) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| kind.extensions().contains(&e))
}

fn looks_like(path: &Path, kind: InstanceKind) -> bool {
    if kind == InstanceKind::Cnf {
        return true;
    }
    let mut head = Vec::new();
    match File::open(path).and_then(|f| f.take(SNIFF_LENGTH).read_to_end(&mut head)) {
        Ok(_) => {
            let head = String::from_utf8_lossy(&head);
            head.contains("p edge") || head.contains("p col") || head.contains("e ")
        }
        Err(_) => false,
    }
}
