//! Test fixtures.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::logging::{Logger, MemorySink, Sink};

/// Returns a logger whose only sink is the returned in-memory sink.
#[must_use]
pub fn capture_logger() -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (Logger::new(vec![sink.clone() as Arc<dyn Sink>]), sink)
}

/// Creates an empty file at each path, along with missing parents.
///
/// # Errors
///
/// Returns the first IO error.
pub fn touch_all<P: AsRef<Path>>(paths: &[P]) -> io::Result<()> {
    for path in paths {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"")?;
    }
    Ok(())
}
