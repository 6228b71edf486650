//! Recording loaders.
//!
//! `load` picks the format from the path: `*.json` / `*.json.gz` are session
//! logs, anything else is a WFDB record base path (with or without `.hea`).

pub mod session_log;
pub mod wfdb;

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::types::AccelerationTrace;

/// Load a recording as a 3-axis acceleration trace
pub fn load(path: impl AsRef<Path>) -> Result<AccelerationTrace> {
    let path = path.as_ref();
    if session_log::is_session_log(path) {
        debug!("loading {} as a session log", path.display());
        session_log::read_session_log(path)
    } else {
        debug!("loading {} as a WFDB record", path.display());
        wfdb::read_record(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GaitError;
    use std::fs;

    #[test]
    fn test_load_dispatches_on_suffix() {
        let dir = tempfile::tempdir().unwrap();

        fs::write(
            dir.path().join("rec.hea"),
            "rec 3 100 1\nrec.dat 16 1\nrec.dat 16 1\nrec.dat 16 1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("rec.dat"),
            [1i16, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>(),
        )
        .unwrap();
        let trace = load(dir.path().join("rec")).unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.axis(2)[0], 3.0);

        fs::write(dir.path().join("rec.json"), "{\"readings\": []}").unwrap();
        assert!(matches!(
            load(dir.path().join("rec.json")),
            Err(GaitError::RecordFormat(_))
        ));
    }

    #[test]
    fn test_load_missing_record() {
        assert!(matches!(
            load("does/not/exist"),
            Err(GaitError::RecordNotFound { .. })
        ));
    }
}
