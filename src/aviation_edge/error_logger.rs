// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use chrono::Local;
use std::fs;
use std::path::PathBuf;

const LOG_DIR: &str = "/tmp/aviation_edge_errors";

/// Writes an unexpected provider payload to a diagnostic file and returns
/// its path for inclusion in the error message. Best effort: when the
/// directory is unwritable a sentinel path comes back and the caller's
/// error still carries a body snippet.
pub fn log_unexpected_response(body: &[u8], status_code: u16, endpoint: &str) -> PathBuf {
    let _ = fs::create_dir_all(LOG_DIR);

    let timestamp = Local::now();
    let filename = format!(
        "error_{}_status{}.log",
        timestamp.format("%Y%m%d_%H%M%S"),
        status_code
    );
    let log_path = PathBuf::from(LOG_DIR).join(filename);

    let mut content = format!(
        "Timestamp: {}\nStatus Code: {}\nEndpoint: {}\n\n",
        timestamp.to_rfc3339(),
        status_code,
        endpoint
    )
    .into_bytes();
    content.extend_from_slice(body);
    content.push(b'\n');

    if fs::write(&log_path, content).is_err() {
        return PathBuf::from("/tmp/aviation_edge_error.log (write failed)");
    }

    log_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_body() {
        let path = log_unexpected_response(b"<html>teapot</html>", 418, "timetable");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Status Code: 418"));
        assert!(content.contains("Endpoint: timetable"));
        assert!(content.contains("<html>teapot</html>"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("error_"));
        assert!(name.ends_with("_status418.log"));
        let _ = fs::remove_file(path);
    }
}
