use std::{fs, thread::sleep, time::Duration};

use tempfile::tempdir;

#[test]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("organizer.log");

    organizer::logging::init(true, Some(&path));
    tracing::info!("dashboard log line");

    sleep(Duration::from_millis(200));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("dashboard log line"));

    // A second call must not panic or replace the subscriber.
    organizer::logging::init(false, None);
}
