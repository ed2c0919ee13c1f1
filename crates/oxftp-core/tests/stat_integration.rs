//! End-to-end tests driving the public API against an in-memory session.
//!
//! The fake session serves canned listing lines the way a real server
//! would; everything else (format probing, caching, symlink chasing,
//! clock synchronization) runs through the real code paths.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, Timelike};
use oxftp_core::error::TimeShiftError;
use oxftp_core::{FileType, FtpSession, ListingFormat, SessionError, StatEngine, StatError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct FakeServer {
    cwd: String,
    listings: HashMap<String, Vec<String>>,
    listing_calls: usize,
    deleted: Vec<String>,
    temp_name: Option<String>,
}

impl FakeServer {
    fn new(cwd: &str) -> Self {
        Self {
            cwd: cwd.to_string(),
            ..Self::default()
        }
    }

    fn with_listing(mut self, dir: &str, lines: &[&str]) -> Self {
        self.listings
            .insert(dir.to_string(), lines.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl FtpSession for FakeServer {
    fn current_dir(&mut self) -> Result<String, SessionError> {
        Ok(self.cwd.clone())
    }

    fn change_dir(&mut self, path: &str) -> Result<(), SessionError> {
        self.cwd = path.to_string();
        Ok(())
    }

    fn raw_listing(
        &mut self,
        path: &str,
        callback: &mut dyn FnMut(&str),
    ) -> Result<(), SessionError> {
        self.listing_calls += 1;
        match self.listings.get(path) {
            Some(lines) => {
                for line in lines {
                    callback(line);
                }
                Ok(())
            }
            None => Err(SessionError::Permanent {
                code: 550,
                message: format!("{path}: no such file or directory"),
            }),
        }
    }

    fn make_temp_file(&mut self) -> Result<String, SessionError> {
        self.temp_name.clone().ok_or(SessionError::Other {
            message: "temp files not supported".to_string(),
        })
    }

    fn delete(&mut self, path: &str) -> Result<(), SessionError> {
        self.deleted.push(path.to_string());
        Ok(())
    }

    fn make_dir(&mut self, _path: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn remove_dir(&mut self, _path: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn rename(&mut self, _from: &str, _to: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

fn unix_server() -> FakeServer {
    FakeServer::new("/")
        .with_listing(
            "/",
            &[
                "total 4",
                "drwxr-sr-x   2 45854    200           512 May  4  2000 chemeng",
                "drwxr-xr-x   5 ftp      ftp           512 Jan  1  2020 pub",
            ],
        )
        .with_listing(
            "/pub",
            &[
                "total 14",
                "-rw-r--r--   1 ftp      ftp       1024000 Jan 15  2021 archive.tar.gz",
                "-rw-r--r--   1 ftp      ftp           512 Feb  2  2021 README",
                "lrwxrwxrwx   1 ftp      ftp             7 Feb  3  2021 latest -> archive.tar.gz",
                "lrwxrwxrwx   1 ftp      ftp             4 Feb  4  2021 parent -> ../chemeng",
            ],
        )
        .with_listing("/chemeng", &[])
}

#[test]
fn browse_a_unix_server() {
    init_tracing();
    let mut engine = StatEngine::new(unix_server());

    let names = engine.listdir("/pub").unwrap();
    assert_eq!(names, vec!["archive.tar.gz", "README", "latest", "parent"]);

    let stat = engine.lstat("/pub/archive.tar.gz").unwrap();
    assert_eq!(stat.file_type(), FileType::Regular);
    assert_eq!(stat.size, Some(1024000));
    assert_eq!(stat.owner.as_deref(), Some("ftp"));

    // The listing confirmed the Unix format.
    assert_eq!(engine.listing_format(), ListingFormat::Unix);
}

#[test]
fn stat_follows_links_across_directories() {
    init_tracing();
    let mut engine = StatEngine::new(unix_server());

    // `latest` points at a sibling file.
    let stat = engine.stat("/pub/latest").unwrap();
    assert_eq!(stat.matched_name, "archive.tar.gz");
    assert_eq!(stat.size, Some(1024000));

    // `parent` points out of the directory; the target's mode carries the
    // set-gid bit from its listing line.
    let stat = engine.stat("/pub/parent").unwrap();
    assert_eq!(stat.matched_name, "chemeng");
    assert!(stat.is_dir());
    assert_eq!(stat.mode & 0o7777, 0o2755);
}

#[test]
fn listings_are_cached_per_directory() {
    init_tracing();
    let mut engine = StatEngine::new(unix_server());

    engine.lstat("/pub/README").unwrap();
    engine.lstat("/pub/archive.tar.gz").unwrap();
    engine.lstat("/pub/latest").unwrap();
    assert_eq!(engine.session_mut().listing_calls, 1);

    engine.invalidate("/pub/README").unwrap();
    engine.lstat("/pub/README").unwrap();
    assert_eq!(engine.session_mut().listing_calls, 2);
}

#[test]
fn microsoft_servers_are_detected_automatically() {
    init_tracing();
    let server = FakeServer::new("/").with_listing(
        "/",
        &[
            "07-17-00  02:08PM       12266720 test.exe",
            "10-23-01  03:25PM       <DIR>          WindowsUpdate",
        ],
    );
    let mut engine = StatEngine::new(server);

    let stat = engine.lstat("/test.exe").unwrap();
    assert_eq!(stat.size, Some(12266720));
    assert_eq!(engine.listing_format(), ListingFormat::Microsoft);

    let dir = engine.lstat("/WindowsUpdate").unwrap();
    assert!(dir.is_dir());
    assert_eq!(dir.size, None);

    let names = engine.listdir("/").unwrap();
    assert_eq!(names, vec!["test.exe", "WindowsUpdate"]);
}

#[test]
fn the_root_cannot_be_stat_ed_but_can_be_listed() {
    init_tracing();
    let mut engine = StatEngine::new(unix_server());

    assert!(matches!(engine.lstat("/"), Err(StatError::RootDir { .. })));
    assert_eq!(engine.listdir("/").unwrap(), vec!["chemeng", "pub"]);
}

#[test]
fn clock_synchronization_round_trip() {
    init_tracing();
    let at = Local::now() - Duration::hours(2);
    let months = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let helper_line = format!(
        "-rw-r--r--   1 ftp ftp 0 {} {} {:02}:{:02} clock_helper",
        months[at.month0() as usize],
        at.day(),
        at.hour(),
        at.minute(),
    );
    let server = FakeServer {
        temp_name: Some("clock_helper".to_string()),
        ..FakeServer::new("/pub")
            .with_listing("/", &["drwxr-xr-x 5 ftp ftp 512 Jan 1 2020 pub"])
            .with_listing("/pub", &[helper_line.as_str()])
    };
    let mut engine = StatEngine::new(server);

    let shift = engine.synchronize_times().unwrap();
    assert_eq!(shift, -7200.0);
    assert_eq!(engine.time_shift(), -7200.0);
    assert_eq!(engine.session_mut().deleted, vec!["/pub/clock_helper"]);
}

#[test]
fn clock_synchronization_needs_a_non_root_helper() {
    init_tracing();
    let mut engine = StatEngine::new(FakeServer {
        temp_name: Some("/".to_string()),
        ..FakeServer::new("/")
    });
    assert!(matches!(
        engine.synchronize_times(),
        Err(StatError::TimeShift(TimeShiftError::RootDirectory))
    ));
}
