//! Parser for Microsoft/DOS-style listing lines.
//!
//! Expected shape, exactly four fields after splitting at most three
//! times:
//!
//! ```text
//! <MM-DD-YY> <HH:MM(AM|PM)> <"<DIR>"|size> <name>
//! ```
//!
//! The format carries far less than the Unix one: no permissions, no
//! owner, no link count. Directories are marked with the `<DIR>` token and
//! have no size. The listing prints explicit years, so the time shift is
//! never needed here; the format always has minute precision.

use super::{ParseError, split_tokens, time};
use crate::stat::{PRECISION_MINUTE, S_IFDIR, S_IFREG, StatResult};

/// Read access only; the format reveals nothing more about permissions.
const READ_ONLY: u32 = 0o400;

/// Parse one DOS-style listing line.
pub(crate) fn parse_line(line: &str) -> Result<StatResult, ParseError> {
    let tokens = split_tokens(line, 4);
    if tokens.len() < 4 {
        return Err(ParseError::TooFewFields {
            line: line.to_string(),
        });
    }
    let (date_token, time_token, dir_or_size, name) = (tokens[0], tokens[1], tokens[2], tokens[3]);

    let mtime = time::resolve_ms_mtime(date_token, time_token)?;
    let (mode, size) = if dir_or_size == "<DIR>" {
        (READ_ONLY | S_IFDIR, None)
    } else {
        let size: u64 = dir_or_size.parse().map_err(|_| ParseError::InvalidNumber {
            token: dir_or_size.to_string(),
        })?;
        (READ_ONLY | S_IFREG, Some(size))
    };

    Ok(StatResult {
        mode,
        inode: None,
        device: None,
        link_count: None,
        owner: None,
        group: None,
        size,
        access_time: None,
        modify_time: Some(mtime),
        change_time: None,
        matched_name: name.to_string(),
        link_target: None,
        mtime_precision: PRECISION_MINUTE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::FileType;
    use chrono::{Local, TimeZone};

    fn epoch(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> f64 {
        Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .unwrap()
            .timestamp() as f64
    }

    #[test]
    fn regular_file() {
        let stat = parse_line("07-17-00  02:08PM       12266720 test.exe").unwrap();
        assert_eq!(stat.file_type(), FileType::Regular);
        assert_eq!(stat.mode, S_IFREG | 0o400);
        assert_eq!(stat.size, Some(12266720));
        assert_eq!(stat.modify_time, Some(epoch(2000, 7, 17, 14, 8)));
        assert_eq!(stat.mtime_precision, PRECISION_MINUTE);
        assert_eq!(stat.matched_name, "test.exe");
        assert_eq!(stat.link_target, None);
    }

    #[test]
    fn directory_entry() {
        let stat = parse_line("10-23-01  03:25PM       <DIR>          WindowsUpdate").unwrap();
        assert!(stat.is_dir());
        assert_eq!(stat.mode, S_IFDIR | 0o400);
        assert_eq!(stat.size, None);
        assert_eq!(stat.matched_name, "WindowsUpdate");
    }

    #[test]
    fn name_may_contain_spaces() {
        let stat = parse_line("07-17-00  02:08PM       128 My Documents.zip").unwrap();
        assert_eq!(stat.matched_name, "My Documents.zip");
    }

    #[test]
    fn pre_2000_years_stay_in_the_1900s() {
        let stat = parse_line("03-07-95  01:30AM       100 old.dat").unwrap();
        assert_eq!(stat.modify_time, Some(epoch(1995, 3, 7, 1, 30)));
    }

    #[test]
    fn non_integer_size_is_rejected() {
        assert!(matches!(
            parse_line("07-17-00  02:08PM       big test.exe"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn too_few_fields() {
        assert!(matches!(
            parse_line("07-17-00  02:08PM"),
            Err(ParseError::TooFewFields { .. })
        ));
    }

    #[test]
    fn unix_line_does_not_parse_as_ms() {
        assert!(
            parse_line("drwxr-sr-x   2   45854    200           512 May  4  2000 chemeng")
                .is_err()
        );
    }
}
