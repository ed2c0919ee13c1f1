//! Parser for Unix-style (`ls -l`) listing lines.
//!
//! Expected shape, whitespace-tokenized:
//!
//! ```text
//! <10-char mode> <nlink> [<owner>] <group> <size> <month> <day> <year-or-HH:MM> <name>
//! ```
//!
//! Some servers omit the owner column. The two layouts are told apart by
//! the sixth token: in the owner-less layout it is the day of month (an
//! integer), in the full layout it is the month name. The name field may
//! contain a single `" -> "` separating a symlink's name from its target.

use super::{ParseError, split_tokens, time};
use crate::stat::{
    S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFREG, S_IFSOCK, S_ISGID, S_ISUID, StatResult,
};

/// Parse one Unix-style listing line against an explicit wall clock.
pub(crate) fn parse_line_at(
    line: &str,
    time_shift: f64,
    now: f64,
) -> Result<StatResult, ParseError> {
    let tokens = split_tokens(line, 9);
    if tokens.len() < 8 {
        return Err(ParseError::TooFewFields {
            line: line.to_string(),
        });
    }

    // Owner-less layout iff the sixth token is a day of month. Re-split
    // with a lower limit so a name containing spaces stays in one piece.
    let ownerless = tokens[5].parse::<u32>().is_ok();
    let (mode_token, nlink_token, owner, group, size_token, month_token, day_token, time_token, raw_name) =
        if ownerless {
            let t = split_tokens(line, 8);
            (t[0], t[1], None, t[2], t[3], t[4], t[5], t[6], t[7])
        } else {
            if tokens.len() < 9 {
                return Err(ParseError::TooFewFields {
                    line: line.to_string(),
                });
            }
            (
                tokens[0], tokens[1], Some(tokens[2]), tokens[3], tokens[4], tokens[5], tokens[6],
                tokens[7], tokens[8],
            )
        };

    let mode = parse_mode_string(mode_token)?;
    let link_count: u32 = nlink_token.parse().map_err(|_| ParseError::InvalidNumber {
        token: nlink_token.to_string(),
    })?;
    let size: u64 = size_token.parse().map_err(|_| ParseError::InvalidNumber {
        token: size_token.to_string(),
    })?;
    let (mtime, precision) =
        time::resolve_unix_mtime(month_token, day_token, time_token, time_shift, now)?;
    let (name, target) = split_symlink_name(raw_name)?;

    Ok(StatResult {
        mode,
        inode: None,
        device: None,
        link_count: Some(link_count),
        owner: owner.map(str::to_string),
        group: Some(group.to_string()),
        size: Some(size),
        access_time: None,
        modify_time: Some(mtime),
        change_time: None,
        matched_name: name.to_string(),
        link_target: target.map(str::to_string),
        mtime_precision: precision,
    })
}

/// Decode a 10-character mode string (`drwxr-sr-x`) into POSIX mode bits.
///
/// Positions 1..9 map to the nine rwx bits; an `s` in position 3 or 6
/// additionally sets the set-uid or set-gid bit. Characters past position
/// 9 (ACL `+` markers and the like) are ignored.
pub(crate) fn parse_mode_string(token: &str) -> Result<u32, ParseError> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 10 {
        return Err(ParseError::InvalidModeString {
            mode: token.to_string(),
        });
    }
    let mut mode: u32 = 0;
    for &c in &chars[1..10] {
        mode = (mode << 1) | u32::from(c != '-');
    }
    if chars[3] == 's' {
        mode |= S_ISUID;
    }
    if chars[6] == 's' {
        mode |= S_ISGID;
    }
    let type_bits = match chars[0] {
        '-' => S_IFREG,
        'd' => S_IFDIR,
        'l' => S_IFLNK,
        'b' => S_IFBLK,
        'c' => S_IFCHR,
        'p' => S_IFIFO,
        's' => S_IFSOCK,
        '?' => 0,
        _ => {
            return Err(ParseError::InvalidModeString {
                mode: token.to_string(),
            });
        }
    };
    Ok(mode | type_bits)
}

/// Split a raw name field into `(name, symlink target)`.
///
/// More than one `" -> "` makes the target ambiguous and is rejected.
fn split_symlink_name(raw: &str) -> Result<(&str, Option<&str>), ParseError> {
    let mut parts = raw.split(" -> ");
    let name = parts.next().unwrap_or(raw);
    match (parts.next(), parts.next()) {
        (None, _) => Ok((raw, None)),
        (Some(target), None) => Ok((name, Some(target))),
        (Some(_), Some(_)) => Err(ParseError::AmbiguousLink {
            name: raw.to_string(),
        }),
    }
}
