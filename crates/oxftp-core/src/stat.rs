//! Structured stat results reconstructed from directory listings.
//!
//! FTP has no stat call, so everything in a [`StatResult`] comes from
//! parsing one line of listing output. Fields the listing format cannot
//! express are `None`; the mode bits use the POSIX encoding so hosts can
//! feed them to anything expecting `st_mode` semantics.

use serde::{Deserialize, Serialize};

/// Mask for the file-type bits of a mode value.
pub const S_IFMT: u32 = 0o170000;
/// Regular file.
pub const S_IFREG: u32 = 0o100000;
/// Directory.
pub const S_IFDIR: u32 = 0o040000;
/// Symbolic link.
pub const S_IFLNK: u32 = 0o120000;
/// Block device.
pub const S_IFBLK: u32 = 0o060000;
/// Character device.
pub const S_IFCHR: u32 = 0o020000;
/// FIFO.
pub const S_IFIFO: u32 = 0o010000;
/// Socket.
pub const S_IFSOCK: u32 = 0o140000;
/// Set-user-id bit.
pub const S_ISUID: u32 = 0o4000;
/// Set-group-id bit.
pub const S_ISGID: u32 = 0o2000;

/// Modification-time precision of a minute-resolution listing entry.
pub const PRECISION_MINUTE: f64 = 60.0;
/// Modification-time precision of a day-resolution listing entry.
pub const PRECISION_DAY: f64 = 86400.0;

/// The type of a filesystem entry, derived from the mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// A regular file.
    Regular,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
    /// A block device.
    BlockDevice,
    /// A character device.
    CharDevice,
    /// A FIFO (named pipe).
    Fifo,
    /// A socket.
    Socket,
    /// The listing did not reveal the type.
    Unknown,
}

impl FileType {
    /// Derive the file type from POSIX mode bits.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => FileType::Regular,
            S_IFDIR => FileType::Directory,
            S_IFLNK => FileType::Symlink,
            S_IFBLK => FileType::BlockDevice,
            S_IFCHR => FileType::CharDevice,
            S_IFIFO => FileType::Fifo,
            S_IFSOCK => FileType::Socket,
            _ => FileType::Unknown,
        }
    }
}

/// Metadata for one filesystem entry, reconstructed from a listing line.
///
/// Analogous to a POSIX stat structure, plus two fields the analogy does
/// not cover: [`matched_name`](StatResult::matched_name), the name token
/// exactly as it appeared in the listing (the caller's request string may
/// differ in case or whitespace), and
/// [`link_target`](StatResult::link_target), set only for symbolic links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatResult {
    /// Permission and file-type bits, POSIX-encoded.
    pub mode: u32,
    /// Inode number. Listings never carry one.
    pub inode: Option<u64>,
    /// Device number. Listings never carry one.
    pub device: Option<u64>,
    /// Hard link count.
    pub link_count: Option<u32>,
    /// Owner as reported by the server. Some servers omit the field.
    pub owner: Option<String>,
    /// Group as reported by the server.
    pub group: Option<String>,
    /// Size in bytes. Absent for directories in DOS-style listings.
    pub size: Option<u64>,
    /// Last access time, seconds since the epoch. Listings never carry one.
    pub access_time: Option<f64>,
    /// Modification time, seconds since the epoch. Resolution is bounded by
    /// [`mtime_precision`](StatResult::mtime_precision).
    pub modify_time: Option<f64>,
    /// Status-change time. Listings never carry one.
    pub change_time: Option<u32>,
    /// The name token as it appeared in the listing line.
    pub matched_name: String,
    /// Symlink target, set iff the entry is a symbolic link.
    pub link_target: Option<String>,
    /// Granularity of `modify_time` in seconds: 60 for `HH:MM` entries,
    /// 86400 for year-only entries. "Newer than" comparisons must widen
    /// their tolerance by this amount.
    pub mtime_precision: f64,
}

impl StatResult {
    /// The file type encoded in the mode bits.
    #[inline]
    pub fn file_type(&self) -> FileType {
        FileType::from_mode(self.mode)
    }

    /// Returns true if this entry is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type() == FileType::Directory
    }

    /// Returns true if this entry is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type() == FileType::Regular
    }

    /// Returns true if this entry is a symbolic link.
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type() == FileType::Symlink
    }
}
