//! `minifs` implements a single-volume file store kept in a fixed-size disk image.
//!
//! The namespace is flat: the volume holds up to [`MAX_FILES`] named byte streams
//! and nothing else. All state lives in the image, laid out as follows:
//!
//! - block 0: superblock
//! - block 1: block allocation bitmap
//! - blocks 2 to 9: inode table
//! - blocks 10 and up: file data
//!
//! A volume is created with [`Volume::format`] and accessed through a [`Volume`]
//! handle obtained from [`Volume::mount`]. The handle owns the backing image;
//! dropping it without [`Volume::unmount`] leaves the free-space counters on disk
//! stale until the next unmount.

pub mod bitmap;
pub mod error;
pub mod inode;
pub mod superblock;
pub mod util;
pub mod volume;

pub use error::FsError;
pub use volume::FileInfo;
pub use volume::Volume;

/// The size of a block in bytes.
pub const BLOCK_SIZE: usize = 4096;
/// The total number of blocks in a volume. The image is exactly 10 MiB.
pub const TOTAL_BLOCKS: u32 = 2560;
/// The capacity of the inode table.
pub const MAX_FILES: usize = 256;
/// The number of block pointers stored inline in each inode.
pub const MAX_DIRECT_BLOCKS: usize = 12;
/// The size of an inode's name field in bytes, including the NUL terminator.
pub const MAX_FILENAME: usize = 28;
/// The number of leading blocks permanently reserved for volume metadata.
pub const METADATA_BLOCKS: u32 = 10;

/// The maximum size of a file in bytes.
pub const MAX_FILE_SIZE: usize = MAX_DIRECT_BLOCKS * BLOCK_SIZE;
