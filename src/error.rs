//! Error type shared by every volume operation.

use std::io;
use thiserror::Error;

/// An error occurring while operating on a volume.
#[derive(Debug, Error)]
pub enum FsError {
	/// A file with the requested name is already present.
	#[error("file already exists")]
	Exists,
	/// No file with the requested name is present.
	#[error("file not found")]
	NotFound,
	/// The volume has no free inode slot or not enough free blocks.
	#[error("no space left on volume")]
	NoSpace,
	/// The payload exceeds the maximum file size.
	#[error("file too large")]
	TooLarge,
	/// The name is empty, too long, or contains a NUL byte.
	#[error("invalid file name")]
	InvalidName,
	/// The name passed to a removal is empty, too long, or contains a NUL
	/// byte. Removals report invalid names with the exhaustion status class,
	/// unlike every other operation.
	#[error("invalid file name")]
	RemoveInvalidName,
	/// A parameter is invalid, such as an empty buffer or payload.
	#[error("invalid argument")]
	InvalidArgument,
	/// The image does not contain a mountable volume.
	#[error("invalid volume")]
	InvalidVolume,
	/// The on-disk structures are inconsistent, such as an inode referencing a
	/// block outside of the data region.
	#[error("corrupted volume")]
	Corrupted,
	/// An I/O failure on the backing image.
	#[error(transparent)]
	Io(#[from] io::Error),
}

impl FsError {
	/// Returns the status code reported by the `minifs` command.
	///
	/// Name lookup and mount failures map to `-1`, exhaustion of inodes or
	/// blocks to `-2`, and invalid parameters or runtime failures to `-3`.
	/// A removal with an invalid name also maps to `-2`.
	pub fn code(&self) -> i32 {
		match self {
			Self::Exists | Self::NotFound | Self::InvalidVolume => -1,
			Self::NoSpace | Self::TooLarge | Self::RemoveInvalidName => -2,
			Self::InvalidName | Self::InvalidArgument | Self::Corrupted | Self::Io(_) => -3,
		}
	}
}
