//! A mounted volume and the file operations available on it.
//!
//! Every operation resolves names through a linear scan of the inode table,
//! then issues block-level I/O through the allocation bitmap. The superblock's
//! free counters are maintained in memory and flushed at unmount; bitmap and
//! inode updates are persisted immediately.

use crate::bitmap::Bitmap;
use crate::error::FsError;
use crate::inode::Inode;
use crate::inode;
use crate::superblock::Superblock;
use crate::util::ceil_division;
use crate::BLOCK_SIZE;
use crate::MAX_DIRECT_BLOCKS;
use crate::MAX_FILENAME;
use crate::MAX_FILES;
use crate::MAX_FILE_SIZE;
use crate::METADATA_BLOCKS;
use crate::TOTAL_BLOCKS;
use log::debug;
use log::info;
use std::cmp::min;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::io;
use std::path::Path;

/// Describes one file of a volume, as returned by [`Volume::list`].
pub struct FileInfo {
	/// The file's name.
	pub name: String,
	/// The file's length in bytes.
	pub size: u32,
}

/// A mounted volume.
///
/// The value owns the handle to the backing image and the cached superblock.
/// It is created by [`Volume::mount`] and consumed by [`Volume::unmount`],
/// which writes the cached superblock back. At most one process mounts a
/// given image at a time; this is the caller's contract and is not enforced.
#[derive(Debug)]
pub struct Volume {
	/// The handle to the backing image.
	dev: File,
	/// The cached superblock, flushed at unmount.
	superblock: Superblock,
}

impl Volume {
	/// Creates a fresh volume in the image at the given path.
	///
	/// The image is created if necessary and truncated, then every block is
	/// zero-filled before the metadata structures are written. The resulting
	/// image is not mounted.
	pub fn format(path: &Path) -> Result<(), FsError> {
		let mut dev = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(true)
			.open(path)?;

		let empty = [0u8; BLOCK_SIZE];
		for _ in 0..TOTAL_BLOCKS {
			dev.write_all(&empty)?;
		}

		Superblock::new().write(&mut dev)?;
		Bitmap::new().write(&mut dev)?;
		let slot = Inode::zeroed();
		for index in 0..MAX_FILES {
			slot.write(index, &mut dev)?;
		}

		info!(
			"formatted {}: {} blocks of {} bytes, {} inodes",
			path.display(),
			TOTAL_BLOCKS,
			BLOCK_SIZE,
			MAX_FILES
		);
		Ok(())
	}

	/// Mounts the volume in the image at the given path.
	///
	/// The superblock is read and validated against the compiled-in geometry.
	/// Every failure mode reports [`FsError::InvalidVolume`]: a path that
	/// cannot be opened, a truncated image and a foreign image alike.
	pub fn mount(path: &Path) -> Result<Self, FsError> {
		let mut dev = OpenOptions::new()
			.read(true)
			.write(true)
			.open(path)
			.map_err(|e| {
				debug!("{}: {e}", path.display());
				FsError::InvalidVolume
			})?;

		let superblock = Superblock::read(&mut dev).map_err(|e| {
			debug!("{}: superblock read failed: {e}", path.display());
			FsError::InvalidVolume
		})?;
		if !superblock.is_valid() {
			debug!("{}: superblock geometry mismatch", path.display());
			return Err(FsError::InvalidVolume);
		}

		let free_blocks = superblock.free_blocks;
		let free_inodes = superblock.free_inodes;
		debug!(
			"mounted {}: {} free blocks, {} free inodes",
			path.display(),
			free_blocks,
			free_inodes
		);

		Ok(Self {
			dev,
			superblock,
		})
	}

	/// Unmounts the volume, writing the cached superblock back to the image.
	pub fn unmount(mut self) -> Result<(), FsError> {
		self.superblock.write(&mut self.dev)?;
		Ok(())
	}

	/// The total number of blocks in the volume.
	pub fn total_blocks(&self) -> u32 {
		let total_blocks = self.superblock.total_blocks;
		total_blocks as u32
	}

	/// The number of unallocated data blocks.
	pub fn free_blocks(&self) -> u32 {
		let free_blocks = self.superblock.free_blocks;
		free_blocks as u32
	}

	/// The capacity of the inode table.
	pub fn total_inodes(&self) -> u32 {
		let total_inodes = self.superblock.total_inodes;
		total_inodes as u32
	}

	/// The number of free inode slots.
	pub fn free_inodes(&self) -> u32 {
		let free_inodes = self.superblock.free_inodes;
		free_inodes as u32
	}

	/// Validates a file name and returns it as bytes.
	///
	/// A valid name is non-empty, fits in the name field together with its NUL
	/// terminator, and contains no interior NUL byte.
	fn check_name(name: &str) -> Result<&[u8], FsError> {
		let name = name.as_bytes();
		if name.is_empty() || name.len() > MAX_FILENAME - 1 || name.contains(&b'\0') {
			return Err(FsError::InvalidName);
		}

		Ok(name)
	}

	/// Creates an empty file with the given name.
	pub fn create(&mut self, name: &str) -> Result<(), FsError> {
		let name = Self::check_name(name)?;
		if inode::find_by_name(name, &mut self.dev)?.is_some() {
			return Err(FsError::Exists);
		}
		let Some(index) = inode::find_free(&mut self.dev)? else {
			return Err(FsError::NoSpace);
		};

		Inode::new(name).write(index, &mut self.dev)?;
		self.superblock.free_inodes -= 1;

		debug!("created `{}` in slot {index}", String::from_utf8_lossy(name));
		Ok(())
	}

	/// Lists the files present on the volume, in inode-table order.
	///
	/// That order matches creation order, except that slots freed by deletions
	/// are reused lowest-first.
	pub fn list(&mut self) -> Result<Vec<FileInfo>, FsError> {
		let mut files = Vec::new();
		for index in 0..MAX_FILES {
			let slot = Inode::read(index, &mut self.dev)?;
			if slot.used == 0 {
				continue;
			}

			let size = slot.size;
			files.push(FileInfo {
				name: String::from_utf8_lossy(slot.name()).into_owned(),
				size: size as u32,
			});
		}

		Ok(files)
	}

	/// Reads the content of the file with the given name into `buf`.
	///
	/// Copies `min(buf.len(), file size)` bytes and returns the number of
	/// bytes copied. An empty buffer is rejected.
	pub fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, FsError> {
		let name = Self::check_name(name)?;
		if buf.is_empty() {
			return Err(FsError::InvalidArgument);
		}
		let Some((_, slot)) = inode::find_by_name(name, &mut self.dev)? else {
			return Err(FsError::NotFound);
		};

		let size = slot.size;
		let effective = min(buf.len(), size as usize);
		if effective == 0 {
			return Ok(0);
		}

		let blocks = slot.blocks;
		let mut block_buf = [0u8; BLOCK_SIZE];
		let mut copied = 0;
		for block in blocks.iter().take(ceil_division(effective, BLOCK_SIZE)) {
			if *block < METADATA_BLOCKS as i32 || *block >= TOTAL_BLOCKS as i32 {
				return Err(FsError::Corrupted);
			}
			self.read_block(*block as u32, &mut block_buf)?;

			let n = min(BLOCK_SIZE, effective - copied);
			buf[copied..copied + n].copy_from_slice(&block_buf[..n]);
			copied += n;
		}

		Ok(copied)
	}

	/// Replaces the content of the file with the given name by `data`.
	///
	/// The write has whole-file semantics: on success the file's length is
	/// exactly `data.len()` and its content exactly `data`, whatever its prior
	/// state. Fresh blocks are allocated and filled before the previous ones
	/// are released, so a failed write never damages the existing content; the
	/// price is that rewriting a file requires its new block count to be free
	/// while the old blocks are still held.
	pub fn write(&mut self, name: &str, data: &[u8]) -> Result<(), FsError> {
		let name = Self::check_name(name)?;
		if data.is_empty() {
			return Err(FsError::InvalidArgument);
		}
		if data.len() > MAX_FILE_SIZE {
			return Err(FsError::TooLarge);
		}
		let Some((index, mut slot)) = inode::find_by_name(name, &mut self.dev)? else {
			return Err(FsError::NotFound);
		};

		let needed = ceil_division(data.len(), BLOCK_SIZE);
		let free_blocks = self.superblock.free_blocks;
		// The file's current blocks will be released, so count them as
		// available
		if needed > free_blocks as usize + slot.block_count() {
			return Err(FsError::NoSpace);
		}

		// Allocate and fill the new blocks before touching the previous
		// content
		let mut new_blocks = [0i32; MAX_DIRECT_BLOCKS];
		let mut allocated = 0;
		for chunk in data.chunks(BLOCK_SIZE) {
			let Some(block) = self.alloc_block()? else {
				self.release(&new_blocks[..allocated])?;
				return Err(FsError::NoSpace);
			};
			new_blocks[allocated] = block as i32;
			allocated += 1;

			let mut block_buf = [0u8; BLOCK_SIZE];
			block_buf[..chunk.len()].copy_from_slice(chunk);
			self.write_block(block, &block_buf)?;
		}

		// Point the slot at the new content, then release the old one
		let old_blocks = slot.blocks;
		slot.size = data.len() as i32;
		slot.blocks = new_blocks;
		slot.write(index, &mut self.dev)?;
		self.release(&old_blocks)?;

		debug!(
			"wrote {} bytes to `{}` in {needed} blocks",
			data.len(),
			String::from_utf8_lossy(name)
		);
		Ok(())
	}

	/// Deletes the file with the given name, releasing its blocks and its
	/// inode slot.
	///
	/// An invalid name reports [`FsError::RemoveInvalidName`], which carries
	/// the `-2` status class instead of the `-3` used by the other operations.
	pub fn remove(&mut self, name: &str) -> Result<(), FsError> {
		let name = Self::check_name(name).map_err(|_| FsError::RemoveInvalidName)?;
		let Some((index, slot)) = inode::find_by_name(name, &mut self.dev)? else {
			return Err(FsError::NotFound);
		};

		let blocks = slot.blocks;
		self.release(&blocks)?;
		Inode::zeroed().write(index, &mut self.dev)?;
		self.superblock.free_inodes += 1;

		debug!("removed `{}` from slot {index}", String::from_utf8_lossy(name));
		Ok(())
	}

	/// Allocates the lowest-numbered free data block, or returns `None` if the
	/// volume is full.
	fn alloc_block(&mut self) -> Result<Option<u32>, FsError> {
		let mut bitmap = Bitmap::read(&mut self.dev)?;
		let Some(block) = bitmap.find_free() else {
			return Ok(None);
		};
		bitmap.set_used(block);
		bitmap.write(&mut self.dev)?;
		self.superblock.free_blocks -= 1;

		Ok(Some(block))
	}

	/// Releases a single data block.
	fn free_block(&mut self, block: u32) -> Result<(), FsError> {
		let mut bitmap = Bitmap::read(&mut self.dev)?;
		bitmap.set_free(block);
		bitmap.write(&mut self.dev)?;
		self.superblock.free_blocks += 1;

		Ok(())
	}

	/// Releases every non-zero block of the given pointer list.
	fn release(&mut self, blocks: &[i32]) -> Result<(), FsError> {
		for block in blocks {
			if *block != 0 {
				self.free_block(*block as u32)?;
			}
		}

		Ok(())
	}

	/// Reads the data block with the given index into `buf`.
	fn read_block(&mut self, block: u32, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()> {
		self.dev.seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64))?;
		self.dev.read_exact(buf)
	}

	/// Writes `buf` to the data block with the given index.
	fn write_block(&mut self, block: u32, buf: &[u8; BLOCK_SIZE]) -> io::Result<()> {
		self.dev.seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64))?;
		self.dev.write_all(buf)
	}
}
