//! The `minifs` command manages volumes of the minifs flat file store.
//!
//! Every invocation mounts the image, performs a single operation and unmounts.

use minifs::util::ByteSize;
use minifs::FsError;
use minifs::Volume;
use minifs::BLOCK_SIZE;
use minifs::MAX_FILE_SIZE;
use std::env;
use std::fmt;
use std::io::Read;
use std::io::Write;
use std::io;
use std::path::Path;
use std::process::exit;

/// Prints the command's usage.
fn print_usage() {
	eprintln!("Usage:");
	eprintln!(" minifs format <image>");
	eprintln!(" minifs create <image> <name>");
	eprintln!(" minifs write <image> <name>");
	eprintln!(" minifs read <image> <name>");
	eprintln!(" minifs ls <image>");
	eprintln!(" minifs rm <image> <name>");
	eprintln!(" minifs stat <image>");
	eprintln!();
	eprintln!("Commands:");
	eprintln!(" format:\tcreates an empty volume in the image, overwriting its content");
	eprintln!(" create:\tcreates an empty file");
	eprintln!(" write:\treplaces a file's content with standard input");
	eprintln!(" read:\twrites a file's content to standard output");
	eprintln!(" ls:\t\tlists files along with their sizes");
	eprintln!(" rm:\t\tdeletes a file");
	eprintln!(" stat:\tprints the volume's free space counters");
}

/// Writes an error to stderr, then exits with a status matching the given
/// operation code.
fn error<M: fmt::Display>(msg: M, code: i32) -> ! {
	eprintln!("minifs: error: {msg}");
	exit(-code)
}

/// Mounts the image at the given path, runs `f` on the volume, then unmounts.
///
/// The superblock is flushed even when the operation fails.
fn with_volume<F>(image: &str, f: F) -> Result<(), FsError>
where
	F: FnOnce(&mut Volume) -> Result<(), FsError>,
{
	let mut vol = Volume::mount(Path::new(image))?;
	let result = f(&mut vol);
	result.and(vol.unmount())
}

fn main() {
	env_logger::init();

	let args: Vec<String> = env::args().skip(1).collect();
	let args: Vec<&str> = args.iter().map(String::as_str).collect();
	let result = match args[..] {
		["format", image] => Volume::format(Path::new(image)),
		["create", image, name] => with_volume(image, |vol| vol.create(name)),
		["write", image, name] => with_volume(image, |vol| {
			let mut data = Vec::new();
			io::stdin().read_to_end(&mut data).map_err(FsError::from)?;
			vol.write(name, &data)
		}),
		["read", image, name] => with_volume(image, |vol| {
			let mut buf = vec![0u8; MAX_FILE_SIZE];
			let n = vol.read(name, &mut buf)?;
			io::stdout().write_all(&buf[..n]).map_err(FsError::from)
		}),
		["ls", image] => with_volume(image, |vol| {
			for file in vol.list()? {
				println!("{}\t{}", file.name, ByteSize(file.size as u64));
			}
			Ok(())
		}),
		["rm", image, name] => with_volume(image, |vol| vol.remove(name)),
		["stat", image] => with_volume(image, |vol| {
			println!("blocks: {}/{} free", vol.free_blocks(), vol.total_blocks());
			println!("inodes: {}/{} free", vol.free_inodes(), vol.total_inodes());
			println!(
				"free space: {}",
				ByteSize(vol.free_blocks() as u64 * BLOCK_SIZE as u64)
			);
			Ok(())
		}),
		["-h"] | ["--help"] => {
			print_usage();
			exit(0);
		}
		_ => {
			print_usage();
			exit(1);
		}
	};

	if let Err(e) = result {
		let code = e.code();
		error(e, code);
	}
}
