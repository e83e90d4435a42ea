//! Packaging the static library for the IPASIR harness.
//!
//! The harness builds each solver directory with `make`, so the library is
//! shipped as a gzip tarball next to a lowercase `makefile` whose only rule
//! unpacks it. The tarball also carries `LINK` and `LIBS`, which tell the
//! harness which linker and extra link flags the library needs.

use crate::error::CommandError;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TAR_NAME: &str = "edusat.tar.gz";
pub const MAKEFILE_NAME: &str = "makefile";

const LINK_NAME: &str = "LINK";
const LIBS_NAME: &str = "LIBS";
const LINKER: &str = "g++";
const LIBRARIES: &str = "-lm -lz -lstdc++ -fsanitize=address -fsanitize=undefined";

/// Files written into the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed {
    pub tar: PathBuf,
    pub makefile: PathBuf,
}

/// Makefile whose default target unpacks the tarball into `target_name`.
///
/// Recipe lines must start with a tab.
pub fn makefile(target_name: &str) -> String {
    format!(
        "\nall: {target_name}\n\n{target_name}:\n\ttar zxf {TAR_NAME} --overwrite\n\n.PHONY: all\n"
    )
}

/// Gzip tarball holding `target`, `LINK` and `LIBS`.
///
/// # Errors
///
/// Fails if `target` cannot be read.
pub fn archive(target: &Path) -> Result<Vec<u8>, CommandError> {
    let name = target
        .file_name()
        .ok_or_else(|| {
            CommandError::io(
                target,
                io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"),
            )
        })?
        .to_owned();

    let build = || -> io::Result<Vec<u8>> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        builder.append_path_with_name(target, &name)?;
        append_generated(&mut builder, LINK_NAME, LINKER)?;
        append_generated(&mut builder, LIBS_NAME, LIBRARIES)?;
        builder.into_inner()?.finish()
    };
    build().map_err(|e| CommandError::io(target, e))
}

fn append_generated<W: io::Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    contents: &str,
) -> io::Result<()> {
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    builder.append_data(&mut header, name, contents.as_bytes())
}

/// Remove everything inside `dir`, keeping `dir` itself.
///
/// # Errors
///
/// Fails on the first entry that cannot be removed.
pub fn clear_dir(dir: &Path) -> Result<(), CommandError> {
    let entries = fs::read_dir(dir).map_err(|e| CommandError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CommandError::io(dir, e))?;
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map_err(|e| CommandError::io(&path, e))?
            .is_dir();
        let removed = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| CommandError::io(&path, e))?;
    }
    Ok(())
}

/// Replace the contents of `destination` with the packaged `target`.
///
/// The tarball is built before `destination` is touched, so a missing target
/// leaves the previous package in place.
///
/// # Errors
///
/// Any filesystem error is returned as is; there is no partial recovery.
pub fn pack(target: &Path, destination: &Path) -> Result<Packed, CommandError> {
    let tarball = archive(target)?;
    let target_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    fs::create_dir_all(destination).map_err(|e| CommandError::io(destination, e))?;
    clear_dir(destination)?;

    let packed = Packed {
        tar: destination.join(TAR_NAME),
        makefile: destination.join(MAKEFILE_NAME),
    };
    fs::write(&packed.tar, tarball).map_err(|e| CommandError::io(&packed.tar, e))?;
    fs::write(&packed.makefile, makefile(&target_name))
        .map_err(|e| CommandError::io(&packed.makefile, e))?;

    tracing::debug!(destination = %destination.display(), "packed {target_name}");
    Ok(packed)
}
