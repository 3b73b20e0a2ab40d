//! File-backed memory mappings for the broadcast bus.
//!
//! Two wrappers, one per side of the bus: [`MmapFileMut`] is the
//! producer's writable mapping, [`MmapFile`] the read-only mapping
//! subscribers attach with. Each keeps its backing `File` open so the
//! mapping never outlives the descriptor.

use memmap2::{Mmap, MmapMut};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

pub struct MmapFileMut {
    _file: File,
    mmap: MmapMut,
}

pub struct MmapFile {
    _file: File,
    mmap: Mmap,
}

impl MmapFileMut {
    /// Creates the file at `path` sized to `size_bytes` and maps it
    /// read-write. An existing file is truncated first, so the region
    /// always starts out zero-filled.
    pub fn create_rw<P: AsRef<Path>>(path: P, size_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size_bytes)?;
        Self::map(file)
    }

    /// Maps an existing file read-write at its current length.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::map(file)
    }

    fn map(file: File) -> io::Result<Self> {
        // Resizing or unlinking a live bus file is outside the supported
        // lifecycle; the mapping assumes the length fixed at map time.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { _file: file, mmap })
    }

    /// Base pointer of the mapped region.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    /// Mapped length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl MmapFile {
    /// Open an existing file and map it read-only.
    pub fn open_ro<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;

        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self { _file: file, mmap })
    }

    /// Return raw pointer to start of memory mapped file data
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}
