//! Planar source abstraction.
//!
//! A source exposes its pixels as a list of planes, each an interleaved
//! group of `f32` components. Decoders never see the storage format; they
//! only call the methods below, always under their own lock.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! | PlanarSource      |   planes, resolution, scanline / full-plane reads
//! +-------------------+
//!         ^
//!         |
//! +-------+-----------+
//! | DeepSource        |   per-pixel sample cursor
//! +-------------------+
//!         ^
//!         |
//! +-------+-------------------------------+
//! | MemorySource      | MemoryDeepSource  |
//! +-------------------+-------------------+
//! ```
//!
//! Row indices passed to a source are already flipped by the decoder when
//! `reverse_scanlines` is set; sources never flip.

mod memory;

use std::sync::atomic::{AtomicU64, Ordering};

use deeprat_core::PlaneInfo;

use crate::IoResult;

pub use memory::{DeepPixelDesc, MemoryDeepSource, MemorySource, PlaneData, PlaneDesc, SourceDesc};

/// Planar image source consumed by the decoders.
///
/// Implementations must be `Send`; decoders wrap them in a mutex so calls
/// never overlap.
pub trait PlanarSource: Send {
    /// Stored planes, in file order. Immutable for the life of the source.
    fn planes(&self) -> &[PlaneInfo];

    /// Image size as `(width, height)`.
    fn resolution(&self) -> (u32, u32);

    /// Reads one row of `plane` into `out` as `width * cpp` interleaved floats.
    ///
    /// `out` may be longer than needed; only the leading part is written.
    fn read_scanline(&mut self, row: u32, plane: usize, out: &mut [f32]) -> IoResult<()>;

    /// Reads a whole plane as `width * height * cpp` interleaved floats.
    fn read_full_plane(&mut self, plane: usize) -> IoResult<Vec<f32>>;

    /// Widest interleaved row across all planes, in floats.
    fn max_row_len(&self) -> usize {
        let (width, _) = self.resolution();
        let widest = self
            .planes()
            .iter()
            .map(PlaneInfo::component_count)
            .max()
            .unwrap_or(0);
        width as usize * widest
    }
}

/// Planar source with a variable number of samples per pixel.
///
/// The cursor is stateful: [`open_pixel`](Self::open_pixel) positions it,
/// and [`sample_count`](Self::sample_count) / [`sample`](Self::sample) read
/// from the current pixel until the next `open_pixel`.
pub trait DeepSource: PlanarSource {
    /// Positions the sample cursor at `(x, y)`.
    fn open_pixel(&mut self, x: u32, y: u32) -> IoResult<()>;

    /// Number of samples at the current pixel.
    fn sample_count(&self) -> usize;

    /// Components of `plane` for sample `index` of the current pixel.
    ///
    /// Returns an empty slice when `index` or `plane` is out of range.
    fn sample(&self, plane: usize, index: usize) -> &[f32];
}

impl<S: PlanarSource + ?Sized> PlanarSource for Box<S> {
    fn planes(&self) -> &[PlaneInfo] {
        (**self).planes()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }

    fn read_scanline(&mut self, row: u32, plane: usize, out: &mut [f32]) -> IoResult<()> {
        (**self).read_scanline(row, plane, out)
    }

    fn read_full_plane(&mut self, plane: usize) -> IoResult<Vec<f32>> {
        (**self).read_full_plane(plane)
    }
}

impl<S: DeepSource + ?Sized> DeepSource for Box<S> {
    fn open_pixel(&mut self, x: u32, y: u32) -> IoResult<()> {
        (**self).open_pixel(x, y)
    }

    fn sample_count(&self) -> usize {
        (**self).sample_count()
    }

    fn sample(&self, plane: usize, index: usize) -> &[f32] {
        (**self).sample(plane, index)
    }
}

/// Snapshot of source read counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Calls to `read_scanline`.
    pub scanline_reads: u64,
    /// Calls to `read_full_plane`.
    pub full_plane_reads: u64,
    /// Calls to `open_pixel`.
    pub pixel_opens: u64,
    /// Calls to `sample`.
    pub sample_reads: u64,
}

/// Shared, lock-free read counters.
///
/// Sources hold one behind an `Arc` so tests can observe reads after the
/// source has been moved into a decoder.
#[derive(Debug, Default)]
pub struct ReadCounter {
    scanline_reads: AtomicU64,
    full_plane_reads: AtomicU64,
    pixel_opens: AtomicU64,
    sample_reads: AtomicU64,
}

impl ReadCounter {
    pub(crate) fn scanline(&self) {
        self.scanline_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn full_plane(&self) {
        self.full_plane_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pixel(&self) {
        self.pixel_opens.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn sample(&self) {
        self.sample_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values.
    pub fn stats(&self) -> ReadStats {
        ReadStats {
            scanline_reads: self.scanline_reads.load(Ordering::Relaxed),
            full_plane_reads: self.full_plane_reads.load(Ordering::Relaxed),
            pixel_opens: self.pixel_opens.load(Ordering::Relaxed),
            sample_reads: self.sample_reads.load(Ordering::Relaxed),
        }
    }
}
