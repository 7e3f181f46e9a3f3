//! Memory-backed planar sources.
//!
//! [`MemorySource`] and [`MemoryDeepSource`] keep each plane in its
//! **native** sample width ([`PlaneData`]) and convert to `f32` on read,
//! the same way a file-backed reader would. Both count their reads through
//! a shared [`ReadCounter`].
//!
//! Sources can be described in YAML:
//!
//! ```yaml
//! width: 2
//! height: 1
//! planes:
//!   - name: C
//!     components: [r, g, b, a]
//!     bit_depth: f16
//!     data: [1.0, 0.0, 0.0, 1.0,  0.0, 1.0, 0.0, 1.0]
//! ```
//!
//! A deep description sets `deep: true`, leaves plane `data` empty and
//! lists per-pixel samples instead:
//!
//! ```yaml
//! width: 1
//! height: 1
//! deep: true
//! planes:
//!   - { name: Pz, components: [r] }
//!   - { name: Of, components: [r] }
//! pixels:
//!   - x: 0
//!     y: 0
//!     planes:
//!       Pz: [1.0, 2.0, 3.0]
//!       Of: [1.0, 0.6, 0.0]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use deeprat_core::{BitDepth, Error, PlaneInfo};
use half::f16;
use serde::{Deserialize, Serialize};

use tracing::{debug, trace};

use super::{DeepSource, PlanarSource, ReadCounter};
use crate::{IoError, IoResult};

/// Maximum value for 8-bit unsigned normalization.
const U8_MAX_F32: f32 = u8::MAX as f32;
/// Maximum value for 16-bit unsigned normalization.
const U16_MAX_F32: f32 = u16::MAX as f32;

/// Plane samples in their stored width.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneData {
    /// 8-bit unsigned, normalized to [0, 1] on read.
    U8(Vec<u8>),
    /// 16-bit unsigned, normalized to [0, 1] on read.
    U16(Vec<u16>),
    /// Half float.
    F16(Vec<f16>),
    /// Single float.
    F32(Vec<f32>),
}

impl PlaneData {
    /// Quantizes `values` to `bit_depth`.
    pub fn from_f32(values: &[f32], bit_depth: BitDepth) -> Self {
        match bit_depth {
            BitDepth::U8 => Self::U8(
                values
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * U8_MAX_F32).round() as u8)
                    .collect(),
            ),
            BitDepth::U16 => Self::U16(
                values
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * U16_MAX_F32).round() as u16)
                    .collect(),
            ),
            BitDepth::F16 => Self::F16(values.iter().map(|&v| f16::from_f32(v)).collect()),
            BitDepth::F32 => Self::F32(values.to_vec()),
        }
    }

    /// Number of stored scalars.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(d) => d.len(),
            Self::U16(d) => d.len(),
            Self::F16(d) => d.len(),
            Self::F32(d) => d.len(),
        }
    }

    /// Returns `true` if no scalars are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts `len` scalars starting at `start` into `out`.
    fn copy_to(&self, start: usize, out: &mut [f32]) {
        let end = start + out.len();
        match self {
            Self::U8(d) => {
                for (o, &v) in out.iter_mut().zip(&d[start..end]) {
                    *o = v as f32 / U8_MAX_F32;
                }
            }
            Self::U16(d) => {
                for (o, &v) in out.iter_mut().zip(&d[start..end]) {
                    *o = v as f32 / U16_MAX_F32;
                }
            }
            Self::F16(d) => {
                for (o, &v) in out.iter_mut().zip(&d[start..end]) {
                    *o = v.to_f32();
                }
            }
            Self::F32(d) => out.copy_from_slice(&d[start..end]),
        }
    }

    fn to_f32_vec(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.len()];
        self.copy_to(0, &mut out);
        out
    }
}

/// One plane of a source description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneDesc {
    /// Plane layout.
    #[serde(flatten)]
    pub info: PlaneInfo,
    /// Interleaved `width * height * cpp` values (flat sources only).
    /// Empty means zero-filled.
    #[serde(default)]
    pub data: Vec<f32>,
}

/// Samples of one deep pixel, keyed by plane name.
///
/// Each entry holds `samples * cpp` interleaved values. Planes that are not
/// listed read as zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepPixelDesc {
    /// Column.
    pub x: u32,
    /// Row, in source order.
    pub y: u32,
    /// Plane name to interleaved sample values.
    #[serde(default)]
    pub planes: BTreeMap<String, Vec<f32>>,
}

impl DeepPixelDesc {
    /// Creates a pixel with no samples.
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            planes: BTreeMap::new(),
        }
    }

    /// Adds the samples of one plane.
    pub fn with_plane(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.planes.insert(name.into(), values);
        self
    }
}

/// YAML-serializable description of a flat or deep source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `true` for a deep (per-pixel sample list) source.
    #[serde(default)]
    pub deep: bool,
    /// Planes, in file order.
    #[serde(default)]
    pub planes: Vec<PlaneDesc>,
    /// Deep pixels with at least one sample.
    #[serde(default)]
    pub pixels: Vec<DeepPixelDesc>,
}

impl SourceDesc {
    /// Parses a description from YAML.
    pub fn from_yaml_str(yaml: &str) -> IoResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a description from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| IoError::Open(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Plane layouts without data.
    pub fn plane_infos(&self) -> Vec<PlaneInfo> {
        self.planes.iter().map(|p| p.info.clone()).collect()
    }
}

fn check_plane(planes: &[PlaneInfo], plane: usize) -> IoResult<&PlaneInfo> {
    planes
        .get(plane)
        .ok_or_else(|| IoError::Source(format!("plane index {plane} out of range ({} planes)", planes.len())))
}

/// Flat source held in memory.
///
/// # Example
///
/// ```rust
/// use deeprat_core::{BitDepth, PlaneInfo};
/// use deeprat_io::source::{MemorySource, PlanarSource};
///
/// let plane = PlaneInfo::new("C", ["r", "g", "b", "a"], BitDepth::F32);
/// let mut source = MemorySource::new(1, 1, vec![(plane, vec![0.5, 0.25, 0.0, 1.0])]).unwrap();
///
/// let mut row = vec![0.0; 4];
/// source.read_scanline(0, 0, &mut row).unwrap();
/// assert_eq!(row, [0.5, 0.25, 0.0, 1.0]);
/// assert_eq!(source.counter().stats().scanline_reads, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    width: u32,
    height: u32,
    planes: Vec<PlaneInfo>,
    data: Vec<PlaneData>,
    counter: Arc<ReadCounter>,
}

impl MemorySource {
    /// Creates a source from `(layout, interleaved values)` pairs.
    ///
    /// Each value list must hold `width * height * cpp` floats, or be empty
    /// for a zero-filled plane. Values are stored at the plane's bit depth.
    pub fn new(width: u32, height: u32, planes: Vec<(PlaneInfo, Vec<f32>)>) -> IoResult<Self> {
        let pixels = width as usize * height as usize;
        let mut infos = Vec::with_capacity(planes.len());
        let mut data = Vec::with_capacity(planes.len());

        for (info, values) in planes {
            info.validate()?;
            let expected = pixels * info.component_count();
            let values = if values.is_empty() {
                vec![0.0; expected]
            } else if values.len() != expected {
                return Err(IoError::Open(format!(
                    "plane '{}' has {} values, expected {} ({}x{}x{})",
                    info.name,
                    values.len(),
                    expected,
                    width,
                    height,
                    info.component_count()
                )));
            } else {
                values
            };
            data.push(PlaneData::from_f32(&values, info.bit_depth));
            infos.push(info);
        }

        debug!(width, height, planes = infos.len(), "MemorySource created");

        Ok(Self {
            width,
            height,
            planes: infos,
            data,
            counter: Arc::new(ReadCounter::default()),
        })
    }

    /// Builds a source from a description. Deep descriptions are rejected.
    pub fn from_desc(desc: SourceDesc) -> IoResult<Self> {
        if desc.deep {
            return Err(IoError::Open("description is a deep source".into()));
        }
        let planes = desc.planes.into_iter().map(|p| (p.info, p.data)).collect();
        Self::new(desc.width, desc.height, planes)
    }

    /// Parses a YAML description.
    pub fn from_yaml_str(yaml: &str) -> IoResult<Self> {
        Self::from_desc(SourceDesc::from_yaml_str(yaml)?)
    }

    /// Loads a YAML description from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        Self::from_desc(SourceDesc::load(path)?)
    }

    /// Shared read counters.
    pub fn counter(&self) -> Arc<ReadCounter> {
        Arc::clone(&self.counter)
    }

    /// Stored data of plane `index`.
    pub fn plane_data(&self, index: usize) -> Option<&PlaneData> {
        self.data.get(index)
    }
}

impl PlanarSource for MemorySource {
    fn planes(&self) -> &[PlaneInfo] {
        &self.planes
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_scanline(&mut self, row: u32, plane: usize, out: &mut [f32]) -> IoResult<()> {
        let cpp = check_plane(&self.planes, plane)?.component_count();
        if row >= self.height {
            return Err(Error::out_of_bounds(0, row, self.width, self.height).into());
        }
        let len = self.width as usize * cpp;
        if out.len() < len {
            return Err(IoError::Source(format!(
                "scanline buffer holds {} floats, row needs {}",
                out.len(),
                len
            )));
        }
        self.counter.scanline();
        trace!(row, plane, "read_scanline");
        self.data[plane].copy_to(row as usize * len, &mut out[..len]);
        Ok(())
    }

    fn read_full_plane(&mut self, plane: usize) -> IoResult<Vec<f32>> {
        check_plane(&self.planes, plane)?;
        self.counter.full_plane();
        debug!(plane, name = %self.planes[plane].name, "read_full_plane");
        Ok(self.data[plane].to_f32_vec())
    }
}

/// Deep source held in memory.
///
/// Samples are stored per plane in pixel order, addressed through
/// cumulative per-pixel sample offsets. [`open_pixel`](DeepSource::open_pixel)
/// converts the pixel's samples into a small `f32` cursor buffer.
///
/// As a [`PlanarSource`], each pixel reads as its front-most sample, or
/// zeros when it has none.
#[derive(Debug, Clone)]
pub struct MemoryDeepSource {
    width: u32,
    height: u32,
    planes: Vec<PlaneInfo>,
    /// Cumulative sample counts; entry `i` is the end of pixel `i`.
    sample_offsets: Vec<u32>,
    data: Vec<PlaneData>,
    cursor: Vec<Vec<f32>>,
    cursor_samples: usize,
    counter: Arc<ReadCounter>,
}

impl MemoryDeepSource {
    /// Creates a deep source from plane layouts and per-pixel samples.
    ///
    /// Pixels not listed have no samples. Within a pixel every listed plane
    /// must describe the same number of samples.
    pub fn from_pixels(
        width: u32,
        height: u32,
        planes: Vec<PlaneInfo>,
        pixels: Vec<DeepPixelDesc>,
    ) -> IoResult<Self> {
        for plane in &planes {
            plane.validate()?;
        }

        let pixel_count = width as usize * height as usize;
        let mut by_index: Vec<Option<DeepPixelDesc>> = vec![None; pixel_count];
        for pixel in pixels {
            if pixel.x >= width || pixel.y >= height {
                return Err(Error::out_of_bounds(pixel.x, pixel.y, width, height).into());
            }
            if let Some(name) = pixel.planes.keys().find(|n| !planes.iter().any(|p| &p.name == *n)) {
                return Err(IoError::Open(format!(
                    "pixel ({}, {}) references unknown plane '{}'",
                    pixel.x, pixel.y, name
                )));
            }
            let idx = pixel.y as usize * width as usize + pixel.x as usize;
            if by_index[idx].is_some() {
                return Err(IoError::Open(format!(
                    "pixel ({}, {}) listed twice",
                    pixel.x, pixel.y
                )));
            }
            by_index[idx] = Some(pixel);
        }

        let mut sample_offsets = Vec::with_capacity(pixel_count);
        let mut values: Vec<Vec<f32>> = vec![Vec::new(); planes.len()];
        let mut total: u32 = 0;

        for slot in &by_index {
            let samples = match slot {
                Some(pixel) => Self::pixel_sample_count(pixel, &planes)?,
                None => 0,
            };
            for (p, plane) in planes.iter().enumerate() {
                let cpp = plane.component_count();
                match slot.as_ref().and_then(|px| px.planes.get(&plane.name)) {
                    Some(v) => values[p].extend_from_slice(v),
                    None => values[p].extend(std::iter::repeat_n(0.0, samples * cpp)),
                }
            }
            total += samples as u32;
            sample_offsets.push(total);
        }

        let data = planes
            .iter()
            .zip(&values)
            .map(|(info, v)| PlaneData::from_f32(v, info.bit_depth))
            .collect();

        debug!(width, height, planes = planes.len(), samples = total, "MemoryDeepSource created");

        let cursor = vec![Vec::new(); planes.len()];
        Ok(Self {
            width,
            height,
            planes,
            sample_offsets,
            data,
            cursor,
            cursor_samples: 0,
            counter: Arc::new(ReadCounter::default()),
        })
    }

    fn pixel_sample_count(pixel: &DeepPixelDesc, planes: &[PlaneInfo]) -> IoResult<usize> {
        let mut count: Option<usize> = None;
        for plane in planes {
            let Some(v) = pixel.planes.get(&plane.name) else {
                continue;
            };
            let cpp = plane.component_count();
            if v.len() % cpp != 0 {
                return Err(IoError::Open(format!(
                    "pixel ({}, {}) plane '{}': {} values is not a multiple of {} components",
                    pixel.x,
                    pixel.y,
                    plane.name,
                    v.len(),
                    cpp
                )));
            }
            let n = v.len() / cpp;
            match count {
                Some(c) if c != n => {
                    return Err(IoError::Open(format!(
                        "pixel ({}, {}) planes disagree on sample count ({} vs {})",
                        pixel.x, pixel.y, c, n
                    )));
                }
                _ => count = Some(n),
            }
        }
        Ok(count.unwrap_or(0))
    }

    /// Builds a source from a description with `deep: true`.
    pub fn from_desc(desc: SourceDesc) -> IoResult<Self> {
        if !desc.deep {
            return Err(IoError::Open("description is a flat source".into()));
        }
        let planes = desc.planes.into_iter().map(|p| p.info).collect();
        Self::from_pixels(desc.width, desc.height, planes, desc.pixels)
    }

    /// Parses a YAML description.
    pub fn from_yaml_str(yaml: &str) -> IoResult<Self> {
        Self::from_desc(SourceDesc::from_yaml_str(yaml)?)
    }

    /// Loads a YAML description from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        Self::from_desc(SourceDesc::load(path)?)
    }

    /// Shared read counters.
    pub fn counter(&self) -> Arc<ReadCounter> {
        Arc::clone(&self.counter)
    }

    /// Total number of samples across all pixels.
    pub fn total_samples(&self) -> usize {
        self.sample_offsets.last().copied().unwrap_or(0) as usize
    }

    /// Sample range of linear pixel `idx`.
    fn pixel_range(&self, idx: usize) -> std::ops::Range<usize> {
        let end = self.sample_offsets[idx] as usize;
        let start = if idx == 0 {
            0
        } else {
            self.sample_offsets[idx - 1] as usize
        };
        start..end
    }
}

impl PlanarSource for MemoryDeepSource {
    fn planes(&self) -> &[PlaneInfo] {
        &self.planes
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_scanline(&mut self, row: u32, plane: usize, out: &mut [f32]) -> IoResult<()> {
        let cpp = check_plane(&self.planes, plane)?.component_count();
        if row >= self.height {
            return Err(Error::out_of_bounds(0, row, self.width, self.height).into());
        }
        let len = self.width as usize * cpp;
        if out.len() < len {
            return Err(IoError::Source(format!(
                "scanline buffer holds {} floats, row needs {}",
                out.len(),
                len
            )));
        }
        self.counter.scanline();
        for x in 0..self.width as usize {
            let idx = row as usize * self.width as usize + x;
            let range = self.pixel_range(idx);
            let dst = &mut out[x * cpp..(x + 1) * cpp];
            if range.is_empty() {
                dst.fill(0.0);
            } else {
                self.data[plane].copy_to(range.start * cpp, dst);
            }
        }
        Ok(())
    }

    fn read_full_plane(&mut self, plane: usize) -> IoResult<Vec<f32>> {
        let cpp = check_plane(&self.planes, plane)?.component_count();
        let mut out = vec![0.0; self.width as usize * cpp];
        let mut full = Vec::with_capacity(out.len() * self.height as usize);
        for row in 0..self.height {
            self.read_scanline(row, plane, &mut out)?;
            full.extend_from_slice(&out);
        }
        self.counter.full_plane();
        Ok(full)
    }
}

impl DeepSource for MemoryDeepSource {
    fn open_pixel(&mut self, x: u32, y: u32) -> IoResult<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height).into());
        }
        self.counter.pixel();

        let range = self.pixel_range(y as usize * self.width as usize + x as usize);
        self.cursor_samples = range.len();
        for (p, plane) in self.planes.iter().enumerate() {
            let cpp = plane.component_count();
            let buf = &mut self.cursor[p];
            buf.clear();
            buf.resize(range.len() * cpp, 0.0);
            self.data[p].copy_to(range.start * cpp, buf);
        }
        trace!(x, y, samples = self.cursor_samples, "open_pixel");
        Ok(())
    }

    fn sample_count(&self) -> usize {
        self.cursor_samples
    }

    fn sample(&self, plane: usize, index: usize) -> &[f32] {
        let Some(info) = self.planes.get(plane) else {
            return &[];
        };
        if index >= self.cursor_samples {
            return &[];
        }
        self.counter.sample();
        let cpp = info.component_count();
        &self.cursor[plane][index * cpp..(index + 1) * cpp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_plane(depth: BitDepth) -> PlaneInfo {
        PlaneInfo::new("C", ["r", "g", "b", "a"], depth)
    }

    #[test]
    fn test_plane_data_quantization() {
        let data = PlaneData::from_f32(&[0.0, 0.5, 1.0, 2.0], BitDepth::U8);
        assert_eq!(data, PlaneData::U8(vec![0, 128, 255, 255]));

        let half = PlaneData::from_f32(&[0.5, 0.25], BitDepth::F16);
        assert_eq!(half.to_f32_vec(), vec![0.5, 0.25]);
    }

    #[test]
    fn test_scanline_rows() {
        let values: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let plane = PlaneInfo::new("Pz", ["r"], BitDepth::F32);
        let mut source = MemorySource::new(4, 2, vec![(plane, values)]).unwrap();

        let mut row = vec![0.0; 4];
        source.read_scanline(1, 0, &mut row).unwrap();
        assert_eq!(row, [4.0, 5.0, 6.0, 7.0]);
        assert!(source.read_scanline(2, 0, &mut row).is_err());
        assert!(source.read_scanline(0, 1, &mut row).is_err());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut source = MemorySource::new(2, 1, vec![(color_plane(BitDepth::F32), vec![])]).unwrap();
        let mut row = vec![0.0; 4];
        let err = source.read_scanline(0, 0, &mut row).unwrap_err();
        assert!(matches!(err, IoError::Source(_)));
    }

    #[test]
    fn test_wrong_value_count() {
        let err = MemorySource::new(2, 2, vec![(color_plane(BitDepth::F32), vec![0.0; 3])]).unwrap_err();
        assert!(matches!(err, IoError::Open(_)));
    }

    #[test]
    fn test_counter_survives_move() {
        let source = MemorySource::new(1, 1, vec![(color_plane(BitDepth::F16), vec![])]).unwrap();
        let counter = source.counter();
        let mut boxed: Box<dyn PlanarSource> = Box::new(source);
        boxed.read_full_plane(0).unwrap();
        assert_eq!(counter.stats().full_plane_reads, 1);
    }

    #[test]
    fn test_yaml_flat() {
        let yaml = r#"
width: 2
height: 1
planes:
  - name: C
    components: [r, g, b, a]
    bit_depth: f16
    data: [1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]
  - name: Pz
    components: [r]
"#;
        let mut source = MemorySource::from_yaml_str(yaml).unwrap();
        assert_eq!(source.resolution(), (2, 1));
        assert_eq!(source.planes()[0].bit_depth, BitDepth::F16);
        assert_eq!(source.read_full_plane(1).unwrap(), vec![0.0, 0.0]);
    }

    fn deep_source() -> MemoryDeepSource {
        let planes = vec![
            PlaneInfo::new("Pz", ["r"], BitDepth::F32),
            PlaneInfo::new("Of", ["r"], BitDepth::F32),
        ];
        let pixels = vec![
            DeepPixelDesc::new(1, 0)
                .with_plane("Pz", vec![1.0, 2.0, 3.0])
                .with_plane("Of", vec![1.0, 0.6, 0.0]),
            DeepPixelDesc::new(0, 1).with_plane("Pz", vec![5.0]),
        ];
        MemoryDeepSource::from_pixels(2, 2, planes, pixels).unwrap()
    }

    #[test]
    fn test_deep_cursor() {
        let mut source = deep_source();
        assert_eq!(source.total_samples(), 4);

        source.open_pixel(0, 0).unwrap();
        assert_eq!(source.sample_count(), 0);
        assert!(source.sample(0, 0).is_empty());

        source.open_pixel(1, 0).unwrap();
        assert_eq!(source.sample_count(), 3);
        assert_eq!(source.sample(0, 1), [2.0]);
        assert_eq!(source.sample(1, 2), [0.0]);

        source.open_pixel(0, 1).unwrap();
        assert_eq!(source.sample(0, 0), [5.0]);
        // Plane not listed for this pixel reads as zero.
        assert_eq!(source.sample(1, 0), [0.0]);

        assert!(source.open_pixel(2, 0).is_err());
        let stats = source.counter().stats();
        assert_eq!(stats.pixel_opens, 3);
        assert_eq!(stats.sample_reads, 4);
    }

    #[test]
    fn test_deep_scanline_is_front_sample() {
        let mut source = deep_source();
        let mut row = vec![9.0; 2];
        source.read_scanline(0, 0, &mut row).unwrap();
        assert_eq!(row, [0.0, 1.0]);
    }

    #[test]
    fn test_deep_sample_count_mismatch() {
        let planes = vec![
            PlaneInfo::new("Pz", ["r"], BitDepth::F32),
            PlaneInfo::new("Of", ["r"], BitDepth::F32),
        ];
        let pixels = vec![
            DeepPixelDesc::new(0, 0)
                .with_plane("Pz", vec![1.0, 2.0])
                .with_plane("Of", vec![1.0]),
        ];
        let err = MemoryDeepSource::from_pixels(1, 1, planes, pixels).unwrap_err();
        assert!(matches!(err, IoError::Open(_)));
    }

    #[test]
    fn test_deep_unknown_plane() {
        let planes = vec![PlaneInfo::new("Pz", ["r"], BitDepth::F32)];
        let pixels = vec![DeepPixelDesc::new(0, 0).with_plane("C", vec![1.0])];
        assert!(MemoryDeepSource::from_pixels(1, 1, planes, pixels).is_err());
    }

    #[test]
    fn test_kind_mismatch() {
        let desc = SourceDesc {
            width: 1,
            height: 1,
            deep: true,
            ..Default::default()
        };
        assert!(MemorySource::from_desc(desc.clone()).is_err());
        assert!(MemoryDeepSource::from_desc(desc).is_ok());
    }
}
