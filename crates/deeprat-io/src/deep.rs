//! Deep (per-pixel sample list) decoder and uncompositer.
//!
//! [`DeepDecoder`] walks a box pixel by pixel, reads each pixel's samples
//! from a [`DeepSource`] and emits one value per requested channel per
//! surviving sample. What "surviving" means depends on the config:
//!
//! - `raw`: every stored sample is emitted with its stored alpha and back
//!   depth.
//! - otherwise alpha is derived from the accumulated opacity of a sample and
//!   its successor, and back depth comes from the successor's front depth
//!   (or equals front when `discrete`). The last sample has no successor and
//!   is dropped, as is any sample whose opacity does not change.
//!
//! Sources with a `C` plane are color deep files and are always treated as
//! discrete; only shadow maps derive back depth from the next sample.
//!
//! Accumulated opacity is handled in one of two modes chosen per call:
//!
//! | `composite` | Mode          | Alpha                              |
//! |-------------|---------------|------------------------------------|
//! | `true`      | pass-through  | `(op[i] - op[i+1]) / op[i]`        |
//! | `false`     | invert        | `op[i] - op[i+1]`                  |
//!
//! Inverting turns the `C` and `Of` planes back into per-sample
//! contributions, `v[i] - v[i+1]`, with the last sample keeping its stored
//! value. This happens in `raw` mode too; `raw` only skips the alpha and
//! back-depth derivation. Inverting needs both the `Pz` and `Of` planes;
//! without them the call fails with [`IoError::CannotUncomposite`] before
//! touching any pixel.

use std::sync::{Mutex, MutexGuard};

use deeprat_core::{Channel, ChannelSet, Error, PlaneInfo, Rect};
use enough::Stop;
use smallvec::SmallVec;

use tracing::{debug, trace, warn};

use crate::channel_map::{ChannelMap, ChannelMapOptions, PlaneComponent};
use crate::config::{DecodeConfig, DecodeStatus};
use crate::info::{SourceInfo, SourceKind};
use crate::source::DeepSource;
use crate::{IoError, IoResult};

/// How accumulated opacity is turned into per-sample alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Samples are already front-to-back accumulated.
    PassThrough,
    /// Samples are inverted back to discrete contributions first.
    Invert,
}

impl Accumulation {
    /// Mode selected by a config.
    pub fn from_config(config: &DecodeConfig) -> Self {
        if config.composite {
            Self::PassThrough
        } else {
            Self::Invert
        }
    }

    /// Alpha of a sample with accumulated opacity `current` followed by a
    /// sample with opacity `next`. `None` means the sample is skipped.
    pub fn alpha(self, current: f32, next: Option<f32>) -> Option<f32> {
        let next = next?;
        if current == next {
            return None;
        }
        match self {
            Self::PassThrough if current == 0.0 => None,
            Self::PassThrough => Some((current - next) / current),
            Self::Invert => Some(current - next),
        }
    }
}

/// Decoded deep region.
///
/// Pixels are stored row-major over `rect`; pixel `k`'s samples live at
/// `sample_offsets[k-1]..sample_offsets[k]`, each sample holding one value
/// per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepRegion {
    /// Decoded box, in output coordinates.
    pub rect: Rect,
    /// Channel order of each sample.
    pub channels: ChannelSet,
    /// Cumulative sample counts, one per decoded pixel.
    pub sample_offsets: Vec<u32>,
    /// Sample values, `total_samples() * channels.len()`.
    pub data: Vec<f32>,
    /// How the call finished.
    pub status: DecodeStatus,
}

impl DeepRegion {
    fn new(rect: Rect, channels: &ChannelSet) -> Self {
        Self {
            rect,
            channels: channels.clone(),
            sample_offsets: Vec::with_capacity(rect.area() as usize),
            data: Vec::new(),
            status: DecodeStatus::Complete,
        }
    }

    /// Pixels written before the call returned.
    pub fn pixels_done(&self) -> usize {
        self.sample_offsets.len()
    }

    /// Total samples across all written pixels.
    pub fn total_samples(&self) -> usize {
        self.sample_offsets.last().copied().unwrap_or(0) as usize
    }

    /// Linear index of `(x, y)` relative to the region origin.
    #[inline]
    pub fn pixel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.rect.width as usize + x as usize
    }

    /// Sample range of pixel `k`; empty for pixels not written.
    fn range(&self, k: usize) -> std::ops::Range<usize> {
        if k >= self.sample_offsets.len() {
            return 0..0;
        }
        let end = self.sample_offsets[k] as usize;
        let start = if k == 0 {
            0
        } else {
            self.sample_offsets[k - 1] as usize
        };
        start..end
    }

    /// Number of samples of pixel `k`.
    pub fn sample_count(&self, k: usize) -> usize {
        self.range(k).len()
    }

    /// All values of pixel `k`, sample-major.
    pub fn pixel(&self, k: usize) -> &[f32] {
        let n = self.channels.len();
        let range = self.range(k);
        &self.data[range.start * n..range.end * n]
    }

    /// Values of sample `i` of pixel `k`.
    pub fn sample(&self, k: usize, i: usize) -> &[f32] {
        let n = self.channels.len();
        let pixel = self.pixel(k);
        &pixel[i * n..(i + 1) * n]
    }

    /// Value of `channel` for every sample of pixel `k`.
    pub fn channel_values(&self, k: usize, channel: &Channel) -> Vec<f32> {
        let n = self.channels.len();
        match self.channels.index_of(channel) {
            Some(c) => self.pixel(k).chunks_exact(n).map(|s| s[c]).collect(),
            None => Vec::new(),
        }
    }
}

/// What one requested channel resolves to for a decode call.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Z,
    Front,
    Back,
    Alpha,
    Mapped { pair: PlaneComponent, premult: bool },
    Fallback(PlaneComponent),
    Zero,
}

/// Per-call sample layout: where each plane starts inside a sample record.
struct SampleLayout {
    offsets: Vec<usize>,
    stride: usize,
}

impl SampleLayout {
    fn new(planes: &[PlaneInfo]) -> Self {
        let mut offsets = Vec::with_capacity(planes.len());
        let mut stride = 0;
        for plane in planes {
            offsets.push(stride);
            stride += plane.component_count();
        }
        Self { offsets, stride }
    }

    #[inline]
    fn index(&self, sample: usize, pair: PlaneComponent) -> usize {
        sample * self.stride + self.offsets[pair.plane] + pair.component
    }
}

/// Deep decoder over a [`DeepSource`].
///
/// The source and its pixel cursor sit behind one mutex held for a whole
/// region decode. `DeepDecoder` is `Sync`; concurrent calls serialize.
#[derive(Debug)]
pub struct DeepDecoder<S: DeepSource> {
    source: Mutex<S>,
    planes: Vec<PlaneInfo>,
    width: u32,
    height: u32,
    map: ChannelMap,
    info: SourceInfo,
}

impl<S: DeepSource> DeepDecoder<S> {
    /// Opens a decoder, building the channel map.
    ///
    /// # Errors
    ///
    /// - [`IoError::NoChannels`] if the source has no planes
    /// - [`IoError::Open`] for a zero resolution
    pub fn open(source: S, options: ChannelMapOptions) -> IoResult<Self> {
        let planes = source.planes().to_vec();
        if planes.is_empty() {
            return Err(IoError::NoChannels);
        }
        for plane in &planes {
            plane.validate()?;
        }
        let (width, height) = source.resolution();
        if width == 0 || height == 0 {
            return Err(IoError::Open(format!("zero resolution {width}x{height}")));
        }

        let map = ChannelMap::build(&planes, options);
        let info = SourceInfo::new((width, height), &planes, &map, SourceKind::Deep);
        debug!(
            width,
            height,
            color = ?map.color_plane(),
            depth = ?map.depth_plane(),
            opacity = ?map.opacity_plane(),
            "deep decoder opened"
        );

        Ok(Self {
            source: Mutex::new(source),
            planes,
            width,
            height,
            map,
            info,
        })
    }

    /// Source summary.
    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Channel map built at open.
    pub fn channel_map(&self) -> &ChannelMap {
        &self.map
    }

    /// Stored planes.
    pub fn planes(&self) -> &[PlaneInfo] {
        &self.planes
    }

    /// Checks that `config` can be honored by this source.
    ///
    /// # Errors
    ///
    /// [`IoError::CannotUncomposite`] when inverting accumulation is
    /// requested (`composite` off, whatever `raw` is) and the depth or
    /// opacity plane is missing.
    pub fn validate(&self, config: &DecodeConfig) -> IoResult<()> {
        if Accumulation::from_config(config) == Accumulation::PassThrough {
            return Ok(());
        }
        if self.map.depth_plane().is_none() {
            return Err(IoError::CannotUncomposite("depth"));
        }
        if self.map.opacity_plane().is_none() {
            return Err(IoError::CannotUncomposite("opacity"));
        }
        Ok(())
    }

    /// Effective `discrete` flag: color deep files are always discrete.
    pub fn is_discrete(&self, config: &DecodeConfig) -> bool {
        config.discrete || self.map.color_plane().is_some()
    }

    /// Per-plane flag: does this plane hold accumulated values to invert?
    fn inverted_planes(&self, mode: Accumulation) -> SmallVec<[bool; 8]> {
        let accumulated = [self.map.color_plane(), self.map.opacity_plane()];
        (0..self.planes.len())
            .map(|p| mode == Accumulation::Invert && accumulated.contains(&Some(p)))
            .collect()
    }

    fn lock_source(&self) -> IoResult<MutexGuard<'_, S>> {
        self.source
            .lock()
            .map_err(|_| IoError::Source("source lock poisoned".into()))
    }

    /// Resolves requested channels, logging each recoverable problem once.
    fn slots(&self, channels: &ChannelSet, config: &DecodeConfig) -> SmallVec<[Slot; 8]> {
        let has_depth = self.map.depth_plane().is_some();
        let has_alpha = self.map.get(&Channel::Alpha).is_some();
        let mut warned_depth = false;

        channels
            .iter()
            .map(|channel| {
                if channel.is_depth() && !has_depth {
                    if !warned_depth {
                        warn!("source has no depth plane, depth channels read as 0");
                        warned_depth = true;
                    }
                    return Slot::Zero;
                }
                match channel {
                    Channel::Z => return Slot::Z,
                    Channel::DeepFront => return Slot::Front,
                    Channel::DeepBack => return Slot::Back,
                    Channel::Alpha => return Slot::Alpha,
                    _ => {}
                }
                if let Some(pair) = self.map.get(channel) {
                    let premult = config.premult && channel.is_rgb() && has_alpha;
                    return Slot::Mapped { pair, premult };
                }
                match self.fallback(channel) {
                    Some(pair) => {
                        warn!(%channel, %pair, "unmapped channel, reading opacity component");
                        Slot::Fallback(pair)
                    }
                    None => {
                        warn!(%channel, "unmapped channel, filling with zeros");
                        Slot::Zero
                    }
                }
            })
            .collect()
    }

    /// Opacity component standing in for an unmapped color channel.
    fn fallback(&self, channel: &Channel) -> Option<PlaneComponent> {
        let plane = self.map.opacity_plane()?;
        let index = channel.rgb_index()?;
        let cpp = self.planes[plane].component_count();
        let component = if cpp == 1 { 0 } else { index };
        (component < cpp).then_some(PlaneComponent::new(plane, component))
    }

    /// Pair holding the accumulated opacity for derived alpha.
    fn opacity_pair(&self, mode: Accumulation) -> Option<PlaneComponent> {
        let of = self.map.opacity_plane().map(|p| PlaneComponent::new(p, 0));
        match mode {
            Accumulation::Invert => of,
            Accumulation::PassThrough => of.or_else(|| self.map.get(&Channel::Alpha)),
        }
    }

    /// Decodes a box in output coordinates.
    ///
    /// # Errors
    ///
    /// - [`IoError::CannotUncomposite`], see [`validate`](Self::validate)
    /// - [`deeprat_core::Error::InvalidRegion`] (wrapped) if the box is not
    ///   inside the source
    ///
    /// Both are reported before any pixel is read. Cancellation is not an
    /// error: the region is returned with the pixels written so far and
    /// [`DecodeStatus::Cancelled`].
    pub fn decode_region(
        &self,
        rect: Rect,
        channels: &ChannelSet,
        config: &DecodeConfig,
        stop: &dyn Stop,
    ) -> IoResult<DeepRegion> {
        self.validate(config)?;
        if !Rect::from_size(self.width, self.height).contains_rect(&rect) {
            return Err(Error::invalid_region(rect, self.width, self.height).into());
        }

        let mode = Accumulation::from_config(config);
        let slots = self.slots(channels, config);
        let layout = SampleLayout::new(&self.planes);
        let opacity = self.opacity_pair(mode);
        let depth = self.map.depth_plane();
        let stored_alpha = self.map.get(&Channel::Alpha);
        let stored_back = depth
            .filter(|&p| self.planes[p].component_count() > 1)
            .map(|p| PlaneComponent::new(p, 1));
        let inverted = self.inverted_planes(mode);
        let discrete = self.is_discrete(config);

        debug!(%rect, channels = channels.len(), ?mode, raw = config.raw, discrete, "deep decode");

        let mut region = DeepRegion::new(rect, channels);
        let mut source = self.lock_source()?;
        let mut values: Vec<f32> = Vec::new();
        let mut total: u32 = 0;

        for (x, y) in rect.iter_coords() {
            if stop.check().is_err() {
                region.status = DecodeStatus::Cancelled;
                debug!(pixels_done = region.pixels_done(), "deep decode cancelled");
                break;
            }

            source.open_pixel(x, config.source_row(y, self.height))?;
            let n = source.sample_count();

            // One read per plane per sample.
            values.clear();
            values.resize(n * layout.stride, 0.0);
            for i in 0..n {
                for (p, plane) in self.planes.iter().enumerate() {
                    let cpp = plane.component_count();
                    let src = source.sample(p, i);
                    let start = i * layout.stride + layout.offsets[p];
                    let len = src.len().min(cpp);
                    values[start..start + len].copy_from_slice(&src[..len]);
                }
            }

            let get = |i: usize, pair: PlaneComponent| values[layout.index(i, pair)];
            let front_of = |i: usize| depth.map_or(0.0, |p| get(i, PlaneComponent::new(p, 0)));
            // Stored value, or its own contribution when the plane is inverted.
            let value = |i: usize, pair: PlaneComponent| {
                let v = get(i, pair);
                if inverted[pair.plane] && i + 1 < n {
                    v - get(i + 1, pair)
                } else {
                    v
                }
            };

            for i in 0..n {
                let next = (i + 1 < n).then_some(i + 1);
                let front = front_of(i);

                let (alpha, back) = if config.raw {
                    let alpha = stored_alpha.map_or(1.0, |pair| value(i, pair));
                    let back = stored_back.map_or(front, |pair| get(i, pair));
                    (alpha, back)
                } else {
                    let alpha = match opacity {
                        Some(pair) => {
                            let Some(alpha) = mode.alpha(get(i, pair), next.map(|j| get(j, pair)))
                            else {
                                trace!(x, y, sample = i, "degenerate sample skipped");
                                continue;
                            };
                            alpha
                        }
                        None => 1.0,
                    };
                    let back = if discrete {
                        front
                    } else {
                        match next {
                            Some(j) => front_of(j),
                            None => {
                                trace!(x, y, sample = i, "last sample has no back depth, skipped");
                                continue;
                            }
                        }
                    };
                    (alpha, back)
                };

                for slot in &slots {
                    let v = match *slot {
                        Slot::Z => 1.0 / front,
                        Slot::Front => front,
                        Slot::Back => back,
                        Slot::Alpha => alpha,
                        Slot::Mapped { pair, premult } => {
                            let v = value(i, pair);
                            if premult { v * alpha } else { v }
                        }
                        Slot::Fallback(pair) => value(i, pair),
                        Slot::Zero => 0.0,
                    };
                    region.data.push(v);
                }
                total += 1;
            }
            region.sample_offsets.push(total);
        }

        Ok(region)
    }
}
