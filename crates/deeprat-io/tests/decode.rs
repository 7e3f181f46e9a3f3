//! Decoder integration tests against YAML fixtures and in-memory sources.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use deeprat_core::{BitDepth, Channel, ChannelSet, PlaneInfo, Rect};
use deeprat_io::{
    AbortFlag, ChannelMapOptions, DecodeConfig, DecodeStatus, DeepDecoder, DeepPixelDesc,
    FlatDecoder, IoError, MemoryDeepSource, MemorySource,
};
use enough::{Stop, StopReason, Unstoppable};
use rayon::prelude::*;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Lets `n` checks pass, then reports cancellation.
struct Countdown(AtomicUsize);

impl Countdown {
    fn new(n: usize) -> Self {
        Self(AtomicUsize::new(n))
    }
}

impl Stop for Countdown {
    fn check(&self) -> Result<(), StopReason> {
        let left = self.0.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StopReason::Cancelled);
        }
        self.0.store(left - 1, Ordering::SeqCst);
        Ok(())
    }
}

fn channels(list: &str) -> ChannelSet {
    list.parse().unwrap()
}

// === Flat ===

#[test]
fn flat_fixture_values() {
    let source = MemorySource::load(fixture_path("flat_4x4.yaml")).unwrap();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();
    assert_eq!(dec.info().depth, 5);

    let region = dec
        .decode_region(Rect::from_size(4, 4), &channels("r,g,z"), &DecodeConfig::default(), &Unstoppable)
        .unwrap();
    // Output row 0 is stored row 3.
    assert_eq!(region.pixel(1, 0), [0.25, 0.75, 14.0]);
    assert_eq!(region.pixel(3, 3), [0.75, 0.0, 4.0]);
}

#[test]
fn flat_scanline_reads_each_plane_once_per_row() {
    let source = MemorySource::load(fixture_path("flat_4x4.yaml")).unwrap();
    let counter = source.counter();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();

    let config = DecodeConfig::default().with_raster_strategy(false);
    dec.decode_region(Rect::from_size(4, 4), &channels("z,r,g,b,a"), &config, &Unstoppable)
        .unwrap();

    let stats = counter.stats();
    assert_eq!(stats.scanline_reads, 4 * 2);
    assert_eq!(stats.full_plane_reads, 0);
    assert!(!dec.is_raster_loaded());
}

#[test]
fn flat_aliased_channels_share_one_read() {
    let lum = PlaneInfo::new("L", ["Y"], BitDepth::F16);
    let source = MemorySource::new(3, 2, vec![(lum, vec![0.5, 0.25, 0.125, 1.0, 0.75, 0.0])]).unwrap();
    let counter = source.counter();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();

    let config = DecodeConfig::default()
        .with_raster_strategy(false)
        .with_reverse_scanlines(false);
    let region = dec
        .decode_region(Rect::from_size(3, 2), &channels("r,g,b"), &config, &Unstoppable)
        .unwrap();

    assert_eq!(counter.stats().scanline_reads, 2);
    for y in 0..2 {
        for x in 0..3 {
            let px = region.pixel(x, y);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }
    assert_eq!(region.pixel(1, 0)[0], 0.25);
}

#[test]
fn flat_raster_populated_once() {
    let source = MemorySource::load(fixture_path("flat_4x4.yaml")).unwrap();
    let counter = source.counter();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();

    let set = channels("r,g,b,a,z");
    let config = DecodeConfig::default();
    let first = dec.decode_region(Rect::from_size(4, 4), &set, &config, &Unstoppable).unwrap();
    let second = dec.decode_region(Rect::from_size(4, 4), &set, &config, &Unstoppable).unwrap();

    assert_eq!(first, second);
    assert!(dec.is_raster_loaded());
    let stats = counter.stats();
    assert_eq!(stats.full_plane_reads, 2);
    assert_eq!(stats.scanline_reads, 0);
}

#[test]
fn flat_concurrent_rows_match_sequential() {
    let source = MemorySource::load(fixture_path("flat_4x4.yaml")).unwrap();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();
    let set = channels("r,g,z");

    for raster in [true, false] {
        let config = DecodeConfig::default().with_raster_strategy(raster);
        let whole = dec.decode_region(Rect::from_size(4, 4), &set, &config, &Unstoppable).unwrap();

        let rows: Vec<Vec<f32>> = (0..4u32)
            .into_par_iter()
            .map(|y| {
                dec.decode_region(Rect::new(0, y, 4, 1), &set, &config, &Unstoppable)
                    .unwrap()
                    .data
            })
            .collect();
        assert_eq!(rows.concat(), whole.data);
    }
}

#[test]
fn flat_cancel_keeps_finished_rows() {
    let plane = PlaneInfo::new("C", ["r", "g", "b", "a"], BitDepth::F32);
    let data: Vec<f32> = (0..100).flat_map(|i| [i as f32, 0.0, 0.0, 1.0]).collect();
    let source = MemorySource::new(10, 10, vec![(plane, data)]).unwrap();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();

    // One check per row plus one per channel group.
    let stop = Countdown::new(7);
    let config = DecodeConfig::default().with_reverse_scanlines(false);
    let region = dec
        .decode_region(Rect::from_size(10, 10), &channels("r"), &config, &stop)
        .unwrap();

    assert_eq!(region.status, DecodeStatus::Cancelled);
    assert!(region.rows_done < 10);
    for y in 0..region.rows_done {
        for x in 0..10 {
            assert_eq!(region.pixel(x, y), [(y * 10 + x) as f32]);
        }
    }
}

#[test]
fn flat_cancelled_row_is_not_stale() {
    let source = MemorySource::new(
        2,
        2,
        vec![
            (PlaneInfo::new("C", ["r"], BitDepth::F32), vec![1.0, 1.0, 2.0, 2.0]),
            (PlaneInfo::new("P", ["r"], BitDepth::F32), vec![10.0, 10.0, 20.0, 20.0]),
        ],
    )
    .unwrap();
    let dec = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();

    // Row 0 takes three checks; row 1 is cut between its two planes.
    let stop = Countdown::new(5);
    let config = DecodeConfig::default().with_reverse_scanlines(false);
    let region = dec
        .decode_region(Rect::from_size(2, 2), &channels("r,P.red"), &config, &stop)
        .unwrap();

    assert_eq!(region.status, DecodeStatus::Cancelled);
    assert_eq!(region.rows_done, 1);
    assert_eq!(region.pixel(0, 0), [1.0, 10.0]);
    assert_eq!(region.pixel(1, 1), [2.0, 0.0]);
    assert_eq!(region.data, vec![1.0, 10.0, 1.0, 10.0, 2.0, 0.0, 2.0, 0.0]);
}

#[test]
fn flat_region_past_u32_range() {
    let dec = FlatDecoder::open(
        MemorySource::new(4, 4, vec![(PlaneInfo::new("C", ["r"], BitDepth::F32), vec![0.0; 16])]).unwrap(),
        ChannelMapOptions::default(),
    )
    .unwrap();
    let err = dec
        .decode_region(Rect::new(u32::MAX, 0, 2, 1), &channels("r"), &DecodeConfig::default(), &Unstoppable)
        .unwrap_err();
    assert!(matches!(err, IoError::Core(deeprat_core::Error::InvalidRegion { .. })));
}

// === Deep ===

fn shadow() -> MemoryDeepSource {
    MemoryDeepSource::load(fixture_path("shadow_2x2.yaml")).unwrap()
}

#[test]
fn deep_uncomposite_alphas() {
    let dec = DeepDecoder::open(shadow(), ChannelMapOptions::default()).unwrap();
    let config = DecodeConfig::default().with_discrete(true);
    let region = dec
        .decode_region(Rect::from_size(2, 2), &channels("a,front"), &config, &Unstoppable)
        .unwrap();

    // Stored (0, 0) lands at output (0, 1).
    let k = region.pixel_index(0, 1);
    assert_eq!(region.sample_count(k), 2);
    let alphas = region.channel_values(k, &Channel::Alpha);
    assert_eq!(alphas, vec![1.0f32 - 0.6, 0.6]);
    assert_relative_eq!(alphas[0], 0.4, epsilon = 1e-6);
    assert_eq!(region.channel_values(k, &Channel::DeepFront), vec![2.0, 3.0]);

    assert_eq!(region.sample_count(region.pixel_index(0, 0)), 0);
    assert_eq!(region.sample_count(region.pixel_index(1, 1)), 0);
}

#[test]
fn deep_z_is_inverse_front() {
    let dec = DeepDecoder::open(shadow(), ChannelMapOptions::default()).unwrap();
    let config = DecodeConfig::default().with_reverse_scanlines(false);
    let region = dec
        .decode_region(Rect::new(0, 0, 1, 1), &channels("z,front,back"), &config, &Unstoppable)
        .unwrap();
    // The fixture carries color, so back depth equals front.
    assert_eq!(region.sample(0, 0), [0.5, 2.0, 2.0]);
    assert_eq!(region.sample(0, 1), [1.0 / 3.0, 3.0, 3.0]);
}

#[test]
fn deep_premult_toggle() {
    let dec = DeepDecoder::open(shadow(), ChannelMapOptions::default()).unwrap();
    let rect = Rect::new(0, 0, 1, 1);
    let set = channels("r,a");
    let raw = DecodeConfig::default()
        .with_composite(true)
        .with_raw(true)
        .with_reverse_scanlines(false);

    let straight = dec.decode_region(rect, &set, &raw, &Unstoppable).unwrap();
    assert_eq!(straight.sample(0, 0), [1.0, 0.5]);

    let premult = dec.decode_region(rect, &set, &raw.with_premult(true), &Unstoppable).unwrap();
    assert_eq!(premult.sample(0, 0), [0.5, 0.5]);
}

#[test]
fn deep_reads_each_plane_once_per_sample() {
    let source = shadow();
    let counter = source.counter();
    let dec = DeepDecoder::open(source, ChannelMapOptions::default()).unwrap();

    dec.decode_region(Rect::from_size(2, 2), &channels("r,g,b,a,z"), &DecodeConfig::default(), &Unstoppable)
        .unwrap();

    let stats = counter.stats();
    assert_eq!(stats.pixel_opens, 4);
    assert_eq!(stats.sample_reads, (3 + 2) * 3);
}

fn grid_10x10() -> MemoryDeepSource {
    let planes = vec![
        PlaneInfo::new("Pz", ["r"], BitDepth::F32),
        PlaneInfo::new("Of", ["r"], BitDepth::F32),
    ];
    let mut pixels = Vec::new();
    for y in 0..10u32 {
        for x in 0..10u32 {
            let depth = 1.0 + (y * 10 + x) as f32;
            pixels.push(
                DeepPixelDesc::new(x, y)
                    .with_plane("Pz", vec![depth, depth + 1.0])
                    .with_plane("Of", vec![1.0, 0.0]),
            );
        }
    }
    MemoryDeepSource::from_pixels(10, 10, planes, pixels).unwrap()
}

#[test]
fn deep_cancel_mid_region() {
    let dec = DeepDecoder::open(grid_10x10(), ChannelMapOptions::default()).unwrap();
    let config = DecodeConfig::default().with_reverse_scanlines(false);
    let stop = Countdown::new(37);

    let region = dec
        .decode_region(Rect::from_size(10, 10), &channels("front,a"), &config, &stop)
        .unwrap();

    assert_eq!(region.status, DecodeStatus::Cancelled);
    assert_eq!(region.pixels_done(), 37);
    for k in 0..region.pixels_done() {
        assert_eq!(region.sample_count(k), 1);
        assert_eq!(region.sample(k, 0), [1.0 + k as f32, 1.0]);
    }

    // The lock was released: a second call completes.
    let again = dec
        .decode_region(Rect::from_size(10, 10), &channels("front"), &config, &Unstoppable)
        .unwrap();
    assert_eq!(again.pixels_done(), 100);
}

#[test]
fn deep_abort_flag_before_start() {
    let dec = DeepDecoder::open(grid_10x10(), ChannelMapOptions::default()).unwrap();
    let flag = AbortFlag::new();
    flag.clone().abort();

    let region = dec
        .decode_region(Rect::from_size(10, 10), &channels("front"), &DecodeConfig::default(), &flag)
        .unwrap();
    assert!(region.status.is_cancelled());
    assert_eq!(region.pixels_done(), 0);
}

#[test]
fn deep_concurrent_disjoint_regions() {
    let dec = DeepDecoder::open(grid_10x10(), ChannelMapOptions::default()).unwrap();
    let config = DecodeConfig::default().with_reverse_scanlines(false);
    let set = channels("front");

    let fronts: Vec<Vec<f32>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..10u32)
            .map(|y| {
                let dec = &dec;
                let set = &set;
                s.spawn(move || {
                    dec.decode_region(Rect::new(0, y, 10, 1), set, &config, &Unstoppable)
                        .unwrap()
                        .data
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (y, row) in fronts.iter().enumerate() {
        let expected: Vec<f32> = (0..10).map(|x| 1.0 + (y * 10 + x) as f32).collect();
        assert_eq!(row, &expected);
    }
}
