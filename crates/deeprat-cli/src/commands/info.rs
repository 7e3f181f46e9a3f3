//! Source inspection: planes, channel map, derived channels.

use std::path::Path;

use anyhow::{Context, Result};
use deeprat_core::PlaneInfo;
use deeprat_io::{
    ChannelMap, ChannelMapOptions, DeepDecoder, FlatDecoder, MemoryDeepSource, MemorySource,
    SourceInfo,
};
use serde_json::json;
use tracing::debug;

use super::load_desc;
use crate::InfoArgs;

pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    let options = ChannelMapOptions::default().with_luminance_only(args.raw);

    for path in &args.input {
        let desc = load_desc(path)?;
        debug!(path = %path.display(), deep = desc.deep, "inspecting");

        let (planes, map, info) = if desc.deep {
            let source = MemoryDeepSource::from_desc(desc)?;
            let dec = DeepDecoder::open(source, options)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            (dec.planes().to_vec(), dec.channel_map().clone(), dec.info().clone())
        } else {
            let source = MemorySource::from_desc(desc)?;
            let dec = FlatDecoder::open(source, options)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            (dec.planes().to_vec(), dec.channel_map().clone(), dec.info().clone())
        };

        if args.json {
            print_json(path, &planes, &map, &info)?;
        } else {
            print_text(path, &planes, &map, &info, verbose);
        }

        if args.input.len() > 1 {
            println!();
        }
    }

    Ok(())
}

fn print_text(path: &Path, planes: &[PlaneInfo], map: &ChannelMap, info: &SourceInfo, verbose: u8) {
    println!("{}", path.display());
    println!("  {}", info);
    println!("  Planes: {}", planes.len());
    for (idx, plane) in planes.iter().enumerate() {
        println!(
            "    [{}] {} ({:?}) [{}]",
            idx,
            plane.name,
            plane.bit_depth,
            plane.components.join(", ")
        );
    }

    println!("  Channel map:");
    for (channel, pair) in map.iter() {
        let plane = &planes[pair.plane];
        println!(
            "    {:<16} <- {}.{}",
            channel.name(),
            plane.name,
            plane.component_name(pair.component)
        );
    }
    println!("  Derived: {}", map.derived());

    if verbose > 0 || !map.shadowed().is_empty() {
        for s in map.shadowed() {
            println!("  Shadowed: {} at {} (kept {})", s.channel, s.pair, s.winner);
        }
    }
    for pair in map.unmapped() {
        println!("  Unmapped: {}", pair);
    }
}

fn print_json(path: &Path, planes: &[PlaneInfo], map: &ChannelMap, info: &SourceInfo) -> Result<()> {
    let mapping: Vec<_> = map
        .iter()
        .map(|(channel, pair)| json!({ "channel": channel, "plane": pair.plane, "component": pair.component }))
        .collect();
    let shadowed: Vec<_> = map
        .shadowed()
        .iter()
        .map(|s| json!({ "channel": s.channel, "pair": s.pair, "winner": s.winner }))
        .collect();

    let doc = json!({
        "file": path.display().to_string(),
        "info": info,
        "planes": planes,
        "channel_map": mapping,
        "derived": map.derived(),
        "shadowed": shadowed,
        "unmapped": map.unmapped(),
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
