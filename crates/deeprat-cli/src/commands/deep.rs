//! Deep decode command.

use anyhow::{Context, Result};
use deeprat_io::{DeepDecoder, MemoryDeepSource};
use enough::Unstoppable;
use serde_json::json;
use tracing::debug;

use super::{decode_config, format_values, load_desc, map_options, region};
use crate::DecodeArgs;

pub fn run(args: DecodeArgs, verbose: u8) -> Result<()> {
    let config = decode_config(&args)?;
    let source = MemoryDeepSource::from_desc(load_desc(&args.input)?)
        .with_context(|| format!("Not a deep source: {}", args.input.display()))?;
    let decoder = DeepDecoder::open(source, map_options(&config))
        .with_context(|| format!("Failed to open: {}", args.input.display()))?;
    decoder.validate(&config).context("Unsupported decode config")?;

    let info = decoder.info();
    let rect = region(&args, info.width, info.height);
    if verbose > 0 {
        eprintln!("{}", info);
        eprintln!("Decoding {} ({})", rect, args.channels);
    }

    let decoded = decoder
        .decode_region(rect, &args.channels, &config, &Unstoppable)
        .context("Deep decode failed")?;
    debug!(samples = decoded.total_samples(), "deep decode finished");

    if args.json {
        let pixels: Vec<_> = rect
            .iter_coords()
            .enumerate()
            .map(|(k, (x, y))| {
                let samples: Vec<&[f32]> = (0..decoded.sample_count(k))
                    .map(|i| decoded.sample(k, i))
                    .collect();
                json!({ "x": x, "y": y, "samples": samples })
            })
            .collect();
        let doc = json!({
            "file": args.input.display().to_string(),
            "box": [rect.x, rect.y, rect.width, rect.height],
            "channels": args.channels,
            "config": config,
            "complete": !decoded.status.is_cancelled(),
            "total_samples": decoded.total_samples(),
            "pixels": pixels,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("# x y sample {}", args.channels.to_string().replace(',', " "));
    for (k, (x, y)) in rect.iter_coords().enumerate() {
        for i in 0..decoded.sample_count(k) {
            println!("{} {} {} {}", x, y, i, format_values(decoded.sample(k, i)));
        }
    }
    Ok(())
}
