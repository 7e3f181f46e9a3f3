//! Flat decode command.

use anyhow::{Context, Result};
use deeprat_core::Rect;
use deeprat_io::{DecodeStatus, FlatDecoder, MemorySource};
use enough::Unstoppable;
use rayon::prelude::*;
use serde_json::json;
use tracing::debug;

use super::{decode_config, format_values, load_desc, map_options, region};
use crate::DecodeArgs;

pub fn run(args: DecodeArgs, verbose: u8) -> Result<()> {
    let config = decode_config(&args)?;
    let source = MemorySource::from_desc(load_desc(&args.input)?)
        .with_context(|| format!("Not a flat source: {}", args.input.display()))?;
    let decoder = FlatDecoder::open(source, map_options(&config))
        .with_context(|| format!("Failed to open: {}", args.input.display()))?;

    let info = decoder.info();
    let rect = region(&args, info.width, info.height);
    if verbose > 0 {
        eprintln!("{}", info);
        eprintln!("Decoding {} ({})", rect, args.channels);
    }

    // Rows are independent; decode them in parallel.
    let rows = rect
        .rows()
        .into_par_iter()
        .map(|y| {
            let row = Rect::new(rect.x, y, rect.width, 1);
            decoder
                .decode_region(row, &args.channels, &config, &Unstoppable)
                .with_context(|| format!("Failed to decode row {}", y))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = rows.len(), "flat decode finished");
    let nch = args.channels.len();

    if args.json {
        let pixels: Vec<_> = rows
            .iter()
            .flat_map(|row| {
                (0..row.rect.width).map(move |x| {
                    json!({ "x": row.rect.x + x, "y": row.rect.y, "values": row.pixel(x, 0) })
                })
            })
            .collect();
        let doc = json!({
            "file": args.input.display().to_string(),
            "box": [rect.x, rect.y, rect.width, rect.height],
            "channels": args.channels,
            "config": config,
            "complete": rows.iter().all(|r| r.status == DecodeStatus::Complete),
            "pixels": pixels,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("# x y {}", args.channels.to_string().replace(',', " "));
    for row in &rows {
        for x in 0..row.rect.width {
            let values = row.pixel(x, 0);
            debug_assert_eq!(values.len(), nch);
            println!("{} {} {}", row.rect.x + x, row.rect.y, format_values(values));
        }
    }
    Ok(())
}
