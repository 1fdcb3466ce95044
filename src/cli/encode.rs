use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use dataobj_streams::dataset::CompressionType;
use dataobj_streams::encoding::{Encoder, EncoderConfig};
use dataobj_streams::labels::Labels;
use dataobj_streams::streams::{Streams, StreamsConfig, DEFAULT_PAGE_SIZE_HINT};

use super::config::Config;

/// One input line
#[derive(Debug, Deserialize)]
struct Record {
    labels: BTreeMap<String, String>,
    timestamp: DateTime<Utc>,
}

/// Record every line of `input` and write one streams section to `output`
pub fn run(
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    page_size: Option<usize>,
    compression_level: Option<i32>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let file_config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    let page_size = page_size
        .or(file_config.encode.page_size_hint)
        .unwrap_or(DEFAULT_PAGE_SIZE_HINT);
    let level = compression_level
        .or(file_config.encode.compression_level)
        .unwrap_or(3);
    let label_compression = if level == 0 {
        CompressionType::None
    } else {
        CompressionType::Zstd { level }
    };
    let encoder_config = EncoderConfig {
        max_sections: None,
        max_section_columns: file_config.encode.max_section_columns,
        max_section_bytes: file_config.encode.max_section_bytes,
    };

    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());
    info!("Page size hint: {}", page_size);
    info!("Label compression: {:?}", label_compression);

    let mut streams = Streams::with_config(StreamsConfig { label_compression });
    let records = record_file(&mut streams, &input)?;
    info!("Recorded {} rows into {} streams", records, streams.len());

    let mut encoder = Encoder::with_config(encoder_config);
    let stats = streams
        .encode_to(&mut encoder, page_size)
        .context("Failed to encode streams section")?;

    let out = File::create(&output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let written = encoder
        .flush(BufWriter::new(out))
        .context("Failed to write data object")?;

    println!("{stats}");
    println!("Data object: {} ({} bytes)", output.display(), written);
    Ok(())
}

fn record_file(streams: &mut Streams, path: &Path) -> Result<usize> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;

    let mut records = 0;
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)
            .with_context(|| format!("Invalid record on line {}", i + 1))?;

        let id = streams.record(&Labels::from(record.labels), record.timestamp);
        debug!("line {} -> stream {}", i + 1, id);
        records += 1;
    }
    Ok(records)
}
