use anyhow::{Context, Result};
use std::path::PathBuf;

use dataobj_streams::encoding::FileMetadata;

/// Display the sections and columns of a data object
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let bytes = std::fs::read(&file).context("Failed to read file")?;
    let metadata = FileMetadata::read_from(&bytes).context("Failed to read data object footer")?;

    println!("Data Object Information");
    println!("=======================");
    println!("File: {}", file.display());
    println!("Size: {} bytes", bytes.len());
    println!("Format version: {}", metadata.format_version);
    println!("Sections: {}", metadata.sections.len());

    for (i, section) in metadata.sections.iter().enumerate() {
        println!();
        println!("Section {} ({:?}, {} rows):", i, section.kind, section.rows());
        for (j, column) in section.columns.iter().enumerate() {
            let name = if column.info.name.is_empty() {
                column.column_type.to_string()
            } else {
                format!("{} {:?}", column.column_type, column.info.name)
            };
            println!(
                "  {:3}. {} ({:?}, {:?}, {:?}) - {} values, {} pages, {} bytes",
                j + 1,
                name,
                column.info.value_type,
                column.info.encoding,
                column.info.compression,
                column.info.values_count,
                column.pages.len(),
                column.info.compressed_size,
            );
        }
    }

    Ok(())
}
