//! Example: Creating, streaming and compressing with polyarc-core
//!
//! Run with: `cargo run --example create_archive`

use polyarc_core::Archiver;
use polyarc_core::ArchiverConfig;
use polyarc_core::Compressor;
use polyarc_core::formats::CompressionType;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let work = tempfile::TempDir::new()?;
    let source = work.path().join("site");
    std::fs::create_dir_all(source.join("assets"))?;
    std::fs::write(source.join("index.html"), "<h1>Hello, polyarc!</h1>")?;
    std::fs::write(source.join("assets/app.js"), "console.log('hi');")?;
    std::fs::write(source.join("assets/app.js.map"), "{}")?;

    // Example 1: format chosen from the suffix
    println!("Example 1: Create from suffix");
    let archiver = Archiver::for_path("site.tar.zst")?;
    let archive = archiver.create("site", work.path(), &[&source])?;
    println!("  Created {}", archive.display());

    // Example 2: configured archiver, walking entries one at a time
    println!("\nExample 2: Stream a zip");
    let config = ArchiverConfig::new()
        .with_compression_level(9)
        .with_exclude_patterns(vec!["*.map".to_string()]);
    let zipper = Archiver::for_path("site.zip")?.with_config(config)?;
    let zip = zipper.create("site", work.path(), &[&source])?;

    let mut stream = zipper.stream(&zip)?;
    while let Some(entry) = stream.next_entry()? {
        println!("  {:<24} {:>6} bytes", entry.name(), entry.size());
        if entry.name() == "index.html" {
            entry.extract(work.path().join("unpacked"))?;
        }
    }
    stream.close()?;

    // Example 3: single-file compression
    println!("\nExample 3: Compress one file");
    let packed = Compressor::new(CompressionType::Xz).compress(source.join("index.html"), work.path())?;
    println!("  Compressed to {}", packed.display());

    println!("\nExamples completed successfully!");
    Ok(())
}
