//! Source export — packages the crate's own sources into a zip archive.
//!
//! A packaging side-tool; nothing in the audio path uses it. Missing files
//! are skipped with a warning. Only a failure to build the archive itself is
//! reported as an error.

use std::path::Path;

#[cfg(feature = "export")]
use crate::error::StudioError;

/// Files gathered into the archive, relative to the crate root.
pub const SOURCE_MANIFEST: &[&str] = &[
    "Cargo.toml",
    "src/lib.rs",
    "src/error.rs",
    "src/instrument.rs",
    "src/settings.rs",
    "src/engine.rs",
    "src/gesture.rs",
    "src/timer.rs",
    "src/studio.rs",
    "src/advice.rs",
    "src/export.rs",
    "src/dsp/mod.rs",
    "src/dsp/param.rs",
    "src/dsp/oscillator.rs",
    "src/dsp/envelope.rs",
    "src/dsp/shaper.rs",
    "src/dsp/filter.rs",
    "src/dsp/chain.rs",
    "src/dsp/voice.rs",
    "src/dsp/renderer.rs",
];

/// Archive file name for a download started at `unix_ms`.
pub fn archive_name(unix_ms: u128) -> String {
    format!("multistudio-pro-source-{unix_ms}.zip")
}

/// An in-memory archive ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub included: Vec<String>,
    pub skipped: Vec<String>,
}

#[cfg_attr(not(feature = "export"), allow(dead_code))]
fn read_entry(root: &Path, entry: &str) -> Option<Vec<u8>> {
    match std::fs::read(root.join(entry)) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("skipping {entry} in source export: {e}");
            None
        }
    }
}

/// Zip every manifest entry found under `root`.
#[cfg(feature = "export")]
pub fn export_sources(root: &Path, manifest: &[&str]) -> Result<ExportBundle, StudioError> {
    use std::io::{Cursor, Write};
    use std::time::{SystemTime, UNIX_EPOCH};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    let zip_err = |e: zip::result::ZipError| StudioError::Export(format!("Failed to build zip: {e}"));

    log::info!("preparing source export from {}", root.display());
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut included = Vec::new();
    let mut skipped = Vec::new();
    for entry in manifest {
        let Some(bytes) = read_entry(root, entry) else {
            skipped.push(entry.to_string());
            continue;
        };
        // Zip paths always use forward slashes.
        let name = entry.replace('\\', "/");
        zip.start_file(name.as_str(), options).map_err(zip_err)?;
        zip.write_all(&bytes)
            .map_err(|e| StudioError::Export(format!("Failed to write {name}: {e}")))?;
        included.push(name);
    }

    let bytes = zip.finish().map_err(zip_err)?.into_inner();
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    log::info!(
        "source export ready: {} files, {} skipped, {} bytes",
        included.len(),
        skipped.len(),
        bytes.len()
    );
    Ok(ExportBundle {
        file_name: archive_name(unix_ms),
        bytes,
        included,
        skipped,
    })
}
