//! Batch grading command

use super::{build_settings, grade_file, new_session};
use crate::BatchArgs;
use anyhow::{bail, Result};
use labcurves_io::Format;
use labcurves_pipeline::Settings;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

pub fn run(args: BatchArgs, verbose: u8) -> Result<()> {
    trace!(pattern = %args.input, "batch::run");

    let files = expand_pattern(&args.input)?;

    if files.is_empty() {
        bail!("No files match pattern: {}", args.input);
    }

    info!(files = files.len(), pattern = %args.input, "Starting batch processing");

    if verbose > 0 {
        println!("Found {} files matching '{}'", files.len(), args.input);
    }

    std::fs::create_dir_all(&args.output_dir)?;

    // curve files are read once and validated before any image is touched
    let settings = build_settings(&args.grade)?;
    let template = new_session(settings.clone())?;
    let curves = template.curves().clone();

    let results: Vec<(&PathBuf, Result<()>)> = files
        .par_iter()
        .map(|input| {
            let result = process_file(
                input,
                &args.output_dir,
                args.format.as_deref(),
                &settings,
                &curves,
                verbose,
            );
            (input, result)
        })
        .collect();

    let mut success = 0;
    let mut failed = 0;
    for (input, r) in results {
        match r {
            Ok(()) => success += 1,
            Err(e) => {
                failed += 1;
                eprintln!("Error: {}: {:#}", input.display(), e);
            }
        }
    }

    info!(success, failed, "Batch processing complete");
    println!("Processed: {} success, {} failed", success, failed);

    if failed > 0 {
        bail!("{} files failed", failed);
    }

    Ok(())
}

/// Regular files matching `pattern`; unreadable entries are skipped with a
/// warning.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable entry"),
        }
    }
    Ok(files)
}

/// Output path: input stem in `output_dir`, with `format`, the input
/// extension, or the extension of the detected format (TIFF if unknown).
fn output_path(input: &Path, output_dir: &Path, format: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let ext = format
        .or_else(|| input.extension().and_then(|s| s.to_str()))
        .unwrap_or_else(|| {
            let detected = Format::detect(input).unwrap_or(Format::Unknown);
            match detected {
                Format::Unknown => Format::Tiff.extension(),
                known => known.extension(),
            }
        });

    output_dir.join(format!("{}.{}", stem, ext))
}

fn process_file(
    input: &Path,
    output_dir: &Path,
    format: Option<&str>,
    settings: &Settings,
    curves: &labcurves_curve::CurveSet,
    verbose: u8,
) -> Result<()> {
    let output = output_path(input, output_dir, format);

    if verbose > 0 {
        println!("Processing {} -> {}", input.display(), output.display());
    }

    let mut session = labcurves_pipeline::Session::new(settings.clone());
    *session.curves_mut() = curves.clone();
    grade_file(&mut session, input, &output, None)
}
