//! CLI command implementations

pub mod batch;
pub mod curve;
pub mod process;

use crate::GradeArgs;
use anyhow::{Context, Result};
use labcurves_core::LabView;
use labcurves_pipeline::{CurveSource, Phase, Session, Settings};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Loads the settings file, if any, and applies the flag overrides.
pub fn build_settings(args: &GradeArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::from_yaml_file(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => Settings::default(),
    };

    let overrides = [
        (&args.curve_l, &mut settings.curves.l),
        (&args.curve_a, &mut settings.curves.a),
        (&args.curve_b, &mut settings.curves.b),
        (&args.curve_sat, &mut settings.curves.saturation),
    ];
    for (path, source) in overrides {
        if let Some(path) = path {
            *source = CurveSource::File(path.clone());
        }
    }
    if let Some(mode) = args.sat_mode {
        settings.saturation_mode = mode.into();
    }
    if let Some(key) = args.sat_key {
        settings.saturation_key = key.into();
    }
    Ok(settings)
}

/// Creates a session for `settings` with its curves loaded.
pub fn new_session(settings: Settings) -> Result<Session> {
    let mut session = Session::new(settings);
    session
        .load_curves_from_settings()
        .context("Failed to load curves")?;
    Ok(session)
}

/// Grades `input` into `output`, optionally writing a preview first.
pub fn grade_file(
    session: &mut Session,
    input: &Path,
    output: &Path,
    preview: Option<(&Path, LabView)>,
) -> Result<()> {
    trace!(input = %input.display(), output = %output.display(), "grade_file");
    session
        .open(input)
        .with_context(|| format!("Failed to load: {}", input.display()))?;

    if let Some((path, view)) = preview {
        session.update(Phase::Scale)?;
        let image = session.preview(view, None)?;
        labcurves_io::write(path, &image, None)
            .with_context(|| format!("Failed to save preview: {}", path.display()))?;
        debug!(path = %path.display(), "preview written");
    }

    session
        .save(output)
        .with_context(|| format!("Failed to save: {}", output.display()))?;
    Ok(())
}

/// Prints `msg` when verbose output is on.
pub fn log_verbose(msg: &str, verbose: u8) {
    if verbose > 0 {
        println!("{msg}");
    }
}
