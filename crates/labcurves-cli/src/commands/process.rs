//! Single image grading command.

use super::{build_settings, grade_file, log_verbose, new_session};
use crate::ProcessArgs;
use anyhow::{bail, Result};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

pub fn run(args: ProcessArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "process::run");

    let output = match (&args.output, args.in_place) {
        (Some(output), _) => output.clone(),
        (None, true) => args.input.clone(),
        (None, false) => bail!(
            "No output given; use -o <file> or --in-place to overwrite {}",
            args.input.display()
        ),
    };

    let mut settings = build_settings(&args.grade)?;
    if let Some(view) = args.view {
        settings.view = view.into();
    }
    let view = settings.view;
    if !settings.channel_flags().any() {
        log_verbose("No curves enabled; the image is only converted", verbose);
    }

    let mut session = new_session(settings)?;
    let preview = args.preview.as_deref().map(|path| (path, view));
    grade_file(&mut session, &args.input, &output, preview)?;

    log_verbose(&format!("Saved: {}", output.display()), verbose);
    Ok(())
}
