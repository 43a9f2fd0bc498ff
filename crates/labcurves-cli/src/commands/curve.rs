//! Curve file tools: `curve new`, `curve info`, `curve dump`.

use super::log_verbose;
use crate::{CurveDumpArgs, CurveInfoArgs, CurveNewArgs};
use anyhow::{bail, Context, Result};
use labcurves_curve::{Anchor, Curve, CurveChannel, Interpolation, DEFAULT_HEADER, LUT_SIZE};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Parses an `x,y` anchor.
fn parse_point(s: &str) -> Result<Anchor> {
    let Some((x, y)) = s.split_once(',') else {
        bail!("Expected x,y, got '{}'", s);
    };
    let x: f64 = x.trim().parse().with_context(|| format!("Invalid x in '{}'", s))?;
    let y: f64 = y.trim().parse().with_context(|| format!("Invalid y in '{}'", s))?;
    Ok(Anchor::new(x, y))
}

fn header(description: Option<&str>) -> String {
    match description {
        Some(text) => format!("{DEFAULT_HEADER}\n\n{text}"),
        None => DEFAULT_HEADER.to_string(),
    }
}

pub fn run_new(args: CurveNewArgs, verbose: u8) -> Result<()> {
    trace!(output = %args.output.display(), points = args.points.len(), "curve::run_new");

    let anchors = args
        .points
        .iter()
        .map(|p| parse_point(p))
        .collect::<Result<Vec<_>>>()?;
    let interpolation = if args.linear {
        Interpolation::Linear
    } else {
        Interpolation::Spline
    };

    let curve = Curve::from_anchors(args.channel.into(), anchors, interpolation)?;
    curve
        .write_curve(&args.output, Some(&header(args.description.as_deref())))
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;

    log_verbose(&format!("Saved: {}", args.output.display()), verbose);
    Ok(())
}

pub fn run_info(args: CurveInfoArgs) -> Result<()> {
    for path in &args.input {
        let curve = Curve::from_file(path, CurveChannel::Lightness)
            .with_context(|| format!("Failed to load: {}", path.display()))?;

        println!("{}", path.display());
        println!("  Interpolation: {}", curve.interpolation().keyword());
        println!("  Anchors: {}", curve.anchors().len());
        for anchor in curve.anchors() {
            println!("    {:.4} {:.4}", anchor.x, anchor.y);
        }

        let samples = args.samples.max(2);
        println!("  Table:");
        for i in 0..samples {
            let input = (i * (LUT_SIZE - 1) / (samples - 1)) as u16;
            println!("    {:5} -> {:5}", input, curve.lookup(input));
        }
    }
    Ok(())
}

pub fn run_dump(args: CurveDumpArgs, verbose: u8) -> Result<()> {
    if args.scale == 0 {
        bail!("Scale must be positive");
    }
    let curve = Curve::from_file(&args.input, CurveChannel::Lightness)
        .with_context(|| format!("Failed to load: {}", args.input.display()))?;
    curve
        .dump_data(&args.output, args.scale)
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;

    log_verbose(&format!("Saved: {}", args.output.display()), verbose);
    Ok(())
}
