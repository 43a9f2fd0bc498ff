//! Cached processing phases.
//!
//! The processor holds three cache slots:
//!
//! ```text
//! AfterOpen --Scale--> AfterScale --Lab--> AfterLab --Output--> (consumer)
//! ```
//!
//! Running a phase re-derives its slot from the previous one and then runs
//! every later phase. In interactive mode each slot owns its buffer, so a
//! curve edit only re-runs [`Phase::Lab`]. In job mode the later slots are
//! aliases of [`SlotId::AfterOpen`] and the curves are applied to the
//! source buffer in place, with no copies and no binning; the source is
//! consumed by that run.

use crate::{PipelineError, PipelineResult};
use labcurves_core::{ColorSpace, Image};
use labcurves_curve::{CurveChannel, CurveSet};
use labcurves_ops::{apply_curve, apply_saturation_curve, ChannelMask, SaturationKey, SaturationMode};
use std::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Derive the working buffer from the decoded image (binning).
    Scale,
    /// Apply the enabled curves.
    Lab,
    /// Hand the result to the consumer.
    Output,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 3] = [Phase::Scale, Phase::Lab, Phase::Output];
}

/// Names of the cache slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    /// The decoded Lab image.
    AfterOpen,
    /// The binned working copy.
    AfterScale,
    /// The working copy with curves applied.
    AfterLab,
}

impl SlotId {
    #[inline]
    fn index(self) -> usize {
        match self {
            Self::AfterOpen => 0,
            Self::AfterScale => 1,
            Self::AfterLab => 2,
        }
    }
}

/// Contents of one cache slot.
///
/// A slot either owns its buffer or refers to an earlier slot; the buffer
/// is dropped exactly once, with its owner.
#[derive(Debug, Clone, Default)]
pub enum CacheSlot {
    /// Nothing computed yet.
    #[default]
    Empty,
    /// Exclusively owned buffer.
    Owned(Image),
    /// Same buffer as an earlier slot (job mode).
    AliasOf(SlotId),
}

/// Which curve channels are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelFlags {
    /// L curve.
    pub l: bool,
    /// a curve.
    pub a: bool,
    /// b curve.
    pub b: bool,
    /// Saturation curve.
    pub saturation: bool,
}

impl ChannelFlags {
    /// Every channel enabled.
    pub const ALL: Self = Self {
        l: true,
        a: true,
        b: true,
        saturation: true,
    };

    /// Whether `channel` is enabled.
    pub fn enabled(&self, channel: CurveChannel) -> bool {
        match channel {
            CurveChannel::Lightness => self.l,
            CurveChannel::ChromaA => self.a,
            CurveChannel::ChromaB => self.b,
            CurveChannel::Saturation => self.saturation,
        }
    }

    /// Whether any channel is enabled.
    pub fn any(&self) -> bool {
        self.l || self.a || self.b || self.saturation
    }
}

/// Inputs of a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct RunParams<'a> {
    /// Curves to apply.
    pub curves: &'a CurveSet,
    /// Channels to apply; disabled channels are skipped entirely.
    pub enabled: ChannelFlags,
    /// Saturation blend mode.
    pub saturation_mode: SaturationMode,
    /// Saturation curve key.
    pub saturation_key: SaturationKey,
    /// Binning factor for interactive runs (ignored in job mode).
    pub pipe_size: u32,
}

/// The three-slot processing pipeline.
#[derive(Debug, Default)]
pub struct Processor {
    slots: [CacheSlot; 3],
    job_mode: bool,
    consumed: bool,
    pipe_dimensions: Option<(u32, u32)>,
}

impl Processor {
    /// Creates an empty processor in interactive mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a decoded Lab image as [`SlotId::AfterOpen`] and clears the
    /// later slots.
    pub fn set_source(&mut self, image: Image) {
        self.slots = [CacheSlot::Owned(image), CacheSlot::Empty, CacheSlot::Empty];
        self.consumed = false;
        self.pipe_dimensions = None;
    }

    /// Switches between interactive (cached) and job (aliased) mode.
    pub fn set_job_mode(&mut self, job_mode: bool) {
        self.job_mode = job_mode;
    }

    /// Whether runs alias instead of copying.
    pub fn is_job_mode(&self) -> bool {
        self.job_mode
    }

    /// Whether a job-mode run already processed the source in place.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Raw slot contents.
    pub fn slot(&self, id: SlotId) -> &CacheSlot {
        &self.slots[id.index()]
    }

    /// Buffer visible through `id`, following aliases.
    pub fn image(&self, id: SlotId) -> Option<&Image> {
        match &self.slots[self.resolve(id).index()] {
            CacheSlot::Owned(image) => Some(image),
            _ => None,
        }
    }

    /// The pipeline result ([`SlotId::AfterLab`]).
    pub fn output(&self) -> Option<&Image> {
        self.image(SlotId::AfterLab)
    }

    /// Moves the pipeline result out, leaving every slot that shared it
    /// empty.
    pub fn take_output(&mut self) -> Option<Image> {
        let owner = self.resolve(SlotId::AfterLab);
        let image = match std::mem::take(&mut self.slots[owner.index()]) {
            CacheSlot::Owned(image) => image,
            other => {
                self.slots[owner.index()] = other;
                return None;
            }
        };
        for slot in &mut self.slots {
            if matches!(slot, CacheSlot::AliasOf(target) if *target == owner) {
                *slot = CacheSlot::Empty;
            }
        }
        if owner == SlotId::AfterOpen {
            self.consumed = true;
        }
        Some(image)
    }

    /// Width and height of the image after the last [`Phase::Lab`] run.
    pub fn pipe_dimensions(&self) -> Option<(u32, u32)> {
        self.pipe_dimensions
    }

    /// Runs `phase` and every later phase.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::SourceConsumed`] after a job-mode run
    /// - [`PipelineError::NotReady`] if the input slot of `phase` is empty
    /// - curve application errors
    pub fn run(&mut self, phase: Phase, params: &RunParams<'_>) -> PipelineResult<()> {
        let timer = Instant::now();
        for current in Phase::ALL.into_iter().filter(|p| *p >= phase) {
            match current {
                Phase::Scale => self.run_scale(params, &timer)?,
                Phase::Lab => self.run_lab(params, &timer)?,
                Phase::Output => {}
            }
        }
        info!(elapsed_ms = timer.elapsed().as_millis() as u64, "Ready");
        Ok(())
    }

    fn run_scale(&mut self, params: &RunParams<'_>, timer: &Instant) -> PipelineResult<()> {
        self.check_source()?;
        if self.job_mode {
            self.slots[SlotId::AfterScale.index()] = CacheSlot::AliasOf(SlotId::AfterOpen);
            return Ok(());
        }
        let scaled = self
            .image(SlotId::AfterOpen)
            .ok_or(PipelineError::NotReady(SlotId::AfterOpen))?
            .binned(params.pipe_size);
        self.slots[SlotId::AfterScale.index()] = CacheSlot::Owned(scaled);
        info!(pipe_size = params.pipe_size, elapsed_ms = timer.elapsed().as_millis() as u64, "Scaling");
        Ok(())
    }

    fn run_lab(&mut self, params: &RunParams<'_>, timer: &Instant) -> PipelineResult<()> {
        self.check_source()?;
        if self.job_mode {
            self.slots[SlotId::AfterLab.index()] = CacheSlot::AliasOf(SlotId::AfterScale);
        } else {
            let working = self
                .image(SlotId::AfterScale)
                .ok_or(PipelineError::NotReady(SlotId::AfterScale))?
                .clone();
            self.slots[SlotId::AfterLab.index()] = CacheSlot::Owned(working);
        }

        let owner = self.resolve(SlotId::AfterLab);
        let CacheSlot::Owned(image) = &mut self.slots[owner.index()] else {
            return Err(PipelineError::NotReady(SlotId::AfterScale));
        };

        // saturation needs Lab; refuse before any stage touches the buffer
        if params.enabled.saturation && image.color_space() != ColorSpace::Lab {
            let err = labcurves_core::Error::color_space_mismatch(ColorSpace::Lab, image.color_space());
            return Err(err.into());
        }

        let curves = params.curves;
        let stages = [
            (CurveChannel::Lightness, ChannelMask::L, "Applying L curve"),
            (CurveChannel::ChromaA, ChannelMask::A, "Applying a curve"),
            (CurveChannel::ChromaB, ChannelMask::B, "Applying b curve"),
        ];
        for (channel, mask, label) in stages {
            if params.enabled.enabled(channel) {
                apply_curve(image, &curves[channel], mask)?;
                info!(elapsed_ms = timer.elapsed().as_millis() as u64, "{label}");
            }
        }
        if params.enabled.saturation {
            apply_saturation_curve(
                image,
                &curves[CurveChannel::Saturation],
                params.saturation_mode,
                params.saturation_key,
            )?;
            info!(elapsed_ms = timer.elapsed().as_millis() as u64, "Applying saturation curve");
        }

        self.pipe_dimensions = Some(image.dimensions());
        if owner == SlotId::AfterOpen {
            self.consumed = true;
        }
        debug!(width = image.width(), height = image.height(), job_mode = self.job_mode, "Lab phase done");
        Ok(())
    }

    fn check_source(&self) -> PipelineResult<()> {
        if self.consumed {
            return Err(PipelineError::SourceConsumed);
        }
        Ok(())
    }

    /// Follows aliases to the owning slot.
    fn resolve(&self, mut id: SlotId) -> SlotId {
        // aliases always point to an earlier slot, so this ends
        for _ in 0..self.slots.len() {
            match self.slots[id.index()] {
                CacheSlot::AliasOf(target) => id = target,
                _ => break,
            }
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcurves_curve::{Anchor, Curve, Interpolation};

    fn source() -> Image {
        let data = (0..64 * 32u32).map(|i| [(i * 31) as u16, 0x8080, 0x8080]).collect();
        Image::from_data(64, 32, ColorSpace::Lab, data).unwrap()
    }

    fn darken() -> CurveSet {
        let mut curves = CurveSet::new();
        curves[CurveChannel::Lightness] = Curve::from_anchors(
            CurveChannel::Lightness,
            vec![Anchor::new(0.0, 0.0), Anchor::new(1.0, 0.5)],
            Interpolation::Linear,
        )
        .unwrap();
        curves
    }

    fn params(curves: &CurveSet, pipe_size: u32) -> RunParams<'_> {
        RunParams {
            curves,
            enabled: ChannelFlags {
                l: true,
                ..Default::default()
            },
            saturation_mode: SaturationMode::Adaptive,
            saturation_key: SaturationKey::Hue,
            pipe_size,
        }
    }

    #[test]
    fn interactive_run_caches_every_slot() {
        let curves = darken();
        let mut processor = Processor::new();
        processor.set_source(source());
        processor.run(Phase::Scale, &params(&curves, 1)).unwrap();

        assert!(matches!(processor.slot(SlotId::AfterScale), CacheSlot::Owned(_)));
        assert!(matches!(processor.slot(SlotId::AfterLab), CacheSlot::Owned(_)));
        assert_eq!(processor.image(SlotId::AfterOpen), Some(&source()));
        assert_eq!(processor.image(SlotId::AfterScale).unwrap().dimensions(), (32, 16));
        assert_eq!(processor.pipe_dimensions(), Some((32, 16)));

        let scaled = processor.image(SlotId::AfterScale).unwrap().clone();
        let out = processor.output().unwrap();
        for (o, s) in out.pixels().iter().zip(scaled.pixels()) {
            assert_eq!(o[0], curves[CurveChannel::Lightness].lookup(s[0]));
        }
    }

    #[test]
    fn lab_rerun_starts_from_scaled_copy() {
        let curves = darken();
        let mut processor = Processor::new();
        processor.set_source(source());
        processor.run(Phase::Scale, &params(&curves, 0)).unwrap();
        let first = processor.output().unwrap().clone();

        // re-running Lab must not darken twice
        processor.run(Phase::Lab, &params(&curves, 0)).unwrap();
        assert_eq!(processor.output(), Some(&first));
    }

    #[test]
    fn disabled_channels_are_skipped() {
        let curves = darken();
        let mut processor = Processor::new();
        processor.set_source(source());
        let mut p = params(&curves, 0);
        p.enabled = ChannelFlags::default();
        processor.run(Phase::Scale, &p).unwrap();
        assert_eq!(processor.output(), Some(&source()));
    }

    #[test]
    fn job_mode_aliases_and_consumes() {
        let curves = darken();
        let mut processor = Processor::new();
        processor.set_source(source());
        processor.set_job_mode(true);
        processor.run(Phase::Scale, &params(&curves, 2)).unwrap();

        assert!(matches!(processor.slot(SlotId::AfterScale), CacheSlot::AliasOf(SlotId::AfterOpen)));
        assert!(matches!(processor.slot(SlotId::AfterLab), CacheSlot::AliasOf(SlotId::AfterScale)));
        assert!(processor.is_consumed());
        // no binning in job mode
        assert_eq!(processor.pipe_dimensions(), Some((64, 32)));
        assert_eq!(processor.output().unwrap().pixel(10, 0)[0], curves[CurveChannel::Lightness].lookup(310));

        let err = processor.run(Phase::Scale, &params(&curves, 0)).unwrap_err();
        assert!(matches!(err, PipelineError::SourceConsumed));

        let out = processor.take_output().unwrap();
        assert_eq!(out.dimensions(), (64, 32));
        assert!(processor.output().is_none());
        assert!(matches!(processor.slot(SlotId::AfterLab), CacheSlot::Empty));
    }

    #[test]
    fn set_source_resets_consumption() {
        let curves = darken();
        let mut processor = Processor::new();
        processor.set_source(source());
        processor.set_job_mode(true);
        processor.run(Phase::Scale, &params(&curves, 0)).unwrap();
        processor.set_source(source());
        assert!(!processor.is_consumed());
        processor.run(Phase::Scale, &params(&curves, 0)).unwrap();
    }

    #[test]
    fn empty_processor_reports_not_ready() {
        let curves = darken();
        let mut processor = Processor::new();
        assert!(matches!(
            processor.run(Phase::Scale, &params(&curves, 0)),
            Err(PipelineError::NotReady(SlotId::AfterOpen))
        ));
        assert!(matches!(
            processor.run(Phase::Lab, &params(&curves, 0)),
            Err(PipelineError::NotReady(SlotId::AfterScale))
        ));
        assert!(processor.take_output().is_none());
    }

    #[test]
    fn failed_job_run_keeps_the_source() {
        let curves = darken();
        let xyz = Image::filled(16, 16, ColorSpace::Xyz, [0x4000, 0x5000, 0x6000]);
        let mut processor = Processor::new();
        processor.set_source(xyz.clone());
        processor.set_job_mode(true);

        let err = processor.run(Phase::Scale, &params(&curves, 0)).unwrap_err();
        assert!(matches!(err, PipelineError::Ops(_)));
        assert!(!processor.is_consumed());
        assert_eq!(processor.image(SlotId::AfterOpen), Some(&xyz));

        let mut nothing = params(&curves, 0);
        nothing.enabled = ChannelFlags::default();
        processor.run(Phase::Scale, &nothing).unwrap();
        assert!(processor.is_consumed());

        // L would apply to RGB, but saturation must fail first
        let rgb = Image::filled(16, 16, ColorSpace::SrgbD65, [0x4000, 0x5000, 0x6000]);
        processor.set_source(rgb.clone());
        let mut both = params(&curves, 0);
        both.enabled = ChannelFlags::ALL;
        assert!(matches!(
            processor.run(Phase::Scale, &both),
            Err(PipelineError::Core(_))
        ));
        assert!(!processor.is_consumed());
        assert_eq!(processor.image(SlotId::AfterOpen), Some(&rgb));
    }
}
