//! One open image with its curves and settings.

use crate::processor::{Phase, Processor, RunParams, SlotId};
use crate::settings::{CurveSource, Settings};
use crate::{PipelineError, PipelineResult};
use labcurves_core::{Image, LabView};
use labcurves_curve::{Curve, CurveChannel, CurveSet};
use labcurves_icc::{image_to_lab, image_to_rgb, lab_to_srgb_simple, Profile};
use std::path::{Path, PathBuf};
use std::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, info, warn};

/// Smallest accepted image side.
pub const MIN_IMAGE_SIDE: u32 = 16;

/// Largest preview binning factor.
pub const MAX_PIPE_SIZE: u32 = 3;

/// Preview binning for an image whose longer side is `longer_side`.
///
/// ```
/// use labcurves_pipeline::auto_pipe_size;
///
/// assert_eq!(auto_pipe_size(6000), 3);
/// assert_eq!(auto_pipe_size(1200), 0);
/// ```
pub fn auto_pipe_size(longer_side: u32) -> u32 {
    match longer_side {
        s if s > 4800 => 3,
        s if s > 2400 => 2,
        s if s > 1200 => 1,
        _ => 0,
    }
}

/// A rectangle in full-resolution image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// An editing session: the curve set, the settings and the pipeline of one
/// open image.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = Session::new(Settings::from_yaml_file("job.yaml")?);
/// session.load_curves_from_settings()?;
/// session.open("photo.tif")?;
/// session.save("photo_graded.tif")?;
/// ```
#[derive(Debug, Default)]
pub struct Session {
    curves: CurveSet,
    settings: Settings,
    processor: Processor,
    profile: Option<Profile>,
    source_path: Option<PathBuf>,
    full_size: Option<(u32, u32)>,
    pipe_size: u32,
}

impl Session {
    /// Creates a session with null curves.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings; call [`update`](Self::update) afterwards.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// The curve set.
    pub fn curves(&self) -> &CurveSet {
        &self.curves
    }

    /// Mutable curve set; call [`update`](Self::update) with
    /// [`Phase::Lab`] afterwards.
    pub fn curves_mut(&mut self) -> &mut CurveSet {
        &mut self.curves
    }

    /// The pipeline.
    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Input profile of the open image.
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Path of the open image, if it came from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Full-resolution size of the open image.
    pub fn full_size(&self) -> Option<(u32, u32)> {
        self.full_size
    }

    /// Binning factor of interactive runs.
    pub fn pipe_size(&self) -> u32 {
        self.pipe_size
    }

    /// Copies the curve of `channel` into its backup slot.
    pub fn backup_curve(&mut self, channel: CurveChannel) {
        self.curves.backup_curve(channel);
    }

    /// Restores the backup of `channel`; `false` if there is none.
    pub fn restore_curve(&mut self, channel: CurveChannel) -> bool {
        self.curves.restore_curve(channel)
    }

    /// Builds every channel's curve from its [`CurveSource`].
    ///
    /// All files are read before any curve is replaced, so a failure leaves
    /// the curve set unchanged.
    pub fn load_curves_from_settings(&mut self) -> PipelineResult<()> {
        let mut loaded = Vec::with_capacity(CurveChannel::ALL.len());
        for channel in CurveChannel::ALL {
            let curve = match self.settings.curves.get(channel) {
                CurveSource::None => Curve::new(channel),
                CurveSource::File(path) => Curve::from_file(path, channel)?,
                CurveSource::Tone(function) => Curve::from_function(channel, function),
            };
            loaded.push((channel, curve));
        }
        for (channel, curve) in loaded {
            self.curves[channel] = curve;
        }
        Ok(())
    }

    /// Decodes `path`, converts it to Lab and installs it in the pipeline.
    ///
    /// Returns the full-resolution size.
    ///
    /// # Errors
    ///
    /// Decode failures, [`PipelineError::ImageTooSmall`] below 16x16 and
    /// color conversion failures. The previous image stays open on error.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> PipelineResult<(u32, u32)> {
        let path = path.as_ref();
        let timer = Instant::now();
        let decoded = labcurves_io::read(path)?;
        let size = self.open_image(decoded.image, decoded.icc.as_deref())?;
        self.source_path = Some(path.to_path_buf());
        info!(path = %path.display(), elapsed_ms = timer.elapsed().as_millis() as u64, "opened image");
        Ok(size)
    }

    /// Installs an already decoded RGB image with its embedded profile.
    pub fn open_image(&mut self, image: Image, icc: Option<&[u8]>) -> PipelineResult<(u32, u32)> {
        let (width, height) = image.dimensions();
        if width < MIN_IMAGE_SIDE || height < MIN_IMAGE_SIDE {
            return Err(PipelineError::ImageTooSmall {
                width,
                height,
                min: MIN_IMAGE_SIDE,
            });
        }

        let profile = Profile::from_icc_or_srgb(icc);
        let mut image = image;
        image_to_lab(&mut image, &profile)?;

        let pipe_size = match self.settings.pipe_size {
            Some(size) if size > MAX_PIPE_SIZE => {
                warn!(size, max = MAX_PIPE_SIZE, "pipe size clamped");
                MAX_PIPE_SIZE
            }
            Some(size) => size,
            None => auto_pipe_size(width.max(height)),
        };

        self.processor.set_job_mode(false);
        self.processor.set_source(image);
        self.profile = Some(profile);
        self.source_path = None;
        self.full_size = Some((width, height));
        self.pipe_size = pipe_size;
        debug!(width, height, pipe_size, "image installed");
        Ok((width, height))
    }

    /// Runs the pipeline from `phase` with the current curves and settings.
    pub fn update(&mut self, phase: Phase) -> PipelineResult<()> {
        let params = RunParams {
            curves: &self.curves,
            enabled: self.settings.channel_flags(),
            saturation_mode: self.settings.saturation_mode,
            saturation_key: self.settings.saturation_key,
            pipe_size: self.pipe_size,
        };
        self.processor.run(phase, &params)
    }

    /// Renders the processed image for display.
    ///
    /// Copies the [`SlotId::AfterLab`] buffer, crops it to `crop` (given
    /// in full-resolution coordinates), isolates `view` and converts the
    /// result to sRGB.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotReady`] before the first run,
    /// [`PipelineError::InvalidCrop`] for rectangles outside the image.
    pub fn preview(&self, view: LabView, crop: Option<CropRect>) -> PipelineResult<Image> {
        let lab = self
            .processor
            .output()
            .ok_or(PipelineError::NotReady(SlotId::AfterLab))?;
        let mut image = match crop {
            Some(rect) => self.crop_preview(lab, rect)?,
            None => lab.clone(),
        };
        image.view_lab(view)?;
        lab_to_srgb_simple(&mut image)?;
        Ok(image)
    }

    fn crop_preview(&self, lab: &Image, rect: CropRect) -> PipelineResult<Image> {
        let (full_width, full_height) = self.full_size.unwrap_or(lab.dimensions());
        let invalid = || PipelineError::InvalidCrop {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            image_width: full_width,
            image_height: full_height,
        };
        let shift = if lab.dimensions() == (full_width, full_height) {
            0
        } else {
            self.pipe_size
        };
        let (x, y) = (rect.x >> shift, rect.y >> shift);
        let (w, h) = (rect.width >> shift, rect.height >> shift);
        if w == 0 || h == 0 {
            return Err(invalid());
        }
        lab.checked_cropped(x, y, w, h).map_err(|_| invalid())
    }

    /// Writes the processed image at full resolution.
    ///
    /// When the preview runs binned (or nothing has run yet), the pipeline
    /// switches to job mode and re-runs from [`Phase::Scale`] on the source
    /// buffer; the source is consumed and the image must be reopened before
    /// further edits. The output is converted to the input profile (or
    /// sRGB), which is embedded in the file.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> PipelineResult<()> {
        let path = path.as_ref();
        let timer = Instant::now();
        let profile = self.profile.clone().ok_or(PipelineError::NotReady(SlotId::AfterOpen))?;

        let mut image = if self.pipe_size != 0 || self.processor.output().is_none() {
            self.processor.set_job_mode(true);
            self.update(Phase::Scale)?;
            self.processor
                .take_output()
                .ok_or(PipelineError::NotReady(SlotId::AfterLab))?
        } else {
            self.processor
                .output()
                .ok_or(PipelineError::NotReady(SlotId::AfterLab))?
                .clone()
        };

        image_to_rgb(&mut image, &profile)?;
        let icc = profile.to_icc()?;
        labcurves_io::write(path, &image, Some(&icc))?;
        info!(path = %path.display(), elapsed_ms = timer.elapsed().as_millis() as u64, "saved image");
        Ok(())
    }
}
