//! # labcurves-pipeline
//!
//! The LabCurves processing pipeline.
//!
//! - [`Processor`] - Three cache slots driven by [`Phase`]s, with a job
//!   mode that aliases slots instead of copying
//! - [`Session`] - One open image with its [`CurveSet`](labcurves_curve::CurveSet),
//!   [`Settings`] and processor: open, update, preview, save
//! - [`Settings`] - YAML job recipe
//!
//! # Example
//!
//! ```rust,ignore
//! use labcurves_pipeline::{Phase, Session, Settings};
//!
//! let mut session = Session::new(Settings::from_yaml_file("job.yaml")?);
//! session.load_curves_from_settings()?;
//! session.open("photo.png")?;
//! session.update(Phase::Scale)?;
//! let preview = session.preview(session.settings().view, None)?;
//! session.save("graded.png")?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod processor;
mod session;
mod settings;

pub use error::{PipelineError, PipelineResult};
pub use processor::{CacheSlot, ChannelFlags, Phase, Processor, RunParams, SlotId};
pub use session::{auto_pipe_size, CropRect, Session, MAX_PIPE_SIZE, MIN_IMAGE_SIDE};
pub use settings::{CurveSource, CurveSources, Settings};
