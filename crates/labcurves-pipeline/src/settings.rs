//! Job recipe loaded from YAML.
//!
//! ```yaml
//! curves:
//!   l:
//!     file: contrast.dlc
//!   a: none
//!   b: none
//!   saturation:
//!     tone:
//!       function: gamma_tool
//!       gamma: 0.45
//!       linearity: 0.1
//! saturation_mode: adaptive
//! saturation_key: hue
//! pipe_size: 1
//! view: lab
//! ```
//!
//! Relative curve paths are resolved against the settings file's directory.

use crate::{ChannelFlags, PipelineError, PipelineResult};
use labcurves_core::LabView;
use labcurves_curve::{CurveChannel, ToneFunction};
use labcurves_ops::{SaturationKey, SaturationMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Where the curve of one channel comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveSource {
    /// Channel disabled.
    #[default]
    None,
    /// Anchors from a `.dlc` curve file.
    File(PathBuf),
    /// Table sampled from a tone function.
    Tone(ToneFunction),
}

impl CurveSource {
    /// Whether the channel is processed at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// One [`CurveSource`] per channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSources {
    /// Lightness.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub l: CurveSource,
    /// Chroma a.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub a: CurveSource,
    /// Chroma b.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub b: CurveSource,
    /// Saturation.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub saturation: CurveSource,
}

impl CurveSources {
    /// Source of `channel`.
    pub fn get(&self, channel: CurveChannel) -> &CurveSource {
        match channel {
            CurveChannel::Lightness => &self.l,
            CurveChannel::ChromaA => &self.a,
            CurveChannel::ChromaB => &self.b,
            CurveChannel::Saturation => &self.saturation,
        }
    }

    /// Mutable source of `channel`.
    pub fn get_mut(&mut self, channel: CurveChannel) -> &mut CurveSource {
        match channel {
            CurveChannel::Lightness => &mut self.l,
            CurveChannel::ChromaA => &mut self.a,
            CurveChannel::ChromaB => &mut self.b,
            CurveChannel::Saturation => &mut self.saturation,
        }
    }
}

/// Processing settings for a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Curve per channel; `none` disables the channel.
    pub curves: CurveSources,
    /// Saturation blend mode.
    pub saturation_mode: SaturationMode,
    /// Saturation curve key.
    pub saturation_key: SaturationKey,
    /// Preview binning (0..=3); chosen from the image size when absent.
    pub pipe_size: Option<u32>,
    /// Channel isolation for previews.
    pub view: LabView,
}

impl Settings {
    /// Loads settings from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::SettingsFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_yaml_str(&content)?;
        if let Some(dir) = path.parent() {
            settings.resolve_paths(dir);
        }
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parses settings from YAML text; paths are kept as written.
    pub fn from_yaml_str(yaml: &str) -> PipelineResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serializes to YAML text.
    pub fn to_yaml(&self) -> PipelineResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Writes the settings as YAML.
    pub fn save_yaml_file<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_yaml()?).map_err(|source| PipelineError::SettingsFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Which channels are enabled.
    pub fn channel_flags(&self) -> ChannelFlags {
        ChannelFlags {
            l: self.curves.l.is_enabled(),
            a: self.curves.a.is_enabled(),
            b: self.curves.b.is_enabled(),
            saturation: self.curves.saturation.is_enabled(),
        }
    }

    /// Makes relative curve file paths relative to `dir`.
    pub fn resolve_paths(&mut self, dir: &Path) {
        for channel in CurveChannel::ALL {
            if let CurveSource::File(path) = self.curves.get_mut(channel) {
                if path.is_relative() {
                    *path = dir.join(&*path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "\
curves:
  l:
    file: curves/contrast.dlc
  saturation:
    tone:
      function: gamma_tool
      gamma: 0.45
      linearity: 0.1
saturation_mode: absolute
saturation_key: lightness
pipe_size: 2
view: a
";

    #[test]
    fn parse_recipe() {
        let settings = Settings::from_yaml_str(YAML).unwrap();
        assert_eq!(settings.curves.l, CurveSource::File("curves/contrast.dlc".into()));
        assert_eq!(settings.curves.a, CurveSource::None);
        assert_eq!(
            settings.curves.saturation,
            CurveSource::Tone(ToneFunction::GammaTool { gamma: 0.45, linearity: 0.1 })
        );
        assert_eq!(settings.saturation_mode, SaturationMode::Absolute);
        assert_eq!(settings.saturation_key, SaturationKey::Lightness);
        assert_eq!(settings.pipe_size, Some(2));
        assert_eq!(settings.view, LabView::A);

        let flags = settings.channel_flags();
        assert!(flags.l && !flags.a && !flags.b && flags.saturation);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let settings = Settings::from_yaml_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.channel_flags().any());
    }

    #[test]
    fn yaml_roundtrip() {
        let settings = Settings::from_yaml_str(YAML).unwrap();
        let text = settings.to_yaml().unwrap();
        assert_eq!(Settings::from_yaml_str(&text).unwrap(), settings);
    }

    #[test]
    fn relative_paths_follow_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.yaml");
        std::fs::write(&path, YAML).unwrap();

        let settings = Settings::from_yaml_file(&path).unwrap();
        assert_eq!(
            settings.curves.l,
            CurveSource::File(dir.path().join("curves/contrast.dlc"))
        );
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert!(matches!(
            Settings::from_yaml_str("saturation_mode: loud\n"),
            Err(PipelineError::Yaml(_))
        ));
        assert!(matches!(
            Settings::from_yaml_file("/nonexistent/job.yaml"),
            Err(PipelineError::SettingsFile { .. })
        ));
    }
}
