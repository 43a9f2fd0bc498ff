//! RGB profiles used for decode and encode.

use crate::{IccError, IccResult};
use lcms2::{ColorSpaceSignature, Profile as LcmsProfile};
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, warn};

/// An RGB color profile: built-in sRGB or an embedded ICC blob.
///
/// The profile keeps its serialized form rather than a live lcms2 handle,
/// so it can be shared freely between worker threads; each worker opens
/// its own handle.
///
/// # Example
///
/// ```rust
/// use labcurves_icc::Profile;
///
/// let srgb = Profile::srgb();
/// let blob = srgb.to_icc().unwrap();
/// let embedded = Profile::from_icc(&blob).unwrap();
/// assert!(!embedded.is_srgb());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    source: Source,
}

#[derive(Clone, PartialEq, Eq)]
enum Source {
    Srgb,
    Embedded(Arc<[u8]>),
}

impl Profile {
    /// The built-in sRGB profile.
    pub fn srgb() -> Self {
        Self { source: Source::Srgb }
    }

    /// Wraps an embedded ICC blob.
    ///
    /// # Errors
    ///
    /// [`IccError::InvalidProfile`] if lcms2 cannot parse the blob or the
    /// profile is not an RGB profile.
    pub fn from_icc(data: &[u8]) -> IccResult<Self> {
        let inner = LcmsProfile::new_icc(data).map_err(|e| IccError::InvalidProfile(e.to_string()))?;
        if inner.color_space() != ColorSpaceSignature::RgbData {
            return Err(IccError::InvalidProfile(format!(
                "expected an RGB profile, got {:?}",
                inner.color_space()
            )));
        }
        Ok(Self {
            source: Source::Embedded(Arc::from(data)),
        })
    }

    /// Uses the embedded blob when it is present and valid, sRGB otherwise.
    pub fn from_icc_or_srgb(data: Option<&[u8]>) -> Self {
        match data {
            Some(blob) => match Self::from_icc(blob) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(error = %e, "embedded profile rejected, assuming sRGB");
                    Self::srgb()
                }
            },
            None => {
                debug!("no embedded profile, assuming sRGB");
                Self::srgb()
            }
        }
    }

    /// Whether this is the built-in sRGB profile.
    pub fn is_srgb(&self) -> bool {
        self.source == Source::Srgb
    }

    /// Embedded blob, `None` for the built-in sRGB profile.
    pub fn embedded(&self) -> Option<&[u8]> {
        match &self.source {
            Source::Srgb => None,
            Source::Embedded(blob) => Some(blob),
        }
    }

    /// Profile bytes to embed in an output file.
    pub fn to_icc(&self) -> IccResult<Vec<u8>> {
        match &self.source {
            Source::Srgb => LcmsProfile::new_srgb()
                .icc()
                .map_err(|e| IccError::CreateFailed(e.to_string())),
            Source::Embedded(blob) => Ok(blob.to_vec()),
        }
    }

    /// Profile description, empty if the profile has none.
    pub fn description(&self) -> String {
        self.open()
            .ok()
            .and_then(|p| p.info(lcms2::InfoType::Description, lcms2::Locale::none()))
            .unwrap_or_default()
    }

    /// Opens a fresh lcms2 handle.
    pub(crate) fn open(&self) -> IccResult<LcmsProfile> {
        match &self.source {
            Source::Srgb => Ok(LcmsProfile::new_srgb()),
            Source::Embedded(blob) => {
                LcmsProfile::new_icc(blob).map_err(|e| IccError::InvalidProfile(e.to_string()))
            }
        }
    }
}

/// Opens the CIE Lab v4 (D50) profile.
pub(crate) fn lab_profile() -> IccResult<LcmsProfile> {
    LcmsProfile::new_lab4_context(lcms2::GlobalContext::new(), &lcms2::CIExyY::d50())
        .map_err(|e| IccError::CreateFailed(e.to_string()))
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Profile");
        match &self.source {
            Source::Srgb => s.field("source", &"sRGB"),
            Source::Embedded(blob) => s.field("embedded_bytes", &blob.len()),
        };
        s.field("description", &self.description()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_roundtrips_through_icc() {
        let srgb = Profile::srgb();
        assert!(srgb.is_srgb());
        assert!(srgb.embedded().is_none());
        assert!(!srgb.description().is_empty());

        let blob = srgb.to_icc().unwrap();
        let embedded = Profile::from_icc(&blob).unwrap();
        assert_eq!(embedded.embedded(), Some(&blob[..]));
        assert_eq!(embedded.to_icc().unwrap(), blob);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Profile::from_icc(b"not a profile").is_err());
    }

    #[test]
    fn non_rgb_profile_is_rejected() {
        let lab = lab_profile().unwrap().icc().unwrap();
        assert!(matches!(Profile::from_icc(&lab), Err(IccError::InvalidProfile(_))));
    }

    #[test]
    fn fallback_to_srgb() {
        assert!(Profile::from_icc_or_srgb(None).is_srgb());
        assert!(Profile::from_icc_or_srgb(Some(b"junk")).is_srgb());
        let blob = Profile::srgb().to_icc().unwrap();
        assert!(!Profile::from_icc_or_srgb(Some(&blob)).is_srgb());
    }
}
