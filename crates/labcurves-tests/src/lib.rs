//! Integration tests for LabCurves crates.
//!
//! End-to-end runs: decode, Lab conversion, curves, encode.

#[cfg(test)]
mod tests {
    use labcurves_core::{ColorSpace, Image, Pixel};
    use labcurves_curve::{Anchor, Curve, CurveChannel, Interpolation};
    use labcurves_pipeline::{CurveSource, Phase, PipelineError, Session, Settings};
    use std::path::Path;
    use tempfile::tempdir;

    /// Smooth RGB ramp with some color in it.
    fn ramp(width: u32, height: u32) -> Image {
        let data = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    let r = (x * 0xffff / (width - 1)) as u16;
                    let g = (y * 0xffff / (height - 1)) as u16;
                    [r, g, 0x4000]
                })
            })
            .collect();
        Image::from_data(width, height, ColorSpace::SrgbD65, data).unwrap()
    }

    fn gray(width: u32, height: u32, level: u16) -> Image {
        Image::filled(width, height, ColorSpace::SrgbD65, [level; 3])
    }

    fn mean_luma(image: &Image) -> f64 {
        let sum: f64 = image
            .pixels()
            .iter()
            .map(|p| 0.2126 * p[0] as f64 + 0.7152 * p[1] as f64 + 0.0722 * p[2] as f64)
            .sum();
        sum / image.len() as f64
    }

    fn max_diff(a: &[Pixel], b: &[Pixel]) -> u16 {
        a.iter()
            .zip(b)
            .flat_map(|(p, q)| (0..3).map(move |c| p[c].abs_diff(q[c])))
            .max()
            .unwrap_or(0)
    }

    fn write_curve(path: &Path, channel: CurveChannel, points: &[(f64, f64)]) {
        let anchors = points.iter().map(|&(x, y)| Anchor::new(x, y)).collect();
        Curve::from_anchors(channel, anchors, Interpolation::Spline)
            .unwrap()
            .write_curve(path, None)
            .unwrap();
    }

    /// Null curves only round-trip through Lab.
    #[test]
    fn test_null_curves_preserve_image() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        let source = ramp(48, 32);
        labcurves_io::write(&input, &source, None).unwrap();

        let mut session = Session::new(Settings::default());
        session.open(&input).unwrap();
        session.save(&output).unwrap();

        let result = labcurves_io::read(&output).unwrap();
        assert_eq!(result.image.dimensions(), (48, 32));
        assert!(result.icc.is_some(), "output carries a profile");
        let diff = max_diff(source.pixels(), result.image.pixels());
        assert!(diff < 0x400, "max channel error {diff}");
    }

    /// A darkening L curve read from a settings file darkens the output.
    #[test]
    fn test_settings_file_l_curve() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.tif");
        let output = dir.path().join("out.tif");
        let source = ramp(64, 40);
        labcurves_io::write(&input, &source, None).unwrap();

        write_curve(
            &dir.path().join("darken.dlc"),
            CurveChannel::Lightness,
            &[(0.0, 0.0), (0.5, 0.3), (1.0, 0.8)],
        );
        let settings_path = dir.path().join("job.yaml");
        std::fs::write(&settings_path, "curves:\n  l:\n    file: darken.dlc\n").unwrap();

        let settings = Settings::from_yaml_file(&settings_path).unwrap();
        assert!(matches!(settings.curves.l, CurveSource::File(ref p) if p.is_absolute()));

        let mut session = Session::new(settings);
        session.load_curves_from_settings().unwrap();
        session.open(&input).unwrap();
        session.save(&output).unwrap();

        let result = labcurves_io::read(&output).unwrap().image;
        assert!(mean_luma(&result) < mean_luma(&source) * 0.85);
    }

    /// 8-bit sources are written back as 8-bit.
    #[test]
    fn test_bit_depth_is_preserved() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in8.png");
        let output = dir.path().join("out8.png");
        labcurves_io::write(&input, &ramp(32, 32).with_bit_depth(8), None).unwrap();

        let mut session = Session::new(Settings::default());
        session.open(&input).unwrap();
        assert_eq!(
            session.processor().image(labcurves_pipeline::SlotId::AfterOpen).unwrap().bit_depth(),
            8
        );
        session.save(&output).unwrap();
        assert_eq!(labcurves_io::read(&output).unwrap().image.bit_depth(), 8);
    }

    /// Saturation changes chroma, never neutral grays.
    #[test]
    fn test_saturation_keeps_grays_neutral() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("gray.png");
        let output = dir.path().join("gray_out.png");
        labcurves_io::write(&input, &gray(32, 32, 0x7000), None).unwrap();

        let boost = dir.path().join("boost.dlc");
        write_curve(&boost, CurveChannel::Saturation, &[(0.0, 0.9), (1.0, 0.9)]);

        let mut settings = Settings::default();
        settings.curves.saturation = CurveSource::File(boost);
        let mut session = Session::new(settings);
        session.load_curves_from_settings().unwrap();
        session.open(&input).unwrap();
        session.save(&output).unwrap();

        let result = labcurves_io::read(&output).unwrap().image;
        for p in result.pixels() {
            assert!(p[0].abs_diff(p[1]) < 0x200 && p[1].abs_diff(p[2]) < 0x200, "{p:?}");
        }
    }

    /// Interactive previews are binned; saving still writes full size.
    #[test]
    fn test_preview_then_save_full_resolution() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("big.tif");
        let output = dir.path().join("big_out.tif");
        labcurves_io::write(&input, &ramp(128, 96), None).unwrap();

        let mut settings = Settings::default();
        settings.pipe_size = Some(2);
        let mut session = Session::new(settings);
        session.open(&input).unwrap();
        session.update(Phase::Scale).unwrap();

        let preview = session.preview(labcurves_core::LabView::Lab, None).unwrap();
        assert_eq!(preview.dimensions(), (32, 24));
        assert_eq!(preview.color_space(), ColorSpace::SrgbD65);

        session.save(&output).unwrap();
        assert_eq!(labcurves_io::read(&output).unwrap().image.dimensions(), (128, 96));
        assert!(matches!(session.update(Phase::Scale), Err(PipelineError::SourceConsumed)));

        // reopening restores interactive use
        session.open(&input).unwrap();
        session.update(Phase::Scale).unwrap();
    }

    #[test]
    fn test_tiny_image_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tiny.png");
        labcurves_io::write(&input, &ramp(8, 8), None).unwrap();

        let mut session = Session::default();
        let err = session.open(&input).unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooSmall { width: 8, height: 8, min: 16 }));
    }

    #[test]
    fn test_unreadable_curve_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.dlc");
        std::fs::write(&path, "; broken\n0 0\n1\n").unwrap();

        let mut settings = Settings::default();
        settings.curves.a = CurveSource::File(path);
        let mut session = Session::new(settings);
        assert!(matches!(
            session.load_curves_from_settings(),
            Err(PipelineError::Curve(_))
        ));
    }

    /// Applying a curve to the L channel only leaves a and b untouched.
    #[test]
    fn test_l_curve_leaves_chroma() {
        let mut image = ramp(20, 20);
        let profile = labcurves_icc::Profile::srgb();
        labcurves_icc::image_to_lab(&mut image, &profile).unwrap();
        let before = image.clone();

        let curve = Curve::from_anchors(
            CurveChannel::Lightness,
            vec![Anchor::new(0.0, 0.2), Anchor::new(1.0, 1.0)],
            Interpolation::Linear,
        )
        .unwrap();
        labcurves_ops::apply_curve(&mut image, &curve, labcurves_ops::ChannelMask::L).unwrap();

        for (p, q) in image.pixels().iter().zip(before.pixels()) {
            assert_eq!((p[1], p[2]), (q[1], q[2]));
            assert!(p[0] >= q[0]);
        }
        approx::assert_abs_diff_eq!(
            image.pixel(0, 0)[0] as f64,
            curve.lookup(before.pixel(0, 0)[0]) as f64
        );
    }
}
