//! Image quality assessment
//!
//! Resolution is the quality proxy: the score is the pixel area relative to a
//! 4K UHD frame, capped at 1.0. Only the image header is parsed.

use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::ProcessingError;

/// Pixel area treated as fully adequate (3840×2160).
pub const REFERENCE_AREA: f64 = 3840.0 * 2160.0;

/// Header-derived assessment of a single image. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    score: f64,
    width: u32,
    height: u32,
    format: String,
}

impl QualityAssessment {
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

/// Normalized quality score for the given dimensions, in `[0, 1]`.
pub fn score_for(width: u32, height: u32) -> f64 {
    let area = u64::from(width) * u64::from(height);
    (area as f64 / REFERENCE_AREA).min(1.0)
}

/// Stable lowercase name for a detected format.
fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QualityAssessor {
    threshold: f64,
}

impl QualityAssessor {
    /// `threshold` is clamped into `[0, 1]`.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Read width, height and format from the image header.
    pub fn assess(&self, data: &[u8]) -> Result<QualityAssessment, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;

        let format = reader
            .format()
            .ok_or_else(|| ProcessingError::Decode("unrecognized image format".to_string()))?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ProcessingError::Decode(format!(
                "invalid dimensions {}x{}",
                width, height
            )));
        }

        Ok(QualityAssessment {
            score: score_for(width, height),
            width,
            height,
            format: format_name(format).to_string(),
        })
    }

    /// Inclusive: a score equal to the threshold is good quality.
    pub fn is_good_quality(&self, assessment: &QualityAssessment) -> bool {
        assessment.score >= self.threshold
    }

    pub fn needs_enhancement(&self, assessment: &QualityAssessment) -> bool {
        assessment.score < self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_score_is_clamped_to_one() {
        // 4000×3000 = 12,000,000 px, well above the 8,294,400 px reference
        assert_eq!(score_for(4000, 3000), 1.0);
        assert_eq!(score_for(3840, 2160), 1.0);
    }

    #[test]
    fn test_score_for_small_image() {
        let score = score_for(800, 600);
        assert!((score - 480_000.0 / 8_294_400.0).abs() < 1e-12);
        assert!(score > 0.057 && score < 0.058);
    }

    #[test]
    fn test_score_bounds() {
        for (w, h) in [(1, 1), (1, u32::MAX), (u32::MAX, u32::MAX), (1920, 1080)] {
            let score = score_for(w, h);
            assert!((0.0..=1.0).contains(&score), "{w}x{h} -> {score}");
        }
    }

    #[test]
    fn test_score_independent_of_format() {
        let assessor = QualityAssessor::new(0.5);
        let png = assessor.assess(&encode(640, 480, ImageFormat::Png)).unwrap();
        let jpeg = assessor.assess(&encode(640, 480, ImageFormat::Jpeg)).unwrap();

        assert_eq!(png.format(), "png");
        assert_eq!(jpeg.format(), "jpeg");
        assert_eq!(png.score(), jpeg.score());
        assert_eq!((png.width(), png.height()), (640, 480));
    }

    #[test]
    fn test_format_names() {
        assert_eq!(format_name(ImageFormat::Png), "png");
        assert_eq!(format_name(ImageFormat::Jpeg), "jpeg");
        assert_eq!(format_name(ImageFormat::WebP), "webp");
        assert_eq!(format_name(ImageFormat::Gif), "gif");
        assert_eq!(format_name(ImageFormat::Bmp), "bmp");
    }

    #[test]
    fn test_threshold_boundary_is_good_quality() {
        let assessment = QualityAssessment {
            score: 0.5,
            width: 1,
            height: 1,
            format: "png".to_string(),
        };
        let assessor = QualityAssessor::new(0.5);

        assert!(assessor.is_good_quality(&assessment));
        assert!(!assessor.needs_enhancement(&assessment));
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_eq!(QualityAssessor::new(3.0).threshold(), 1.0);
        assert_eq!(QualityAssessor::new(-1.0).threshold(), 0.0);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let assessor = QualityAssessor::new(0.5);
        let err = assessor.assess(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ProcessingError::Decode(_)));
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn test_truncated_header_fails_to_decode() {
        let png = encode(32, 32, ImageFormat::Png);
        let assessor = QualityAssessor::new(0.5);
        let err = assessor.assess(&png[..12]).unwrap_err();
        assert!(matches!(err, ProcessingError::Decode(_)));
    }
}
