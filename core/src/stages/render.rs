use crate::prelude::{PipelineError, PipelineResult, PipelineStage};
use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use log::debug;

/// Landscape panel size of the e-paper display.
pub const CANVAS_WIDTH: u32 = 960;
pub const CANVAS_HEIGHT: u32 = 540;
/// Pixels per em.
pub const FONT_SIZE: f32 = 90.0;
/// Left end of the text baseline.
pub const TEXT_ORIGIN: (i32, i32) = (100, 270);

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

/// Text drawn on the panel: two decimals followed by the unit.
pub fn power_label(watts: f64) -> String {
    format!("{watts:.2} W")
}

/// Encoded JPEG panel, owned by the run until it is published.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub label: String,
}

/// Draws the power reading as bold white text on a black panel.
pub struct RenderStage {
    font_data: &'static [u8],
}

impl RenderStage {
    pub fn new() -> Self {
        Self::with_font(BUNDLED_FONT)
    }

    pub fn with_font(font_data: &'static [u8]) -> Self {
        Self { font_data }
    }

    fn font(&self) -> PipelineResult<FontRef<'static>> {
        FontRef::try_from_slice(self.font_data)
            .map_err(|err| PipelineError::FontLoad(err.to_string()))
    }

    // ab_glyph scales by line height, not by em.
    fn scale(font: &FontRef<'_>) -> PipelineResult<PxScale> {
        let units_per_em = font
            .units_per_em()
            .ok_or_else(|| PipelineError::FontLoad("font has no units-per-em".into()))?;
        Ok(PxScale::from(FONT_SIZE * font.height_unscaled() / units_per_em))
    }

    pub fn render(&self, watts: f64) -> PipelineResult<RenderedImage> {
        let font = self.font()?;
        let scale = Self::scale(&font)?;
        let label = power_label(watts);

        let mut canvas = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        let ascent = font.as_scaled(scale).ascent().round() as i32;
        let (x, baseline) = TEXT_ORIGIN;
        draw_text_mut(&mut canvas, TEXT_COLOR, x, baseline - ascent, scale, &font, &label);

        // JPEG has no alpha channel; the untouched background flattens to black.
        let rgb = DynamicImage::ImageRgba8(canvas).into_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new(&mut bytes).write_image(
            rgb.as_raw(),
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            ExtendedColorType::Rgb8,
        )?;
        debug!("rendered {:?} into {} jpeg bytes", label, bytes.len());

        Ok(RenderedImage {
            bytes,
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            label,
        })
    }
}

impl Default for RenderStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for RenderStage {
    type Input = f64;
    type Output = RenderedImage;

    fn name(&self) -> &'static str {
        "render"
    }

    fn execute(&mut self, watts: f64) -> PipelineResult<RenderedImage> {
        self.render(watts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Pixel};
    use imageproc::drawing::text_size;

    fn label_width(stage: &RenderStage, label: &str) -> u32 {
        let font = stage.font().unwrap();
        let scale = RenderStage::scale(&font).unwrap();
        text_size(scale, &font, label).0
    }

    fn decode(image: &RenderedImage) -> DynamicImage {
        image::load_from_memory_with_format(&image.bytes, ImageFormat::Jpeg).unwrap()
    }

    fn bright_in(image: &DynamicImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
        xs.flat_map(|x| ys.clone().map(move |y| (x, y)))
            .any(|(x, y)| image.get_pixel(x, y).to_luma()[0] > 200)
    }

    #[test]
    fn label_always_has_two_decimals() {
        assert_eq!(power_label(0.0), "0.00 W");
        assert_eq!(power_label(1234.5), "1234.50 W");
        assert_eq!(power_label(123.4), "123.40 W");
        assert_eq!(power_label(42.0), "42.00 W");
    }

    #[test]
    fn renders_960_by_540_jpeg() {
        let image = RenderStage::new().render(0.0).unwrap();
        assert_eq!(image.label, "0.00 W");
        assert_eq!(&image.bytes[..2], &[0xFF, 0xD8]);

        let decoded = decode(&image);
        assert_eq!(decoded.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    }

    #[test]
    fn text_sits_on_baseline_right_of_origin() {
        let decoded = decode(&RenderStage::new().render(0.0).unwrap());

        assert!(bright_in(&decoded, 100..170, 200..272));
        assert!(!bright_in(&decoded, 0..90, 0..CANVAS_HEIGHT));
        assert!(!bright_in(&decoded, 0..CANVAS_WIDTH, 290..CANVAS_HEIGHT));
    }

    #[test]
    fn wider_values_draw_wider_text() {
        let stage = RenderStage::new();
        let short = label_width(&stage, &power_label(0.0));
        let long = label_width(&stage, &power_label(1234.5));
        assert!(long > short);

        let decoded = decode(&stage.render(1234.5).unwrap());
        assert!(bright_in(&decoded, 100 + short + 20..CANVAS_WIDTH, 200..272));
    }

    #[test]
    fn rendering_is_deterministic() {
        let stage = RenderStage::new();
        assert_eq!(stage.render(42.0).unwrap().bytes, stage.render(42.0).unwrap().bytes);
    }

    #[test]
    fn unusable_font_is_reported() {
        static GARBAGE: &[u8] = b"not a font";
        assert!(matches!(
            RenderStage::with_font(GARBAGE).render(1.0),
            Err(PipelineError::FontLoad(_))
        ));
    }
}
