//! Image size hints and the policy that turns them into display bounds.

use serde::Serialize;

/// A single dimension with an optional unit (`px`, `em` or `%`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub value: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Dimension {
    pub fn new(value: f32, unit: Option<&str>) -> Self {
        Self {
            value,
            unit: unit.map(str::to_string),
        }
    }

    /// Parses values such as `100`, `100px`, `2.5em` or `50%`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);
        let value = number.parse::<f32>().ok()?;
        let unit = unit.trim();
        Some(Self::new(value, (!unit.is_empty()).then_some(unit)))
    }
}

/// Requested size of an image, usually from HTML `width`/`height`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSize {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
}

impl ImageSize {
    pub fn new(width: Option<Dimension>, height: Option<Dimension>) -> Self {
        Self { width, height }
    }
}

/// Display bounds computed for an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Resolves the display bounds of an image once its intrinsic size is known.
pub trait ImageSizeResolver: Send + Sync {
    /// Name used when comparing configurations.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn resolve(
        &self,
        size: Option<&ImageSize>,
        image: Bounds,
        canvas_width: f32,
        text_size: f32,
    ) -> Bounds;
}

/// Default policy.
///
/// Without a size hint the image keeps its intrinsic size, scaled down to
/// the canvas width. With a hint, `%` is relative to the canvas width, `em`
/// to the text size, anything else is taken as-is. A missing dimension is
/// derived from the other one, keeping the aspect ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSizeResolverDef;

impl ImageSizeResolverDef {
    fn resolve_dimension(dimension: &Dimension, canvas_width: f32, text_size: f32) -> f32 {
        match dimension.unit.as_deref() {
            Some("%") => canvas_width * dimension.value / 100.0,
            Some("em") => dimension.value * text_size,
            _ => dimension.value,
        }
    }
}

impl ImageSizeResolver for ImageSizeResolverDef {
    fn resolve(
        &self,
        size: Option<&ImageSize>,
        image: Bounds,
        canvas_width: f32,
        text_size: f32,
    ) -> Bounds {
        let ratio = if image.height > 0.0 {
            image.width / image.height
        } else {
            1.0
        };

        let Some(size) = size else {
            if canvas_width > 0.0 && image.width > canvas_width {
                return Bounds::new(canvas_width, canvas_width / ratio);
            }
            return image;
        };

        let width = size
            .width
            .as_ref()
            .map(|w| Self::resolve_dimension(w, canvas_width, text_size));
        let height = size
            .height
            .as_ref()
            .map(|h| Self::resolve_dimension(h, canvas_width, text_size));

        match (width, height) {
            (Some(width), Some(height)) => Bounds::new(width, height),
            (Some(width), None) => Bounds::new(width, width / ratio),
            (None, Some(height)) => Bounds::new(height * ratio, height),
            (None, None) => image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("100", Some(Dimension::new(100.0, None)))]
    #[case("100px", Some(Dimension::new(100.0, Some("px"))))]
    #[case("2.5em", Some(Dimension::new(2.5, Some("em"))))]
    #[case(" 50% ", Some(Dimension::new(50.0, Some("%"))))]
    #[case("auto", None)]
    #[case("", None)]
    fn test_parse_dimension(#[case] raw: &str, #[case] expected: Option<Dimension>) {
        assert_eq!(Dimension::parse(raw), expected);
    }

    #[test]
    fn test_no_hint_scales_down_to_canvas() {
        let bounds = ImageSizeResolverDef.resolve(None, Bounds::new(400.0, 200.0), 200.0, 16.0);
        assert_eq!(bounds, Bounds::new(200.0, 100.0));
    }

    #[test]
    fn test_no_hint_keeps_small_image() {
        let bounds = ImageSizeResolverDef.resolve(None, Bounds::new(40.0, 20.0), 200.0, 16.0);
        assert_eq!(bounds, Bounds::new(40.0, 20.0));
    }

    #[test]
    fn test_percent_width_keeps_ratio() {
        let size = ImageSize::new(Some(Dimension::new(50.0, Some("%"))), None);
        let bounds =
            ImageSizeResolverDef.resolve(Some(&size), Bounds::new(400.0, 200.0), 300.0, 16.0);
        assert_eq!(bounds, Bounds::new(150.0, 75.0));
    }

    #[test]
    fn test_em_height_keeps_ratio() {
        let size = ImageSize::new(None, Some(Dimension::new(2.0, Some("em"))));
        let bounds =
            ImageSizeResolverDef.resolve(Some(&size), Bounds::new(400.0, 200.0), 300.0, 16.0);
        assert_eq!(bounds, Bounds::new(64.0, 32.0));
    }

    #[test]
    fn test_both_dimensions_are_exact() {
        let size = ImageSize::new(
            Some(Dimension::new(10.0, Some("px"))),
            Some(Dimension::new(30.0, None)),
        );
        let bounds =
            ImageSizeResolverDef.resolve(Some(&size), Bounds::new(400.0, 200.0), 300.0, 16.0);
        assert_eq!(bounds, Bounds::new(10.0, 30.0));
    }
}
