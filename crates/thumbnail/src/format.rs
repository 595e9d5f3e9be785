use image::ImageFormat;

/// Map a lower- or mixed-case file extension (no leading dot) onto one of the
/// four raster formats previews can be generated from.
#[must_use]
pub fn source_format(extension: &str) -> Option<ImageFormat> {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "webp" => Some(ImageFormat::WebP),
        "gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("jpg", Some(ImageFormat::Jpeg))]
    #[case("JPEG", Some(ImageFormat::Jpeg))]
    #[case("png", Some(ImageFormat::Png))]
    #[case("webp", Some(ImageFormat::WebP))]
    #[case("gif", Some(ImageFormat::Gif))]
    // Listed as pages inside archives, but not decodable here.
    #[case("bmp", None)]
    #[case("avif", None)]
    #[case("", None)]
    fn test_source_format(#[case] extension: &str, #[case] expected: Option<ImageFormat>) {
        assert_eq!(source_format(extension), expected);
    }
}
