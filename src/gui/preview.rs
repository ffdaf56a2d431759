// preview.rs — 把下载的图片解码成窗口里显示用的纹理数据

use crate::error::ApodError;
use eframe::egui::ColorImage;

/// 预览图最长边，APOD 的高清原图经常超过显卡纹理上限
pub const MAX_PREVIEW_SIDE: u32 = 2048;

/// 解码图片字节，必要时等比缩小
pub fn decode_preview(bytes: &[u8]) -> Result<ColorImage, ApodError> {
    let mut img = image::load_from_memory(bytes)?;
    if img.width() > MAX_PREVIEW_SIDE || img.height() > MAX_PREVIEW_SIDE {
        img = img.thumbnail(MAX_PREVIEW_SIDE, MAX_PREVIEW_SIDE);
    }
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn decodes_small_image_as_is() {
        let preview = decode_preview(&png_bytes(4, 3)).unwrap();
        assert_eq!(preview.size, [4, 3]);
    }

    #[test]
    fn shrinks_oversized_image() {
        let preview = decode_preview(&png_bytes(4096, 16)).unwrap();
        assert_eq!(preview.size[0], MAX_PREVIEW_SIDE as usize);
        assert!(preview.size[1] <= 16);
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = decode_preview(b"<html>not an image</html>").unwrap_err();
        assert!(matches!(err, ApodError::Decode(_)));
    }
}
