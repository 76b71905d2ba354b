use chipvm::Bitmap;

/// Formats a Bitmap for rendering as an RGB24 texture.
///
/// An RGB24 texture is a 1D array of bytes that represent concatenated rows of RGB pixels.
///
/// This creates a black and white rendering by:
/// - Flattening the bitmap into a 1D array by concatenating its rows
/// - Triplicating each pixel to represent its RGB values
/// - Mapping lit pixels to full 255 intensity
pub fn to_rgb24(bitmap: &Bitmap) -> Vec<u8> {
    bitmap
        .rows()
        .flat_map(|row| row.iter())
        .flat_map(|lit| std::iter::repeat(u8::from(*lit) * 255).take(3))
        .collect()
}

#[cfg(test)]
mod test_frame {
    use super::*;
    use chipvm::Display;

    #[test]
    fn test_to_rgb24() {
        let mut bitmap = Bitmap::new();
        bitmap.set(1, 0, true);
        bitmap.set(0, 1, true);
        let frame = to_rgb24(&bitmap);

        let mut expected: Vec<u8> = vec![0; 6144];
        expected[0..6].copy_from_slice(&[0, 0, 0, 255, 255, 255]);
        expected[192..198].copy_from_slice(&[255, 255, 255, 0, 0, 0]);

        assert_eq!(frame, expected);
    }

    #[test]
    fn test_to_rgb24_extended() {
        let mut bitmap = Bitmap::new();
        bitmap.extend(true);
        bitmap.set(127, 63, true);
        let frame = to_rgb24(&bitmap);

        assert_eq!(frame.len(), 128 * 64 * 3);
        assert_eq!(frame[frame.len() - 3..], [255, 255, 255]);
        assert_eq!(frame.iter().filter(|b| **b == 255).count(), 3);
    }
}
