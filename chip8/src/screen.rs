use std::error::Error;

use sdl2::pixels::PixelFormatEnum;

use chipvm::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chipvm::{Bitmap, Display};

use crate::frame::to_rgb24;

const SCALE: usize = 10;

/// # Screen
/// An SDL2 window showing a Bitmap.
///
/// The window keeps its size; extended mode bitmaps are drawn at half the scale.
pub struct Screen {
    canvas: sdl2::render::WindowCanvas,
}

impl Screen {
    /// Opens a window bound to an sdl2 context.
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, Box<dyn Error>> {
        let video_subsystem = sdl.video()?;
        let window = video_subsystem
            .window(
                "chipvm",
                (DISPLAY_WIDTH * SCALE) as u32,
                (DISPLAY_HEIGHT * SCALE) as u32,
            )
            .position_centered()
            .opengl()
            .build()?;
        let canvas = window.into_canvas().build()?;

        Ok(Screen { canvas })
    }

    /// Formats the Bitmap as an SDL2 RGB24 texture and renders it.
    pub fn render(&mut self, bitmap: &Bitmap) -> Result<(), Box<dyn Error>> {
        let texture_creator = self.canvas.texture_creator();

        let mut texture = texture_creator.create_texture_streaming(
            PixelFormatEnum::RGB24,
            bitmap.width() as u32,
            bitmap.height() as u32,
        )?;

        let frame = to_rgb24(bitmap);
        let row_bytes = bitmap.width() * 3;
        texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
            for (row, pixels) in frame.chunks(row_bytes).enumerate() {
                buffer[row * pitch..row * pitch + row_bytes].copy_from_slice(pixels);
            }
        })?;

        self.canvas.copy(&texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}
