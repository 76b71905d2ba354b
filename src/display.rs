use std::sync::{Arc, Mutex};

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, EXTENDED_DISPLAY_HEIGHT, EXTENDED_DISPLAY_WIDTH, SCROLL_STEP,
};

/// # Display
/// The surface sprites are drawn onto.
///
/// The CPU only ever learns the resolution through `width` and `height`, so switching between
/// the normal and extended resolutions is entirely up to the implementation.
/// Coordinates outside the surface are ignored by `set` and read back as unset.
pub trait Display {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn get(&self, x: usize, y: usize) -> bool;
    fn set(&mut self, x: usize, y: usize, on: bool);
    fn clear(&mut self);

    /// Switch between 64x32 (`false`) and 128x64 (`true`).
    fn extend(&mut self, on: bool);
    fn extended(&self) -> bool;

    /// Scroll down by `lines` rows.
    fn down(&mut self, lines: usize);
    /// Scroll left by 4 pixels.
    fn left(&mut self);
    /// Scroll right by 4 pixels.
    fn right(&mut self);
}

/// # Bitmap
/// A monochrome frame buffer, indexed as `[y * width + x]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pixels: Vec<bool>,
    width: usize,
    height: usize,
    extended: bool,
}

impl Bitmap {
    pub fn new() -> Self {
        Bitmap {
            pixels: vec![false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            extended: false,
        }
    }

    /// Rows of pixels, top to bottom.
    pub fn rows(&self) -> std::slice::Chunks<'_, bool> {
        self.pixels.chunks(self.width)
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Bitmap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: usize, y: usize) -> bool {
        self.index(x, y).map_or(false, |i| self.pixels[i])
    }

    fn set(&mut self, x: usize, y: usize, on: bool) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = on;
        }
    }

    fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = false);
    }

    /// Changing resolution also clears the screen.
    fn extend(&mut self, on: bool) {
        let (width, height) = if on {
            (EXTENDED_DISPLAY_WIDTH, EXTENDED_DISPLAY_HEIGHT)
        } else {
            (DISPLAY_WIDTH, DISPLAY_HEIGHT)
        };
        self.extended = on;
        self.width = width;
        self.height = height;
        self.pixels = vec![false; width * height];
    }

    fn extended(&self) -> bool {
        self.extended
    }

    fn down(&mut self, lines: usize) {
        let shift = lines.min(self.height) * self.width;
        let len = self.pixels.len();
        self.pixels.copy_within(0..len - shift, shift);
        self.pixels[..shift].iter_mut().for_each(|p| *p = false);
    }

    fn left(&mut self) {
        let step = SCROLL_STEP.min(self.width);
        for row in self.pixels.chunks_mut(self.width) {
            row.rotate_left(step);
            let len = row.len();
            row[len - step..].iter_mut().for_each(|p| *p = false);
        }
    }

    fn right(&mut self) {
        let step = SCROLL_STEP.min(self.width);
        for row in self.pixels.chunks_mut(self.width) {
            row.rotate_right(step);
            row[..step].iter_mut().for_each(|p| *p = false);
        }
    }
}

/// Lets a renderer on another thread read the surface the CPU draws on.
///
/// Each call takes the lock for the duration of that call only.
impl<D: Display> Display for Arc<Mutex<D>> {
    fn width(&self) -> usize {
        lock(self).width()
    }

    fn height(&self) -> usize {
        lock(self).height()
    }

    fn get(&self, x: usize, y: usize) -> bool {
        lock(self).get(x, y)
    }

    fn set(&mut self, x: usize, y: usize, on: bool) {
        lock(self).set(x, y, on)
    }

    fn clear(&mut self) {
        lock(self).clear()
    }

    fn extend(&mut self, on: bool) {
        lock(self).extend(on)
    }

    fn extended(&self) -> bool {
        lock(self).extended()
    }

    fn down(&mut self, lines: usize) {
        lock(self).down(lines)
    }

    fn left(&mut self) {
        lock(self).left()
    }

    fn right(&mut self) {
        lock(self).right()
    }
}

// A renderer that panicked mid-frame leaves plain pixel data behind, which is still usable.
fn lock<D>(display: &Mutex<D>) -> std::sync::MutexGuard<'_, D> {
    display.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
