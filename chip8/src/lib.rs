//! Desktop front end for `chipvm`.
//!
//! Everything touching SDL2 sits behind the `sdl` feature.

pub mod args;
pub mod bell;
pub mod frame;

#[cfg(feature = "sdl")]
pub mod keymap;
#[cfg(feature = "sdl")]
pub mod run;
#[cfg(feature = "sdl")]
pub mod screen;
