use std::error::Error;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chipvm::constants::TIMER_HZ;
use chipvm::{Bitmap, Cpu};

use crate::args::Args;
use crate::bell::Bell;
use crate::keymap::keymap;
use crate::screen::Screen;

/// Runs a ROM until the window is closed, Escape is pressed or the CPU fails.
///
/// The CPU runs on a worker thread; this thread owns SDL, feeding key events to the shared
/// keyboard and redrawing the shared bitmap at 60Hz.
pub fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = args.config();
    let rom = fs::read(&args.rom)?;

    let bitmap = Arc::new(Mutex::new(Bitmap::new()));
    let keyboard = Arc::new(config.keyboard());

    let entry = config.entry;
    let load_address = config.load_address;
    let mut cpu = Cpu::new(config, Arc::clone(&bitmap), Arc::clone(&keyboard), Arc::new(Bell))?;
    cpu.load(load_address, &rom)?;
    info!("loaded {} ({} bytes)", args.rom.display(), rom.len());

    let worker = thread::Builder::new().name("cpu".into()).spawn(move || {
        let result = cpu.run(entry);
        (result, cpu.dump())
    })?;

    // Get SDL2 context
    let sdl: sdl2::Sdl = sdl2::init()?;
    let mut screen = Screen::new(&sdl)?;
    let mut events = sdl.event_pump()?;

    let frame_time = Duration::from_secs(1) / TIMER_HZ;
    let mut last_frame = Instant::now();

    'event: while !worker.is_finished() {
        let frame = lock(&bitmap).clone();
        screen.render(&frame)?;

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    keyboard.shutdown();
                    break 'event;
                }
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(position) = keymap(key) {
                        keyboard.press(position);
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match keymap(key) {
                    Some(position) if keyboard.pressed(position) => keyboard.release(),
                    _ => continue,
                },
                _ => continue,
            };
        }

        // Handle timing
        let elapsed = last_frame.elapsed();
        if frame_time > elapsed {
            thread::sleep(frame_time - elapsed);
        }
        last_frame = Instant::now();
    }

    // the worker might still be blocked on a key
    keyboard.shutdown();
    let (result, dump) = worker
        .join()
        .map_err(|_| "the cpu thread panicked".to_string())?;

    match result {
        Ok(()) => {
            info!("shut down");
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            error!("{}", dump);
            Err(e.into())
        }
    }
}

fn lock(bitmap: &Mutex<Bitmap>) -> MutexGuard<'_, Bitmap> {
    bitmap.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
