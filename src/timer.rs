use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Result, VmError};

/// Called when a timer counts down from 1 to 0.
pub type Callback = Box<dyn Fn() + Send + 'static>;

/// # Timer
/// An 8-bit counter that counts down to 0 on a thread of its own.
///
/// Started with `Timer::start` and running until `stop` is called or the timer is dropped.
/// Every period the counter is decremented (never below 0); when that takes it from 1 to 0 the
/// callback fires, outside of the counter's lock.
pub struct Timer {
    count: Arc<Mutex<u8>>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn start(name: &str, hz: u32, callback: Option<Callback>) -> Result<Self> {
        if hz == 0 {
            return Err(VmError::InvalidConfig(format!(
                "{} timer frequency must be above 0Hz",
                name
            )));
        }
        let period = Duration::from_secs(1) / hz;
        let count = Arc::new(Mutex::new(0));
        let (stop, stopped) = mpsc::channel::<()>();

        let counter = Arc::clone(&count);
        let handle = thread::Builder::new()
            .name(format!("{}-timer", name))
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                loop {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    match stopped.recv_timeout(timeout) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // stop was requested or the timer was dropped
                        _ => break,
                    }
                    deadline += period;

                    if tick(&counter) {
                        if let Some(callback) = &callback {
                            callback();
                        }
                    }
                }
            })
            .map_err(|e| VmError::InvalidConfig(format!("unable to start {} timer: {}", name, e)))?;
        debug!("started {} timer at {}Hz", name, hz);

        Ok(Timer {
            count,
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn get(&self) -> u8 {
        *lock(&self.count)
    }

    pub fn set(&self, value: u8) {
        *lock(&self.count) = value;
    }

    /// Stops the timer's thread and waits for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // dropping the sender wakes the thread
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("timer callback panicked");
            }
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One period. Returns whether the counter just reached 0.
fn tick(count: &Mutex<u8>) -> bool {
    let mut count = lock(count);
    let fire = *count == 1;
    *count = count.saturating_sub(1);
    fire
}

fn lock(count: &Mutex<u8>) -> std::sync::MutexGuard<'_, u8> {
    count.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// # Timers
/// The delay and sound timers of one run.
///
/// Dropping this stops both timers, so every way out of a run leaves no timer thread behind.
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn start(delay_hz: u32, sound_hz: u32, on_sound: Callback) -> Result<Self> {
        Ok(Timers {
            delay: Timer::start("delay", delay_hz, None)?,
            sound: Timer::start("sound", sound_hz, Some(on_sound))?,
        })
    }

    pub fn stop(self) {
        let Timers { delay, sound } = self;
        delay.stop();
        sound.stop();
        debug!("stopped timers");
    }
}
