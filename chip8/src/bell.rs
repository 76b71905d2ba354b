use std::io::{self, Write};

use log::{debug, warn};

use chipvm::Audio;

/// Rings the terminal bell whenever the sound timer runs out.
pub struct Bell;

impl Audio for Bell {
    fn boot(&self) {
        debug!("power on");
    }

    fn effect(&self) {
        let mut stderr = io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            warn!("unable to ring the bell: {}", e);
        }
    }

    fn shutdown(&self) {
        debug!("power off");
    }
}
