/// Plays sound effects on behalf of the machine.
///
/// `effect` is called from the sound timer's thread each time the sound timer runs out.
pub trait Audio: Send + Sync {
    /// The machine powered on.
    fn boot(&self) {}

    /// Play the beep once.
    fn effect(&self);

    /// The machine powered off.
    fn shutdown(&self) {}
}

/// Plays nothing.
pub struct Mute;

impl Audio for Mute {
    fn effect(&self) {}
}
