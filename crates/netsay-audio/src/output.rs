//! Peripheral boundary for audio playback

use netsay_foundation::AudioError;
use std::time::Duration;

/// A sample-consuming audio peripheral.
///
/// The synthesis worker owns the output for the lifetime of the process;
/// nothing else touches it. Implementations do not need to be thread-safe.
pub trait AudioOutput {
    /// (Re)configure the output for the given sample rate. Called before
    /// the first write of every utterance whose rate differs from the
    /// current configuration; may be a no-op when the rate is unchanged.
    fn configure(&mut self, sample_rate: u32) -> Result<(), AudioError>;

    /// Write samples, blocking for at most `timeout`. Returns the number of
    /// samples accepted, which may be fewer than requested; a shortfall is
    /// not an error.
    fn write(&mut self, samples: &[i16], timeout: Duration) -> Result<usize, AudioError>;
}
