//! cpal-backed audio output
//!
//! Bridges the blocking, timeout-bounded write interface to cpal's pull
//! model: `write` pushes samples into a lock-free ring buffer and the
//! device callback drains it, emitting silence on underrun.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use rtrb::{Consumer, Producer, RingBuffer};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use netsay_foundation::AudioError;

use crate::output::AudioOutput;

/// Ring capacity relative to the sample rate; 500 ms of audio decouples the
/// worker's write cadence from the device callback.
const RING_SECONDS_DIV: u32 = 2;

pub struct CpalOutput {
    device_name: Option<String>,
    stream: Option<cpal::Stream>,
    producer: Option<Producer<i16>>,
    sample_rate: Option<u32>,
}

impl CpalOutput {
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            stream: None,
            producer: None,
            sample_rate: None,
        }
    }

    fn find_device(&self) -> Result<cpal::Device, AudioError> {
        let host = cpal::default_host();
        match &self.device_name {
            None => host.default_output_device().ok_or(AudioError::DeviceNotFound { name: None }),
            Some(name) => {
                let mut devices = host
                    .output_devices()
                    .map_err(|e| AudioError::Backend(e.to_string()))?;
                devices
                    .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                    .ok_or_else(|| AudioError::DeviceNotFound {
                        name: Some(name.clone()),
                    })
            }
        }
    }

    fn build_stream(
        &mut self,
        sample_rate: u32,
    ) -> Result<(cpal::Stream, Producer<i16>), AudioError> {
        let device = self.find_device()?;
        let sample_format = device.default_output_config()?.sample_format();

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = (sample_rate / RING_SECONDS_DIV).max(1024) as usize;
        let (producer, consumer) = RingBuffer::new(capacity);

        let err_fn = |err: cpal::StreamError| {
            warn!("Audio output stream error: {}", err);
        };

        let stream = match sample_format {
            SampleFormat::I16 => {
                let mut consumer = consumer;
                device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &_| {
                        fill_from_ring(&mut consumer, data, |s| s);
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::F32 => {
                let mut consumer = consumer;
                device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &_| {
                        fill_from_ring(&mut consumer, data, |s| s as f32 / 32_768.0);
                    },
                    err_fn,
                    None,
                )?
            }
            fmt => {
                return Err(AudioError::Backend(format!(
                    "unsupported output sample format: {:?}",
                    fmt
                )))
            }
        };
        stream.play()?;

        info!(
            sample_rate,
            device = %device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            "audio output configured"
        );
        Ok((stream, producer))
    }
}

impl AudioOutput for CpalOutput {
    fn configure(&mut self, sample_rate: u32) -> Result<(), AudioError> {
        if self.sample_rate == Some(sample_rate) {
            return Ok(());
        }
        // Dropping the old stream discards any tail still in its ring; the
        // previous utterance has already finished by the time a new rate
        // arrives.
        self.stream = None;
        self.producer = None;

        let (stream, producer) = self.build_stream(sample_rate)?;
        self.stream = Some(stream);
        self.producer = Some(producer);
        self.sample_rate = Some(sample_rate);
        Ok(())
    }

    fn write(&mut self, samples: &[i16], timeout: Duration) -> Result<usize, AudioError> {
        let producer = self.producer.as_mut().ok_or(AudioError::NotConfigured)?;
        let deadline = Instant::now() + timeout;
        let mut written = 0;

        while written < samples.len() {
            let slots = producer.slots();
            if slots == 0 {
                if Instant::now() >= deadline {
                    debug!(
                        requested = samples.len(),
                        written, "audio write deadline reached"
                    );
                    break;
                }
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }

            let take = slots.min(samples.len() - written);
            let mut chunk = producer
                .write_chunk(take)
                .map_err(|e| AudioError::Backend(e.to_string()))?;
            let (first, second) = chunk.as_mut_slices();
            let split = first.len();
            first.copy_from_slice(&samples[written..written + split]);
            second.copy_from_slice(&samples[written + split..written + take]);
            chunk.commit_all();
            written += take;
        }
        Ok(written)
    }
}

/// Drain the ring into the device buffer, converting samples and padding
/// with silence on underrun.
fn fill_from_ring<T: Copy>(
    consumer: &mut Consumer<i16>,
    data: &mut [T],
    convert: impl Fn(i16) -> T,
) {
    let mut filled = 0;
    while filled < data.len() {
        match consumer.pop() {
            Ok(sample) => {
                data[filled] = convert(sample);
                filled += 1;
            }
            Err(_) => break,
        }
    }
    let silence = convert(0);
    for slot in &mut data[filled..] {
        *slot = silence;
    }
}
