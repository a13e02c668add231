//! WAV helpers: header inspection for generated audio and PCM16 encoding
//! for the in-process synthesizer.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

/// Frame count and sample rate read from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub frames: u32,
    pub sample_rate: u32,
    pub channels: u16,
}

impl WavInfo {
    /// Duration in seconds, `frames / sample_rate`.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Read the header of a WAV file without decoding its samples.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> anyhow::Result<WavInfo> {
    let reader = hound::WavReader::open(path.as_ref())
        .with_context(|| format!("not a WAV file: {}", path.as_ref().display()))?;
    info_from_reader(&reader)
}

/// Same as [`inspect_file`] for an in-memory WAV.
pub fn inspect_bytes(bytes: &[u8]) -> anyhow::Result<WavInfo> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).context("not a WAV stream")?;
    info_from_reader(&reader)
}

fn info_from_reader<R: std::io::Read>(reader: &hound::WavReader<R>) -> anyhow::Result<WavInfo> {
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        anyhow::bail!("WAV header declares a sample rate of 0");
    }
    Ok(WavInfo {
        // hound counts inter-channel samples, i.e. frames
        frames: reader.duration(),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Encode mono f32 samples in [-1.0, 1.0] as a 16-bit PCM WAV.
pub fn encode_pcm16(samples: &[f32], sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::<u8>::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| anyhow::anyhow!("wav write err: {e}"))?;
        const I16_MAX_F32: f32 = i16::MAX as f32;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * I16_MAX_F32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| anyhow::anyhow!("wav sample err: {e}"))?;
        }
        writer
            .finalize()
            .map_err(|e| anyhow::anyhow!("wav finalize err: {e}"))?;
    }

    Ok(cursor.into_inner())
}

/// Samples of a sine tone with the given exact number of frames.
pub fn sine_samples(frames: usize, sample_rate: u32, freq_hz: f32) -> Vec<f32> {
    let step = 2.0 * std::f32::consts::PI * freq_hz / sample_rate as f32;
    (0..frames).map(|i| 0.3 * (step * i as f32).sin()).collect()
}

/// A mono 16-bit sine tone WAV lasting `seconds` (rounded down to whole frames).
pub fn sine_wav(seconds: f64, sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let frames = (seconds * sample_rate as f64) as usize;
    encode_pcm16(&sine_samples(frames, sample_rate, 220.0), sample_rate)
}
