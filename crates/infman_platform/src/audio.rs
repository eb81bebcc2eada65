//! Background music.
//!
//! The game only needs to start a looping track, keep it fed once per frame,
//! change its volume and stop it on exit. `MusicStream` is that contract.
//! `MusicTrack` decodes a PCM WAV file up front and streams it through cpal
//! on the default output device, looping forever. `SilentMusic` stands in
//! when the file or the device is unavailable.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

pub trait MusicStream {
    fn play(&mut self);
    fn stop(&mut self);
    /// Called once per frame with the wall-clock delta.
    fn update(&mut self, dt: f32);
    fn set_volume(&mut self, volume: f32);
    fn is_playing(&self) -> bool;
}

/// Decoded track: interleaved samples in -1..=1.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmTrack {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl PcmTrack {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }
}

/// Playback cursor shared with the audio callback.
#[derive(Debug)]
struct Playback {
    track: PcmTrack,
    /// Position in source frames; fractional when the device rate differs.
    position: f64,
    playing: bool,
    volume: f32,
}

impl Playback {
    fn new(track: PcmTrack) -> Self {
        Self {
            track,
            position: 0.0,
            playing: false,
            volume: 1.0,
        }
    }

    /// Fill an interleaved output buffer, resampling nearest-neighbour and
    /// mapping channels (extra output channels repeat the last source one).
    fn fill(&mut self, out: &mut [f32], out_channels: usize, out_rate: u32) {
        let frames = self.track.frame_count();
        let src_channels = usize::from(self.track.channels.max(1));
        if !self.playing || frames == 0 || out_channels == 0 || out_rate == 0 {
            out.fill(0.0);
            return;
        }

        let step = f64::from(self.track.sample_rate) / f64::from(out_rate);
        for frame in out.chunks_mut(out_channels) {
            let src = self.position as usize % frames;
            for (channel, sample) in frame.iter_mut().enumerate() {
                let src_channel = channel.min(src_channels - 1);
                *sample = self.track.samples[src * src_channels + src_channel] * self.volume;
            }
            self.position += step;
            if self.position >= frames as f64 {
                self.position -= frames as f64;
            }
        }
    }
}

pub struct MusicTrack {
    playback: Arc<Mutex<Playback>>,
    failed: Arc<AtomicBool>,
    stream: cpal::Stream,
    playing: bool,
}

impl MusicTrack {
    pub fn open(path: &Path) -> Result<Self, String> {
        let bytes =
            fs::read(path).map_err(|e| format!("Failed to read music {}: {e}", path.display()))?;
        let track = decode_wav(&bytes)
            .map_err(|e| format!("Failed to decode music {}: {e}", path.display()))?;
        log::info!(
            "Music loaded: {} ({} Hz, {} ch, {:.1}s)",
            path.display(),
            track.sample_rate,
            track.channels,
            track.duration_secs()
        );

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "No audio output device".to_string())?;
        let config = device
            .default_output_config()
            .map_err(|e| format!("Audio device has no output config: {e}"))?
            .config();
        let out_channels = usize::from(config.channels);
        let out_rate = config.sample_rate.0;

        let playback = Arc::new(Mutex::new(Playback::new(track)));
        let failed = Arc::new(AtomicBool::new(false));
        let callback_playback = Arc::clone(&playback);
        let callback_failed = Arc::clone(&failed);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    match callback_playback.lock() {
                        Ok(mut playback) => playback.fill(data, out_channels, out_rate),
                        Err(_) => data.fill(0.0),
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {err}");
                    callback_failed.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| format!("Failed to open audio stream: {e}"))?;

        Ok(Self {
            playback,
            failed,
            stream,
            playing: false,
        })
    }

    fn with_playback(&self, apply: impl FnOnce(&mut Playback)) {
        if let Ok(mut playback) = self.playback.lock() {
            apply(&mut playback);
        }
    }
}

impl MusicStream for MusicTrack {
    fn play(&mut self) {
        self.with_playback(|playback| {
            playback.position = 0.0;
            playback.playing = true;
        });
        match self.stream.play() {
            Ok(()) => self.playing = true,
            Err(err) => log::warn!("Music could not start: {err}"),
        }
    }

    fn stop(&mut self) {
        self.with_playback(|playback| playback.playing = false);
        if let Err(err) = self.stream.pause() {
            log::warn!("Music could not pause: {err}");
        }
        if self.playing {
            log::info!("Music stopped");
        }
        self.playing = false;
    }

    fn update(&mut self, _dt: f32) {
        // The device pulls samples itself; a failed stream is shut down once.
        if self.playing && self.failed.load(Ordering::Relaxed) {
            log::warn!("Audio device lost. Continuing without music.");
            self.stop();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.with_playback(|playback| playback.volume = volume);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Stand-in used when the music file or the output device is unavailable.
#[derive(Debug, Default)]
pub struct SilentMusic {
    playing: bool,
}

impl MusicStream for SilentMusic {
    fn play(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn update(&mut self, _dt: f32) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Open `path` as a track, or fall back to silence with a warning.
pub fn open_music_or_silence(path: &Path) -> Box<dyn MusicStream> {
    match MusicTrack::open(path) {
        Ok(track) => Box::new(track),
        Err(err) => {
            log::warn!("{err}. Continuing without music.");
            Box::new(SilentMusic::default())
        }
    }
}

/// Decode an 8- or 16-bit PCM RIFF/WAVE file.
pub fn decode_wav(bytes: &[u8]) -> Result<PcmTrack, String> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err("not a RIFF/WAVE file".to_string());
    }
    let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
    let u32_at =
        |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

    let mut format: Option<(u16, u16, u32, u16)> = None;
    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let len = u32_at(offset + 4) as usize;
        let body = offset + 8;
        match id {
            b"fmt " => {
                if body + 16 > bytes.len() {
                    return Err("truncated fmt chunk".to_string());
                }
                format = Some((u16_at(body), u16_at(body + 2), u32_at(body + 4), u16_at(body + 14)));
            }
            b"data" => {
                let (encoding, channels, sample_rate, bits) =
                    format.ok_or("data chunk before fmt chunk")?;
                if encoding != 1 {
                    return Err(format!("unsupported WAV encoding {encoding} (PCM only)"));
                }
                if channels == 0 {
                    return Err("WAV declares zero channels".to_string());
                }
                let data = &bytes[body..(body + len).min(bytes.len())];
                let samples = match bits {
                    8 => data.iter().map(|&b| (f32::from(b) - 128.0) / 128.0).collect(),
                    16 => data
                        .chunks_exact(2)
                        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
                        .collect(),
                    other => return Err(format!("unsupported sample width {other} bits")),
                };
                return Ok(PcmTrack {
                    channels,
                    sample_rate,
                    samples,
                });
            }
            _ => {}
        }
        // Chunks are word aligned.
        offset = body + len + (len & 1);
    }

    Err("missing data chunk".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16_wav(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * u32::from(channels) * 2).to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    fn mono(samples: &[f32], sample_rate: u32) -> PcmTrack {
        PcmTrack {
            channels: 1,
            sample_rate,
            samples: samples.to_vec(),
        }
    }

    #[test]
    fn decodes_pcm16_samples() {
        let track = decode_wav(&pcm16_wav(2, 8000, &[0, 16384, -32768, 0])).expect("valid wav");
        assert_eq!(track.channels, 2);
        assert_eq!(track.sample_rate, 8000);
        assert_eq!(track.frame_count(), 2);
        assert_eq!(track.samples, vec![0.0, 0.5, -1.0, 0.0]);
    }

    #[test]
    fn rejects_non_wave_bytes() {
        let err = decode_wav(b"OggS\0\0\0\0\0\0\0\0").expect_err("not wav");
        assert!(err.contains("RIFF"));
    }

    #[test]
    fn stopped_playback_writes_silence() {
        let mut playback = Playback::new(mono(&[0.5, 0.5], 100));
        let mut out = [1.0f32; 4];
        playback.fill(&mut out, 2, 100);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn playback_loops_and_applies_volume() {
        let mut playback = Playback::new(mono(&[0.25, 0.5, 1.0], 100));
        playback.playing = true;
        playback.volume = 0.5;

        let mut out = [0.0f32; 8];
        playback.fill(&mut out, 2, 100);
        // Mono source fans out to both channels and wraps after three frames.
        assert_eq!(out, [0.125, 0.125, 0.25, 0.25, 0.5, 0.5, 0.125, 0.125]);
        assert!((playback.position - 1.0).abs() < 1e-9);
    }

    #[test]
    fn playback_resamples_to_device_rate() {
        let mut playback = Playback::new(mono(&[0.1, 0.2], 100));
        playback.playing = true;

        let mut out = [0.0f32; 4];
        playback.fill(&mut out, 1, 200);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
    }
}
