// SPDX-License-Identifier: GPL-3.0-only

//! Confirmation tone playback via PipeWire
//!
//! A short sine tone is synthesized once into a WAV file in the temp
//! directory and played with `pw-play` (falling back to `aplay`) whenever a
//! new ISBN is confirmed. Playback is fire-and-forget on a detached thread:
//! a missing audio stack must never block or fail the scan loop, so every
//! error here is logged and swallowed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

const TONE_FREQ_HZ: f32 = 1568.0;
const TONE_DURATION_MS: u32 = 120;
const SAMPLE_RATE: u32 = 44_100;

/// Plays the scan confirmation tone
pub struct AudioFeedback {
    enabled: bool,
    tone_path: Option<PathBuf>,
}

impl AudioFeedback {
    /// Synthesize the tone file (once) and get a player for it.
    ///
    /// If the file cannot be written, the feedback object still works; it
    /// just does nothing on `play()`.
    pub fn new(enabled: bool) -> Self {
        let tone_path = if enabled {
            let path = std::env::temp_dir().join("bookscan-beep.wav");
            match write_tone_wav(&path) {
                Ok(()) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Failed to write confirmation tone, audio disabled");
                    None
                }
            }
        } else {
            None
        };

        Self { enabled, tone_path }
    }

    /// Play the confirmation tone. Never blocks the caller.
    pub fn play(&self) {
        if !self.enabled {
            return;
        }
        let Some(path) = self.tone_path.clone() else {
            return;
        };

        std::thread::spawn(move || {
            let played = Command::new("pw-play")
                .arg(&path)
                .status()
                .map(|s| s.success())
                .unwrap_or(false);

            if played {
                debug!("Played confirmation tone");
                return;
            }

            let fallback = Command::new("aplay")
                .arg("-q")
                .arg(&path)
                .status()
                .map(|s| s.success())
                .unwrap_or(false);

            if fallback {
                debug!("Played confirmation tone via aplay");
            } else {
                warn!("No audio player available for confirmation tone");
            }
        });
    }
}

/// Write a mono 16-bit PCM WAV containing a short sine beep.
fn write_tone_wav(path: &Path) -> std::io::Result<()> {
    let sample_count = SAMPLE_RATE * TONE_DURATION_MS / 1000;
    let data_len = sample_count * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());

    for n in 0..sample_count {
        let t = n as f32 / SAMPLE_RATE as f32;
        // Linear fade-out keeps the tone from clicking at the end
        let envelope = 1.0 - n as f32 / sample_count as f32;
        let sample = (t * TONE_FREQ_HZ * std::f32::consts::TAU).sin() * envelope * 0.4;
        wav.extend_from_slice(&((sample * i16::MAX as f32) as i16).to_le_bytes());
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(&wav)?;
    Ok(())
}
