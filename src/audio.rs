//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each simulation `SoundEvent` maps to a small voice: an oscillator or a
//! burst of filtered noise shaped by a piecewise-linear envelope.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use web_sys::{
    AudioBuffer, AudioContext, AudioScheduledSourceNode, BiquadFilterType, GainNode,
    OscillatorType,
};

use crate::settings::Settings;
use crate::sim::SoundEvent;

/// Length of the shared noise buffer (seconds); longer than any noise voice
const NOISE_SECONDS: f32 = 1.0;

enum Source {
    Tone(OscillatorType, f32),
    Noise,
}

/// Tone description: an envelope stretched over `duration` seconds
struct Voice {
    envelope: &'static [f32],
    duration: f64,
    volume: f32,
    source: Source,
}

fn voice_for(sound: SoundEvent) -> Voice {
    match sound {
        SoundEvent::PlayerShoot => Voice {
            envelope: &[0.0, 0.2, 0.3, 0.1, 0.0],
            duration: 0.3,
            volume: 0.8,
            source: Source::Tone(OscillatorType::Sine, 880.0),
        },
        SoundEvent::InvaderShoot => Voice {
            envelope: &[0.0, 0.1, 0.2, 0.1, 0.0],
            duration: 0.4,
            volume: 0.6,
            source: Source::Tone(OscillatorType::Sawtooth, 220.0),
        },
        SoundEvent::InvaderExplode => Voice {
            envelope: &[0.0, 0.3, 0.2, 0.1, 0.0],
            duration: 0.5,
            volume: 0.7,
            source: Source::Noise,
        },
        SoundEvent::PlayerHit => Voice {
            envelope: &[0.3, 0.2, 0.1, 0.3, 0.2, 0.1, 0.0],
            duration: 0.6,
            volume: 0.8,
            source: Source::Tone(OscillatorType::Square, 110.0),
        },
        SoundEvent::GameOver => Voice {
            envelope: &[0.3, 0.4, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0],
            duration: 2.0,
            volume: 0.7,
            source: Source::Tone(OscillatorType::Triangle, 220.0),
        },
        SoundEvent::InvaderMove(n) => Voice {
            envelope: &[0.0, 0.1, 0.0],
            duration: 0.1,
            volume: 0.3,
            source: Source::Tone(
                OscillatorType::Sine,
                match n {
                    1 => 440.0,
                    2 => 466.0,
                    3 => 494.0,
                    _ => 523.0,
                },
            ),
        },
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    /// White noise shared by every noise voice
    noise: Option<AudioBuffer>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let noise = ctx.as_ref().and_then(noise_buffer);
        Self {
            ctx,
            noise,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound event; fire-and-forget
    pub fn play(&self, sound: SoundEvent) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        self.play_voice(ctx, &voice_for(sound), vol);
    }

    /// Build the source node for a voice, wired into `gain`
    fn create_source(
        &self,
        ctx: &AudioContext,
        source: &Source,
        gain: &GainNode,
    ) -> Option<AudioScheduledSourceNode> {
        match source {
            Source::Tone(wave, freq) => {
                let osc = ctx.create_oscillator().ok()?;
                osc.set_type(*wave);
                osc.frequency().set_value(*freq);
                osc.connect_with_audio_node(gain).ok()?;
                Some(osc.into())
            }
            Source::Noise => {
                let node = ctx.create_buffer_source().ok()?;
                node.set_buffer(self.noise.as_ref());
                // Soften the hiss
                let filter = ctx.create_biquad_filter().ok()?;
                filter.set_type(BiquadFilterType::Lowpass);
                filter.frequency().set_value(1200.0);
                filter.q().set_value(5.0);
                node.connect_with_audio_node(&filter).ok()?;
                filter.connect_with_audio_node(gain).ok()?;
                Some(node.into())
            }
        }
    }

    /// Piecewise-linear envelope over the voice duration
    fn play_voice(&self, ctx: &AudioContext, voice: &Voice, vol: f32) {
        let Some(gain) = ctx.create_gain().ok() else {
            return;
        };
        if gain.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }
        let Some(source) = self.create_source(ctx, &voice.source, &gain) else {
            return;
        };

        let t = ctx.current_time();
        let level = vol * voice.volume;
        let slice = voice.duration / (voice.envelope.len().max(2) - 1) as f64;

        for (i, point) in voice.envelope.iter().enumerate() {
            let at = t + slice * i as f64;
            if i == 0 {
                gain.gain().set_value_at_time(point * level, at).ok();
            } else {
                gain.gain()
                    .linear_ramp_to_value_at_time(point * level, at)
                    .ok();
            }
        }

        source.start().ok();
        source.stop_with_when(t + voice.duration).ok();
    }
}

/// One second of mono white noise at the context's sample rate
fn noise_buffer(ctx: &AudioContext) -> Option<AudioBuffer> {
    let rate = ctx.sample_rate();
    let len = (rate * NOISE_SECONDS) as u32;
    let buffer = ctx.create_buffer(1, len, rate).ok()?;

    let mut rng = Pcg32::seed_from_u64(0x0153);
    let mut samples: Vec<f32> = (0..len).map(|_| rng.random_range(-1.0..1.0)).collect();
    buffer.copy_to_channel(&mut samples, 0).ok()?;
    Some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SoundEvent; 9] = [
        SoundEvent::PlayerShoot,
        SoundEvent::InvaderShoot,
        SoundEvent::InvaderExplode,
        SoundEvent::PlayerHit,
        SoundEvent::GameOver,
        SoundEvent::InvaderMove(1),
        SoundEvent::InvaderMove(2),
        SoundEvent::InvaderMove(3),
        SoundEvent::InvaderMove(4),
    ];

    #[test]
    fn test_every_sound_has_a_voice() {
        for sound in ALL {
            let voice = voice_for(sound);
            assert!(voice.envelope.len() >= 2, "{}", sound.name());
            assert!(voice.duration > 0.0);
            if matches!(voice.source, Source::Noise) {
                assert!(voice.duration <= f64::from(NOISE_SECONDS));
            }
            assert!(voice.volume > 0.0 && voice.volume <= 1.0);
        }
    }

    #[test]
    fn test_explosion_is_noise() {
        assert!(matches!(voice_for(SoundEvent::InvaderExplode).source, Source::Noise));
        assert!(matches!(
            voice_for(SoundEvent::PlayerShoot).source,
            Source::Tone(OscillatorType::Sine, f) if f == 880.0
        ));
    }
}
