//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//!
//! The taunt tune is the only sound whose end matters: when it finishes the
//! session unpauses throwing. Its `onended` pushes into a queue the frame loop
//! drains; if it cannot play at all, completion is queued right away.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::settings::Settings;
use crate::sim::Sound;

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
    /// Sounds that reported their end since the last drain
    completed: Rc<RefCell<Vec<Sound>>>,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            muted: settings.muted,
            completed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Sounds that finished playing since the last call
    pub fn drain_completed(&self) -> Vec<Sound> {
        std::mem::take(&mut *self.completed.borrow_mut())
    }

    /// Play a sound. A taunt that cannot be played still reports completion.
    pub fn play(&self, sound: Sound) {
        if self.schedule(sound) {
            return;
        }
        log::debug!("Skipped {:?}", sound);
        if matches!(sound, Sound::Taunt { .. }) {
            self.completed.borrow_mut().push(sound);
        }
    }

    /// Whether the sound actually went to the speakers
    fn schedule(&self, sound: Sound) -> bool {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return false;
        }

        let Some(ctx) = &self.ctx else {
            return false;
        };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match sound {
            Sound::Cheer(variant) => self.play_cheer(ctx, vol, variant),
            Sound::Miss => self.play_miss(ctx, vol),
            Sound::Throw => self.play_throw(ctx, vol),
            Sound::Taunt { stage } => self.play_taunt(ctx, vol, stage).is_some_and(|last| {
                self.notify_on_end(&last, sound);
                true
            }),
        }
    }

    /// Queue `sound` as completed when `osc` stops
    fn notify_on_end(&self, osc: &OscillatorNode, sound: Sound) {
        let completed = Rc::clone(&self.completed);
        let callback = Closure::once_into_js(move || {
            completed.borrow_mut().push(sound);
        });
        osc.set_onended(Some(callback.unchecked_ref()));
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Schedule a run of notes; returns the last oscillator
    fn play_notes(
        &self,
        ctx: &AudioContext,
        vol: f32,
        notes: &[f32],
        spacing: f64,
        length: f64,
        osc_type: OscillatorType,
    ) -> Option<OscillatorNode> {
        let mut last = None;
        for (i, freq) in notes.iter().enumerate() {
            let delay = i as f64 * spacing;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + length * 0.8)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + length).ok();
                last = Some(osc);
            }
        }
        last
    }

    /// Scored - one of four little fanfares
    fn play_cheer(&self, ctx: &AudioContext, vol: f32, variant: u8) -> bool {
        let (notes, osc_type): (&[f32], _) = match variant % 4 {
            0 => (&[500.0, 600.0, 700.0, 800.0, 1000.0], OscillatorType::Triangle),
            1 => (&[523.0, 659.0, 784.0, 1047.0], OscillatorType::Sine),
            2 => (&[400.0, 500.0, 600.0, 800.0], OscillatorType::Square),
            _ => (&[784.0, 659.0, 784.0, 1047.0], OscillatorType::Triangle),
        };
        self.play_notes(ctx, vol * 0.25, notes, 0.08, 0.3, osc_type)
            .is_some()
    }

    /// Ball hit the floor - dull thud
    fn play_miss(&self, ctx: &AudioContext, vol: f32) -> bool {
        let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Sine) else {
            return false;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.6, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.15)
            .ok();
        osc.frequency().set_value_at_time(120.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(50.0, t + 0.15)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.2).is_ok()
    }

    /// Throw - whoosh up
    fn play_throw(&self, ctx: &AudioContext, vol: f32) -> bool {
        let Some((osc, gain)) = self.create_osc(ctx, 200.0, OscillatorType::Triangle) else {
            return false;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(600.0, t + 0.15)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).is_ok()
    }

    /// Taunt - sad descending tune, longer and harsher each stage
    fn play_taunt(&self, ctx: &AudioContext, vol: f32, stage: u32) -> Option<OscillatorNode> {
        let (notes, osc_type): (&[f32], _) = match stage {
            0 | 1 => (&[400.0, 350.0, 300.0, 200.0], OscillatorType::Sine),
            2 => (&[400.0, 350.0, 300.0, 250.0, 200.0, 150.0], OscillatorType::Triangle),
            _ => (
                &[440.0, 415.0, 392.0, 370.0, 300.0, 220.0, 150.0, 110.0],
                OscillatorType::Sawtooth,
            ),
        };
        self.play_notes(ctx, vol * 0.3, notes, 0.25, 0.4, osc_type)
    }
}
