/*
Reverb - Room Simulation via Delay Networks
===========================================

The classic Schroeder topology: four parallel comb filters build the dense
echo tail, two serial allpass filters diffuse it.

    Input ──┬──→ [Comb 1] ──┐
            ├──→ [Comb 2] ──┤
            ├──→ [Comb 3] ──┼──→ (+) ──→ [Allpass 1] ──→ [Allpass 2] ──→ Out
            └──→ [Comb 4] ──┘

Comb:     y[n] = x[n] + feedback * damp(y[n - delay])
Allpass:  y[n] = -g * x[n] + x[n - delay] + g * y[n - delay]

Comb delay times are mutually prime so their echo trains never align into
a resonant buildup. A one-pole lowpass in each comb's feedback path absorbs
high frequencies the way air and soft surfaces do ("damping").

Parameters: room size scales all delay times, damping darkens the tail,
decay sets comb feedback. The stereo node runs two cores with the right
core's delays offset by a few samples for width.
*/

use crate::dsp::delay_line::DelayLine;

/// Base comb delays in samples at 48 kHz, mutually prime.
pub const COMB_DELAYS: [usize; 4] = [1557, 1617, 1491, 1422];
/// Allpass delays in samples at 48 kHz.
pub const ALLPASS_DELAYS: [usize; 2] = [225, 556];

struct Comb {
    line: DelayLine,
    delay: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl Comb {
    fn new(max_delay: usize, delay: usize) -> Self {
        Self {
            line: DelayLine::new(max_delay),
            delay,
            feedback: 0.7,
            damp: 0.3,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.line.read(self.delay.saturating_sub(1));
        // One-pole lowpass on the feedback path absorbs highs
        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.line.write(input + self.filter_state * self.feedback);
        output
    }

    fn reset(&mut self) {
        self.line.reset();
        self.filter_state = 0.0;
    }
}

struct Allpass {
    line: DelayLine,
    delay: usize,
    gain: f32,
}

impl Allpass {
    fn new(max_delay: usize, delay: usize) -> Self {
        Self {
            line: DelayLine::new(max_delay),
            delay,
            gain: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.delay.saturating_sub(1));
        let output = -self.gain * input + delayed;
        self.line.write(input + self.gain * output);
        output
    }

    fn reset(&mut self) {
        self.line.reset();
    }
}

/// One mono Schroeder reverb core.
pub struct ReverbCore {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
    sample_rate: f32,
    room_size: f32,
    base_delays: [usize; 4],
}

impl ReverbCore {
    /// `delay_offset` detunes the delay set, used to decorrelate the right
    /// channel from the left.
    pub fn new(sample_rate: f32, delay_offset: usize) -> Self {
        let scale = sample_rate / 48_000.0;
        let base_delays = COMB_DELAYS.map(|d| ((d as f32 * scale) as usize) + delay_offset);
        let allpass_delays = ALLPASS_DELAYS.map(|d| ((d as f32 * scale) as usize) + delay_offset);

        // Capacity covers the largest room size (2x base)
        let combs = base_delays.map(|d| Comb::new(d * 2 + 4, d));
        let allpasses = allpass_delays.map(|d| Allpass::new(d + 4, d));

        Self {
            combs,
            allpasses,
            sample_rate,
            room_size: 0.5,
            base_delays,
        }
    }

    /// Room size in [0, 1]; scales comb delay times between 0.5x and 2x.
    pub fn set_room_size(&mut self, room_size: f32) {
        self.room_size = room_size.clamp(0.0, 1.0);
        let scale = 0.5 + 1.5 * self.room_size;
        for (comb, &base) in self.combs.iter_mut().zip(&self.base_delays) {
            comb.delay = ((base as f32 * scale) as usize)
                .min(comb.line.capacity() - 1)
                .max(1);
        }
    }

    /// Decay in [0, 1] maps onto comb feedback.
    pub fn set_decay(&mut self, decay: f32) {
        let feedback = decay.clamp(0.0, 1.0) * 0.98;
        for comb in &mut self.combs {
            comb.feedback = feedback;
        }
    }

    /// Damping in [0, 1]: high-frequency absorption of the tail.
    pub fn set_damping(&mut self, damping: f32) {
        let damp = damping.clamp(0.0, 1.0);
        for comb in &mut self.combs {
            comb.damp = damp;
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut acc = 0.0;
        for comb in &mut self.combs {
            acc += comb.process(input);
        }
        acc *= 0.25;
        for allpass in &mut self.allpasses {
            acc = allpass.process(acc);
        }
        acc
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}
