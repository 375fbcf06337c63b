/*
Step Patterns
=============

A step pattern is the drum sequencer's data model: a grid of on/off cells,
one row per track, one column per step, with an optional velocity lane.
The UI mutates the grid cell-by-cell; the transport reads it once per step.

The dimensional invariant — grid is always exactly trackCount × stepsPerBar,
velocities too when present — is maintained by construction: the only ways
to change dimensions (`resize`) rebuild both lanes together.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_STEPS_PER_BAR: usize = 16;
const DEFAULT_VELOCITY: f32 = 1.0;

/// On/off step grid with per-cell velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StepPattern {
    track_count: usize,
    steps_per_bar: usize,
    grid: Vec<Vec<bool>>,
    velocities: Vec<Vec<f32>>,
}

impl StepPattern {
    pub fn new(track_count: usize, steps_per_bar: usize) -> Self {
        Self {
            track_count,
            steps_per_bar,
            grid: vec![vec![false; steps_per_bar]; track_count],
            velocities: vec![vec![DEFAULT_VELOCITY; steps_per_bar]; track_count],
        }
    }

    /// Build a pattern from rows of step indices that should be active.
    ///
    /// ```
    /// use tonelab::sequencing::pattern::StepPattern;
    ///
    /// // Four-on-the-floor kick, backbeat snare
    /// let pattern = StepPattern::from_rows(16, &[&[0, 4, 8, 12], &[4, 12]]);
    /// assert!(pattern.is_active(0, 4));
    /// assert!(!pattern.is_active(1, 0));
    /// ```
    pub fn from_rows(steps_per_bar: usize, rows: &[&[usize]]) -> Self {
        let mut pattern = Self::new(rows.len(), steps_per_bar);
        for (track, steps) in rows.iter().enumerate() {
            for &step in *steps {
                pattern.set(track, step, true);
            }
        }
        pattern
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn steps_per_bar(&self) -> usize {
        self.steps_per_bar
    }

    pub fn is_active(&self, track: usize, step: usize) -> bool {
        self.grid
            .get(track)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn velocity(&self, track: usize, step: usize) -> f32 {
        self.velocities
            .get(track)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(DEFAULT_VELOCITY)
    }

    /// Set a cell. Out-of-range coordinates are ignored.
    pub fn set(&mut self, track: usize, step: usize, active: bool) {
        if let Some(cell) = self.grid.get_mut(track).and_then(|row| row.get_mut(step)) {
            *cell = active;
        }
    }

    pub fn set_velocity(&mut self, track: usize, step: usize, velocity: f32) {
        if let Some(cell) = self
            .velocities
            .get_mut(track)
            .and_then(|row| row.get_mut(step))
        {
            *cell = velocity.clamp(0.0, 1.0);
        }
    }

    pub fn toggle(&mut self, track: usize, step: usize) {
        if let Some(cell) = self.grid.get_mut(track).and_then(|row| row.get_mut(step)) {
            *cell = !*cell;
        }
    }

    pub fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(false);
        }
    }

    /// Change dimensions, preserving overlapping cells.
    ///
    /// Grid and velocity lanes are rebuilt together so they can never
    /// disagree about shape.
    pub fn resize(&mut self, track_count: usize, steps_per_bar: usize) {
        let mut grid = vec![vec![false; steps_per_bar]; track_count];
        let mut velocities = vec![vec![DEFAULT_VELOCITY; steps_per_bar]; track_count];

        for track in 0..track_count.min(self.track_count) {
            for step in 0..steps_per_bar.min(self.steps_per_bar) {
                grid[track][step] = self.grid[track][step];
                velocities[track][step] = self.velocities[track][step];
            }
        }

        self.track_count = track_count;
        self.steps_per_bar = steps_per_bar;
        self.grid = grid;
        self.velocities = velocities;
    }

    /// Tracks that fire on `step`, with their velocities.
    pub fn hits_at(&self, step: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        (0..self.track_count).filter_map(move |track| {
            self.is_active(track, step)
                .then(|| (track, self.velocity(track, step)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pattern_is_silent() {
        let pattern = StepPattern::new(4, 16);
        for track in 0..4 {
            for step in 0..16 {
                assert!(!pattern.is_active(track, step));
            }
        }
    }

    #[test]
    fn toggle_flips_a_cell() {
        let mut pattern = StepPattern::new(2, 16);
        pattern.toggle(1, 3);
        assert!(pattern.is_active(1, 3));
        pattern.toggle(1, 3);
        assert!(!pattern.is_active(1, 3));
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut pattern = StepPattern::new(2, 16);
        pattern.set(5, 0, true);
        pattern.set(0, 99, true);
        assert_eq!(pattern.hits_at(0).count(), 0);
    }

    #[test]
    fn resize_preserves_overlap_and_shape() {
        let mut pattern = StepPattern::from_rows(16, &[&[0, 4, 8, 12]]);
        pattern.set_velocity(0, 4, 0.5);

        pattern.resize(2, 8);

        assert_eq!(pattern.track_count(), 2);
        assert_eq!(pattern.steps_per_bar(), 8);
        assert!(pattern.is_active(0, 0));
        assert!(pattern.is_active(0, 4));
        assert!((pattern.velocity(0, 4) - 0.5).abs() < f32::EPSILON);
        // New track exists and is silent
        assert_eq!(pattern.hits_at(0).count(), 1);
    }

    #[test]
    fn hits_at_reports_track_and_velocity() {
        let mut pattern = StepPattern::from_rows(16, &[&[0], &[0], &[1]]);
        pattern.set_velocity(1, 0, 0.25);

        let hits: Vec<(usize, f32)> = pattern.hits_at(0).collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1], (1, 0.25));
    }
}
