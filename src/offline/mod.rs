/*
Offline Rendering
=================

Reproduces a live widget's graph deterministically and encodes the result
to a WAV blob. The critical property: the SAME `GraphSpec` and the SAME
node constructors are used as in live playback, so what exports is what
played — there is no second audio path to drift out of sync.

Pipeline:

  1. An offline "context": stereo, sample rate taken from the source
     buffer, length equal to the buffer (spatialization of a mono source
     needs both channels).
  2. Graph materialized from the recipe's spec via `GraphBuilder`.
  3. Automation walked at 60 updates per second: the scene's movement
     pattern is evaluated at each tick and scheduled as a stepped value
     write at that exact frame (the panner's own ~10 ms smoothing turns
     the steps into glides, exactly as live). A transport program, if
     present, is run through the same look-ahead scheduler.
  4. The source starts at frame 0; the graph renders in chunks split at
     every automation boundary; the result is peak-scanned for stats and
     encoded to 16-bit PCM.

Nothing here reads the wall clock or unseeded randomness, which is what
makes the output bit-identical across runs (and testable).
*/

pub mod wav;

use crate::error::EngineError;
use crate::graph::{GraphBuilder, GraphSpec, NodeId, Ramp, ScheduledEvent};
use crate::loader::SampleLoader;
use crate::transport::{Transport, TransportProgram};
use crate::viz::scene::Scene3D;
use crate::MAX_BLOCK_SIZE;

pub use wav::{decode_wav_blob, encode_stereo_wav, WavBlob};

/// Automation resolution: movement patterns are sampled at this rate.
pub const AUTOMATION_RATE_HZ: f64 = 60.0;
/// Ramp length for scheduled position writes, seconds.
const POSITION_RAMP_SECONDS: f32 = 0.010;

/// Everything needed to reproduce a widget's audio offline.
#[derive(Debug, Clone)]
pub struct RenderRecipe {
    pub graph: GraphSpec,
    /// The buffer source node started at frame 0.
    pub source: NodeId,
    /// URL of the decoded buffer driving the render (sets rate + length).
    pub source_url: String,
    /// Movement automation: the scene plus the panner node it drives.
    pub scene: Option<(Scene3D, NodeId)>,
    /// Optional transport program (sequenced widgets).
    pub program: Option<TransportProgram>,
    /// False when the user bypassed spatialization; exporting a bypassed
    /// 3-D scene is refused as NothingToRender.
    pub spatialize: bool,
}

/// Summary statistics of a finished render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub duration_seconds: f32,
    pub frame_count: usize,
    pub peak: f32,
    pub rms: f32,
}

impl RenderStats {
    fn from_channels(left: &[f32], right: &[f32], sample_rate: u32) -> Self {
        let frame_count = left.len();
        let mut peak = 0.0f32;
        let mut power = 0.0f64;
        for (l, r) in left.iter().zip(right) {
            peak = peak.max(l.abs()).max(r.abs());
            power += (l * l + r * r) as f64 * 0.5;
        }
        let rms = if frame_count > 0 {
            ((power / frame_count as f64) as f32).sqrt()
        } else {
            0.0
        };
        Self {
            duration_seconds: frame_count as f32 / sample_rate as f32,
            frame_count,
            peak,
            rms,
        }
    }
}

pub struct RenderOutput {
    pub blob: WavBlob,
    pub stats: RenderStats,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

struct AutomationPoint {
    frame: u64,
    node: NodeId,
    param: &'static str,
    value: f32,
}

pub struct OfflineRenderer<'a> {
    loader: &'a SampleLoader,
}

impl<'a> OfflineRenderer<'a> {
    pub fn new(loader: &'a SampleLoader) -> Self {
        Self { loader }
    }

    pub fn render(&self, recipe: &RenderRecipe) -> Result<RenderOutput, EngineError> {
        if recipe.scene.is_some() && !recipe.spatialize {
            return Err(EngineError::NothingToRender);
        }
        let buffer = self
            .loader
            .get(&recipe.source_url)
            .ok_or(EngineError::NotLoaded)?;

        let sample_rate = buffer.sample_rate();
        let frames = buffer.frame_count();
        if frames == 0 {
            return Err(EngineError::NothingToRender);
        }
        let duration = frames as f64 / sample_rate as f64;

        // Same constructors as live playback
        let mut graph = GraphBuilder::new(sample_rate as f32, self.loader)
            .build(&recipe.graph)
            .map_err(|e| EngineError::RenderFailed {
                cause: e.to_string(),
            })?;

        let automation = self.plan_automation(recipe, sample_rate, duration);
        let events = self.plan_events(recipe, sample_rate as f32, duration);

        graph
            .start_source(recipe.source)
            .map_err(|e| EngineError::RenderFailed {
                cause: e.to_string(),
            })?;

        let mut left = vec![0.0f32; frames];
        let mut right = vec![0.0f32; frames];
        let position_ramp = Ramp::linear((POSITION_RAMP_SECONDS * sample_rate as f32) as u32);

        let mut cursor = 0usize;
        let mut auto_idx = 0usize;
        let mut event_idx = 0usize;

        while cursor < frames {
            // Apply every automation point due at or before the cursor
            while auto_idx < automation.len() && automation[auto_idx].frame <= cursor as u64 {
                let point = &automation[auto_idx];
                graph.set_param(point.node, point.param, point.value, position_ramp);
                auto_idx += 1;
            }

            // Chunk ends at the next automation boundary or block limit
            let chunk_end = automation
                .get(auto_idx)
                .map(|p| (p.frame as usize).min(frames))
                .unwrap_or(frames)
                .min(cursor + MAX_BLOCK_SIZE)
                .max(cursor + 1);

            // Transport events inside this chunk
            let event_start = event_idx;
            while event_idx < events.len() && events[event_idx].frame < chunk_end as u64 {
                event_idx += 1;
            }

            graph.process_block(
                &events[event_start..event_idx],
                &mut left[cursor..chunk_end],
                &mut right[cursor..chunk_end],
            );
            cursor = chunk_end;
        }

        let stats = RenderStats::from_channels(&left, &right, sample_rate);
        let blob = encode_stereo_wav(&left, &right, sample_rate)?;
        tracing::info!(
            frames,
            peak = stats.peak,
            rms = stats.rms,
            "offline render complete"
        );

        Ok(RenderOutput {
            blob,
            stats,
            left,
            right,
            sample_rate,
        })
    }

    /// Movement-pattern automation at the fixed 60 Hz resolution.
    fn plan_automation(
        &self,
        recipe: &RenderRecipe,
        sample_rate: u32,
        duration: f64,
    ) -> Vec<AutomationPoint> {
        let Some((scene, panner)) = &recipe.scene else {
            return Vec::new();
        };
        let mut points = Vec::new();
        let step = 1.0 / AUTOMATION_RATE_HZ;
        let mut t = 0.0;
        while t < duration {
            let position = scene.position_at(t);
            let frame = (t * sample_rate as f64) as u64;
            points.push(AutomationPoint {
                frame,
                node: *panner,
                param: "positionX",
                value: position.x,
            });
            points.push(AutomationPoint {
                frame,
                node: *panner,
                param: "positionY",
                value: position.y,
            });
            points.push(AutomationPoint {
                frame,
                node: *panner,
                param: "positionZ",
                value: position.z,
            });
            t += step;
        }
        points
    }

    /// Transport events over the render window, via the same scheduler
    /// the live path uses.
    fn plan_events(
        &self,
        recipe: &RenderRecipe,
        sample_rate: f32,
        duration: f64,
    ) -> Vec<ScheduledEvent> {
        let Some(program) = &recipe.program else {
            return Vec::new();
        };
        let mut transport = Transport::new(sample_rate);
        transport.schedule(program.clone());
        transport.start(0.0);

        let mut events = Vec::new();
        let mut t = 0.0;
        while t < duration {
            events.extend(transport.advance(t));
            t += 1.0 / AUTOMATION_RATE_HZ;
        }
        // Drop anything scheduled past the end by the look-ahead
        let last_frame = (duration * sample_rate as f64) as u64;
        events.retain(|e| e.frame < last_frame);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, NodeSpec};
    use crate::loader::DecodedBuffer;
    use crate::viz::scene::MovementPattern;

    const SR: u32 = 48_000;

    fn tone_loader(url: &str, seconds: f32) -> SampleLoader {
        let loader = SampleLoader::new();
        let frames = (seconds * SR as f32) as usize;
        let samples: Vec<f32> = (0..frames)
            .map(|i| {
                // -6 dBFS tone at 440 Hz
                0.5 * (std::f32::consts::TAU * 440.0 * i as f32 / SR as f32).sin()
            })
            .collect();
        loader.insert(DecodedBuffer::from_mono(url, SR, samples));
        loader
    }

    fn spatial_recipe(url: &str, scene: Scene3D) -> RenderRecipe {
        let mut spec = GraphSpec::new();
        let source = spec.add_kind(NodeKind::SourceBuffer {
            url: url.to_string(),
            looped: false,
        });
        let panner = spec.add_kind(NodeKind::Panner3d);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[source, panner, dest]);

        RenderRecipe {
            graph: spec,
            source,
            source_url: url.to_string(),
            scene: Some((scene, panner)),
            program: None,
            spatialize: true,
        }
    }

    #[test]
    fn render_is_bit_identical_across_runs() {
        let loader = tone_loader("gen:tone", 0.5);
        let mut scene = Scene3D::default();
        scene.set_pattern(MovementPattern::Circle);
        let recipe = spatial_recipe("gen:tone", scene);

        let renderer = OfflineRenderer::new(&loader);
        let a = renderer.render(&recipe).expect("first render");
        let b = renderer.render(&recipe).expect("second render");

        assert_eq!(a.blob.bytes, b.blob.bytes, "renders must be reproducible");
    }

    #[test]
    fn hard_left_source_exports_left_heavy_stereo() {
        let loader = tone_loader("gen:tone", 1.0);
        let mut scene = Scene3D::default();
        assert!(scene.try_drag(-5.0, 0.0));
        let recipe = spatial_recipe("gen:tone", scene);

        let output = OfflineRenderer::new(&loader).render(&recipe).unwrap();

        // First 10 ms: left RMS at least 6 dB over right
        let window = (0.010 * SR as f32) as usize;
        let rms = |b: &[f32]| {
            (b.iter().map(|x| x * x).sum::<f32>() / b.len() as f32)
                .sqrt()
                .max(1e-9)
        };
        let rms_l = rms(&output.left[..window]);
        let rms_r = rms(&output.right[..window]);
        let ratio_db = 20.0 * (rms_l / rms_r).log10();
        assert!(ratio_db >= 6.0, "expected ≥6 dB left bias, got {ratio_db}");
    }

    #[test]
    fn export_length_matches_source() {
        let loader = tone_loader("gen:tone", 0.25);
        let recipe = spatial_recipe("gen:tone", Scene3D::default());
        let output = OfflineRenderer::new(&loader).render(&recipe).unwrap();

        assert_eq!(output.stats.frame_count, (0.25 * SR as f32) as usize);
        assert_eq!(output.sample_rate, SR);
        // 44-byte header + frames * 2 ch * 2 bytes
        assert_eq!(
            output.blob.len(),
            44 + output.stats.frame_count * 4,
            "stereo 16-bit payload"
        );
    }

    #[test]
    fn bypassed_spatializer_refuses_to_export() {
        let loader = tone_loader("gen:tone", 0.1);
        let mut recipe = spatial_recipe("gen:tone", Scene3D::default());
        recipe.spatialize = false;

        let err = OfflineRenderer::new(&loader).render(&recipe).unwrap_err();
        assert_eq!(err, EngineError::NothingToRender);
    }

    #[test]
    fn missing_source_is_not_loaded() {
        let loader = SampleLoader::new();
        let recipe = spatial_recipe("gen:absent", Scene3D::default());
        let err = OfflineRenderer::new(&loader).render(&recipe).unwrap_err();
        assert_eq!(err, EngineError::NotLoaded);
    }

    #[test]
    fn moving_scene_produces_time_varying_panning() {
        let loader = tone_loader("gen:tone", 1.0);
        let mut scene = Scene3D::default();
        scene.movement_speed = std::f64::consts::TAU as f32; // one orbit per second
        scene.set_pattern(MovementPattern::LeftRight);
        let recipe = spatial_recipe("gen:tone", scene);

        let output = OfflineRenderer::new(&loader).render(&recipe).unwrap();

        // Quarter-period windows: the source swings right then left
        let quarter = output.left.len() / 4;
        let rms = |b: &[f32]| (b.iter().map(|x| x * x).sum::<f32>() / b.len() as f32).sqrt();
        let right_heavy = rms(&output.right[0..quarter]) > rms(&output.left[0..quarter]);
        let left_heavy = rms(&output.left[quarter * 2..quarter * 3])
            > rms(&output.right[quarter * 2..quarter * 3]);
        assert!(
            right_heavy && left_heavy,
            "panning should follow the movement pattern"
        );
    }
}
