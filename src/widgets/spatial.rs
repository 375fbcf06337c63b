/*
Spatial Audio Studio
====================

A dropped audio file orbits the listener: buffer source → 3-D panner →
destination, with the scene model driving the panner's position every
frame (through ~10 ms ramps) and a movement pattern or a drag deciding
where the source is.

Export runs the SAME graph spec and the SAME scene through the offline
renderer, so the downloaded WAV is the session the user just heard.
Bypassing the spatializer leaves nothing meaningful to export and is
refused as NothingToRender.

File acceptance (wav/mp3, ≤ 50 MB) is enforced by the loader; anything
else surfaces as UnsupportedFile on drop.
*/

use std::cell::Cell;

use crate::graph::{GraphSpec, NodeId, NodeKind};
use crate::harness::{ParameterDecl, Widget};
use crate::loader::SampleLoader;
use crate::offline::RenderRecipe;
use crate::params::RampPolicy;
use crate::viz::scene::Scene3D;

pub struct SpatialStudioWidget {
    pub source_url: String,
    pub scene: Scene3D,
    /// User toggle: monitor the dry signal instead of the spatialized one.
    pub bypass: bool,
    source: Cell<Option<NodeId>>,
    panner: Cell<Option<NodeId>>,
}

impl SpatialStudioWidget {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            scene: Scene3D::default(),
            bypass: false,
            source: Cell::new(None),
            panner: Cell::new(None),
        }
    }

    pub fn panner_node(&self) -> Option<NodeId> {
        self.panner.get()
    }

    pub fn source_node(&self) -> Option<NodeId> {
        self.source.get()
    }

    /// Per-frame position write set: the scene evaluated at `elapsed`,
    /// as (param, value) pairs for the panner. The caller feeds these to
    /// the binder with the position ramp policy.
    pub fn position_writes(&self, elapsed: f64) -> [(&'static str, f32); 3] {
        let position = self.scene.position_at(elapsed);
        [
            ("positionX", position.x),
            ("positionY", position.y),
            ("positionZ", position.z),
        ]
    }

    /// Ramp policy for position writes (~10 ms glides).
    pub fn position_ramp() -> RampPolicy {
        RampPolicy::Glide(0.010)
    }
}

impl Widget for SpatialStudioWidget {
    fn name(&self) -> &'static str {
        "spatial-studio"
    }

    fn preload_urls(&self) -> Vec<String> {
        vec![self.source_url.clone()]
    }

    fn graph_spec(&self, _loader: &SampleLoader) -> GraphSpec {
        let mut spec = GraphSpec::new();
        let source = spec.add_kind(NodeKind::SourceBuffer {
            url: self.source_url.clone(),
            looped: true,
        });
        let panner = spec.add_kind(NodeKind::Panner3d);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[source, panner, dest]);

        self.source.set(Some(source));
        self.panner.set(Some(panner));
        spec
    }

    fn autostart_sources(&self) -> Vec<NodeId> {
        self.source.get().into_iter().collect()
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        let panner = self.panner.get().expect("graph built first");
        vec![
            ParameterDecl {
                id: "rolloff",
                node: panner,
                param: "rolloffFactor",
                min: 0.0,
                max: 10.0,
                default: 1.0,
                ramp: RampPolicy::Smooth,
            },
            ParameterDecl {
                id: "coneInner",
                node: panner,
                param: "coneInnerAngle",
                min: 0.0,
                max: 360.0,
                default: 360.0,
                ramp: RampPolicy::Step,
            },
            ParameterDecl {
                id: "coneOuter",
                node: panner,
                param: "coneOuterAngle",
                min: 0.0,
                max: 360.0,
                default: 360.0,
                ramp: RampPolicy::Step,
            },
        ]
    }

    fn offline_recipe(&self, _loader: &SampleLoader) -> Option<RenderRecipe> {
        // A fresh spec (not the live graph) keeps the export independent
        // of the live nodes' momentary state; both come from the same
        // constructors, which is the equivalence that matters.
        let mut spec = GraphSpec::new();
        let source = spec.add_kind(NodeKind::SourceBuffer {
            url: self.source_url.clone(),
            looped: false,
        });
        let panner = spec.add_kind(NodeKind::Panner3d);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[source, panner, dest]);

        Some(RenderRecipe {
            graph: spec,
            source,
            source_url: self.source_url.clone(),
            scene: Some((self.scene.clone(), panner)),
            program: None,
            spatialize: !self.bypass,
        })
    }
}
