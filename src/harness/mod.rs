/*
Widget Harness
==============

The generic per-page lifecycle every lab widget runs inside:

  mount     preload samples → build graph from the widget's declarative
            spec → create the binder and transport
  play      ensure the runtime is unlocked (the ONLY gesture-safe entry
            point) → start the transport / autostart sources
  update    once per animation frame: flush staged parameter writes, walk
            the transport look-ahead, hand due events to the driver,
            drain visual ticks
  stop      stop the transport, cancel every pending audio event and
            visual tick, silence instruments
  unmount   dispose the graph, drop runtime listeners

Status is a closed set of five user-visible strings; errors surface as a
status, never as a panic into the page. A panic inside widget code is
caught at the `error_boundary` and becomes the refresh card, leaving
sibling widgets alive.
*/

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::EngineError;
use crate::graph::{Graph, GraphBuilder, GraphSpec, NodeId, NodeSpec, ScheduledEvent};
use crate::loader::SampleLoader;
use crate::offline::{OfflineRenderer, RenderOutput, RenderRecipe};
use crate::params::{ParameterBinder, RampPolicy};
use crate::runtime::{AudioRuntime, UserGesture};
use crate::transport::{Transport, TransportProgram, VisualTick};

/// The five user-visible widget states.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetStatus {
    InitializingAudio,
    ClickToActivate,
    LoadingSample,
    Ready,
    Error(String),
}

impl fmt::Display for WidgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetStatus::InitializingAudio => write!(f, "Initializing audio…"),
            WidgetStatus::ClickToActivate => write!(f, "Click Play to activate audio"),
            WidgetStatus::LoadingSample => write!(f, "Loading sample…"),
            WidgetStatus::Ready => write!(f, "Ready"),
            WidgetStatus::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// One user-facing control bound to a graph parameter.
#[derive(Debug, Clone)]
pub struct ParameterDecl {
    pub id: &'static str,
    pub node: NodeId,
    pub param: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub ramp: RampPolicy,
}

/// What a lab page declares about itself.
pub trait Widget: Send {
    fn name(&self) -> &'static str;

    /// Sample URLs to preload before the graph is built. The widget may
    /// consult the loader afterwards to choose fallbacks for failures.
    fn preload_urls(&self) -> Vec<String> {
        Vec::new()
    }

    /// The declarative audio graph. Called after preloading; the loader
    /// is available so widgets can pick sample vs. synthesized fallback.
    fn graph_spec(&self, loader: &SampleLoader) -> GraphSpec;

    /// Sources the Play button should start directly (non-sequenced
    /// widgets: the EQ's noise source, the buffer player).
    fn autostart_sources(&self) -> Vec<NodeId> {
        Vec::new()
    }

    /// Transport program, for sequenced widgets.
    fn program(&self) -> Option<TransportProgram> {
        None
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        Vec::new()
    }

    /// Recipe for the offline exporter, when the widget supports export.
    fn offline_recipe(&self, loader: &SampleLoader) -> Option<RenderRecipe> {
        let _ = loader;
        None
    }
}

/// Run widget code behind a panic boundary: a panic becomes the refresh
/// card instead of tearing the page down.
pub fn error_boundary<T>(
    widget_name: &str,
    f: impl FnOnce() -> T + std::panic::UnwindSafe,
) -> Result<T, EngineError> {
    std::panic::catch_unwind(f).map_err(|_| {
        tracing::warn!(widget = widget_name, "widget panicked; showing error card");
        EngineError::InvalidState("Please refresh the page".to_string())
    })
}

pub struct WidgetHarness<'a, W: Widget> {
    widget: W,
    runtime: &'a AudioRuntime,
    loader: &'a SampleLoader,
    graph: Arc<Mutex<Graph>>,
    binder: ParameterBinder,
    transport: Transport,
    parameters: Vec<ParameterDecl>,
    load_error: Option<EngineError>,
    playing: bool,
    due_events: Vec<ScheduledEvent>,
}

impl<'a, W: Widget> WidgetHarness<'a, W> {
    /// Build a widget's engine state. Load failures do NOT fail the
    /// mount: the widget stays up with Play disabled and an error status.
    pub fn mount(
        widget: W,
        runtime: &'a AudioRuntime,
        loader: &'a SampleLoader,
    ) -> Result<Self, EngineError> {
        let mut load_error = None;
        for url in widget.preload_urls() {
            if let Err(error) = loader.load(&url) {
                tracing::warn!(%url, %error, "preload failed");
                load_error = Some(error);
            }
        }

        let sample_rate = runtime.sample_rate() as f32;
        let spec = widget.graph_spec(loader);
        let graph = GraphBuilder::new(sample_rate, loader).build(&spec)?;
        let graph = Arc::new(Mutex::new(graph));

        let binder = ParameterBinder::new(graph.clone(), sample_rate);
        let mut transport = Transport::new(sample_rate);
        if let Some(program) = widget.program() {
            transport.schedule(program);
        }
        let parameters = widget.parameters();

        tracing::debug!(widget = widget.name(), "widget mounted");
        Ok(Self {
            widget,
            runtime,
            loader,
            graph,
            binder,
            transport,
            parameters,
            load_error,
            playing: false,
            due_events: Vec::new(),
        })
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn graph(&self) -> Arc<Mutex<Graph>> {
        self.graph.clone()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn status(&self) -> WidgetStatus {
        if let Some(error) = &self.load_error {
            return WidgetStatus::Error(error.to_string());
        }
        match self.runtime.state() {
            crate::runtime::RuntimeState::Running => WidgetStatus::Ready,
            crate::runtime::RuntimeState::Uninitialized => WidgetStatus::ClickToActivate,
            crate::runtime::RuntimeState::Suspended => WidgetStatus::InitializingAudio,
            crate::runtime::RuntimeState::Closed => {
                WidgetStatus::Error("audio runtime closed".to_string())
            }
        }
    }

    /// The Play path: unlock (gesture required the first time), start the
    /// transport and any autostart sources.
    pub fn play(&mut self, gesture: Option<&UserGesture>) -> Result<(), EngineError> {
        if let Some(error) = &self.load_error {
            return Err(error.clone());
        }
        self.runtime.ensure_unlocked(gesture)?;

        {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            for id in self.widget.autostart_sources() {
                graph.reset_source(id);
                graph.start_source(id)?;
            }
        }

        self.transport.start(self.runtime.current_time());
        self.playing = true;
        Ok(())
    }

    /// Stop everything: transport, queued events, sounding notes, and
    /// autostarted sources. Pending visual ticks die with the transport.
    pub fn stop(&mut self) {
        self.transport.stop();
        self.due_events.clear();
        let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        graph.all_notes_off();
        for id in self.widget.autostart_sources() {
            graph.stop_source(id);
        }
        self.playing = false;
    }

    /// Stop and return every control to its declared default.
    pub fn reset(&mut self) {
        self.stop();
        let defaults: Vec<(NodeId, &'static str, f32, RampPolicy)> = self
            .parameters
            .iter()
            .map(|decl| (decl.node, decl.param, decl.default, decl.ramp))
            .collect();
        for (node, param, default, ramp) in defaults {
            self.binder.set(node, param, default, Some(ramp));
        }
        self.binder.flush();
    }

    /// Per-frame pass: commit staged parameter writes, walk the transport
    /// look-ahead, and surface visual ticks whose audio time has passed.
    pub fn update(&mut self, now: f64) -> Vec<VisualTick> {
        self.binder.flush();
        if self.playing {
            self.due_events.extend(self.transport.advance(now));
        }
        self.transport.drain_visual(now)
    }

    /// Drain events for the audio driver to hand to `process_block`.
    pub fn take_due_events(&mut self) -> Vec<ScheduledEvent> {
        std::mem::take(&mut self.due_events)
    }

    /// Set a declared control by id, clamped to its range.
    pub fn set_parameter(&mut self, id: &str, value: f32) {
        let Some(decl) = self.parameters.iter().find(|d| d.id == id) else {
            tracing::warn!(parameter = id, "unknown control ignored");
            return;
        };
        let clamped = value.clamp(decl.min, decl.max);
        self.binder
            .set(decl.node, decl.param, clamped, Some(decl.ramp));
    }

    pub fn parameters(&self) -> &[ParameterDecl] {
        &self.parameters
    }

    /// Structural change (node kind / kind config): rebuild one node.
    pub fn replace_node(&mut self, node: NodeId, spec: &NodeSpec) -> Result<(), EngineError> {
        self.binder.replace(node, spec, self.loader)
    }

    /// Install a new transport program (bar-boundary semantics).
    pub fn schedule_program(&mut self, program: TransportProgram) {
        self.transport.schedule(program);
    }

    pub fn schedule_program_immediate(&mut self, program: TransportProgram) {
        self.transport.schedule_immediate(program);
    }

    /// Render this widget's offline recipe to a WAV blob.
    pub fn export(&self) -> Result<RenderOutput, EngineError> {
        let recipe = self
            .widget
            .offline_recipe(self.loader)
            .ok_or(EngineError::NothingToRender)?;
        OfflineRenderer::new(self.loader).render(&recipe)
    }

    /// Tear down. The graph is disposed; late animation-frame callbacks
    /// hitting handles after this point are logged no-ops.
    pub fn unmount(mut self) {
        self.stop();
        self.graph
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .dispose();
        tracing::debug!(widget = self.widget.name(), "widget unmounted");
    }
}
