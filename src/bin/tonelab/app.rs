//! Tonelab application: audio driver + event loop.
//!
//! The UI thread owns the harness (transport, binder, widget state); the
//! cpal callback owns nothing but a graph lock and an rtrb consumer of
//! scheduled events. Every frame the UI walks the transport look-ahead
//! and pushes due events across the ring; the callback merges them into
//! its block renders and advances the runtime's frame clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rtrb::RingBuffer;

use crate::ui;

use tonelab::graph::{Graph, ScheduledEvent};
use tonelab::harness::WidgetHarness;
use tonelab::loader::SampleLoader;
use tonelab::runtime::{AudioRuntime, UserGesture};
use tonelab::viz::{SpectrumPipeline, StepGridView};
use tonelab::widgets::DrumLabWidget;
use tonelab::MAX_BLOCK_SIZE;

const EVENT_QUEUE_SIZE: usize = 1024;

pub struct TonelabApp {
    bpm: f64,
    swing: f32,
}

/// UI cursor over the step grid.
struct GridCursor {
    track: usize,
    step: usize,
}

impl TonelabApp {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            swing: 0.0,
        }
    }

    pub fn run(self) -> EyreResult<()> {
        // Audio device
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        let sample_rate = config.sample_rate().0;

        let runtime = AudioRuntime::global();
        runtime.set_sample_rate(sample_rate);
        let loader = SampleLoader::global();

        // Widget + harness
        let mut widget = DrumLabWidget::new();
        widget.bpm = self.bpm;
        widget.swing = self.swing;
        let mut harness = WidgetHarness::mount(widget, runtime, loader)
            .wrap_err("failed to mount the drum lab")?;
        let graph = harness.graph();

        // Events cross to the audio callback over a lock-free ring
        let (mut event_tx, mut event_rx) = RingBuffer::<ScheduledEvent>::new(EVENT_QUEUE_SIZE);

        let stream = build_output_stream(&device, &config.into(), graph.clone(), move || {
            let mut events = Vec::new();
            while let Ok(event) = event_rx.pop() {
                events.push(event);
            }
            events
        })?;
        stream.play().wrap_err("failed to start output stream")?;

        // Terminal
        let mut terminal = ratatui::init();
        let mut spectrum = SpectrumPipeline::new(2048, sample_rate as f32);
        let mut grid_view = StepGridView::new();
        let mut cursor = GridCursor { track: 0, step: 0 };
        let mut spectrum_window: Vec<f32> = Vec::new();

        let result = loop {
            // Frame pass: flush params, schedule look-ahead, drain ticks
            let now = runtime.current_time();
            for tick in harness.update(now) {
                grid_view.on_tick(&tick);
            }
            for event in harness.take_due_events() {
                if event_tx.push(event).is_err() {
                    tracing::warn!("event ring full; dropping scheduled event");
                }
            }

            // Pull the master-bus analyzer into the spectrum view
            let reader = harness
                .widget()
                .analyzer_node()
                .and_then(|id| graph.lock().unwrap_or_else(|e| e.into_inner()).tap(id));
            if let Some(reader) = reader {
                if spectrum_window.len() != reader.window_size() {
                    spectrum_window = vec![0.0; reader.window_size()];
                }
                reader.snapshot(&mut spectrum_window);
                spectrum.update(&spectrum_window);
            }

            terminal.draw(|frame| {
                ui::draw(
                    frame,
                    &harness,
                    &spectrum,
                    &grid_view,
                    (cursor.track, cursor.step),
                );
            })?;

            // Input
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                        KeyCode::Char(' ') => {
                            if harness.is_playing() {
                                harness.stop();
                                grid_view.clear();
                            } else {
                                let gesture = UserGesture::from_input_event();
                                if let Err(error) = harness.play(Some(&gesture)) {
                                    tracing::warn!(%error, "play refused");
                                }
                            }
                        }
                        KeyCode::Left => cursor.step = cursor.step.saturating_sub(1),
                        KeyCode::Right => {
                            cursor.step =
                                (cursor.step + 1).min(tonelab::widgets::steps::STEPS_PER_BAR - 1)
                        }
                        KeyCode::Up => cursor.track = cursor.track.saturating_sub(1),
                        KeyCode::Down => {
                            cursor.track =
                                (cursor.track + 1).min(tonelab::widgets::steps::TRACK_COUNT - 1)
                        }
                        KeyCode::Enter => {
                            // Toggle the cell and hot-swap the program at
                            // the next bar boundary
                            let widget = harness.widget_mut();
                            widget.pattern.toggle(cursor.track, cursor.step);
                            let program = widget.current_program();
                            harness.schedule_program(program);
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            self::retempo(&mut harness, 5.0);
                        }
                        KeyCode::Char('-') => {
                            self::retempo(&mut harness, -5.0);
                        }
                        _ => {}
                    }
                }
            }
        };

        ratatui::restore();
        harness.unmount();
        result
    }
}

fn retempo(harness: &mut WidgetHarness<'_, DrumLabWidget>, delta: f64) {
    let widget = harness.widget_mut();
    widget.bpm = (widget.bpm + delta).clamp(40.0, 240.0);
    let program = widget.current_program();
    harness.schedule_program(program);
}

fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    graph: Arc<Mutex<Graph>>,
    mut drain_events: impl FnMut() -> Vec<ScheduledEvent> + Send + 'static,
) -> EyreResult<cpal::Stream> {
    let channels = config.channels as usize;
    let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut right = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut pending: Vec<ScheduledEvent> = Vec::new();

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _| {
                pending.extend(drain_events());
                pending.sort_by_key(|e| e.frame);

                let total_frames = data.len() / channels;
                let mut written = 0;
                while written < total_frames {
                    let chunk = (total_frames - written).min(MAX_BLOCK_SIZE);
                    {
                        let mut graph = graph.lock().unwrap_or_else(|e| e.into_inner());
                        let horizon = graph.current_frame() + chunk as u64;
                        let due: Vec<ScheduledEvent> = pending
                            .iter()
                            .filter(|e| e.frame < horizon)
                            .cloned()
                            .collect();
                        pending.retain(|e| e.frame >= horizon);
                        graph.process_block(&due, &mut left[..chunk], &mut right[..chunk]);
                    }

                    let out = &mut data[written * channels..(written + chunk) * channels];
                    for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
                        frame[0] = left[i];
                        if channels > 1 {
                            frame[1] = right[i];
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = 0.0;
                        }
                    }
                    written += chunk;
                }

                AudioRuntime::global().advance_frames(total_frames as u64);
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )
        .wrap_err("failed to build output stream")?;
    Ok(stream)
}
