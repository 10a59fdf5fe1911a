//! Main iced application
//!
//! Owns the engine model and drives it from a fixed UI tick: each tick
//! measures the real elapsed time, feeds the current throttle in, and
//! advances the simulation. The view is a plain readout plus the
//! throttle slider and start/stop controls.

use std::time::Instant;

use iced::time;
use iced::widget::{button, column, container, row, slider, text, Space};
use iced::{Center, Element, Fill, Subscription, Task, Theme};

use revsim_core::audio::Voice;
use revsim_core::engine::EngineModel;
use revsim_core::EnginePhase;

/// UI tick interval; the simulation runs at this cadence (~120 Hz)
const TICK_MS: u64 = 8;

/// Application state
pub struct RevsimApp {
    model: EngineModel<Box<dyn Voice + Send>>,
    /// Slider position, fed into the model every tick
    throttle: f32,
    last_tick: Option<Instant>,
    status: String,
}

/// Messages that can be sent to the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Fixed-cadence simulation tick
    Tick,
    /// Throttle slider moved
    ThrottleChanged(f32),
    StartEngine,
    StopEngine,
}

impl RevsimApp {
    pub fn new(model: EngineModel<Box<dyn Voice + Send>>, audio_connected: bool) -> Self {
        Self {
            model,
            throttle: 0.0,
            last_tick: None,
            status: if audio_connected {
                "Audio connected".to_string()
            } else {
                "No audio output (UI-only mode)".to_string()
            },
        }
    }

    /// Update application state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                let now = Instant::now();
                // Cap dt so a stalled UI doesn't teleport the simulation
                let dt = self
                    .last_tick
                    .map(|last| (now - last).as_secs_f64().min(0.1))
                    .unwrap_or(0.0);
                self.last_tick = Some(now);

                self.model.set_throttle(self.throttle as f64);
                self.model.update(dt);
                Task::none()
            }

            Message::ThrottleChanged(value) => {
                self.throttle = value;
                Task::none()
            }

            Message::StartEngine => {
                self.model.start_engine();
                Task::none()
            }

            Message::StopEngine => {
                self.throttle = 0.0;
                self.model.stop_engine();
                Task::none()
            }
        }
    }

    /// Subscribe to the simulation tick
    pub fn subscription(&self) -> Subscription<Message> {
        time::every(std::time::Duration::from_millis(TICK_MS)).map(|_| Message::Tick)
    }

    /// Build the view
    pub fn view(&self) -> Element<'_, Message> {
        let phase = self.model.phase();

        let rpm_readout = text(format!("{:.0}", self.model.rpm())).size(52);
        let phase_label = text(phase.label()).size(16);

        let loop_label = self
            .model
            .director()
            .effective_loop_key()
            .map(|k| k.name())
            .unwrap_or("-");
        let cruise_tag = if self.model.is_cruising() {
            "CRUISE"
        } else {
            ""
        };
        let sound_line = row![
            text(format!("loop: {}", loop_label)).size(13),
            Space::new().width(Fill),
            text(cruise_tag).size(13),
        ];

        let throttle_row = column![
            row![
                text("Throttle").size(14),
                Space::new().width(Fill),
                text(format!("{:.0}%", self.throttle * 100.0)).size(14),
            ],
            slider(0.0..=1.0, self.throttle, Message::ThrottleChanged).step(0.01),
        ]
        .spacing(6);

        let start_btn = button(text("START").size(14))
            .padding(10)
            .on_press_maybe((phase == EnginePhase::Off).then_some(Message::StartEngine));
        let stop_btn = button(text("STOP").size(14))
            .padding(10)
            .on_press_maybe(
                matches!(phase, EnginePhase::Idle | EnginePhase::Running)
                    .then_some(Message::StopEngine),
            );
        let controls = row![start_btn, Space::new().width(Fill), stop_btn];

        let content = column![
            text("Revsim").size(20),
            container(column![rpm_readout, phase_label].align_x(Center).spacing(4))
                .width(Fill)
                .center_x(Fill),
            sound_line,
            throttle_row,
            controls,
            text(&self.status).size(11),
        ]
        .spacing(16)
        .padding(20);

        container(content).width(Fill).into()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}
