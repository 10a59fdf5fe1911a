//! Revsim - synthetic engine sound for quiet drivetrains
//!
//! Entry point for the desktop GUI. It:
//! 1. Loads the YAML config and the WAV clip set
//! 2. Starts the CPAL output stream (falling back to UI-only mode)
//! 3. Launches the iced application that drives the simulation

mod config;
mod ui;

use iced::{Size, Task};

use revsim_core::audio::{start_audio_system, ClipBank, NullVoice, Voice};
use revsim_core::director::AudioDirector;
use revsim_core::engine::EngineModel;
use revsim_core::types::NUM_VOICES;

use ui::app::Message;
use ui::RevsimApp;

fn main() -> iced::Result {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("revsim-player starting up");

    let config_path = config::default_config_path();
    let player_config = config::load_config(&config_path);

    // Seed a default config on first run so the tuning knobs are
    // discoverable on disk
    if !config_path.exists() {
        if let Err(e) = config::save_config(&player_config, &config_path) {
            log::warn!("Could not write default config: {:#}", e);
        }
    }

    // Bring up audio; any failure here degrades to a silent simulation
    // rather than refusing to start
    let (audio_handle, voices, audio_connected) =
        match ClipBank::load_dir(&player_config.sounds_dir)
            .and_then(start_audio_system)
        {
            Ok((handle, voices)) => {
                log::info!("Audio running at {} Hz", handle.sample_rate());
                let voices: Vec<Box<dyn Voice + Send>> = voices
                    .into_iter()
                    .map(|v| Box::new(v) as Box<dyn Voice + Send>)
                    .collect();
                (Some(handle), voices, true)
            }
            Err(e) => {
                eprintln!("Warning: audio unavailable: {}", e);
                eprintln!("Running in UI-only mode (no sound output)");
                eprintln!(
                    "Put the engine WAV set in {:?} or point sounds_dir in {:?} at it.",
                    player_config.sounds_dir, config_path
                );
                let voices: Vec<Box<dyn Voice + Send>> = (0..NUM_VOICES)
                    .map(|_| Box::new(NullVoice::new()) as Box<dyn Voice + Send>)
                    .collect();
                (None, voices, false)
            }
        };

    let mut voices = voices.into_iter();
    let director = AudioDirector::new(
        voices.next().expect("loop voice A"),
        voices.next().expect("loop voice B"),
        voices.next().expect("transition voice"),
        voices.next().expect("effect voice"),
        &player_config.engine.levels,
    );
    let model = EngineModel::new(director, player_config.engine);

    // Wrap the model in a cell so the boot closure can be Fn (required
    // by iced); boot only runs once
    let model_cell = std::cell::RefCell::new(Some(model));

    let result = iced::application(
        move || {
            let model = model_cell
                .borrow_mut()
                .take()
                .expect("model already taken");
            (RevsimApp::new(model, audio_connected), Task::none())
        },
        update,
        view,
    )
    .subscription(subscription)
    .theme(theme)
    .title("Revsim")
    .window_size(Size::new(420.0, 380.0))
    .run();

    // Keep the output stream alive until the GUI is done
    drop(audio_handle);
    log::info!("revsim-player stopped");

    result
}

/// Update function for iced
fn update(app: &mut RevsimApp, message: Message) -> Task<Message> {
    app.update(message)
}

/// View function for iced
fn view(app: &RevsimApp) -> iced::Element<'_, Message> {
    app.view()
}

/// Subscription function for iced
fn subscription(app: &RevsimApp) -> iced::Subscription<Message> {
    app.subscription()
}

/// Theme function for iced
fn theme(app: &RevsimApp) -> iced::Theme {
    app.theme()
}
