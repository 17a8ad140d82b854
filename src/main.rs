// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jukebox::clock::{Clock, SystemClock};
use jukebox::gpio::{self, Lamp};
use jukebox::keypad::{KeySymbol, Keypad};
use jukebox::playsync::CancelHandle;
use jukebox::tracks::Tracks;
use jukebox::{audio, util, Jukebox};

/// How long a worker gets to wind down after a signal before the lamps are forced off.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=keypad jukebox
After=sound.target

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/jukebox
ExecStart=/usr/local/bin/jukebox start --config "$JUKEBOX_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=jukebox.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A keypad-driven jukebox and soundboard."
)]
struct Cli {
    /// The log level (e.g. debug, info, warn). Overrides RUST_LOG.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// The path to the jukebox config. Settings can also come from JUKEBOX_* variables.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will run the jukebox until it's interrupted.
    Start {},
    /// Plays a single track with the light show and exits.
    Play {
        /// The track number.
        number: u32,
    },
    /// Switches lamps on until Enter is pressed. Without flags, every lamp.
    TestLights {
        #[arg(long)]
        top: bool,
        #[arg(long)]
        left_right: bool,
        #[arg(long)]
        bottom: bool,
        #[arg(long)]
        all: bool,
    },
    /// Prints keypad reads whenever they change, until interrupted.
    TestKeypad {},
    /// Lists the numbered tracks in the songs directory.
    Tracks {},
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves once the process gets SIGINT or SIGTERM.
async fn interrupted() -> Result<(), Box<dyn Error>> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Interrupted, shutting down.");
        }
        _ = terminate.recv() => info!("Terminated, shutting down."),
    }
    Ok(())
}

/// Cancels the worker and gives it `SHUTDOWN_TIMEOUT` to return. None if it didn't.
async fn wind_down<T>(
    shutdown: &CancelHandle,
    worker: JoinHandle<T>,
) -> Result<Option<T>, Box<dyn Error>> {
    shutdown.cancel();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, worker).await {
        Ok(result) => Ok(Some(result?)),
        Err(_) => {
            warn!(
                timeout = ?SHUTDOWN_TIMEOUT,
                "Worker didn't stop in time, switching the lamps off anyway."
            );
            Ok(None)
        }
    }
}

/// Waits for the worker to return on its own, or winds it down on a signal.
async fn supervise<T>(
    shutdown: &CancelHandle,
    mut worker: JoinHandle<T>,
) -> Result<Option<T>, Box<dyn Error>> {
    tokio::select! {
        result = &mut worker => return Ok(Some(result?)),
        result = interrupted() => result?,
    }
    wind_down(shutdown, worker).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = jukebox::config::Jukebox::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {} => {
            let gpio = gpio::get_device(config.gpio())?;
            let output = audio::get_device(config.audio())?;
            let shutdown = CancelHandle::new();
            let mut jukebox = Jukebox::new(
                &config,
                gpio.clone(),
                output,
                Arc::new(SystemClock::new()),
                shutdown.clone(),
            )?;

            let worker = tokio::task::spawn_blocking(move || jukebox.run());
            let result = supervise(&shutdown, worker).await;
            gpio.release();
            result?;
        }
        Commands::Play { number } => {
            let gpio = gpio::get_device(config.gpio())?;
            let output = audio::get_device(config.audio())?;
            let shutdown = CancelHandle::new();
            let mut jukebox = Jukebox::new(
                &config,
                gpio.clone(),
                output,
                Arc::new(SystemClock::new()),
                shutdown.clone(),
            )?;

            let worker = tokio::task::spawn_blocking(move || jukebox.play_once(number));
            let result = supervise(&shutdown, worker).await;
            gpio.release();
            if let Some(result) = result? {
                println!("Track {}: {}", number, result);
            }
        }
        Commands::TestLights {
            top,
            left_right,
            bottom,
            all,
        } => {
            let selected: Vec<Lamp> = Lamp::ALL
                .into_iter()
                .filter(|lamp| match lamp {
                    Lamp::Top => top,
                    Lamp::LeftRight => left_right,
                    Lamp::Bottom => bottom,
                })
                .collect();
            let lamps = if all || selected.is_empty() {
                Lamp::ALL.to_vec()
            } else {
                selected
            };

            let gpio = gpio::get_device(config.gpio())?;
            for lamp in lamps.iter() {
                gpio.set_lamp(*lamp, true);
            }
            let names: Vec<String> = lamps.iter().map(|lamp| lamp.to_string()).collect();
            println!(
                "Lamps on: {}. Press Enter to switch them off.",
                names.join(", ")
            );

            // A stdin read can't be cancelled, so it mustn't be a task the runtime waits on.
            let (sender, receiver) = oneshot::channel();
            thread::spawn(move || {
                let mut line = String::new();
                let _ = sender.send(io::stdin().read_line(&mut line));
            });
            let enter = async {
                receiver.await??;
                Ok::<(), Box<dyn Error>>(())
            };
            let result = tokio::select! {
                result = enter => result,
                result = interrupted() => result,
            };
            gpio.release();
            result?;
        }
        Commands::TestKeypad {} => {
            let gpio = gpio::get_device(config.gpio())?;
            let clock = Arc::new(SystemClock::new());
            let shutdown = CancelHandle::new();
            let poll_interval = config.keypad().poll_interval()?;
            let keypad = Keypad::new(
                gpio.clone(),
                clock.clone(),
                config.keypad(),
                shutdown.clone(),
            )?;

            println!("Reading the keypad, Ctrl-C to stop.");
            let worker = {
                let shutdown = shutdown.clone();
                tokio::task::spawn_blocking(move || {
                    let mut last = None;
                    while !shutdown.is_cancelled() {
                        let vector = keypad.read_sampled();
                        if last != Some(vector) {
                            match KeySymbol::decode(vector) {
                                Some(key) => println!("{} {}", vector, key),
                                None => println!("{} -", vector),
                            }
                            last = Some(vector);
                        }
                        clock.sleep(poll_interval);
                    }
                })
            };

            let result = interrupted().await;
            let stopped = wind_down(&shutdown, worker).await;
            gpio.release();
            result?;
            stopped?;
        }
        Commands::Tracks {} => {
            let tracks = Tracks::new(config.songs_path()?);
            let list = tracks.list()?;

            if list.is_empty() {
                println!("No tracks found in {}.", tracks.dir().display());
                return Ok(());
            }

            println!("Tracks (count: {}):", list.len());
            for (number, path) in list.iter() {
                println!("- {}: {}", number, util::filename_display(path));
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
