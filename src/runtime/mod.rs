use std::io::{self, Write};

use clap::Parser;
use tracing::{debug, warn};

use crate::app::App;
use crate::audio::{PlaybackEngine, PlaybackEvent};
use crate::config;
use crate::import::{ImportGateway, TrackMetadata};
use crate::library::{
    BlobStore, FileStore, LibraryStore, TrackChange, format_duration, format_optional_duration,
    track_label,
};

mod cli;
mod commands;
mod logging;
mod settings;

pub use cli::{Cli, Command, FolderCommand, TagField};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (settings, problem) = settings::load_settings();
    logging::init(&settings.logging);
    if let Some(msg) = problem {
        warn!("{msg}");
    }

    let data_dir = settings
        .data_dir()
        .ok_or("cannot determine a data directory; set storage.data_dir")?;
    let library = LibraryStore::load(FileStore::new(data_dir));
    debug!(dir = %library.storage().dir().display(), "using library storage");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &settings, library, &mut out)
}

/// Run one command against `library`.
pub fn execute<S: BlobStore>(
    command: Command,
    settings: &config::Settings,
    mut library: LibraryStore<S>,
    out: &mut impl Write,
) -> commands::CmdResult {
    match command {
        Command::Import {
            paths,
            folder,
            artist,
            album,
        } => {
            let gateway = ImportGateway::new(settings.import.clone());
            let known = TrackMetadata {
                artist,
                album,
                duration_secs: None,
            };
            commands::import(&mut library, &gateway, &paths, folder.as_deref(), known, out)
        }
        Command::List { folder } => commands::list(&library, folder.as_deref(), out),
        Command::Folders => commands::folders(&library, out),
        Command::Folder(cmd) => commands::folder(&mut library, cmd, out),
        Command::File { track, folder } => commands::file(&mut library, &track, &folder, out),
        Command::Rm { track } => commands::remove(&mut library, &track, out),
        Command::Clear { yes } => commands::clear(&mut library, yes, out),
        Command::Tag {
            track,
            field,
            value,
        } => commands::tag(&mut library, &track, field, &value, out),
        Command::Play { track, from } => play(library, settings, &track, from, out),
        Command::Config => {
            writeln!(out, "{}", toml::to_string_pretty(settings)?)?;
            Ok(())
        }
    }
}

/// Play until the track (and, with auto-advance, its folder) runs out.
fn play<S: BlobStore>(
    mut library: LibraryStore<S>,
    settings: &config::Settings,
    key: &str,
    from: Option<f64>,
    out: &mut impl Write,
) -> commands::CmdResult {
    let id = commands::find_track(&library, key)?;
    if let Some(from) = from {
        library.update(id, TrackChange::Position(from));
    }

    let engine = PlaybackEngine::new(&settings.playback)?;
    let mut app = App::new(library, engine, settings.playback.clone());
    app.play_track(id)?;

    while app.now_playing().is_some() {
        for event in app.wait_events(settings.playback.tick_interval()) {
            match event {
                PlaybackEvent::Started {
                    position_secs,
                    duration_secs,
                    ..
                } => {
                    if let Some(track) = app.now_playing() {
                        writeln!(out)?;
                        writeln!(
                            out,
                            "> {}  ({} / {})",
                            track_label(track),
                            format_duration(position_secs),
                            format_optional_duration(duration_secs)
                        )?;
                    }
                }
                PlaybackEvent::Tick { position_secs, .. } => {
                    let duration = app.engine().duration();
                    write!(
                        out,
                        "\r  {} / {}",
                        format_duration(position_secs),
                        format_optional_duration(duration)
                    )?;
                    out.flush()?;
                }
                PlaybackEvent::Finished { .. } => writeln!(out, "\r  done")?,
                _ => {}
            }
        }
    }
    writeln!(out)?;
    Ok(())
}
