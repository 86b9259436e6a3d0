use super::*;
use crate::audio::testing::FakeBackend;
use crate::audio::{PlaybackEngine, PlaybackState};
use crate::config::PlaybackSettings;
use crate::error::{PlayError, TransportError};
use crate::library::{
    BlobStore, LibraryStore, MAX_POSITION_SECS, MemoryStore, Track, TrackChange, TrackId,
};
use std::path::Path;
use std::time::{Duration, Instant};

fn settings() -> PlaybackSettings {
    PlaybackSettings {
        tick_interval_ms: 20,
        finish_poll_ms: 5,
        ..PlaybackSettings::default()
    }
}

fn app_with(backend: &FakeBackend, settings: PlaybackSettings) -> App<MemoryStore> {
    let backend = backend.clone();
    let engine = PlaybackEngine::with_backend(move || backend, &settings).unwrap();
    App::new(LibraryStore::load(MemoryStore::new()), engine, settings)
}

fn add(app: &mut App<MemoryStore>, location: &str) -> TrackId {
    let track = Track::new(location, Some(120.0));
    let id = track.id();
    assert!(app.library_mut().add(track));
    id
}

fn saved(app: &App<MemoryStore>, id: TrackId) -> f64 {
    app.library().track(id).unwrap().position_secs()
}

fn pump_until<S: BlobStore>(app: &mut App<S>, mut done: impl FnMut(&App<S>) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        app.wait_events(Duration::from_millis(20));
        if done(app) {
            return true;
        }
    }
    false
}

#[test]
fn play_track_starts_from_saved_position() {
    let backend = FakeBackend::default().with("/a.mp3", Some(120));
    let mut app = app_with(&backend, settings());
    let a = add(&mut app, "/a.mp3");
    app.library_mut().update(a, TrackChange::Position(30.0));

    app.play_track(a).unwrap();

    assert_eq!(app.now_playing().map(Track::id), Some(a));
    assert_eq!(app.engine().position(), 30.0);
    assert_eq!(
        backend.track("/a.mp3").lock().unwrap().position,
        Duration::from_secs(30)
    );
}

#[test]
fn play_track_can_ignore_saved_position() {
    let backend = FakeBackend::default().with("/a.mp3", Some(120));
    let mut app = app_with(
        &backend,
        PlaybackSettings {
            resume_from_saved_position: false,
            ..settings()
        },
    );
    let a = add(&mut app, "/a.mp3");
    app.library_mut().update(a, TrackChange::Position(30.0));

    app.play_track(a).unwrap();
    assert_eq!(app.engine().position(), 0.0);
}

#[test]
fn play_unknown_or_missing_track_fails() {
    let backend = FakeBackend::default();
    let mut app = app_with(&backend, settings());

    let ghost = TrackId::new();
    assert!(matches!(
        app.play_track(ghost),
        Err(PlayError::UnknownTrack(id)) if id == ghost
    ));

    let a = add(&mut app, "/gone.mp3");
    assert!(matches!(
        app.play_track(a),
        Err(PlayError::Transport(TransportError::NotFound(_)))
    ));
    assert!(app.now_playing().is_none());
    assert_eq!(app.engine().state(), PlaybackState::Idle);
}

#[test]
fn ticks_are_folded_into_the_saved_position() {
    let backend = FakeBackend::default().with("/a.mp3", Some(120));
    let mut app = app_with(&backend, settings());
    let a = add(&mut app, "/a.mp3");

    app.play_track(a).unwrap();
    backend.track("/a.mp3").lock().unwrap().position = Duration::from_secs(50);

    assert!(pump_until(&mut app, |app| app
        .library()
        .track(a)
        .is_some_and(|t| t.position_secs() == 50.0)));
}

#[test]
fn seek_pause_and_stop_record_the_position() {
    let backend = FakeBackend::default().with("/a.mp3", Some(120));
    let mut app = app_with(&backend, settings());
    let a = add(&mut app, "/a.mp3");

    app.play_track(a).unwrap();
    assert_eq!(app.seek(200.0), Some(120.0));
    assert_eq!(saved(&app, a), 120.0);

    app.seek(70.0);
    assert!(app.pause());
    assert_eq!(saved(&app, a), 70.0);
    assert!(!app.pause());

    assert!(app.resume());
    backend.track("/a.mp3").lock().unwrap().position = Duration::from_secs(80);
    assert_eq!(app.stop(), Some(80.0));
    assert_eq!(saved(&app, a), 80.0);
    assert!(app.now_playing().is_none());

    // A later tick for the closed transport must not move the position.
    app.pump_events();
    assert_eq!(saved(&app, a), 80.0);
    assert_eq!(app.stop(), None);
}

#[test]
fn switching_tracks_keeps_the_previous_position() {
    let backend = FakeBackend::default()
        .with("/a.mp3", Some(120))
        .with("/b.mp3", Some(120));
    let mut app = app_with(&backend, settings());
    let a = add(&mut app, "/a.mp3");
    let b = add(&mut app, "/b.mp3");

    app.play_track(a).unwrap();
    backend.track("/a.mp3").lock().unwrap().position = Duration::from_secs(40);
    app.play_track(b).unwrap();

    assert_eq!(saved(&app, a), 40.0);
    assert_eq!(app.now_playing().map(Track::id), Some(b));
    app.wait_events(Duration::from_millis(50));
    assert_eq!(app.now_playing().map(Track::id), Some(b));
}

#[test]
fn replaying_the_same_track_stays_current() {
    let backend = FakeBackend::default().with("/a.mp3", Some(120));
    let mut app = app_with(&backend, settings());
    let a = add(&mut app, "/a.mp3");

    app.play_track(a).unwrap();
    app.play_track(a).unwrap();
    app.wait_events(Duration::from_millis(50));

    assert_eq!(app.now_playing().map(Track::id), Some(a));
    assert_eq!(backend.live().len(), 1);
}

#[test]
fn finishing_resets_position_and_advances_within_the_folder() {
    let backend = FakeBackend::default()
        .with("/a.mp3", Some(120))
        .with("/b.mp3", Some(120))
        .with("/c.mp3", Some(120));
    let mut app = app_with(&backend, settings());
    let folder = app.library_mut().add_folder("Course");
    let a = add(&mut app, "/a.mp3");
    let c = add(&mut app, "/c.mp3");
    let b = add(&mut app, "/b.mp3");
    app.library_mut().update(a, TrackChange::Folder(Some(folder)));
    app.library_mut().update(b, TrackChange::Folder(Some(folder)));
    app.library_mut().update(a, TrackChange::Position(30.0));

    app.play_track(a).unwrap();
    backend.track("/a.mp3").lock().unwrap().finished = true;

    assert!(pump_until(&mut app, |app| app
        .now_playing()
        .is_some_and(|t| t.id() == b)));
    assert_eq!(saved(&app, a), 0.0);
    assert_eq!(
        app.engine().location().as_deref(),
        Some(Path::new("/b.mp3"))
    );
    assert_eq!(saved(&app, c), 0.0);

    // b is the last track of the folder.
    backend.track("/b.mp3").lock().unwrap().finished = true;
    assert!(pump_until(&mut app, |app| app.now_playing().is_none()));
    assert_eq!(app.engine().state(), PlaybackState::Idle);
}

#[test]
fn finishing_without_auto_advance_goes_idle() {
    let backend = FakeBackend::default()
        .with("/a.mp3", Some(120))
        .with("/b.mp3", Some(120));
    let mut app = app_with(
        &backend,
        PlaybackSettings {
            auto_advance: false,
            ..settings()
        },
    );
    let a = add(&mut app, "/a.mp3");
    add(&mut app, "/b.mp3");

    app.play_track(a).unwrap();
    backend.track("/a.mp3").lock().unwrap().finished = true;

    assert!(pump_until(&mut app, |app| app.now_playing().is_none()));
    assert_eq!(app.engine().state(), PlaybackState::Idle);
    assert_eq!(backend.opened().len(), 1);
}

#[test]
fn huge_saved_position_on_unknown_duration_still_plays() {
    let backend = FakeBackend::default().with("/stream.mp3", None);
    let mut app = app_with(&backend, settings());
    let track = Track::new("/stream.mp3", None);
    let id = track.id();
    app.library_mut().add(track);
    app.library_mut().update(id, TrackChange::Position(1e300));

    app.play_track(id).unwrap();
    assert_eq!(app.engine().position(), MAX_POSITION_SECS);
    assert_eq!(app.seek(1e300), Some(MAX_POSITION_SECS));

    assert_eq!(app.seek(10.0), Some(10.0));
    app.play_track(id).unwrap();
    assert_eq!(app.engine().state(), PlaybackState::Playing);
    assert_eq!(app.engine().position(), 10.0);
}
