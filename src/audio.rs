use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::mpsc::{self, Sender},
    thread,
};

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AudioRequest {
    pub path: PathBuf,
    pub volume: f32,
}

pub fn sound_path(sounds_dir: &Path, file: &str) -> PathBuf {
    sounds_dir.join(format!("{file}.ogg"))
}

pub trait SoundHandle {
    fn stop(&self);
    fn is_finished(&self) -> bool;
}

impl SoundHandle for Sink {
    fn stop(&self) {
        Sink::stop(self);
    }

    fn is_finished(&self) -> bool {
        self.empty()
    }
}

/// Holds at most one playing sound. Starting a new one always stops the
/// previous handle first; a failed start leaves the slot idle.
pub struct SoundSlot<H: SoundHandle> {
    current: Option<H>,
}

impl<H: SoundHandle> SoundSlot<H> {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn replace(&mut self, start: impl FnOnce() -> Result<H>) -> bool {
        if let Some(previous) = self.current.take() {
            previous.stop();
        }
        match start() {
            Ok(handle) => {
                self.current = Some(handle);
                true
            }
            Err(err) => {
                debug!(?err, "sound did not start; audio idle");
                false
            }
        }
    }

    pub fn reap_finished(&mut self) {
        if self
            .current
            .as_ref()
            .map(|sound| sound.is_finished())
            .unwrap_or(false)
        {
            self.current = None;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }
}

impl<H: SoundHandle> Default for SoundSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AudioPlayer {
    tx: Sender<AudioRequest>,
}

impl AudioPlayer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<AudioRequest>();
        thread::spawn(move || {
            let mut output = OutputStream::try_default().ok();
            if output.is_none() {
                warn!("audio output unavailable; hud sounds disabled until a device is available");
            }
            let mut slot: SoundSlot<Sink> = SoundSlot::new();

            while let Ok(req) = rx.recv() {
                slot.reap_finished();
                if output.is_none() {
                    output = OutputStream::try_default().ok();
                }
                let handle = output.as_ref().map(|(_, handle)| handle);
                slot.replace(|| start_sound(handle, &req));
                if slot.is_playing() {
                    debug!(path = %req.path.display(), volume = req.volume, "hud sound started");
                }
            }
        });
        Self { tx }
    }

    pub fn play(&self, req: AudioRequest) {
        let _ = self.tx.send(req);
    }
}

fn start_sound(handle: Option<&OutputStreamHandle>, req: &AudioRequest) -> Result<Sink> {
    let handle = handle.context("no audio output device")?;
    let file = File::open(&req.path)
        .with_context(|| format!("failed opening sound file {}", req.path.display()))?;
    let decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("failed decoding sound file {}", req.path.display()))?;
    let sink = Sink::try_new(handle).context("failed to create audio sink")?;
    sink.set_volume(req.volume.clamp(0.0, 1.0));
    sink.append(decoder);
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, path::Path, rc::Rc};

    use anyhow::anyhow;

    use super::{sound_path, SoundHandle, SoundSlot};

    struct FakeSound {
        stopped: Rc<Cell<bool>>,
        finished: Rc<Cell<bool>>,
    }

    impl SoundHandle for FakeSound {
        fn stop(&self) {
            self.stopped.set(true);
        }

        fn is_finished(&self) -> bool {
            self.finished.get()
        }
    }

    fn fake() -> (FakeSound, Rc<Cell<bool>>, Rc<Cell<bool>>) {
        let stopped = Rc::new(Cell::new(false));
        let finished = Rc::new(Cell::new(false));
        (
            FakeSound {
                stopped: stopped.clone(),
                finished: finished.clone(),
            },
            stopped,
            finished,
        )
    }

    #[test]
    fn new_sound_stops_previous_and_keeps_only_newest() {
        let mut slot = SoundSlot::new();
        let (first, first_stopped, _) = fake();
        let (second, second_stopped, _) = fake();

        assert!(slot.replace(|| Ok(first)));
        assert!(slot.is_playing());
        assert!(slot.replace(|| Ok(second)));

        assert!(first_stopped.get());
        assert!(!second_stopped.get());
        assert!(slot.is_playing());
    }

    #[test]
    fn failed_start_returns_to_idle() {
        let mut slot = SoundSlot::new();
        let (first, first_stopped, _) = fake();
        assert!(slot.replace(|| Ok(first)));

        assert!(!slot.replace(|| Err(anyhow!("autoplay blocked"))));
        assert!(first_stopped.get());
        assert!(!slot.is_playing());
    }

    #[test]
    fn finished_sound_is_reaped() {
        let mut slot = SoundSlot::new();
        let (sound, _, finished) = fake();
        slot.replace(|| Ok(sound));
        slot.reap_finished();
        assert!(slot.is_playing());
        finished.set(true);
        slot.reap_finished();
        assert!(!slot.is_playing());
    }

    #[test]
    fn default_slot_starts_idle() {
        let slot: SoundSlot<FakeSound> = SoundSlot::default();
        assert!(!slot.is_playing());
    }

    #[test]
    fn sound_path_appends_ogg_extension() {
        assert_eq!(
            sound_path(Path::new("../sounds"), "Upgrade"),
            Path::new("../sounds/Upgrade.ogg")
        );
    }
}
