//! New-alert notification.
//!
//! Notification is fire-and-forget: a failure is logged and never touches
//! alert state.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use stormwatch_config::SoundConfig;
use stormwatch_core::AlertRecord;
use thiserror::Error;
use tracing::debug;

/// Notification errors. Never fatal.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Playback failed: {reason}")]
    PlaybackFailed { reason: String },
}

/// Something that can announce a batch of new alerts.
pub trait Notifier: Send {
    /// Announce `batch`. Must return promptly; long work belongs in a child
    /// process or thread.
    fn notify(&self, batch: &[AlertRecord]) -> Result<(), NotificationError>;
}

/// Run a notifier and swallow its failure.
pub fn fire_and_forget(notifier: &dyn Notifier, batch: &[AlertRecord]) {
    if batch.is_empty() {
        return;
    }
    if let Err(e) = notifier.notify(batch) {
        debug!(error = %e, count = batch.len(), "new-alert notification failed");
    }
}

/// Pick a notifier for the configured sound settings.
///
/// Falls back to the terminal bell when the audio asset is missing.
pub fn notifier_from_config(sound: &SoundConfig) -> Box<dyn Notifier> {
    if !sound.enabled {
        return Box::new(NullNotifier);
    }
    if sound.asset.is_file() {
        Box::new(SoundNotifier::new(&sound.player, sound.asset.clone()))
    } else {
        debug!(asset = %sound.asset.display(), "sound asset missing, using terminal bell");
        Box::new(BellNotifier)
    }
}

/// Plays an audio file through an external player process.
#[derive(Debug, Clone)]
pub struct SoundNotifier {
    player: String,
    asset: PathBuf,
}

impl SoundNotifier {
    pub fn new(player: impl Into<String>, asset: PathBuf) -> Self {
        Self {
            player: player.into(),
            asset,
        }
    }
}

impl Notifier for SoundNotifier {
    fn notify(&self, batch: &[AlertRecord]) -> Result<(), NotificationError> {
        let mut child = Command::new(&self.player)
            .arg(&self.asset)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| NotificationError::PlaybackFailed {
                reason: format!("{}: {e}", self.player),
            })?;

        debug!(player = %self.player, count = batch.len(), "playing alert sound");

        // Reap the player so it does not linger as a zombie
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Rings the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn notify(&self, _batch: &[AlertRecord]) -> Result<(), NotificationError> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(b"\x07")
            .and_then(|_| stdout.flush())
            .map_err(|e| NotificationError::PlaybackFailed {
                reason: e.to_string(),
            })
    }
}

/// Does nothing. Used when sound is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _batch: &[AlertRecord]) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording(Arc<Mutex<Vec<usize>>>);

    impl Notifier for Recording {
        fn notify(&self, batch: &[AlertRecord]) -> Result<(), NotificationError> {
            self.0.lock().unwrap().push(batch.len());
            Ok(())
        }
    }

    #[test]
    fn test_fire_and_forget_skips_empty_batches() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let notifier = Recording(calls.clone());

        fire_and_forget(&notifier, &[]);
        fire_and_forget(&notifier, &[AlertRecord::new("A1", "Flood Watch")]);

        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_missing_player_is_playback_failure() {
        let notifier = SoundNotifier::new("stormwatch-no-such-player", PathBuf::from("bell.wav"));
        let err = notifier.notify(&[AlertRecord::new("A1", "Flood Watch")]).unwrap_err();
        assert!(matches!(err, NotificationError::PlaybackFailed { .. }));
        assert!(err.to_string().contains("stormwatch-no-such-player"));

        // And fire_and_forget swallows it
        fire_and_forget(&notifier, &[AlertRecord::new("A1", "Flood Watch")]);
    }

    #[test]
    fn test_disabled_sound_uses_null_notifier() {
        let sound = SoundConfig {
            enabled: false,
            ..Default::default()
        };
        let notifier = notifier_from_config(&sound);
        assert!(notifier.notify(&[AlertRecord::new("A1", "Flood Watch")]).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_asset_is_played() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("bell.wav");
        std::fs::write(&asset, b"RIFF").unwrap();

        let sound = SoundConfig {
            enabled: true,
            player: "true".to_string(),
            asset,
        };
        let notifier = notifier_from_config(&sound);
        assert!(notifier.notify(&[AlertRecord::new("A1", "Flood Watch")]).is_ok());
    }
}
