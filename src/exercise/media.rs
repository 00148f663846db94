//! Checkpointed media playback controller.
//!
//! Drives a black-box playable element (current time, duration,
//! play/pause/seek, ended notification) through authored checkpoints:
//! playback pauses at each checkpoint timestamp and the embedded
//! exercise is presented until the learner explicitly continues.
//! Completion requires reaching the end of playback AND having
//! completed every checkpoint this session; seeking past one does not
//! count.

/// Time update events within this window after a checkpoint timestamp
/// trigger it.
pub const CHECKPOINT_WINDOW_SECS: f64 = 1.0;

/// Rewind distance for replay when there is no usable previous
/// checkpoint target.
pub const REPLAY_FALLBACK_SECS: f64 = 5.0;

/// Playback phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPhase {
    Playing,
    Paused,
    /// Paused at the checkpoint with this index; its exercise is shown.
    AtCheckpoint(usize),
    Ended,
}

/// Instruction for the underlying media element. The controller never
/// touches the element itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    Play,
    Pause,
    Seek(f64),
}

#[derive(Debug, Clone)]
struct Checkpoint {
    time: f64,
    completed: bool,
}

/// State machine over checkpoint timestamps. The embedded exercise
/// content stays with the caller, keyed by checkpoint index.
#[derive(Debug, Clone)]
pub struct MediaController {
    checkpoints: Vec<Checkpoint>,
    phase: MediaPhase,
    position: f64,
    /// Scrub position while a seek drag is in progress; suppresses
    /// display updates from time events until the drag ends.
    scrub: Option<f64>,
}

impl MediaController {
    /// Checkpoints are sorted ascending at construction regardless of
    /// authored order.
    pub fn new(checkpoint_times: &[f64]) -> Self {
        let mut times: Vec<f64> = checkpoint_times.to_vec();
        times.sort_by(|a, b| a.total_cmp(b));
        Self {
            checkpoints: times
                .into_iter()
                .map(|time| Checkpoint {
                    time,
                    completed: false,
                })
                .collect(),
            phase: MediaPhase::Paused,
            position: 0.0,
            scrub: None,
        }
    }

    pub fn phase(&self) -> MediaPhase {
        self.phase
    }

    /// Position to render on the seek bar: the in-progress scrub value
    /// wins over the real playback position.
    pub fn displayed_position(&self) -> f64 {
        self.scrub.unwrap_or(self.position)
    }

    pub fn checkpoint_completed(&self, index: usize) -> bool {
        self.checkpoints.get(index).is_some_and(|c| c.completed)
    }

    pub fn play(&mut self) -> Option<MediaCommand> {
        match self.phase {
            MediaPhase::Paused => {
                self.phase = MediaPhase::Playing;
                Some(MediaCommand::Play)
            }
            // Leaving a checkpoint requires an explicit continue.
            _ => None,
        }
    }

    pub fn pause(&mut self) -> Option<MediaCommand> {
        match self.phase {
            MediaPhase::Playing => {
                self.phase = MediaPhase::Paused;
                Some(MediaCommand::Pause)
            }
            _ => None,
        }
    }

    /// Playback time update from the media element.
    ///
    /// Entering `[time, time + window)` of an uncompleted checkpoint
    /// while playing pauses immediately and surfaces that checkpoint.
    pub fn time_update(&mut self, position: f64) -> Option<MediaCommand> {
        self.position = position;
        if self.phase != MediaPhase::Playing || self.scrub.is_some() {
            return None;
        }
        let hit = self.checkpoints.iter().position(|c| {
            !c.completed && position >= c.time && position < c.time + CHECKPOINT_WINDOW_SECS
        })?;
        self.phase = MediaPhase::AtCheckpoint(hit);
        Some(MediaCommand::Pause)
    }

    /// Explicit "Continue" from the checkpoint's exercise: marks it
    /// completed for this session and resumes playback.
    pub fn continue_playback(&mut self) -> Option<MediaCommand> {
        let MediaPhase::AtCheckpoint(index) = self.phase else {
            return None;
        };
        if let Some(checkpoint) = self.checkpoints.get_mut(index) {
            checkpoint.completed = true;
        }
        self.phase = MediaPhase::Playing;
        Some(MediaCommand::Play)
    }

    /// Rewind to re-hear the context before the active checkpoint, then
    /// resume playback without marking it completed.
    ///
    /// Target is just after the previous checkpoint's window; when there
    /// is no previous checkpoint, or that target would overshoot the
    /// active one, fall back to a fixed rewind clamped at zero.
    pub fn replay(&mut self) -> Option<(MediaCommand, MediaCommand)> {
        let MediaPhase::AtCheckpoint(index) = self.phase else {
            return None;
        };
        let current_time = self.checkpoints.get(index)?.time;
        let target = match index.checked_sub(1).and_then(|i| self.checkpoints.get(i)) {
            Some(prev) if prev.time + CHECKPOINT_WINDOW_SECS < current_time => {
                prev.time + CHECKPOINT_WINDOW_SECS
            }
            _ => (current_time - REPLAY_FALLBACK_SECS).max(0.0),
        };
        self.position = target;
        self.phase = MediaPhase::Playing;
        Some((MediaCommand::Seek(target), MediaCommand::Play))
    }

    /// End-of-playback notification.
    pub fn playback_ended(&mut self) {
        self.phase = MediaPhase::Ended;
    }

    /// The seek drag started; time updates no longer move the displayed
    /// position.
    pub fn begin_seek(&mut self) {
        self.scrub = Some(self.displayed_position());
    }

    pub fn update_seek(&mut self, position: f64) {
        if self.scrub.is_some() {
            self.scrub = Some(position);
        }
    }

    /// The drag ended; the dragged value becomes the authoritative
    /// media position.
    pub fn end_seek(&mut self) -> Option<MediaCommand> {
        let target = self.scrub.take()?;
        self.position = target;
        if self.phase == MediaPhase::Ended {
            self.phase = MediaPhase::Paused;
        }
        Some(MediaCommand::Seek(target))
    }

    /// Ended AND every checkpoint completed this session. Seeking past
    /// a checkpoint leaves it incomplete.
    pub fn is_complete(&self) -> bool {
        self.phase == MediaPhase::Ended && self.checkpoints.iter().all(|c| c.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> MediaController {
        MediaController::new(&[10.0, 30.0])
    }

    #[test]
    fn test_checkpoints_sorted_at_mount() {
        let mut c = MediaController::new(&[30.0, 10.0]);
        c.play();
        assert_eq!(c.time_update(10.2), Some(MediaCommand::Pause));
        assert_eq!(c.phase(), MediaPhase::AtCheckpoint(0));
    }

    #[test]
    fn test_pause_fires_within_window_only() {
        let mut c = controller();
        c.play();
        assert_eq!(c.time_update(9.9), None);
        assert_eq!(c.time_update(10.0), Some(MediaCommand::Pause));
        assert_eq!(c.phase(), MediaPhase::AtCheckpoint(0));
        // Paused at the checkpoint: further updates change nothing.
        assert_eq!(c.time_update(10.5), None);
    }

    #[test]
    fn test_update_past_window_does_not_fire() {
        let mut c = controller();
        c.play();
        // 11.0 is outside [10.0, 11.0).
        assert_eq!(c.time_update(11.0), None);
        assert_eq!(c.phase(), MediaPhase::Playing);
    }

    #[test]
    fn test_continue_marks_completed_and_resumes() {
        let mut c = controller();
        c.play();
        c.time_update(10.1);
        assert_eq!(c.continue_playback(), Some(MediaCommand::Play));
        assert!(c.checkpoint_completed(0));
        assert_eq!(c.phase(), MediaPhase::Playing);
        // Completed checkpoint does not re-fire.
        assert_eq!(c.time_update(10.3), None);
    }

    #[test]
    fn test_play_does_not_leave_checkpoint() {
        let mut c = controller();
        c.play();
        c.time_update(10.1);
        assert_eq!(c.play(), None);
        assert_eq!(c.phase(), MediaPhase::AtCheckpoint(0));
    }

    #[test]
    fn test_replay_targets_previous_checkpoint_window() {
        let mut c = controller();
        c.play();
        c.time_update(10.1);
        c.continue_playback();
        c.time_update(30.2);
        assert_eq!(c.phase(), MediaPhase::AtCheckpoint(1));
        let (seek, play) = c.replay().unwrap();
        assert_eq!(seek, MediaCommand::Seek(11.0));
        assert_eq!(play, MediaCommand::Play);
        assert_eq!(c.phase(), MediaPhase::Playing);
        // Not marked completed: it fires again.
        assert_eq!(c.time_update(30.4), Some(MediaCommand::Pause));
    }

    #[test]
    fn test_replay_fallback_without_previous_checkpoint() {
        let mut c = controller();
        c.play();
        c.time_update(10.1);
        let (seek, _) = c.replay().unwrap();
        assert_eq!(seek, MediaCommand::Seek(5.0));
    }

    #[test]
    fn test_replay_fallback_clamped_at_zero() {
        let mut c = MediaController::new(&[3.0]);
        c.play();
        c.time_update(3.1);
        let (seek, _) = c.replay().unwrap();
        assert_eq!(seek, MediaCommand::Seek(0.0));
    }

    #[test]
    fn test_replay_fallback_when_previous_window_overshoots() {
        // Second checkpoint starts inside the first one's window.
        let mut c = MediaController::new(&[10.0, 10.5]);
        c.play();
        c.time_update(10.0);
        c.continue_playback();
        c.time_update(10.6);
        assert_eq!(c.phase(), MediaPhase::AtCheckpoint(1));
        let (seek, _) = c.replay().unwrap();
        assert_eq!(seek, MediaCommand::Seek(5.5));
    }

    #[test]
    fn test_ended_without_all_checkpoints_not_complete() {
        let mut c = controller();
        c.play();
        c.time_update(10.1);
        c.continue_playback();
        // Learner seeks past the second checkpoint.
        c.begin_seek();
        c.update_seek(34.0);
        c.end_seek();
        c.playback_ended();
        assert_eq!(c.phase(), MediaPhase::Ended);
        assert!(!c.is_complete());
    }

    #[test]
    fn test_complete_requires_end_and_all_checkpoints() {
        let mut c = controller();
        c.play();
        c.time_update(10.1);
        c.continue_playback();
        c.time_update(30.1);
        c.continue_playback();
        assert!(!c.is_complete());
        c.playback_ended();
        assert!(c.is_complete());
    }

    #[test]
    fn test_scrub_suppresses_time_updates() {
        let mut c = controller();
        c.play();
        c.time_update(5.0);
        c.begin_seek();
        c.update_seek(20.0);
        // Incoming time events keep flowing but don't move the display.
        c.time_update(6.0);
        assert_eq!(c.displayed_position(), 20.0);
        assert_eq!(c.end_seek(), Some(MediaCommand::Seek(20.0)));
        assert_eq!(c.displayed_position(), 20.0);
    }
}
