//! Per-channel pose state
//!
//! The tracker remembers the last direction seen per channel and flags the
//! channel dirty when it changes, so the engine only reselects filters on
//! actual movement. All channels start dirty: the first block on any channel
//! installs a filter.

use bf_core::Pose;

use crate::{EngineError, EngineResult};

pub struct PoseTracker {
    last: Vec<Pose>,
    dirty: Vec<bool>,
}

impl PoseTracker {
    pub fn new(max_channels: usize) -> Self {
        Self {
            last: vec![Pose::default(); max_channels],
            dirty: vec![true; max_channels],
        }
    }

    /// Record the direction seen on `channel`, flagging it dirty if the
    /// direction changed.
    pub fn update(&mut self, channel: usize, azimuth: i32, elevation: i32) -> EngineResult<()> {
        self.check_channel(channel)?;
        if self.last[channel].coord() != (azimuth, elevation) {
            self.last[channel] = Pose::from_direction(azimuth, elevation);
            self.dirty[channel] = true;
        }
        Ok(())
    }

    /// Whether the channel needs a filter reselect.
    pub fn needs_update(&self, channel: usize) -> EngineResult<bool> {
        self.check_channel(channel)?;
        Ok(self.dirty[channel])
    }

    /// Take the channel's pose for filter selection, clearing the dirty
    /// flag.
    pub fn consume(&mut self, channel: usize) -> EngineResult<Pose> {
        self.check_channel(channel)?;
        self.dirty[channel] = false;
        Ok(self.last[channel])
    }

    fn check_channel(&self, channel: usize) -> EngineResult<()> {
        if channel >= self.last.len() {
            return Err(EngineError::ChannelOutOfRange {
                channel,
                max: self.last.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_start_dirty() {
        let tracker = PoseTracker::new(2);
        assert!(tracker.needs_update(0).unwrap());
        assert!(tracker.needs_update(1).unwrap());
    }

    #[test]
    fn test_consume_clears_until_direction_changes() {
        let mut tracker = PoseTracker::new(1);
        tracker.update(0, 30, 0).unwrap();
        let pose = tracker.consume(0).unwrap();
        assert_eq!(pose.coord(), (30, 0));
        assert!(!tracker.needs_update(0).unwrap());

        // Same direction again: still clean.
        tracker.update(0, 30, 0).unwrap();
        assert!(!tracker.needs_update(0).unwrap());

        // New direction: dirty again.
        tracker.update(0, 60, -10).unwrap();
        assert!(tracker.needs_update(0).unwrap());
        assert_eq!(tracker.consume(0).unwrap().coord(), (60, -10));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut tracker = PoseTracker::new(2);
        tracker.consume(0).unwrap();
        tracker.consume(1).unwrap();

        tracker.update(0, 90, 0).unwrap();
        assert!(tracker.needs_update(0).unwrap());
        assert!(!tracker.needs_update(1).unwrap());
    }

    #[test]
    fn test_out_of_range_channel_is_error() {
        let mut tracker = PoseTracker::new(2);
        assert!(matches!(
            tracker.update(2, 0, 0),
            Err(EngineError::ChannelOutOfRange { channel: 2, max: 2 })
        ));
        assert!(tracker.needs_update(5).is_err());
        assert!(tracker.consume(5).is_err());
    }
}
