/// Progress percentages at which the host celebrates
pub const MILESTONES: [u8; 3] = [25, 50, 75];

/// Reports each progress milestone once per session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilestoneTracker {
    last: u8,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest milestone newly reached at `progress` percent, if any. Only
    /// one milestone is reported per call, a jump past several reports the
    /// rest on later calls.
    pub fn check(&mut self, progress: f64) -> Option<u8> {
        let reached = MILESTONES
            .iter()
            .copied()
            .find(|&m| progress >= f64::from(m) && self.last < m)?;
        self.last = reached;
        Some(reached)
    }

    pub fn last_reached(&self) -> Option<u8> {
        (self.last > 0).then_some(self.last)
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}
