//! Strict-decrease change detector for a single monitored scalar.

/// Produced when the monitored value drops below the previous sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropEvent {
    pub previous: f64,
    pub current: f64,
}

/// Holds the last-observed sample of the monitored metric. One instance
/// exists process-wide (the monitored location is fixed); it is owned by
/// the water watch task, which serializes all `observe` calls.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: Option<f64>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge trigger on strict decrease:
    /// - absent sample: no event, baseline untouched;
    /// - first defined sample: establishes the baseline, never fires;
    /// - `current < previous`: fires, then baseline moves to `current`;
    /// - `current >= previous`: no event, baseline moves to `current`.
    pub fn observe(&mut self, current: Option<f64>) -> Option<DropEvent> {
        let current = current?;
        match self.previous {
            None => {
                self.previous = Some(current);
                None
            }
            Some(previous) => {
                self.previous = Some(current);
                if current < previous {
                    Some(DropEvent { previous, current })
                } else {
                    None
                }
            }
        }
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }
}
