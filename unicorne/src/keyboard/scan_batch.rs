use embassy_time::Instant;
use heapless::Vec;

use crate::event::KeyPos;

pub(crate) const SCAN_BATCH_SIZE: usize = 16;

/// One matrix edge of a scan
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScanEdge {
    pub(crate) pos: KeyPos,
    pub(crate) pressed: bool,
    /// Arrival order inside the scan
    pub(crate) seq: u8,
}

pub(crate) type ScanEdges = Vec<ScanEdge, SCAN_BATCH_SIZE>;

/// Matrix edges reported with the same timestamp.
///
/// They belong to one scan of the matrix, so the order they were reported in carries no meaning.
#[derive(Debug, Default)]
pub(crate) struct ScanBatch {
    time: Option<Instant>,
    edges: ScanEdges,
}

impl ScanBatch {
    pub(crate) fn new() -> Self {
        Self {
            time: None,
            edges: Vec::new(),
        }
    }

    pub(crate) fn time(&self) -> Option<Instant> {
        self.time
    }

    pub(crate) fn is_full(&self) -> bool {
        self.edges.is_full()
    }

    /// Add an edge of the scan at `time`. The batch must be empty or already at `time`.
    pub(crate) fn push(&mut self, time: Instant, pos: KeyPos, pressed: bool) -> Result<(), ScanEdge> {
        let edge = ScanEdge {
            pos,
            pressed,
            seq: self.edges.len() as u8,
        };
        self.edges.push(edge)?;
        self.time = Some(time);
        Ok(())
    }

    pub(crate) fn take(&mut self) -> Option<(Instant, ScanEdges)> {
        let time = self.time.take()?;
        Some((time, core::mem::take(&mut self.edges)))
    }

    pub(crate) fn clear(&mut self) {
        self.time = None;
        self.edges.clear();
    }
}
