//! Traits and types for HID message reporting.

use usbd_hid::descriptor::{AsInputReport, BufferOverflow, MediaKeyboardReport};

use crate::descriptor::KeyboardReport;

/// Reports sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Normal keyboard hid report
    KeyboardReport(KeyboardReport),
    /// Media keyboard report
    MediaKeyboardReport(MediaKeyboardReport),
}

impl AsInputReport for Report {
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize, BufferOverflow> {
        match self {
            Report::KeyboardReport(report) => report.serialize(buffer),
            Report::MediaKeyboardReport(report) => report.serialize(buffer),
        }
    }
}

/// HidReporter is the outbound side of the pipeline: USB, BLE, or a test recorder.
///
/// It is called synchronously from the pipeline whenever the composite report changes,
/// implementations that talk to real hardware should only enqueue.
pub trait HidReporter {
    fn send_report(&mut self, report: Report);
}

impl<T: HidReporter + ?Sized> HidReporter for &mut T {
    fn send_report(&mut self, report: Report) {
        (**self).send_report(report)
    }
}
