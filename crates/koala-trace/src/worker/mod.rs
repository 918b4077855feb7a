//! Background workers that keep view building and scanning off the event path.

mod scan;
mod view;

pub use scan::{ScanResult, ScanTicket, ScanWorker};
pub use view::{ViewFrame, ViewWorker};
