//! Event recorder (C4) and stream broker (C5): the append-only structured
//! event log, its on-disk snapshot, and the live SSE fan-out.

mod broker;
mod recorder;

pub use broker::{EventBroker, Frame, Subscriber};
pub use recorder::EventRecorder;
