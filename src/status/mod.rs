pub mod poller;
pub mod types;

pub use poller::{spawn_poll, PollSchedule, PollerHandle};
pub use types::{
    ActivityEntry, ActivityHistory, FileList, HealthReport, RecordKind, RemoteFileRecord,
    SubStatus, SystemStatus,
};
