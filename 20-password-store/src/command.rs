use tokio::{sync::oneshot, time::Instant};

use crate::store::{RecordId, Stats};

/// Requests processed one at a time by the store actor.
///
/// Queries carry a one-shot channel for the reply. `CommitValue` has none and
/// is only ever produced by the delayed commit pipeline.
#[derive(Debug)]
pub(crate) enum Command {
    ReadValue {
        id: RecordId,
        respond_to: oneshot::Sender<Option<String>>,
    },
    ReserveIdentifier {
        respond_to: oneshot::Sender<RecordId>,
    },
    CommitValue {
        id: RecordId,
        value: String,
        started: Instant,
    },
    ReadStats {
        respond_to: oneshot::Sender<Stats>,
    },
}
