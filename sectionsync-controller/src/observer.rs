//! Change notifications for consumers of a results controller.

use crate::error::ControllerError;
use sectionsync_results::ChangeSet;

/// Receives a results controller's notifications.
///
/// Every method defaults to doing nothing. Notifications run on the task that
/// drives [`ResultsController::next_update`](crate::ResultsController::next_update).
pub trait ResultsObserver<R>: Send + Sync {
    /// The content is about to change.
    ///
    /// Always followed by exactly one `did_change_content`, including when
    /// the fetch that announced the change is superseded or rejected before
    /// it delivers.
    fn will_change_content(&self) {}

    /// The snapshot was replaced; `changes` transforms the old one into the
    /// new one.
    fn did_change_results(&self, _changes: &ChangeSet<R>) {}

    /// The content change announced by `will_change_content` is complete.
    fn did_change_content(&self) {}

    /// The current query failed. The snapshot is unchanged.
    fn did_fail(&self, _error: &ControllerError) {}
}
