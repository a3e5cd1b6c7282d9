//! Status reconciliation pass run once after ingest.

use tracing::debug;

use crate::models::{Dataset, TaskStatus};

/// Reclassify every `To Do` task that already has logged hours as
/// `In Progress`. No other field is touched.
///
/// Returns the number of tasks that changed. Running it again on the same
/// dataset changes nothing and returns `0`.
pub fn normalize(dataset: &mut Dataset) -> usize {
    let mut reclassified = 0;

    for sprint in dataset.sprints.iter_mut() {
        for task in sprint.tasks.iter_mut() {
            if task.status == TaskStatus::ToDo && task.actual_hours > 0.0 {
                task.status = TaskStatus::InProgress;
                reclassified += 1;
            }
        }
    }

    debug!("normalize: reclassified {} task(s) as In Progress", reclassified);
    reclassified
}
