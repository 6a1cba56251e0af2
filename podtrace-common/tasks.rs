use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const ABORT_AFTER: Duration = Duration::from_millis(50);
const GIVE_UP_AFTER: Duration = Duration::from_millis(100);

/// Synchronously waits for a background task to end (e.g. after cancellation).\
/// The task is aborted if it does not finish within [`ABORT_AFTER`].
pub fn wait_for_task<T>(task: Option<JoinHandle<T>>, task_name: &str) {
    let Some(task) = task else {
        return;
    };

    let start = Instant::now();
    while !task.is_finished() {
        std::thread::sleep(Duration::from_millis(1));

        if start.elapsed() >= ABORT_AFTER {
            task.abort();
        }

        if start.elapsed() >= GIVE_UP_AFTER {
            tracing::error!("Failed to abort {task_name} task in 100 milliseconds for an unknown reason.");
            break;
        }
    }
}
