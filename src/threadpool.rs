use log::{debug, error};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

/// Fixed-size pool of worker threads serving connections, joining all threads on drop.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `size` threads.
    ///
    /// 'size' must be greater than 0.
    pub fn new(size: usize) -> ThreadPool {
        assert!(size > 0, "ThreadPool size must be greater than 0");

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::new(id, Arc::clone(&receiver)))
            .collect();

        ThreadPool {
            workers,
            sender: Some(sender),
        }
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task to run on the threadpool when a worker is available.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = self
            .sender
            .as_ref()
            .map(|sender| sender.send(Box::new(f)).is_ok())
            .unwrap_or(false);
        if !sent {
            error!("Thread pool is shut down, dropping job");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(thread) = worker.handle.take() {
                if thread.join().is_err() {
                    error!("Worker {} panicked", worker.id);
                }
            }
        }
    }
}

/// Type of jobs to be executed by the threadpool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker struct, holding a thread handle.
struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create a new worker that will execute jobs from the given receiver until this one is closed.
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Worker {
        let handle = thread::Builder::new()
            .name(format!("tipjar-worker-{}", id))
            .spawn(move || loop {
                // A poisoned lock only means another worker panicked while waiting
                let message = match receiver.lock() {
                    Ok(receiver) => receiver.recv(),
                    Err(poisoned) => poisoned.into_inner().recv(),
                };
                match message {
                    Ok(job) => {
                        // A panicking job must not take the worker down with it
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!("Worker {} recovered from a panicking job", id);
                        }
                    }
                    Err(_) => {
                        debug!("Worker {} shutting down", id);
                        break;
                    }
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("Failed to spawn worker {}: {}", id, err);
                None
            }
        };
        Worker { id, handle }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_threadpool_runs_every_job() {
        let pool = ThreadPool::new(4);
        assert_eq!(pool.size(), 4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        // Dropping the pool waits for the queue to drain
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = ThreadPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.execute(|| panic!("job failed"));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    #[should_panic(expected = "ThreadPool size must be greater than 0")]
    fn test_empty_threadpool() {
        ThreadPool::new(0);
    }
}
