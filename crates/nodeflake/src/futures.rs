use core::{future::Future, time::Duration};

use crate::{
    error::Result,
    generator::{Generator, IdGenStatus},
    id::SnowflakeId,
    time::TimeSource,
};

/// A trait that abstracts over how to wait out an exhausted tick in async
/// contexts.
pub trait SleepProvider {
    /// The returned future is `Send` so generator futures can move across
    /// worker threads.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for [`Generator::next_id_async`].
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    async fn sleep_for(dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// An implementation of [`SleepProvider`] using Tokio's yield.
///
/// Skips the timer and hands control straight back to the scheduler. The
/// task is polled again sooner, at the cost of a tighter polling loop while a
/// tick stays exhausted.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    async fn sleep_for(_dur: Duration) {
        tokio::task::yield_now().await;
    }
}

impl<T> Generator<T>
where
    T: TimeSource,
{
    /// Generates the next ID, awaiting [`TokioSleep`] instead of blocking the
    /// thread while the current tick is exhausted.
    ///
    /// # Errors
    ///
    /// Same as [`Generator::next_id`].
    ///
    /// # Example
    /// ```
    /// use nodeflake::{Generator, MonotonicClock};
    ///
    /// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
    /// let generator = Generator::new(5, MonotonicClock::default());
    /// let id = generator.next_id_async().await.unwrap();
    /// assert_eq!(id.node_id(), 5);
    /// # });
    /// ```
    pub async fn next_id_async(&self) -> Result<SnowflakeId> {
        self.next_id_async_with::<TokioSleep>().await
    }

    /// Like [`Self::next_id_async`], with a caller-chosen [`SleepProvider`].
    ///
    /// # Errors
    ///
    /// Same as [`Generator::next_id`].
    pub async fn next_id_async_with<S>(&self) -> Result<SnowflakeId>
    where
        S: SleepProvider,
    {
        loop {
            let dur = match self.try_next_id()? {
                IdGenStatus::Ready { id } => return Ok(id),
                IdGenStatus::Pending { yield_for } => yield_for,
            };
            S::sleep_for(dur).await;
        }
    }
}
