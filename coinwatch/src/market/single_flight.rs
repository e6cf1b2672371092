use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;

/// Collapses concurrent calls for the same key into one underlying future.
///
/// The first caller for a key installs its future; callers arriving while it
/// is pending await the same shared output. The marker is removed once the
/// future resolves, so the next call after completion starts a new flight.
pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    in_flight: DashMap<String, Shared<BoxFuture<'static, T>>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Run `fut` unless a flight for `key` is already pending, in which case
    /// `fut` is dropped unpolled and the pending result is returned.
    pub async fn run<F>(&self, key: &str, fut: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
    {
        let flight = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(existing) => {
                tracing::debug!("Joining in-flight fetch for key '{}'", key);
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let shared = fut.boxed().shared();
                slot.insert(shared.clone());
                shared
            }
        };

        let output = flight.clone().await;

        // A newer flight may already occupy the slot; only clear our own.
        self.in_flight
            .remove_if(key, |_, pending| pending.ptr_eq(&flight));

        output
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
