//! Persisted account balance with change notifications.
//!
//! The [`BalanceLedger`] is the only writer of the balance. Every successful
//! debit or top-up is persisted first and then published on a
//! `tokio::sync::broadcast` channel, so an observer that re-reads the store
//! after receiving [`BalanceChanged`] always sees the new value.
//!
//! Observers never hold a reference to the ledger: they subscribe through a
//! cloneable [`BalanceNotifier`] and unsubscribe by dropping their
//! [`BalanceSubscription`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shunny_core::Amount;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::store::{self, KeyValueStore, StoreError, keys};

/// Balance seeded on first start, when no balance has ever been persisted.
pub const DEFAULT_STARTING_BALANCE: u64 = 5_000_000;

/// Name of the balance change event.
pub const BALANCE_CHANGED_EVENT: &str = "balanceChange";

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// A debit exceeded the current balance. Nothing was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient funds: requested {requested}, available {available}")]
pub struct InsufficientFunds {
    pub requested: Amount,
    pub available: Amount,
}

/// Errors returned by ledger mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),

    /// A top-up would exceed the largest representable amount.
    #[error("balance overflow")]
    Overflow,
}

/// Published after every committed balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceChanged {
    /// Balance after the change.
    pub balance: Amount,
    /// Balance before the change.
    pub previous: Amount,
    /// When the change was committed.
    pub at: DateTime<Utc>,
}

/// Handle for registering balance observers.
///
/// Cheap to clone; registration never fails, including while a broadcast is
/// in progress.
#[derive(Debug, Clone)]
pub struct BalanceNotifier {
    sender: broadcast::Sender<BalanceChanged>,
}

impl BalanceNotifier {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Register an observer. Events published before this call are not delivered.
    #[must_use]
    pub fn subscribe(&self) -> BalanceSubscription {
        debug!(event = BALANCE_CHANGED_EVENT, "New balance subscription");
        BalanceSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish `event`, returning how many observers it reached.
    fn publish(&self, event: BalanceChanged) -> usize {
        // No receivers is the common case and not an error.
        self.sender.send(event).unwrap_or(0)
    }
}

/// A registered balance observer.
///
/// Dropping the subscription (or calling [`cancel`](Self::cancel)) unregisters it.
#[derive(Debug)]
pub struct BalanceSubscription {
    receiver: broadcast::Receiver<BalanceChanged>,
}

impl BalanceSubscription {
    /// Take the next pending event without waiting.
    ///
    /// If the observer fell behind, skipped events are dropped and the oldest
    /// retained event is returned.
    pub fn try_next(&mut self) -> Option<BalanceChanged> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Balance observer lagged; dropping stale events");
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }

    /// Drain pending events and return the most recent one.
    pub fn latest(&mut self) -> Option<BalanceChanged> {
        let mut latest = None;
        while let Some(event) = self.try_next() {
            latest = Some(event);
        }
        latest
    }

    /// Wait for the next event. Returns `None` once the ledger is gone.
    pub async fn next(&mut self) -> Option<BalanceChanged> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Balance observer lagged; dropping stale events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Unregister this observer.
    pub fn cancel(self) {
        drop(self);
    }
}

/// The account balance and its persistence.
pub struct BalanceLedger {
    balance: Amount,
    store: Arc<dyn KeyValueStore>,
    notifier: BalanceNotifier,
}

impl BalanceLedger {
    /// Load the persisted balance.
    ///
    /// `starting_balance` is used (and persisted) only when no balance was
    /// ever stored. A persisted zero is kept. An unreadable value falls back
    /// to `starting_balance` in memory without overwriting the stored value.
    pub fn load(store: Arc<dyn KeyValueStore>, starting_balance: Amount) -> Self {
        let mut ledger = Self {
            balance: starting_balance,
            store,
            notifier: BalanceNotifier::new(),
        };

        match store::load_json::<Amount>(ledger.store.as_ref(), keys::BALANCE) {
            Ok(Some(balance)) => ledger.balance = balance,
            Ok(None) => {
                debug!(balance = %starting_balance, "Seeding starting balance");
                ledger.persist();
            }
            Err(e) => {
                warn!(error = %e, "Unreadable persisted balance; using starting balance");
            }
        }

        ledger
    }

    /// Current balance, as of the last committed change.
    #[must_use]
    pub const fn read(&self) -> Amount {
        self.balance
    }

    /// A handle for registering observers independently of the ledger.
    #[must_use]
    pub fn notifier(&self) -> BalanceNotifier {
        self.notifier.clone()
    }

    /// Register an observer.
    #[must_use]
    pub fn subscribe(&self) -> BalanceSubscription {
        self.notifier.subscribe()
    }

    /// Subtract `amount` if the balance covers it, then persist and publish.
    ///
    /// A zero debit succeeds and still publishes. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientFunds`] if `amount` exceeds the balance; the
    /// balance is left unchanged.
    #[instrument(skip(self, amount), fields(amount = %amount))]
    pub fn debit(&mut self, amount: Amount) -> Result<Amount, InsufficientFunds> {
        let previous = self.balance;
        let balance = previous.checked_sub(amount).ok_or(InsufficientFunds {
            requested: amount,
            available: previous,
        })?;

        self.commit(previous, balance);
        Ok(balance)
    }

    /// Add `amount` to the balance, then persist and publish. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the result is not representable.
    #[instrument(skip(self, amount), fields(amount = %amount))]
    pub fn top_up(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        let previous = self.balance;
        let balance = previous.checked_add(amount).ok_or(LedgerError::Overflow)?;

        self.commit(previous, balance);
        Ok(balance)
    }

    /// Write the balance, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        store::save_json(self.store.as_ref(), keys::BALANCE, &self.balance)
    }

    fn commit(&mut self, previous: Amount, balance: Amount) {
        self.balance = balance;
        self.persist();

        let receivers = self.notifier.publish(BalanceChanged {
            balance,
            previous,
            at: Utc::now(),
        });
        debug!(%previous, %balance, receivers, "Balance changed");
    }

    fn persist(&self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Failed to persist balance; keeping in-memory state");
        }
    }
}

impl std::fmt::Debug for BalanceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceLedger")
            .field("balance", &self.balance)
            .field("subscribers", &self.notifier.subscriber_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ledger_with(balance: u64) -> (MemoryStore, BalanceLedger) {
        let memory = MemoryStore::new();
        store::save_json(&memory, keys::BALANCE, &Amount::from_units(balance)).unwrap();
        let ledger = BalanceLedger::load(
            Arc::new(memory.clone()),
            Amount::from_units(DEFAULT_STARTING_BALANCE),
        );
        (memory, ledger)
    }

    fn persisted(memory: &MemoryStore) -> Amount {
        store::load_json(memory, keys::BALANCE).unwrap().unwrap()
    }

    #[test]
    fn test_fresh_store_seeds_default() {
        let memory = MemoryStore::new();
        let ledger = BalanceLedger::load(
            Arc::new(memory.clone()),
            Amount::from_units(DEFAULT_STARTING_BALANCE),
        );
        assert_eq!(ledger.read(), Amount::from_units(5_000_000));
        assert_eq!(persisted(&memory), Amount::from_units(5_000_000));
    }

    #[test]
    fn test_persisted_zero_is_not_reseeded() {
        let (memory, ledger) = ledger_with(0);
        assert_eq!(ledger.read(), Amount::ZERO);
        assert_eq!(persisted(&memory), Amount::ZERO);
    }

    #[test]
    fn test_legacy_numeric_balance_loads() {
        let memory = MemoryStore::new();
        memory.set(keys::BALANCE, "4250").unwrap();
        let ledger = BalanceLedger::load(
            Arc::new(memory),
            Amount::from_units(DEFAULT_STARTING_BALANCE),
        );
        assert_eq!(ledger.read(), Amount::from_units(4250));
    }

    #[test]
    fn test_corrupt_balance_is_not_overwritten() {
        let memory = MemoryStore::new();
        memory.set(keys::BALANCE, "\"-30\"").unwrap();
        let ledger = BalanceLedger::load(Arc::new(memory.clone()), Amount::from_units(100));
        assert_eq!(ledger.read(), Amount::from_units(100));
        assert_eq!(memory.get(keys::BALANCE).unwrap().as_deref(), Some("\"-30\""));
    }

    #[test]
    fn test_debit_subtracts_persists_and_publishes() {
        let (memory, mut ledger) = ledger_with(1000);
        let mut observer = ledger.subscribe();

        let balance = ledger.debit(Amount::from_units(400)).unwrap();

        assert_eq!(balance, Amount::from_units(600));
        assert_eq!(ledger.read(), Amount::from_units(600));
        assert_eq!(persisted(&memory), Amount::from_units(600));

        let event = observer.try_next().unwrap();
        assert_eq!(event.balance, Amount::from_units(600));
        assert_eq!(event.previous, Amount::from_units(1000));
        assert!(observer.try_next().is_none());
    }

    #[test]
    fn test_debit_more_than_balance_changes_nothing() {
        let (memory, mut ledger) = ledger_with(1000);
        let mut observer = ledger.subscribe();

        let err = ledger.debit(Amount::from_units(1100)).unwrap_err();

        assert_eq!(
            err,
            InsufficientFunds {
                requested: Amount::from_units(1100),
                available: Amount::from_units(1000),
            }
        );
        assert_eq!(ledger.read(), Amount::from_units(1000));
        assert_eq!(persisted(&memory), Amount::from_units(1000));
        assert!(observer.try_next().is_none());
    }

    #[test]
    fn test_debit_entire_balance_reaches_zero() {
        let (_, mut ledger) = ledger_with(1000);
        assert_eq!(ledger.debit(Amount::from_units(1000)).unwrap(), Amount::ZERO);
        assert!(ledger.debit(Amount::from_units(1)).is_err());
    }

    #[test]
    fn test_zero_debit_still_publishes() {
        let (_, mut ledger) = ledger_with(1000);
        let mut observer = ledger.subscribe();

        ledger.debit(Amount::ZERO).unwrap();

        let event = observer.try_next().unwrap();
        assert_eq!(event.balance, Amount::from_units(1000));
        assert_eq!(event.previous, event.balance);
    }

    #[test]
    fn test_every_subscriber_receives_event() {
        let (_, mut ledger) = ledger_with(1000);
        let notifier = ledger.notifier();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        ledger.debit(Amount::from_units(1)).unwrap();

        assert_eq!(first.try_next().unwrap().balance, Amount::from_units(999));
        assert_eq!(second.try_next().unwrap().balance, Amount::from_units(999));
    }

    #[test]
    fn test_cancelled_subscription_is_unregistered() {
        let (_, mut ledger) = ledger_with(1000);
        let observer = ledger.subscribe();
        assert_eq!(ledger.notifier().subscriber_count(), 1);

        observer.cancel();
        assert_eq!(ledger.notifier().subscriber_count(), 0);
        assert!(ledger.debit(Amount::from_units(1)).is_ok());
    }

    #[test]
    fn test_latest_drains_to_newest() {
        let (_, mut ledger) = ledger_with(1000);
        let mut observer = ledger.subscribe();
        ledger.debit(Amount::from_units(100)).unwrap();
        ledger.debit(Amount::from_units(100)).unwrap();
        ledger.top_up(Amount::from_units(50)).unwrap();

        assert_eq!(observer.latest().unwrap().balance, Amount::from_units(850));
        assert!(observer.try_next().is_none());
    }

    #[test]
    fn test_write_failure_keeps_memory_balance() {
        let (memory, mut ledger) = ledger_with(1000);
        memory.set_read_only(true);

        assert_eq!(ledger.debit(Amount::from_units(300)).unwrap(), Amount::from_units(700));
        assert_eq!(ledger.read(), Amount::from_units(700));
        assert_eq!(persisted(&memory), Amount::from_units(1000));
    }

    #[tokio::test]
    async fn test_async_observer_receives_debit() {
        let (_, mut ledger) = ledger_with(1000);
        let mut observer = ledger.notifier().subscribe();

        let handle = tokio::spawn(async move { observer.next().await });
        ledger.debit(Amount::from_units(250)).unwrap();

        let event = handle.await.unwrap().unwrap();
        assert_eq!(event.balance, Amount::from_units(750));
    }

    #[tokio::test]
    async fn test_next_returns_none_after_ledger_dropped() {
        let (_, ledger) = ledger_with(1000);
        let mut observer = ledger.subscribe();
        drop(ledger);
        assert!(observer.next().await.is_none());
    }
}
