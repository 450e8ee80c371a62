use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::listener::Listener;

use super::update::{Category, Update};

/// Predicate a waiter applies to updates of its category.
pub type UpdateFilter = Arc<dyn Fn(&Update) -> bool + Send + Sync>;

/// Registry record for one caller waiting on an update.
///
/// Identity is the session-unique `key`; the filter and channel are payload.
pub(crate) struct Waiter {
    // ---
    pub(crate) key: u64,
    pub(crate) category: Category,
    pub(crate) filter: Option<UpdateFilter>,
    pub(crate) tx: oneshot::Sender<Update>,
}

impl Waiter {
    pub(crate) fn accepts(&self, update: &Update) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(update))
    }
}

impl Listener for Waiter {
    type Category = Category;

    fn category(&self) -> &Category {
        &self.category
    }
}

impl PartialEq for Waiter {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl PartialEq<WaiterTicket> for Waiter {
    fn eq(&self, other: &WaiterTicket) -> bool {
        self.key == other.key
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("key", &self.key)
            .field("category", &self.category)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// Handle identifying a registered waiter, usable to cancel it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaiterTicket {
    pub key: u64,
    pub category: Category,
}

impl Listener for WaiterTicket {
    type Category = Category;

    fn category(&self) -> &Category {
        &self.category
    }
}
