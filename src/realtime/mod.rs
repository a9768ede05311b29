mod invalidator;
mod notifier;

pub use invalidator::{InvalidationAction, RealtimeInvalidator};
pub use notifier::{ChangeEvent, ChangeNotifier, ChangeTable, Subscription};
