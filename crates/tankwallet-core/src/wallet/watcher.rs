//! Background auto-lock enforcement for long-running hosts

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::WalletService;

/// Service handle shared between tasks
///
/// The guard is held for the whole call, including the derivation await,
/// so mutating calls never interleave.
pub type SharedWalletService = Arc<Mutex<WalletService>>;

/// Poll the auto-lock deadline every `period`
///
/// The task holds only a weak reference and exits once every strong handle
/// to the service has been dropped.
pub fn spawn_auto_lock_watcher(service: &SharedWalletService, period: Duration) -> JoinHandle<()> {
    let weak = Arc::downgrade(service);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(service) = weak.upgrade() else {
                debug!("Wallet service dropped, stopping auto-lock watcher");
                break;
            };
            service.lock().await.enforce_auto_lock();
        }
    })
}
