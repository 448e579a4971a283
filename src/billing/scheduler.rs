use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::{self, Duration};
use tracing::{debug, warn};

use super::ledger::SubscriptionLedger;

/// key: billing-lapse-scheduler -> periodic downgrade of expired plans
pub fn spawn(ledger: SubscriptionLedger, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = process_tick(&ledger, Utc::now()).await {
                warn!(?err, "billing lapse sweep failed");
            }
        }
    });
}

/// key: billing-lapse-scheduler -> tick handler
pub async fn process_tick(ledger: &SubscriptionLedger, now: DateTime<Utc>) -> Result<usize> {
    let downgraded = ledger.expire_lapsed(now).await?;
    debug!(downgraded, "billing lapse sweep finished");
    Ok(downgraded)
}
