//! Subcommand implementations.

use std::io::Read;
use std::time::Duration;

use litequeue_core::{Disposition, Item, Queue, QueueConfig};
use miette::{IntoDiagnostic, Result};
use tracing::info;

pub async fn add(config: QueueConfig, data: Option<String>) -> Result<()> {
    let payload = match data {
        Some(data) => data.into_bytes(),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).into_diagnostic()?;
            buf
        }
    };

    let queue = Queue::new(config).await?;
    queue.add(&payload).await?;
    info!("Queued {} bytes", payload.len());
    queue.shutdown().await?;
    Ok(())
}

pub async fn peek(config: QueueConfig, limit: usize) -> Result<()> {
    let queue = Queue::new(config).await?;
    for item in queue.get(limit).await? {
        println!("{}", format_item(&item));
    }
    queue.shutdown().await?;
    Ok(())
}

pub async fn delete(config: QueueConfig, id: i64) -> Result<()> {
    let queue = Queue::new(config).await?;
    queue.delete(id).await?;
    queue.shutdown().await?;
    Ok(())
}

pub async fn len(config: QueueConfig) -> Result<()> {
    let queue = Queue::new(config).await?;
    println!("{}", queue.len().await?);
    queue.shutdown().await?;
    Ok(())
}

pub async fn consume(config: QueueConfig, delay_ms: Option<u64>, requeue: bool) -> Result<()> {
    let disposition = consume_disposition(delay_ms, requeue);
    let queue = Queue::new(config).await?;

    queue.listen(move |delivery| async move {
        println!("{}", format_item(delivery.item()));
        disposition
    });

    info!("Consuming from {}, press Ctrl-C to stop", queue.locator());
    tokio::signal::ctrl_c().await.into_diagnostic()?;

    info!("Stopping consumer");
    queue.shutdown().await?;
    Ok(())
}

/// Pause between redeliveries of an unacknowledged head item.
const DEFAULT_REQUEUE_DELAY: Duration = Duration::from_secs(1);

/// Disposition the consumer returns for every item.
fn consume_disposition(delay_ms: Option<u64>, requeue: bool) -> Disposition {
    match (delay_ms, requeue) {
        (Some(ms), _) => Disposition::RequeueAfter(Duration::from_millis(ms)),
        (None, true) => Disposition::RequeueAfter(DEFAULT_REQUEUE_DELAY),
        (None, false) => Disposition::Ack,
    }
}

fn format_item(item: &Item) -> String {
    format!("{}\t{}", item.id, item.data_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_consume_disposition() {
        assert_eq!(consume_disposition(None, false), Disposition::Ack);
        // Requeueing without a delay still paces redelivery.
        assert_eq!(
            consume_disposition(None, true),
            Disposition::RequeueAfter(DEFAULT_REQUEUE_DELAY)
        );
        assert!(consume_disposition(None, true).delay().is_some());
        assert_eq!(
            consume_disposition(Some(250), false),
            Disposition::RequeueAfter(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_format_item() {
        let item = Item {
            id: 7,
            data: b"hello".to_vec(),
        };
        assert_eq!(format_item(&item), "7\thello");
    }
}
