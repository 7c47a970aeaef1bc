//! Subscriptions deliver one report message at a time.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc;

use super::BusError;
use crate::report::{ReportMessage, Validator};

/// Source of inbound report deliveries.
///
/// `None` means the subscription has ended. A delivery that could not be
/// decoded or validated is yielded as an error so the caller can log it.
#[async_trait]
pub trait Subscription: Send {
    async fn next_message(&mut self) -> Option<Result<ReportMessage, BusError>>;
}

/// Decode and validate one wire payload.
pub fn decode_message(payload: &str) -> Result<ReportMessage, BusError> {
    let message: ReportMessage = serde_json::from_str(payload)?;
    message.validate().map_err(BusError::Invalid)?;
    Ok(message)
}

/// In-process subscription backed by a tokio channel.
pub struct ChannelSubscription {
    receiver: mpsc::Receiver<ReportMessage>,
}

impl ChannelSubscription {
    pub fn new(receiver: mpsc::Receiver<ReportMessage>) -> Self {
        Self { receiver }
    }

    /// Create a bounded channel and its subscription end.
    pub fn channel(capacity: usize) -> (mpsc::Sender<ReportMessage>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl Subscription for ChannelSubscription {
    async fn next_message(&mut self) -> Option<Result<ReportMessage, BusError>> {
        let message = self.receiver.recv().await?;
        Some(message.validate().map(|_| message).map_err(BusError::Invalid))
    }
}

/// One JSON report per line; blank lines are skipped.
pub struct LineSubscription<R> {
    lines: Lines<R>,
}

impl<R> LineSubscription<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(lines: Lines<R>) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl<R> Subscription for LineSubscription<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_message(&mut self) -> Option<Result<ReportMessage, BusError>> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(decode_message(&line)),
                Ok(None) => return None,
                Err(e) => return Some(Err(BusError::Io(e))),
            }
        }
    }
}
