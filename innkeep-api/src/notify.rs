//! Booking notifications: a bounded queue between the request handlers and a
//! background delivery worker. Enqueueing never stalls a page response; the
//! overflow policy is explicit configuration, not an accident of the channel.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use innkeep_store::app_config::OverflowPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailData {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub content: String,
    pub template: Option<String>,
}

/// Delivery transport. The real SMTP hand-off lives outside this service;
/// the default implementation records deliveries in the log.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailData) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailData) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!(
            to = %message.to,
            subject = %message.subject,
            template = message.template.as_deref().unwrap_or("none"),
            "delivering notification"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<MailData>,
    policy: OverflowPolicy,
    enqueue_timeout: Duration,
}

impl Dispatcher {
    /// Builds the bounded queue and spawns the worker draining it.
    pub fn start(
        capacity: usize,
        policy: OverflowPolicy,
        enqueue_timeout: Duration,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(run_worker(rx, mailer));
        Self { tx, policy, enqueue_timeout }
    }

    /// Hands a message to the worker. Best effort: a full queue drops the
    /// message (immediately or after the configured wait) with a warning, and
    /// never fails the request that produced it.
    pub async fn enqueue(&self, message: MailData) {
        match self.policy {
            OverflowPolicy::DropNewest => {
                if let Err(e) = self.tx.try_send(message) {
                    warn!("mail queue full, dropping notification: {}", e);
                }
            }
            OverflowPolicy::BlockWithTimeout => {
                if let Err(e) = self.tx.send_timeout(message, self.enqueue_timeout).await {
                    warn!("mail queue full after {:?}, dropping notification: {}", self.enqueue_timeout, e);
                }
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<MailData>, mailer: Arc<dyn Mailer>) {
    info!("mail worker started");
    while let Some(message) = rx.recv().await {
        if let Err(e) = mailer.send(&message).await {
            error!("failed to deliver notification to {}: {}", message.to, e);
        }
    }
    info!("mail worker stopped");
}
