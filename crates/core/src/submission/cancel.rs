use tokio::sync::watch;

/// Owner side of a cancellation pair. Dropping it cancels as well, so a
/// submission cannot outlive the wizard that started it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

#[derive(Clone, Debug)]
pub struct CancelSignal {
    receiver: Option<watch::Receiver<bool>>,
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver: Some(receiver) })
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { receiver: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.receiver {
            Some(receiver) => *receiver.borrow() || receiver.has_changed().is_err(),
            None => false,
        }
    }

    /// Resolves once the handle cancels or is dropped.
    pub async fn cancelled(&self) {
        match &self.receiver {
            Some(receiver) => {
                let mut receiver = receiver.clone();
                let _ = receiver.wait_for(|cancelled| *cancelled).await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
