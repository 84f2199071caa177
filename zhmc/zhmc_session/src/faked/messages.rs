//! OS message channels of the faked HMC.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Duration;

use zhmc_core::{ClientError, OsMessageReceiver, Result};

/// Receiving end of a faked OS message channel.
///
/// Each batch sent to the channel is delivered as one `receive` result.
pub struct FakedOsMessageReceiver {
    uri: String,
    receiver: Receiver<Vec<String>>,
    closed: bool,
}

impl FakedOsMessageReceiver {
    pub(crate) fn new(uri: impl Into<String>, receiver: Receiver<Vec<String>>) -> Self {
        Self {
            uri: uri.into(),
            receiver,
            closed: false,
        }
    }

    fn closed_error(&self) -> ClientError {
        ClientError::ChannelClosed(format!("OS message channel of {} is closed", self.uri))
    }
}

impl OsMessageReceiver for FakedOsMessageReceiver {
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<String>>> {
        if self.closed {
            return Err(self.closed_error().into());
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(texts) => Ok(Some(texts)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                Err(self.closed_error().into())
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_receive_and_close() {
        let (tx, rx) = unbounded();
        let mut receiver = FakedOsMessageReceiver::new("/api/partitions/p1", rx);

        tx.send(vec!["uname".to_string(), "Linux".to_string()]).unwrap();
        assert_eq!(
            receiver.receive(Duration::from_millis(10)).unwrap(),
            Some(vec!["uname".to_string(), "Linux".to_string()])
        );
        assert_eq!(receiver.receive(Duration::from_millis(10)).unwrap(), None);

        receiver.close();
        let err = receiver.receive(Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.class_name(), "NotificationError");
    }

    #[test]
    fn test_dropped_sender_closes_channel() {
        let (tx, rx) = unbounded::<Vec<String>>();
        let mut receiver = FakedOsMessageReceiver::new("/api/partitions/p1", rx);
        drop(tx);
        assert!(receiver.receive(Duration::from_millis(10)).is_err());
    }
}
