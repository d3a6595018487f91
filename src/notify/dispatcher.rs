use std::sync::Arc;

use crate::notify::error::NotifyError;
use crate::notify::mailer::{Mailer, OutgoingMail};
use crate::oracle::Overpass;
use crate::scheduler::NotificationEvent;

/// Renders pass alerts and hands them to the mail transport.
pub struct Dispatcher {
    mailer: Arc<dyn Mailer>,
    sender: String,
    subject: String,
}

impl Dispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, sender: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            mailer,
            sender: sender.into(),
            subject: subject.into(),
        }
    }

    pub fn compose(&self, recipient: &str, location_name: &str, pass: &Overpass) -> OutgoingMail {
        OutgoingMail {
            from: self.sender.clone(),
            to: recipient.to_string(),
            subject: self.subject.clone(),
            body: format!(
                "Hello,\n\nThere is an upcoming Landsat pass for your location '{}' at {}.\n\nBest regards,\nLandsat Notification System",
                location_name, pass
            ),
        }
    }

    /// Single delivery attempt; the caller decides what a failure means.
    pub async fn send(
        &self,
        recipient: &str,
        location_name: &str,
        pass: &Overpass,
    ) -> Result<(), NotifyError> {
        let mail = self.compose(recipient, location_name, pass);
        self.mailer.send(&mail).await?;
        log::info!(
            "Sent pass alert for '{}' ({}) to {}",
            location_name,
            pass,
            recipient
        );
        Ok(())
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.send(&event.recipient, &event.location.name, &event.pass)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("connection refused".into()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn pass() -> Overpass {
        Overpass::parse("2024-01-02 05:00:00").unwrap()
    }

    #[test]
    fn compose_fixed_template() {
        let dispatcher = Dispatcher::new(
            Arc::new(RecordingMailer::default()),
            "alerts@example.com",
            "Upcoming Landsat Pass",
        );
        let mail = dispatcher.compose("owner@example.com", "Griffith Park", &pass());

        assert_eq!(mail.from, "alerts@example.com");
        assert_eq!(mail.to, "owner@example.com");
        assert_eq!(mail.subject, "Upcoming Landsat Pass");
        assert_eq!(
            mail.body,
            "Hello,\n\nThere is an upcoming Landsat pass for your location 'Griffith Park' at 2024-01-02 05:00:00.\n\nBest regards,\nLandsat Notification System"
        );
    }

    #[tokio::test]
    async fn send_hands_mail_to_transport() {
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = Dispatcher::new(mailer.clone(), "alerts@example.com", "Pass");

        dispatcher
            .send("owner@example.com", "Griffith Park", &pass())
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(mailer, "alerts@example.com", "Pass");

        let err = dispatcher
            .send("owner@example.com", "Griffith Park", &pass())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
