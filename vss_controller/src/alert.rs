//! Operator notification.
//!
//! Alerts are best effort: a delivery failure is logged together with the
//! alert text and escalated through the error indicator, never retried and
//! never returned to the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};
use vss_common::config::VssConfig;
use vss_common::consts::alert_subject;
use vss_common::io::{ErrorReport, IssueKind};

/// Notification transport failure.
#[derive(Debug, Clone, Error)]
#[error("alert delivery failed: {0}")]
pub struct AlertDeliveryError(pub String);

/// Transport that delivers one message to every recipient.
pub trait Notifier: Send + Sync {
    fn deliver(
        &self,
        recipients: &[String],
        subject: &str,
        from_identity: &str,
        body: &str,
    ) -> Result<(), AlertDeliveryError>;
}

type Escalation = Arc<dyn Fn() + Send + Sync>;

/// Best-effort alert dispatch for one experiment.
pub struct AlertGateway {
    experiment: String,
    recipients: Vec<String>,
    /// `None` when notification is administratively disabled.
    notifier: Option<Arc<dyn Notifier>>,
    escalation: Option<Escalation>,
}

impl AlertGateway {
    /// Gateway that only writes alerts to the log.
    pub fn disabled(experiment: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            recipients: Vec::new(),
            notifier: None,
            escalation: None,
        }
    }

    pub fn new(
        experiment: impl Into<String>,
        recipients: Vec<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            experiment: experiment.into(),
            recipients,
            notifier: Some(notifier),
            escalation: None,
        }
    }

    /// Build the gateway described by `[email]` and `[operators]`.
    ///
    /// `transport` replaces the configured SMTP transport when email is
    /// enabled. Problems are reported and leave a log-only gateway.
    pub fn from_config(
        config: &VssConfig,
        transport: Option<Arc<dyn Notifier>>,
    ) -> (Self, ErrorReport) {
        let mut report = ErrorReport::new();
        let experiment = config.general.experiment_name.clone();

        if !config.email.enabled {
            info!("E-mail notification disabled; alerts go to the log only");
            return (Self::disabled(experiment), report);
        }

        let recipients = config.recipients();
        if recipients.is_empty() {
            report.push(
                "operators",
                IssueKind::Notification,
                "e-mail is enabled but no operators are configured",
            );
        }

        let notifier = match transport {
            Some(t) => Some(t),
            None => match build_transport(config) {
                Ok(t) => Some(t),
                Err(msg) => {
                    report.push("email", IssueKind::Notification, msg);
                    None
                }
            },
        };

        match notifier {
            Some(n) if report.is_empty() => (Self::new(experiment, recipients, n), report),
            _ => (Self::disabled(experiment), report),
        }
    }

    /// Install the hook run after a failed delivery.
    pub fn with_escalation(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.escalation = Some(Arc::new(hook));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Deliver `text` to every recipient. Never fails.
    pub fn send(&self, text: &str) {
        let Some(notifier) = &self.notifier else {
            info!(alert = text, "Alert (notification disabled)");
            return;
        };

        let subject = alert_subject(&self.experiment);
        match notifier.deliver(&self.recipients, &subject, &self.experiment, text) {
            Ok(()) => info!(recipients = self.recipients.len(), alert = text, "Alert sent"),
            Err(e) => {
                error!(alert = text, "{e}");
                if let Some(escalate) = &self.escalation {
                    escalate();
                }
            }
        }
    }
}

#[cfg(feature = "smtp")]
fn build_transport(config: &VssConfig) -> Result<Arc<dyn Notifier>, String> {
    Ok(Arc::new(smtp::SmtpNotifier::from_config(&config.email)?))
}

#[cfg(not(feature = "smtp"))]
fn build_transport(_config: &VssConfig) -> Result<Arc<dyn Notifier>, String> {
    Err("e-mail is enabled but this build has no SMTP support (feature `smtp`)".to_string())
}

#[cfg(feature = "smtp")]
pub mod smtp {
    //! SMTP transport over STARTTLS.

    use lettre::message::header::ContentType;
    use lettre::message::{Mailbox, Message};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{Address, SmtpTransport, Transport};
    use vss_common::config::EmailConfig;

    use super::{AlertDeliveryError, Notifier};

    pub struct SmtpNotifier {
        transport: SmtpTransport,
        sender: Address,
    }

    impl SmtpNotifier {
        pub fn from_config(email: &EmailConfig) -> Result<Self, String> {
            let server = email.server.as_deref().ok_or("missing 'server'")?;
            let username = email.username.clone().ok_or("missing 'username'")?;
            let password = email.password.clone().ok_or("missing 'password'")?;
            let sender = email
                .sender()
                .ok_or("missing 'sender'")?
                .parse::<Address>()
                .map_err(|e| format!("invalid sender address: {e}"))?;

            let transport = SmtpTransport::starttls_relay(server)
                .map_err(|e| format!("cannot use SMTP server {server:?}: {e}"))?
                .port(email.port())
                .credentials(Credentials::new(username, password))
                .build();

            Ok(Self { transport, sender })
        }
    }

    impl Notifier for SmtpNotifier {
        fn deliver(
            &self,
            recipients: &[String],
            subject: &str,
            from_identity: &str,
            body: &str,
        ) -> Result<(), AlertDeliveryError> {
            let mut builder = Message::builder()
                .from(Mailbox::new(Some(from_identity.to_string()), self.sender.clone()))
                .subject(subject)
                .header(ContentType::TEXT_PLAIN);
            for rcpt in recipients {
                let mailbox = rcpt
                    .parse::<Mailbox>()
                    .map_err(|e| AlertDeliveryError(format!("invalid recipient {rcpt:?}: {e}")))?;
                builder = builder.to(mailbox);
            }
            let message = builder
                .body(body.to_string())
                .map_err(|e| AlertDeliveryError(e.to_string()))?;

            self.transport
                .send(&message)
                .map(|_| ())
                .map_err(|e| AlertDeliveryError(e.to_string()))
        }
    }
}
