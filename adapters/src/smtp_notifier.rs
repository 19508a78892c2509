use std::net::IpAddr;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::{ConfigError, MailerConfig};
use application::ports::out_::{DeliveryError, Notifier};
use domain::ALERT_SUBJECT;

/// When STARTTLS must succeed before credentials go over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsPolicy {
    /// Fail the delivery if the server does not offer STARTTLS.
    Required,
    /// Upgrade when offered, otherwise authenticate in clear. Loopback servers only.
    Opportunistic,
}

impl TlsPolicy {
    fn for_host(host: &str) -> Self {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        let loopback =
            bare.eq_ignore_ascii_case("localhost") || bare.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback());
        if loopback { Self::Opportunistic } else { Self::Required }
    }
}

/// Sends alerts as plain-text mail over SMTP with PLAIN authentication.
///
/// The session is upgraded with STARTTLS, the certificate checked against
/// `AuthHost`. Only a loopback server may receive the password unencrypted.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(mailer: &MailerConfig) -> Result<Self, ConfigError> {
        let (host, _) = mailer.server_address()?;
        Self::with_policy(mailer, TlsPolicy::for_host(host))
    }

    fn with_policy(
        mailer: &MailerConfig,
        policy: TlsPolicy,
    ) -> Result<Self, ConfigError> {
        let (host, port) = mailer.server_address()?;
        let from = parse_mailbox("AddressFrom", &mailer.address_from)?;
        let to = parse_mailbox("AddressTo", &mailer.address_to)?;

        let params = TlsParameters::new(mailer.auth_host.clone())
            .map_err(|err| ConfigError::Invalid(format!("TLS setup for {:?}: {err}", mailer.auth_host)))?;
        let tls = match policy {
            TlsPolicy::Required => Tls::Required(params),
            TlsPolicy::Opportunistic => Tls::Opportunistic(params),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .tls(tls)
            .credentials(Credentials::new(
                mailer.auth_username.clone(),
                mailer.auth_password.clone(),
            ))
            .authentication(vec![Mechanism::Plain])
            .build();

        Ok(Self { transport, from, to })
    }

    pub fn compose(
        &self,
        body: &str,
    ) -> Result<Message, DeliveryError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(ALERT_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|err| DeliveryError::Message(err.to_string()))
    }
}

fn parse_mailbox(
    field: &str,
    address: &str,
) -> Result<Mailbox, ConfigError> {
    address
        .parse()
        .map_err(|err| ConfigError::Invalid(format!("Mailer.{field} {address:?}: {err}")))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        message: &str,
    ) -> Result<(), DeliveryError> {
        let email = self.compose(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        debug!(to = %self.to, code = %response.code(), "Alert delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    fn mailer() -> MailerConfig {
        MailerConfig {
            smtp_server: "smtp.example.com:587".to_string(),
            auth_username: "alerts".to_string(),
            auth_password: "hunter2".to_string(),
            auth_host: "smtp.example.com".to_string(),
            address_from: "alerts@example.com".to_string(),
            address_to: "me@example.com".to_string(),
        }
    }

    fn local_mailer(port: u16) -> MailerConfig {
        MailerConfig {
            smtp_server: format!("127.0.0.1:{port}"),
            auth_host: "127.0.0.1".to_string(),
            ..mailer()
        }
    }

    /// Accepts one session from a server that never offers STARTTLS and
    /// returns every command line the client sent.
    async fn plaintext_smtp_server() -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut received = Vec::new();
            let mut in_data = false;

            write.write_all(b"220 mail.test ESMTP\r\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                received.push(line.clone());
                let reply = if in_data {
                    if line != "." {
                        continue;
                    }
                    in_data = false;
                    "250 queued\r\n"
                } else if line.starts_with("EHLO") {
                    "250-mail.test\r\n250 AUTH PLAIN\r\n"
                } else if line.starts_with("AUTH") {
                    "235 accepted\r\n"
                } else if line == "DATA" {
                    in_data = true;
                    "354 go ahead\r\n"
                } else if line == "QUIT" {
                    let _ = write.write_all(b"221 bye\r\n").await;
                    break;
                } else {
                    "250 ok\r\n"
                };
                if write.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
            received
        });
        (port, server)
    }

    #[test]
    fn requires_tls_unless_server_is_loopback() {
        assert_eq!(TlsPolicy::for_host("smtp.example.com"), TlsPolicy::Required);
        assert_eq!(TlsPolicy::for_host("10.0.0.25"), TlsPolicy::Required);
        assert_eq!(TlsPolicy::for_host("localhost"), TlsPolicy::Opportunistic);
        assert_eq!(TlsPolicy::for_host("127.0.0.1"), TlsPolicy::Opportunistic);
        assert_eq!(TlsPolicy::for_host("[::1]"), TlsPolicy::Opportunistic);
    }

    #[tokio::test]
    async fn composes_plain_text_alert() {
        let notifier = SmtpNotifier::new(&mailer()).unwrap();
        let email = notifier.compose("IdrA was last seen playing at Jan 1, 1970 12:16am UTC\n").unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("From: alerts@example.com"));
        assert!(raw.contains("Subject: Starcraft Alert"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("IdrA was last seen playing at"));
    }

    #[tokio::test]
    async fn rejects_invalid_recipient() {
        let mut config = mailer();
        config.address_to = "not an address".to_string();
        let result = SmtpNotifier::new(&config);
        assert!(matches!(result, Err(ConfigError::Invalid(message)) if message.contains("AddressTo")));
    }

    #[tokio::test]
    async fn never_authenticates_without_starttls_when_tls_is_required() {
        let (port, server) = plaintext_smtp_server().await;
        let notifier = SmtpNotifier::with_policy(&local_mailer(port), TlsPolicy::Required).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), notifier.send("IdrA played\n"))
            .await
            .unwrap();
        drop(notifier);
        let received = tokio::time::timeout(Duration::from_secs(10), server).await.unwrap().unwrap();

        assert!(matches!(result, Err(DeliveryError::Transport(_))));
        assert!(received.iter().any(|line| line.starts_with("EHLO")));
        assert!(!received.iter().any(|line| line.starts_with("AUTH")));
    }

    #[tokio::test]
    async fn loopback_server_may_authenticate_in_clear() {
        let (port, server) = plaintext_smtp_server().await;
        let notifier = SmtpNotifier::new(&local_mailer(port)).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), notifier.send("IdrA played\n"))
            .await
            .unwrap();
        drop(notifier);
        let received = tokio::time::timeout(Duration::from_secs(10), server).await.unwrap().unwrap();

        assert_eq!(result, Ok(()));
        assert!(received.iter().any(|line| line.starts_with("AUTH PLAIN")));
        assert!(received.iter().any(|line| line == "Subject: Starcraft Alert"));
    }
}
