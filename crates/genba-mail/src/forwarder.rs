//! SMTP forwarding of inquiries to the site staff

use std::env;
use std::sync::Arc;

use chrono::Local;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info, warn};

use genba_core::locale::{Locale, messages};
use genba_core::{Error, LlmProvider, Result};

use crate::translate::JapaneseTranslator;

/// SMTP settings and credentials for the forwarding mailbox
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub user: String,
    pub password: String,
    pub to: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl MailConfig {
    /// Read the mailbox settings from the environment.
    ///
    /// `GMAIL_USER`, `GMAIL_APP_PASSWORD` and `INQUIRY_TO_EMAIL` are all
    /// required; any missing one leaves the forwarder unconfigured and is
    /// named in a warning.
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();

        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let smtp_port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);

        let user = env::var("GMAIL_USER").ok();
        let password = env::var("GMAIL_APP_PASSWORD").ok();
        let to = env::var("INQUIRY_TO_EMAIL").ok();

        for (name, value) in [
            ("GMAIL_USER", &user),
            ("GMAIL_APP_PASSWORD", &password),
            ("INQUIRY_TO_EMAIL", &to),
        ] {
            if value.is_none() {
                warn!(variable = name, "mail settings incomplete");
            }
        }

        Self::from_vars(user, password, to, smtp_host, smtp_port)
    }

    /// Explicit-value seam used by `from_env` and tests
    pub fn from_vars(
        user: Option<String>,
        password: Option<String>,
        to: Option<String>,
        smtp_host: String,
        smtp_port: u16,
    ) -> Option<Self> {
        Some(Self {
            user: user?,
            password: password?,
            to: to?,
            smtp_host,
            smtp_port,
        })
    }
}

/// Forwards inquiry messages to the site staff over authenticated SMTP.
///
/// Shares the session's locale but sits outside the RAG flow entirely.
pub struct InquiryForwarder<P: LlmProvider> {
    config: Option<MailConfig>,
    translator: JapaneseTranslator<P>,
}

impl<P: LlmProvider> InquiryForwarder<P> {
    pub fn new(config: Option<MailConfig>, provider: Arc<P>) -> Self {
        Self {
            config,
            translator: JapaneseTranslator::new(provider),
        }
    }

    pub fn from_env(provider: Arc<P>) -> Self {
        Self::new(MailConfig::from_env(), provider)
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Forward one inquiry.
    ///
    /// Every outcome is user-facing text: the thanks message on success, the
    /// settings message when unconfigured (nothing is attempted), and the
    /// detail-suppressed sending message on transport failure. Under the
    /// `en` locale the body carries a Japanese translation of the message;
    /// translation failure degrades to a tagged passthrough.
    pub async fn send_inquiry(&self, message: &str, locale: Locale) -> String {
        let Some(config) = &self.config else {
            return messages::mail_settings_error(locale).to_string();
        };

        let datetime = Local::now().format("%Y年%m月%d日 %H:%M:%S").to_string();

        let translated = match locale {
            Locale::En => Some(self.translator.translate(message).await),
            Locale::Ja => None,
        };

        let subject = format!("{} - {}", messages::forwarding_subject(locale), datetime);
        let body = messages::email_body(locale, message, translated.as_deref(), &datetime);

        match dispatch(config, &subject, body) {
            Ok(()) => {
                info!(to = %config.to, "inquiry forwarded to staff");
                messages::contact_thanks(locale).to_string()
            }
            Err(e) => {
                error!(error = %e, "inquiry mail send failed");
                messages::mail_sending_error_detail(locale).to_string()
            }
        }
    }
}

fn dispatch(config: &MailConfig, subject: &str, body: String) -> Result<()> {
    let email = Message::builder()
        .from(config
            .user
            .parse()
            .map_err(|e| Error::Transport(format!("invalid sender address: {}", e)))?)
        .to(config
            .to
            .parse()
            .map_err(|e| Error::Transport(format!("invalid recipient address: {}", e)))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| Error::Transport(e.to_string()))?;

    let mailer = SmtpTransport::starttls_relay(&config.smtp_host)
        .map_err(|e| Error::Transport(e.to_string()))?
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.user.clone(),
            config.password.clone(),
        ))
        .build();

    mailer.send(&email).map_err(|e| Error::Transport(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use genba_core::{ChatMessage, GenerationConfig, GenerationResult};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _config: &GenerationConfig,
        ) -> genba_core::Result<GenerationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerationResult {
                text: "翻訳".to_string(),
                model_id: "mock".to_string(),
                tokens_used: None,
            })
        }

        async fn embed(&self, _text: &str) -> genba_core::Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> genba_core::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0]).collect())
        }

        fn model_id(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn any_missing_variable_leaves_config_unset() {
        let full = MailConfig::from_vars(
            Some("site@example.com".to_string()),
            Some("app-password".to_string()),
            Some("staff@example.com".to_string()),
            "smtp.gmail.com".to_string(),
            587,
        );
        assert!(full.is_some());

        let missing = MailConfig::from_vars(
            Some("site@example.com".to_string()),
            None,
            Some("staff@example.com".to_string()),
            "smtp.gmail.com".to_string(),
            587,
        );
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn unconfigured_forwarder_reports_settings_error_without_any_work() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let forwarder = InquiryForwarder::new(None, provider.clone());

        let result = forwarder.send_inquiry("When does it end?", Locale::En).await;

        assert_eq!(result, messages::mail_settings_error(Locale::En));
        // No translation, hence no model call, was attempted.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
