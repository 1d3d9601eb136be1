// Name translation
//
// - tencent: Tencent Cloud machine translation client (TC3 signed requests)
// - rename: the translation pass over a directory tree
//
// Every translator handed out by the factory is throttled so that successive
// calls keep the configured minimum interval.

pub mod rename;
pub mod tencent;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub use rename::*;
pub use tencent::*;

use crate::config::TranslateConfig;
use crate::error::{Result, OrganizerError};

/// Main trait for translation operations
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a single file or folder name
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Wraps a translator and enforces a minimum delay between successive calls
pub struct ThrottledTranslator<T> {
    inner: T,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<T: Translator> ThrottledTranslator<T> {
    pub fn new(inner: T, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_call: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<T: Translator> Translator for ThrottledTranslator<T> {
    async fn translate(&self, text: &str) -> Result<String> {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limiting translation for {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        let result = self.inner.translate(text).await;
        *last_call = Some(Instant::now());
        result
    }
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the Tencent Cloud translator, throttled per configuration
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        let credentials = config.credentials.clone().ok_or_else(|| {
            OrganizerError::Config("translate.credentials are required for translation".to_string())
        })?;
        let min_interval = Duration::from_millis(config.min_interval_ms);
        let client = TencentTranslator::new(config, credentials)?;

        Ok(Box::new(ThrottledTranslator::new(client, min_interval)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Credentials};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(&self, text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.is_empty() {
                return Err(OrganizerError::Translation("empty".to_string()));
            }
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_throttle_spaces_out_calls() {
        let translator = ThrottledTranslator::new(
            CountingTranslator { calls: AtomicUsize::new(0) },
            Duration::from_millis(60),
        );

        let start = std::time::Instant::now();
        assert_eq!(translator.translate("a").await.unwrap(), "A");
        assert_eq!(translator.translate("b").await.unwrap(), "B");
        assert_eq!(translator.translate("c").await.unwrap(), "C");

        assert!(start.elapsed() >= Duration::from_millis(120));
        assert_eq!(translator.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_throttle_counts_failed_calls() {
        let translator = ThrottledTranslator::new(
            CountingTranslator { calls: AtomicUsize::new(0) },
            Duration::from_millis(50),
        );

        let start = std::time::Instant::now();
        tokio_test::block_on(async {
            assert!(translator.translate("").await.is_err());
            assert!(translator.translate("x").await.is_ok());
        });

        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_factory_requires_credentials() {
        let config = Config::default().translate;
        assert!(matches!(
            TranslatorFactory::create_translator(config),
            Err(OrganizerError::Config(_))
        ));
    }

    #[test]
    fn test_factory_builds_with_credentials() {
        let mut config = Config::default().translate;
        config.credentials = Some(Credentials {
            secret_id: "id".to_string(),
            secret_key: "key".to_string(),
        });
        assert!(TranslatorFactory::create_translator(config).is_ok());
    }
}
