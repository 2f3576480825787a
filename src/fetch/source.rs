use crate::config::NetConfig;
use crate::error::FetchError;
use crate::net;

/// Somewhere page text comes from.
pub trait Source {
    fn name(&self) -> &str;
    fn fetch_text(&self) -> Result<String, FetchError>;
}

/// The configured remote page, fetched with one blocking GET.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    url: String,
    retries: u32,
}

impl HttpSource {
    pub fn new(config: &NetConfig) -> Result<Self, FetchError> {
        let client = net::client(config.timeout).map_err(|source| FetchError::Http {
            url: config.url.clone(),
            source,
        })?;
        Ok(HttpSource {
            client,
            url: config.url.clone(),
            retries: config.retries,
        })
    }
}

impl Source for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn fetch_text(&self) -> Result<String, FetchError> {
        let response = net::with_retry(&self.url, self.retries, || self.client.get(&self.url).send())
            .map_err(|source| FetchError::Http {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        // decodes with the charset from Content-Type, utf-8 otherwise
        response.text().map_err(|source| FetchError::Http {
            url: self.url.clone(),
            source,
        })
    }
}

/// Fixed text, for offline runs and tests.
pub struct StaticSource {
    label: String,
    text: String,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        StaticSource {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl Source for StaticSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch_text(&self) -> Result<String, FetchError> {
        Ok(self.text.clone())
    }
}
