use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::header::USER_AGENT;

use crate::http_client::http_client;

/// Where exported spreadsheet bytes come from.
pub trait DocumentSource {
    fn fetch(&self, export_url: &str) -> Result<Vec<u8>>;
}

/// Downloads exports over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpDocumentSource {
    timeout: Option<Duration>,
}

impl HttpDocumentSource {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl DocumentSource for HttpDocumentSource {
    fn fetch(&self, export_url: &str) -> Result<Vec<u8>> {
        let client = http_client(self.timeout)?;
        let resp = client
            .get(export_url)
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("http {status}"));
        }
        let body = resp.bytes().context("failed reading body")?;
        Ok(body.to_vec())
    }
}
