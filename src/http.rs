//! `reqwest` implementation of [`HashSource`].
use async_trait::async_trait;
use bitcoin::{Amount, Denomination};
use reqwest::{
    header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    redirect, Client, StatusCode, Url,
};
use tracing::debug;

use crate::{
    config::{ValidHashConfig, TRUNCATED_HASH_LEN},
    error::{Error, Result},
    hash::TruncatedHash,
    source::HashSource,
};

/// Talks to trusted servers over HTTP(S).
///
/// Hash sync: `POST <server>` with `application/octet-stream` locator bytes.
/// Fee quote: `POST <server>/getfee` with `bytes=..&amount=..` form data.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build a client with the configured connect/read timeouts, redirects
    /// disabled and no idle connection pool: every call opens and closes
    /// its own connection.
    pub fn new(config: &ValidHashConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client })
    }

    async fn post(
        &self,
        url: Url,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "no-cache")
            .header(CONNECTION, "close")
            .body(body)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(Error::Network(format!("{url} answered {}", resp.status())));
        }
        Ok(resp)
    }
}

/// `<server>/getfee`, without doubling a trailing slash.
fn fee_url(server: &Url) -> Result<Url> {
    let base = server.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/getfee")).map_err(|e| Error::Network(format!("fee url: {e}")))
}

#[async_trait]
impl HashSource for HttpSource {
    async fn download_hashes(
        &self,
        server: &Url,
        locator: &[u8],
        limit: usize,
    ) -> Result<Vec<TruncatedHash>> {
        let mut resp = self
            .post(server.clone(), "application/octet-stream", locator.to_vec())
            .await?;

        let mut out = Vec::new();
        let mut pending: Vec<u8> = Vec::with_capacity(TRUNCATED_HASH_LEN);

        // Dropping `resp` early closes the connection once we have enough.
        'read: while out.len() < limit {
            let Some(chunk) = resp.chunk().await? else {
                break;
            };
            let mut rest = &chunk[..];
            while !rest.is_empty() {
                let take = (TRUNCATED_HASH_LEN - pending.len()).min(rest.len());
                pending.extend_from_slice(&rest[..take]);
                rest = &rest[take..];
                if let Some(h) = TruncatedHash::from_slice(&pending) {
                    out.push(h);
                    pending.clear();
                    if out.len() >= limit {
                        break 'read;
                    }
                }
            }
        }

        debug!(%server, records = out.len(), partial = pending.len(), "downloaded trusted hashes");
        Ok(out)
    }

    async fn get_fee(&self, server: &Url, size_bytes: usize, amount: Amount) -> Result<Amount> {
        let form = format!(
            "bytes={size_bytes}&amount={}",
            amount.to_string_in(Denomination::Bitcoin)
        );
        let resp = self
            .post(fee_url(server)?, "application/x-www-form-urlencoded", form.into_bytes())
            .await?;

        let body = resp.bytes().await?;
        let text = std::str::from_utf8(&body)
            .map_err(|e| Error::Decode(format!("fee body is not utf-8: {e}")))?;
        let fee = Amount::from_str_in(text.trim(), Denomination::Bitcoin)
            .map_err(|e| Error::Decode(format!("fee {text:?}: {e}")))?;
        debug!(%server, size_bytes, %fee, "fee quote");
        Ok(fee)
    }
}
