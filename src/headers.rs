use async_trait::async_trait;
use bitcoin::{block::Header, hashes::Hash as _};
use tracing::debug;

use crate::{
    config::{LOCATOR_BYTES, MAX_LOCATOR_HASHES},
    error::{Error, Result},
};

/// Read access to the local best header chain.
#[async_trait]
pub trait ChainCursor: Send + Sync {
    /// Current best-known header.
    async fn head(&self) -> anyhow::Result<Header>;

    /// Parent of `header`, or `None` at genesis.
    async fn previous(&self, header: &Header) -> anyhow::Result<Option<Header>>;
}

/// Recent ancestor hashes sent to a trusted server, newest first.
pub struct Locator {
    buf: [u8; LOCATOR_BYTES],
    count: usize,
}

impl Locator {
    /// Walk back from the head, collecting at most [`MAX_LOCATOR_HASHES`]
    /// hashes (head included) in internal byte order.
    pub async fn from_chain<C: ChainCursor + ?Sized>(chain: &C) -> Result<Self> {
        let mut buf = [0u8; LOCATOR_BYTES];
        let mut count = 0;
        let mut cursor = Some(chain.head().await.map_err(Error::ChainStore)?);

        while let Some(header) = cursor {
            let off = count * 32;
            buf[off..off + 32].copy_from_slice(&header.block_hash().to_byte_array());
            count += 1;
            if count == MAX_LOCATOR_HASHES {
                break;
            }
            cursor = chain.previous(&header).await.map_err(Error::ChainStore)?;
        }

        debug!(hashes = count, "built sync locator");
        Ok(Self { buf, count })
    }

    /// Number of hashes in the locator.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if the locator holds no hashes.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The meaningful prefix of the buffer: `len() * 32` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.count * 32]
    }
}
