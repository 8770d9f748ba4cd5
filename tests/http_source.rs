use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Form, Router,
};
use bitcoin::{block::Header as BlockHeader, Amount, Denomination};
use reqwest::Url;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tempfile::tempdir;
use trusted_hash_sync::{prelude::*, Error, HttpSource, TruncatedHash};

/// What a trusted server saw: (path, content type, body).
type Seen = Arc<Mutex<Vec<(String, String, Vec<u8>)>>>;

#[derive(Clone)]
struct Trusted {
    reply: Vec<u8>,
    fee: &'static str,
    seen: Seen,
}

async fn hashes(State(s): State<Trusted>, headers: HeaderMap, body: Bytes) -> Vec<u8> {
    let ct = content_type(&headers);
    s.seen.lock().unwrap().push(("/".into(), ct, body.to_vec()));
    s.reply.clone()
}

async fn getfee(
    State(s): State<Trusted>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> &'static str {
    let ct = content_type(&headers);
    let body = format!(
        "bytes={}&amount={}",
        form.get("bytes").cloned().unwrap_or_default(),
        form.get("amount").cloned().unwrap_or_default()
    );
    s.seen
        .lock()
        .unwrap()
        .push(("/getfee".into(), ct, body.into_bytes()));
    s.fee
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn(router: Router) -> anyhow::Result<Url> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(Url::parse(&format!("http://{addr}/"))?)
}

async fn trusted_server(reply: Vec<u8>, fee: &'static str) -> anyhow::Result<(Url, Seen)> {
    let seen: Seen = Arc::default();
    let state = Trusted {
        reply,
        fee,
        seen: seen.clone(),
    };
    let router = Router::new()
        .route("/", post(hashes))
        .route("/getfee", post(getfee))
        .with_state(state);
    Ok((spawn(router).await?, seen))
}

/// A local address nothing listens on.
async fn dead_server() -> anyhow::Result<Url> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(Url::parse(&format!("http://{addr}/"))?)
}

fn records(n: u8) -> Vec<u8> {
    (0..n).flat_map(|i| [i; 16]).collect()
}

fn source() -> anyhow::Result<HttpSource> {
    let cfg = ValidHashConfig::default()
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    Ok(HttpSource::new(&cfg)?)
}

#[tokio::test]
async fn posts_locator_and_decodes_records() -> anyhow::Result<()> {
    let mut body = records(3);
    body.extend_from_slice(&[0xee; 5]); // trailing partial record
    let (url, seen) = trusted_server(body, "0").await?;

    let locator = vec![7u8; 64];
    let got = source()?.download_hashes(&url, &locator, 50_000).await?;

    assert_eq!(
        got,
        vec![
            TruncatedHash::from_bytes([0; 16]),
            TruncatedHash::from_bytes([1; 16]),
            TruncatedHash::from_bytes([2; 16]),
        ]
    );
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, "application/octet-stream");
    assert_eq!(seen[0].2, locator);
    Ok(())
}

#[tokio::test]
async fn stops_reading_at_limit() -> anyhow::Result<()> {
    let (url, _) = trusted_server(records(10), "0").await?;
    let got = source()?.download_hashes(&url, &[], 4).await?;
    assert_eq!(got.len(), 4);
    assert_eq!(got[3], TruncatedHash::from_bytes([3; 16]));
    Ok(())
}

#[tokio::test]
async fn non_ok_status_is_a_network_error() -> anyhow::Result<()> {
    let router = Router::new().route("/", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let url = spawn(router).await?;

    let err = source()?.download_hashes(&url, &[], 10).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "{err}");
    Ok(())
}

#[tokio::test]
async fn redirects_are_not_followed() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/",
        post(|| async { (StatusCode::FOUND, [("location", "http://elsewhere.invalid/")]) }),
    );
    let url = spawn(router).await?;

    let err = source()?.download_hashes(&url, &[], 10).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "{err}");
    Ok(())
}

#[tokio::test]
async fn each_call_uses_its_own_connection() -> anyhow::Result<()> {
    let peers: Arc<Mutex<Vec<SocketAddr>>> = Arc::default();
    let recorded = peers.clone();
    let router = Router::new().route(
        "/",
        post(move |ConnectInfo(peer): ConnectInfo<SocketAddr>| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(peer);
                records(1)
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    let url = Url::parse(&format!("http://{addr}/"))?;

    let http = source()?;
    http.download_hashes(&url, &[], 10).await?;
    http.download_hashes(&url, &[], 10).await?;

    let peers = peers.lock().unwrap();
    assert_eq!(peers.len(), 2);
    assert_ne!(peers[0], peers[1], "second call reused the first connection");
    Ok(())
}

#[tokio::test]
async fn fee_is_posted_as_form_and_parsed() -> anyhow::Result<()> {
    let (url, seen) = trusted_server(vec![], "0.0001\n").await?;
    let amount = Amount::from_sat(2_500_000);

    let fee = source()?.get_fee(&url, 250, amount).await?;
    assert_eq!(fee, Amount::from_sat(10_000));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, "/getfee");
    assert_eq!(seen[0].1, "application/x-www-form-urlencoded");
    let body = String::from_utf8(seen[0].2.clone())?;
    let (bytes, sent_amount) = body
        .strip_prefix("bytes=")
        .and_then(|b| b.split_once("&amount="))
        .ok_or_else(|| anyhow::anyhow!("unexpected form {body}"))?;
    assert_eq!(bytes, "250");
    assert_eq!(Amount::from_str_in(sent_amount, Denomination::Bitcoin)?, amount);
    Ok(())
}

#[tokio::test]
async fn garbage_fee_is_a_decode_error() -> anyhow::Result<()> {
    let (url, _) = trusted_server(vec![], "lots").await?;
    let err = source()?
        .get_fee(&url, 250, Amount::from_sat(1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "{err}");
    Ok(())
}

/// One-block chain whose head is `header`.
struct OneBlock(BlockHeader);

#[async_trait]
impl ChainCursor for OneBlock {
    async fn head(&self) -> anyhow::Result<BlockHeader> {
        Ok(self.0)
    }
    async fn previous(&self, _h: &BlockHeader) -> anyhow::Result<Option<BlockHeader>> {
        Ok(None)
    }
}

#[tokio::test]
async fn store_fails_over_from_dead_server_over_http() -> anyhow::Result<()> {
    use bitcoin::{
        block::Version, hash_types::TxMerkleNode, hashes::Hash as _, pow::CompactTarget, BlockHash,
    };

    let header = BlockHeader {
        version: Version::from_consensus(2),
        prev_blockhash: BlockHash::all_zeros(),
        merkle_root: TxMerkleNode::all_zeros(),
        time: 0,
        bits: CompactTarget::from_consensus(0x207fffff),
        nonce: 0,
    };
    let hash = header.block_hash();
    let key = TruncatedHash::from_block_hash(&hash);

    let (live, seen) = trusted_server(key.as_bytes().to_vec(), "0.0002").await?;
    let servers = ServerList::new(vec![dead_server().await?, live]);

    let dir = tempdir()?;
    let cfg = ValidHashConfig::default()
        .with_grace_period(Duration::ZERO)
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    let store = ValidHashStore::open_with_config(dir.path().join("valid.bin"), servers, cfg)?;

    assert!(store.is_valid(hash, &OneBlock(header), false).await?);
    assert_eq!(store.cached_hashes().await, vec![key]);
    assert!(!store.servers().invalidated());

    // Locator was the single 32-byte head hash.
    assert_eq!(seen.lock().unwrap()[0].2, hash.to_byte_array().to_vec());

    // The last working server answers fee quotes.
    let fee = store.estimate_fee(226, Amount::from_sat(100_000)).await?;
    assert_eq!(fee, Amount::from_sat(20_000));
    Ok(())
}
