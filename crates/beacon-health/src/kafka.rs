//! Minimal Kafka wire codec: just enough of the `Metadata` API to find the
//! cluster controller a broker currently reports.
//!
//! Frames are a big-endian `i32` length followed by the payload. Requests use
//! header v1 (api key, api version, correlation id, client id) and `Metadata`
//! v1, the first version whose response carries `controller_id`.

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const METADATA_API_KEY: i16 = 3;
pub const METADATA_API_VERSION: i16 = 1;
/// Upper bound for a response frame; a metadata reply without topics is tiny.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid frame length {0}")]
    InvalidLength(i32),
    #[error("frame of {0} bytes exceeds limit")]
    FrameTooLarge(usize),
    #[error("truncated response while reading {0}")]
    Truncated(&'static str),
    #[error("invalid utf-8 in {0}")]
    Utf8(&'static str),
    #[error("correlation id mismatch: sent {sent}, received {received}")]
    CorrelationMismatch { sent: i32, received: i32 },
    #[error("no controller elected")]
    NoController,
    #[error("controller {0} missing from broker list")]
    UnknownController(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMetadata {
    pub node_id: i32,
    pub host: String,
    pub port: i32,
    pub rack: Option<String>,
}

impl BrokerMetadata {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    pub brokers: Vec<BrokerMetadata>,
    pub controller_id: i32,
}

impl MetadataResponse {
    /// The broker entry of the elected controller.
    pub fn controller(&self) -> Result<&BrokerMetadata, WireError> {
        if self.controller_id < 0 {
            return Err(WireError::NoController);
        }
        self.brokers
            .iter()
            .find(|b| b.node_id == self.controller_id)
            .ok_or(WireError::UnknownController(self.controller_id))
    }

    /// Encode as a v1 response frame (length prefix included) with an empty topic list.
    pub fn encode(&self, correlation_id: i32) -> BytesMut {
        let mut body = BytesMut::new();
        body.put_i32(correlation_id);
        body.put_i32(self.brokers.len() as i32);
        for broker in &self.brokers {
            body.put_i32(broker.node_id);
            put_string(&mut body, Some(&broker.host));
            body.put_i32(broker.port);
            put_string(&mut body, broker.rack.as_deref());
        }
        body.put_i32(self.controller_id);
        body.put_i32(0);
        frame(body)
    }
}

fn frame(body: BytesMut) -> BytesMut {
    let mut out = BytesMut::with_capacity(4 + body.len());
    out.put_i32(body.len() as i32);
    out.extend_from_slice(&body);
    out
}

fn put_string(buf: &mut BytesMut, value: Option<&str>) {
    match value {
        None => buf.put_i16(-1),
        Some(s) => {
            let bytes = &s.as_bytes()[..s.len().min(i16::MAX as usize)];
            buf.put_i16(bytes.len() as i16);
            buf.put_slice(bytes);
        }
    }
}

/// Encode a `Metadata` v1 request asking for no topics.
pub fn encode_metadata_request(correlation_id: i32, client_id: &str) -> BytesMut {
    let mut body = BytesMut::new();
    body.put_i16(METADATA_API_KEY);
    body.put_i16(METADATA_API_VERSION);
    body.put_i32(correlation_id);
    put_string(&mut body, Some(client_id));
    body.put_i32(0);
    frame(body)
}

fn get_i16(buf: &mut &[u8], what: &'static str) -> Result<i16, WireError> {
    if buf.remaining() < 2 {
        return Err(WireError::Truncated(what));
    }
    Ok(buf.get_i16())
}

fn get_i32(buf: &mut &[u8], what: &'static str) -> Result<i32, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::Truncated(what));
    }
    Ok(buf.get_i32())
}

fn get_string(buf: &mut &[u8], what: &'static str) -> Result<Option<String>, WireError> {
    let len = get_i16(buf, what)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    if buf.remaining() < len {
        return Err(WireError::Truncated(what));
    }
    let value = std::str::from_utf8(&buf[..len])
        .map_err(|_| WireError::Utf8(what))?
        .to_owned();
    buf.advance(len);
    Ok(Some(value))
}

/// Decode a `Metadata` v1 response payload (length prefix already stripped).
/// Topic metadata after `controller_id` is ignored.
pub fn decode_metadata_response(
    payload: &[u8],
    expected_correlation_id: i32,
) -> Result<MetadataResponse, WireError> {
    let mut buf = payload;
    let received = get_i32(&mut buf, "correlation id")?;
    if received != expected_correlation_id {
        return Err(WireError::CorrelationMismatch {
            sent: expected_correlation_id,
            received,
        });
    }

    let count = get_i32(&mut buf, "broker count")?.max(0) as usize;
    // Each broker entry is at least 14 bytes; don't trust the count for allocation.
    let mut brokers = Vec::with_capacity(count.min(buf.remaining() / 14));
    for _ in 0..count {
        let node_id = get_i32(&mut buf, "broker node id")?;
        let host = get_string(&mut buf, "broker host")?.unwrap_or_default();
        let port = get_i32(&mut buf, "broker port")?;
        let rack = get_string(&mut buf, "broker rack")?;
        brokers.push(BrokerMetadata {
            node_id,
            host,
            port,
            rack,
        });
    }
    let controller_id = get_i32(&mut buf, "controller id")?;

    Ok(MetadataResponse {
        brokers,
        controller_id,
    })
}

/// Read one length-prefixed frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, WireError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_i32().await?;
    if len < 0 {
        return Err(WireError::InvalidLength(len));
    }
    let len = len as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Send a metadata request over `stream` and decode the reply.
pub async fn fetch_metadata<S>(
    stream: &mut S,
    correlation_id: i32,
    client_id: &str,
) -> Result<MetadataResponse, WireError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = encode_metadata_request(correlation_id, client_id);
    stream.write_all(&request).await?;
    stream.flush().await?;
    let payload = read_frame(stream).await?;
    decode_metadata_response(&payload, correlation_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_broker_metadata(controller_id: i32) -> MetadataResponse {
        MetadataResponse {
            brokers: vec![
                BrokerMetadata {
                    node_id: 1,
                    host: "kafka-1".into(),
                    port: 9092,
                    rack: None,
                },
                BrokerMetadata {
                    node_id: 2,
                    host: "kafka-2".into(),
                    port: 9093,
                    rack: Some("eu-west-1a".into()),
                },
            ],
            controller_id,
        }
    }

    #[test]
    fn request_layout_matches_metadata_v1() {
        let frame = encode_metadata_request(7, "beacon");
        let mut expected = Vec::new();
        expected.extend_from_slice(&20i32.to_be_bytes()); // length
        expected.extend_from_slice(&3i16.to_be_bytes()); // api key
        expected.extend_from_slice(&1i16.to_be_bytes()); // api version
        expected.extend_from_slice(&7i32.to_be_bytes()); // correlation id
        expected.extend_from_slice(&6i16.to_be_bytes());
        expected.extend_from_slice(b"beacon");
        expected.extend_from_slice(&0i32.to_be_bytes()); // no topics
        assert_eq!(&frame[..], &expected[..]);
    }

    #[test]
    fn decodes_controller_from_broker_list() {
        let frame = two_broker_metadata(2).encode(11);
        let resp = decode_metadata_response(&frame[4..], 11).unwrap();
        assert_eq!(resp.brokers.len(), 2);
        assert_eq!(resp.brokers[1].rack.as_deref(), Some("eu-west-1a"));
        assert_eq!(resp.controller().unwrap().address(), "kafka-2:9093");
    }

    #[test]
    fn no_elected_controller_is_an_error() {
        let resp = two_broker_metadata(-1);
        assert!(matches!(resp.controller(), Err(WireError::NoController)));
    }

    #[test]
    fn controller_outside_broker_list_is_an_error() {
        let resp = two_broker_metadata(9);
        assert!(matches!(resp.controller(), Err(WireError::UnknownController(9))));
    }

    #[test]
    fn rejects_mismatched_correlation_id() {
        let frame = two_broker_metadata(1).encode(3);
        let err = decode_metadata_response(&frame[4..], 4).unwrap_err();
        assert!(matches!(
            err,
            WireError::CorrelationMismatch { sent: 4, received: 3 }
        ));
    }

    #[test]
    fn truncated_payload_is_reported() {
        let frame = two_broker_metadata(1).encode(3);
        let cut = &frame[4..frame.len() - 10];
        assert!(matches!(
            decode_metadata_response(cut, 3),
            Err(WireError::Truncated(_))
        ));
    }

    #[tokio::test]
    async fn fetch_metadata_round_trips_over_a_duplex_stream() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let broker = tokio::spawn(async move {
            let request = read_frame(&mut server).await.unwrap();
            let correlation_id = i32::from_be_bytes([request[4], request[5], request[6], request[7]]);
            server
                .write_all(&two_broker_metadata(1).encode(correlation_id))
                .await
                .unwrap();
        });

        let resp = fetch_metadata(&mut client, 42, "beacon").await.unwrap();
        assert_eq!(resp.controller().unwrap().address(), "kafka-1:9092");
        broker.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_before_allocation() {
        let (mut client, mut server) = tokio::io::duplex(64);
        server.write_i32(i32::MAX).await.unwrap();
        assert!(matches!(
            read_frame(&mut client).await,
            Err(WireError::FrameTooLarge(_))
        ));
    }
}
