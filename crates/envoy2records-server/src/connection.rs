// Per-connection stream sessions
//
// One connection carries one logical metrics stream: length-delimited frames,
// each holding an encoded stream message. Clean EOF completes the stream,
// decode or transport errors fail it; both paths acknowledge the stream with
// an empty response frame before the session state is released.

use anyhow::Result;
use bytes::Bytes;
use envoy2records_handlers::{MetricStreamHandler, MetricStreamSession};
use envoy2records_proto::{decode_stream_message, StreamMetricsResponse};
use futures::SinkExt;
use prost::Message;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::debug;
use vrl::value::Value;

use crate::sink::ChannelReceiver;

/// Serve one inbound metrics stream over a framed byte transport.
pub async fn run_connection<S>(stream: S, receiver: ChannelReceiver) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut frames = FramedRead::new(read_half, LengthDelimitedCodec::new());
    let mut ack = FramedWrite::new(write_half, LengthDelimitedCodec::new());

    let mut session = MetricStreamSession::new(MetricStreamHandler::new(receiver));

    // None = clean EOF, Some = the failure that ended the stream.
    let terminal_error = loop {
        match frames.next().await {
            Some(Ok(frame)) => match decode_stream_message(frame.as_ref()) {
                Ok(message) => session.on_next(&Value::from(message)),
                Err(error) => break Some(error.to_string()),
            },
            Some(Err(error)) => break Some(error.to_string()),
            None => break None,
        }
    };

    // Acknowledge the outward stream first, then release session state; the
    // peer is expected to open a fresh stream afterwards.
    ack.send(Bytes::from(StreamMetricsResponse::default().encode_to_vec()))
        .await?;
    ack.close().await?;

    match terminal_error {
        None => {
            session.on_completed();
            debug!("metrics stream completed");
        }
        Some(error) => session.on_error(&error),
    }

    Ok(())
}
