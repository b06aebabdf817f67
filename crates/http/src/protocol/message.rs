use bytes::Bytes;

/// A unit of request input produced by the [`RequestDecoder`](crate::codec::RequestDecoder).
///
/// The request line and header lines arrive as [`Message::Line`] with the line
/// terminator stripped; an upload body arrives once, whole, as [`Message::Body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// One line of the request head, without its `\r\n` or `\n` terminator
    Line(Bytes),
    /// The complete request body, exactly as long as the requested length
    Body(Bytes),
}

