//! `multipart/x-mixed-replace` framing

use bytes::{BufMut, Bytes, BytesMut};

/// Part boundary marker
pub const BOUNDARY: &str = "frame";

/// Response content type announcing [`BOUNDARY`]
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Wrap one encoded image as a multipart part
///
/// Layout: `--frame\r\nContent-Type: <type>\r\n\r\n<payload>\r\n`
pub fn part(content_type: &str, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + content_type.len() + 32);

    buf.put_slice(b"--");
    buf.put_slice(BOUNDARY.as_bytes());
    buf.put_slice(b"\r\nContent-Type: ");
    buf.put_slice(content_type.as_bytes());
    buf.put_slice(b"\r\n\r\n");
    buf.put_slice(payload);
    buf.put_slice(b"\r\n");

    buf.freeze()
}

/// Shorthand for a JPEG part
pub fn jpeg_part(jpeg: &[u8]) -> Bytes {
    part("image/jpeg", jpeg)
}
