//! gzip content coding for requests and responses.

use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

/// Compresses responses for clients sending `Accept-Encoding: gzip`.
pub fn response_layer() -> CompressionLayer {
    CompressionLayer::new().gzip(true)
}

/// Inflates request bodies sent with `Content-Encoding: gzip`.
///
/// Bodies with an unsupported encoding are answered with 415.
pub fn request_layer() -> RequestDecompressionLayer {
    RequestDecompressionLayer::new().gzip(true)
}
