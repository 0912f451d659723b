//! Media storage
//!
//! The upload collaborator: takes file bytes plus a kind hint and returns a
//! durable public URL, or fails. Services never persist a URL that came from
//! a failed upload.

mod media;

pub use media::{MediaKind, MediaStore, S3MediaStore};

#[cfg(test)]
pub use media::MockMediaStore;

pub(crate) fn build_s3_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
