//! HTTP archive fetching against a mock server

use flate2::Compression;
use flate2::write::GzEncoder;
use packrender_repo::{DefaultFetcherFactory, FetchError, FetcherFactory, SourceIdentifier};
use sha2::{Digest, Sha256};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pack_archive() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for (name, content) in [
        ("web/Pack.yaml", "apiVersion: packrender/v1\nmetadata:\n  name: web\n  version: 1.0.0\n"),
        ("web/values.yaml", "replicas: 1\n"),
        ("web/templates/service.yaml", "kind: Service\n"),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

async fn serve(server: &MockServer, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path("/packs/web-1.0.0.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_downloads_and_unwraps_archive() {
    let server = MockServer::start().await;
    serve(&server, pack_archive()).await;

    let dest = tempfile::tempdir().unwrap();
    let source = SourceIdentifier::new(format!("{}/packs/web-1.0.0.tgz", server.uri()));

    let fetcher = DefaultFetcherFactory::new().create(&source, dest.path()).unwrap();
    fetcher.fetch().await.unwrap();

    assert!(dest.path().join("Pack.yaml").is_file());
    assert_eq!(
        std::fs::read_to_string(dest.path().join("templates/service.yaml")).unwrap(),
        "kind: Service\n"
    );
}

#[tokio::test]
async fn test_checksum_verified() {
    let server = MockServer::start().await;
    let archive = pack_archive();
    let digest = hex::encode(Sha256::digest(&archive));
    serve(&server, archive).await;

    let dest = tempfile::tempdir().unwrap();
    let good = SourceIdentifier::new(format!(
        "{}/packs/web-1.0.0.tgz?checksum=sha256:{}",
        server.uri(),
        digest
    ));
    DefaultFetcherFactory::new()
        .create(&good, dest.path())
        .unwrap()
        .fetch()
        .await
        .unwrap();

    let bad = SourceIdentifier::new(format!(
        "{}/packs/web-1.0.0.tgz?checksum=sha256:{}",
        server.uri(),
        "0".repeat(64)
    ));
    let err = DefaultFetcherFactory::new()
        .create(&bad, dest.path())
        .unwrap()
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ChecksumMismatch { .. }));
}

#[tokio::test]
async fn test_bearer_token_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private/web.tgz"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pack_archive()))
        .expect(1)
        .mount(&server)
        .await;

    let dest = tempfile::tempdir().unwrap();
    let source = SourceIdentifier::new(format!("{}/private/web.tgz", server.uri()));

    DefaultFetcherFactory::new()
        .with_bearer_token("s3cret")
        .create(&source, dest.path())
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert!(dest.path().join("values.yaml").is_file());
}

#[tokio::test]
async fn test_http_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dest = tempfile::tempdir().unwrap();
    let source = SourceIdentifier::new(format!("{}/missing.tgz", server.uri()));

    let err = DefaultFetcherFactory::new()
        .create(&source, dest.path())
        .unwrap()
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Http { status: 404, .. }));
}

#[tokio::test]
async fn test_not_an_archive() {
    let server = MockServer::start().await;
    serve(&server, b"<html>login</html>".to_vec()).await;

    let dest = tempfile::tempdir().unwrap();
    let source = SourceIdentifier::new(format!("{}/packs/web-1.0.0.tgz", server.uri()));

    let err = DefaultFetcherFactory::new()
        .create(&source, dest.path())
        .unwrap()
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Archive { .. }));
}
