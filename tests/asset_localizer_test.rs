mod common;

use futures::future::join_all;
use pagebake::asset_localizer::{asset_path_for, url_hash};
use pagebake::{AssetType, FetchError};
use url::Url;

use common::{
    create_asset_mock, create_error_mock, create_test_dir, setup_mock_server, test_config,
    test_localizer, test_url,
};

#[tokio::test]
async fn test_cached_image_is_returned_without_network() {
    let dir = create_test_dir().unwrap();
    let config = test_config(dir.path(), "http://src.test");
    let localizer = test_localizer(config.clone());

    // Nothing listens on src.test; a pre-existing file must short-circuit
    let url = Url::parse("http://src.test/image.png").unwrap();
    let path = asset_path_for(&url, AssetType::Image, config.output_dir(), "/assets");
    std::fs::create_dir_all(path.fs_path.parent().unwrap()).unwrap();
    std::fs::write(&path.fs_path, b"png").unwrap();

    let local = localizer.localize(&url, AssetType::Image).await;
    assert_eq!(
        local,
        format!("/assets/images/{}.png", url_hash("http://src.test/image.png"))
    );
}

#[tokio::test]
async fn test_second_localization_does_not_fetch() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let mock = server
        .mock("GET", "/logo.svg")
        .with_status(200)
        .with_header("content-type", "image/svg+xml")
        .with_body("<svg></svg>")
        .expect(1)
        .create_async()
        .await;

    let config = test_config(dir.path(), &server.url());
    let localizer = test_localizer(config);
    let url = Url::parse(&test_url(&server, "/logo.svg")).unwrap();

    let first = localizer.localize(&url, AssetType::Image).await;
    let second = localizer.localize(&url, AssetType::Image).await;

    assert_eq!(first, second);
    assert!(first.starts_with("/assets/images/"));
    assert!(first.ends_with(".svg"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_localizations_converge() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let _mock = create_asset_mock(&mut server, "/font.woff2", "font/woff2", "woff2-bytes").await;

    let config = test_config(dir.path(), &server.url());
    let localizer = test_localizer(config.clone());
    let url = Url::parse(&test_url(&server, "/font.woff2")).unwrap();

    let results = join_all((0..8).map(|_| localizer.localize(&url, AssetType::Font))).await;

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    let path = asset_path_for(&url, AssetType::Font, config.output_dir(), "/assets");
    assert_eq!(std::fs::read(&path.fs_path).unwrap(), b"woff2-bytes");
}

#[tokio::test]
async fn test_failed_fetch_returns_original_url() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let _mock = create_error_mock(&mut server, "/missing.png", 404).await;

    let config = test_config(dir.path(), &server.url());
    let localizer = test_localizer(config.clone());
    let url = Url::parse(&test_url(&server, "/missing.png")).unwrap();

    assert_eq!(localizer.localize(&url, AssetType::Image).await, url.as_str());
    assert!(!localizer.is_cached(&url, AssetType::Image).await);

    match localizer.try_localize(&url, AssetType::Image).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_size_limit_is_enforced() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let _mock = create_asset_mock(&mut server, "/big.png", "image/png", "0123456789").await;

    let config = std::sync::Arc::new(
        pagebake::BakeConfig::builder()
            .output_dir(dir.path())
            .source_origin(server.url())
            .max_binary_size(4)
            .build()
            .unwrap(),
    );
    let localizer = test_localizer(config);
    let url = Url::parse(&test_url(&server, "/big.png")).unwrap();

    assert!(matches!(
        localizer.try_localize(&url, AssetType::Image).await,
        Err(FetchError::TooLarge { limit: 4, .. })
    ));
    assert_eq!(localizer.localize(&url, AssetType::Image).await, url.as_str());
}

#[tokio::test]
async fn test_authorization_header_is_sent() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let mock = server
        .mock("GET", "/private.js")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body("console.log(1)")
        .expect(1)
        .create_async()
        .await;

    let config = std::sync::Arc::new(
        pagebake::BakeConfig::builder()
            .output_dir(dir.path())
            .source_origin(server.url())
            .auth_header("Bearer secret")
            .build()
            .unwrap(),
    );
    let localizer = test_localizer(config);
    let url = Url::parse(&test_url(&server, "/private.js")).unwrap();

    let local = localizer.localize(&url, AssetType::Script).await;
    assert!(local.starts_with("/assets/scripts/"));
    assert!(local.ends_with(".js"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_extension_ignores_query_string() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let _mock = server
        .mock("GET", "/photo.JPG")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("jpg")
        .create_async()
        .await;

    let config = test_config(dir.path(), &server.url());
    let localizer = test_localizer(config);
    let url = Url::parse(&test_url(&server, "/photo.JPG?w=200")).unwrap();

    let local = localizer.localize(&url, AssetType::Image).await;
    assert!(local.ends_with(".jpg"), "unexpected path {local}");
}
