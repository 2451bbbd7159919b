mod common;

use pagebake::asset_localizer::asset_path_for;
use pagebake::{AssetType, PageEntry, RenderedPage, rewrite_page};
use url::Url;

use common::{
    assert_no_host, create_asset_mock, create_error_mock, create_test_dir, setup_mock_server,
    test_config, test_context, test_url,
};

const SPRITE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><symbol id="star" viewBox="0 0 10 10"><path d="M5 0L10 10H0Z"></path></symbol></svg>"#;

#[tokio::test]
async fn test_full_page_is_self_contained() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let host = server.host_with_port();

    let mut mocks = Vec::new();
    for (path, content_type, body) in [
        ("/image.png", "image/png", "png-1x"),
        ("/image@2x.png", "image/png", "png-2x"),
        ("/wide.webp", "image/webp", "wide"),
        ("/narrow.webp", "image/webp", "narrow"),
        ("/bg.png", "image/png", "bg"),
        ("/bg.png.svg", "image/svg+xml", "<svg></svg>"),
        ("/hero.jpg", "image/jpeg", "hero"),
        ("/sprite.svg", "image/svg+xml", SPRITE),
        ("/app.css", "text/css", "body { background: url(/bg.png); }"),
        ("/app.js", "application/javascript", "console.log('app')"),
    ] {
        mocks.push(create_asset_mock(&mut server, path, content_type, body).await);
    }

    let html = r#"<!DOCTYPE html>
<html>
<head>
    <link rel="stylesheet" href="/app.css">
    <style>.hero { background: url(/hero.jpg); }</style>
    <script src="/app.js"></script>
</head>
<body>
    <img src="/image.png" srcset="/image.png 1x, /image@2x.png 2x" alt="logo">
    <picture><source srcset="/wide.webp 1200w, /narrow.webp 600w"></picture>
    <div style="background: url(/bg.png); mask: url(/bg.png.svg)"></div>
    <svg class="icon" role="img"><use href="/sprite.svg#star"></use></svg>
    <a href="/about">About</a>
    <a href="https://external.example/x">Elsewhere</a>
</body>
</html>"#;

    let rendered = RenderedPage {
        html: html.to_string(),
        stylesheets: vec![test_url(&server, "/app.css")],
        scripts: vec![test_url(&server, "/app.js")],
    };

    let config = test_config(dir.path(), &server.url());
    let pages = [PageEntry::new("/about", test_url(&server, "/about"))];
    let ctx = test_context(config.clone(), &pages);
    let page_url = Url::parse(&test_url(&server, "/docs/page")).unwrap();

    let baked = rewrite_page(&ctx, &page_url, &rendered).await.unwrap();

    let local = |path: &str, asset_type: AssetType| {
        let url = Url::parse(&test_url(&server, path)).unwrap();
        asset_path_for(&url, asset_type, config.output_dir(), "/assets").public_path
    };

    // Host purity
    assert_no_host(&baked.document_html, &host);
    for style in &baked.inline_styles {
        assert_no_host(style, &host);
    }

    // Images and srcset candidates keep their descriptors and order
    assert!(baked.body_html.contains(&format!("src=\"{}\"", local("/image.png", AssetType::Image))));
    assert!(baked.body_html.contains(&format!(
        "{} 1x, {} 2x",
        local("/image.png", AssetType::Image),
        local("/image@2x.png", AssetType::Image)
    )));
    assert!(baked.body_html.contains(&format!(
        "{} 1200w, {} 600w",
        local("/wide.webp", AssetType::Image),
        local("/narrow.webp", AssetType::Image)
    )));

    // A URL that prefixes another does not clobber it
    assert!(baked.body_html.contains(&format!("url('{}')", local("/bg.png", AssetType::Image))));
    assert!(baked.body_html.contains(&format!("url('{}')", local("/bg.png.svg", AssetType::Image))));

    // Sprite inlined
    assert!(!baked.body_html.contains("<use"));
    assert!(baked.body_html.contains("viewBox=\"0 0 10 10\""));
    assert!(baked.body_html.contains("M5 0L10 10H0Z"));
    assert!(baked.body_html.contains("class=\"icon\""));

    // Anchors
    assert!(baked.body_html.contains("href=\"/pages/about\""));
    assert!(baked.body_html.contains("href=\"https://external.example/x\""));

    // Style blocks moved to the side-list, discovered tags removed
    assert!(!baked.document_html.contains("<style"));
    assert!(!baked.document_html.contains("<link"));
    assert!(!baked.document_html.contains("<script"));
    assert_eq!(baked.inline_styles.len(), 1);
    assert!(baked.inline_styles[0].contains(&local("/hero.jpg", AssetType::Image)));

    assert_eq!(baked.stylesheets, vec![local("/app.css", AssetType::Stylesheet)]);
    assert_eq!(baked.scripts, vec![local("/app.js", AssetType::Script)]);

    let stored_css = std::fs::read_to_string(
        config
            .output_dir()
            .join("assets")
            .join(baked.stylesheets[0].trim_start_matches("/assets/")),
    )
    .unwrap();
    assert!(stored_css.contains(&local("/bg.png", AssetType::Image)));
}

#[tokio::test]
async fn test_failed_asset_degrades_to_absolute_url() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let _missing = create_error_mock(&mut server, "/missing.png", 404).await;

    let rendered = RenderedPage {
        html: r#"<html><body><img src="missing.png"></body></html>"#.to_string(),
        ..RenderedPage::default()
    };

    let config = test_config(dir.path(), &server.url());
    let ctx = test_context(config, &[]);
    let page_url = Url::parse(&test_url(&server, "/docs/")).unwrap();

    let baked = rewrite_page(&ctx, &page_url, &rendered).await.unwrap();

    assert_eq!(
        baked.body_html,
        format!("<img src=\"{}\">", test_url(&server, "/docs/missing.png"))
    );
}

#[tokio::test]
async fn test_unresolvable_sprites_are_left_alone() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let _sprite = create_asset_mock(&mut server, "/sprite.svg", "image/svg+xml", SPRITE).await;

    let html = r##"<html><body>
<svg id="a"><use href="#local-symbol"></use></svg>
<svg id="b"><use href="https://cdn.example/icons.svg#star"></use></svg>
<svg id="c"><use href="/sprite.svg#missing"></use></svg>
</body></html>"##;
    let rendered = RenderedPage {
        html: html.to_string(),
        ..RenderedPage::default()
    };

    let config = test_config(dir.path(), &server.url());
    let ctx = test_context(config, &[]);
    let page_url = Url::parse(&test_url(&server, "/")).unwrap();

    let baked = rewrite_page(&ctx, &page_url, &rendered).await.unwrap();

    assert!(baked.body_html.contains("href=\"#local-symbol\""));
    assert!(baked.body_html.contains("href=\"https://cdn.example/icons.svg#star\""));
    assert!(baked.body_html.contains("href=\"/sprite.svg#missing\""));
}

#[tokio::test]
async fn test_page_without_references_is_preserved() {
    let dir = create_test_dir().unwrap();
    let config = test_config(dir.path(), "http://src.test");
    let ctx = test_context(config, &[]);
    let page_url = Url::parse("http://src.test/plain").unwrap();

    let rendered = RenderedPage {
        html: "<html><head><title>Plain</title></head><body><h1>Hello</h1><p>World</p></body></html>"
            .to_string(),
        ..RenderedPage::default()
    };

    let baked = rewrite_page(&ctx, &page_url, &rendered).await.unwrap();

    assert_eq!(baked.body_html, "<h1>Hello</h1><p>World</p>");
    assert!(baked.document_html.contains("<title>Plain</title>"));
    assert!(baked.inline_styles.is_empty());
    assert!(baked.stylesheets.is_empty());
    assert!(baked.scripts.is_empty());
}

#[tokio::test]
async fn test_query_strings_survive_localization_and_fallback() {
    let dir = create_test_dir().unwrap();
    let mut server = setup_mock_server().await;
    let logo = server
        .mock("GET", "/logo.png?a=1;b=2")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body("png")
        .expect(1)
        .create_async()
        .await;
    let missing = server
        .mock("GET", "/missing.png?v123")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let rendered = RenderedPage {
        html: r#"<html><body><img src="/logo.png?a=1;b=2"><img src="/missing.png?v123"><a href="/search?q">Search</a></body></html>"#
            .to_string(),
        ..RenderedPage::default()
    };

    let config = test_config(dir.path(), &server.url());
    let ctx = test_context(config.clone(), &[]);
    let page_url = Url::parse(&test_url(&server, "/")).unwrap();

    let baked = rewrite_page(&ctx, &page_url, &rendered).await.unwrap();

    let logo_url = Url::parse(&test_url(&server, "/logo.png?a=1;b=2")).unwrap();
    let logo_path = asset_path_for(&logo_url, AssetType::Image, config.output_dir(), "/assets");
    assert!(baked.body_html.contains(&format!("src=\"{}\"", logo_path.public_path)));
    assert!(logo_path.fs_path.exists());

    assert!(
        baked
            .body_html
            .contains(&format!("src=\"{}\"", test_url(&server, "/missing.png?v123")))
    );
    assert!(
        baked
            .body_html
            .contains(&format!("href=\"{}\"", test_url(&server, "/search?q")))
    );

    logo.assert_async().await;
    missing.assert_async().await;
}
