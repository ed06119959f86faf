//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

mod common;

#[cfg(test)]
mod passing {
    use webclone::core::{clone_site, create_static_bundle, AssetKind, CloneJob};
    use webclone::network::Session;

    use crate::common::{offline_options, read, write_sample_site, FixedRenderer, SiteFixture};

    #[test]
    fn sample_site_end_to_end() {
        let site = SiteFixture::new();
        let page = write_sample_site(&site);
        let out = tempfile::tempdir().unwrap();

        let report = clone_site(page.as_str(), Some("sample"), &offline_options(out.path())).unwrap();
        let folder = out.path().join("sample");

        assert_eq!(report.folder, "sample");
        assert_eq!(report.title.as_deref(), Some("Fixture Page"));
        assert_eq!(report.failed(), 0);
        // site.css + bg.jpg + hero.png + a.png + tile.png + app.js
        assert_eq!(report.downloaded(), 6);

        let html = read(folder.join("index.html"));
        assert!(html.contains(r#"src="a.png""#));
        assert!(!html.contains("data-src"));
        assert!(html.contains(r#"href="https://fonts.googleapis.com/css2?family=Inter""#));
        assert_eq!(html.matches(r#"href="styles.css""#).count(), 1);
        assert!(!html.contains("css/site.css"));
        assert!(!html.contains("<style"));
        assert!(!html.contains("google-analytics"));
        assert!(html.contains(r#"src="app.js""#));

        let css = read(folder.join("styles.css"));
        assert!(css.contains("url(bg.jpg)"));
        assert!(css.contains("url('bg.jpg')"));
        assert!(css.contains("url('hero.png')"));
        assert!(!css.contains("../img"));

        for name in ["a.png", "bg.jpg", "hero.png", "tile.png", "app.js", "README.md"] {
            assert!(folder.join(name).is_file(), "missing {name}");
        }
        assert_eq!(std::fs::read(folder.join("bg.jpg")).unwrap(), b"bg-bytes");
    }

    #[test]
    fn background_style_is_rewritten_in_place() {
        let site = SiteFixture::new();
        let page = write_sample_site(&site);
        let out = tempfile::tempdir().unwrap();

        clone_site(page.as_str(), Some("bg"), &offline_options(out.path())).unwrap();
        let html = read(out.path().join("bg").join("index.html"));

        assert!(html.contains(
            r#"style="color: red; background: url('tile.png') no-repeat, url(data:image/png;base64,AAAA)""#
        ));
    }

    #[test]
    fn shared_stylesheet_resource_is_fetched_once() {
        let site = SiteFixture::new();
        let page = write_sample_site(&site);
        let out = tempfile::tempdir().unwrap();

        let report = clone_site(page.as_str(), Some("once"), &offline_options(out.path())).unwrap();

        let bg_fetches = report
            .outcomes_of(AssetKind::CssResource)
            .filter(|o| o.origin.ends_with("/img/bg.jpg"))
            .count();
        assert_eq!(bg_fetches, 1);
        assert!(report
            .outcomes_of(AssetKind::Background)
            .any(|o| o.origin.starts_with("data:image/png;base64") && !o.is_ok()));
    }

    #[test]
    fn readme_describes_the_clone() {
        let site = SiteFixture::new();
        let page = write_sample_site(&site);
        let out = tempfile::tempdir().unwrap();

        clone_site(page.as_str(), Some("docs"), &offline_options(out.path())).unwrap();
        let readme = read(out.path().join("docs").join("README.md"));

        assert!(readme.contains(page.as_str()));
        assert!(readme.contains("Cloned at: "));
        assert!(readme.contains("- `a.png`"));
        assert!(readme.contains("Open `index.html` in your web browser."));
    }

    #[test]
    fn rendered_dom_and_base_href_are_used() {
        let site = SiteFixture::new();
        site.write("assets/logo.png", b"logo");
        let job = CloneJob::new(site.url("page.html").as_str(), Some("based")).unwrap();
        let out = tempfile::tempdir().unwrap();
        let options = offline_options(out.path());
        let session = Session::new(&options).unwrap();
        let renderer = FixedRenderer(
            r#"<html><head><base href="assets/"></head><body><img src="logo.png"></body></html>"#
                .to_string(),
        );

        let report = create_static_bundle(&job, &renderer, &session, &options).unwrap();
        let html = read(report.output_dir.join("index.html"));

        assert!(html.contains(r#"src="logo.png""#));
        assert!(!html.contains("<base"));
        assert!(report.output_dir.join("logo.png").is_file());
        assert!(report.output_dir.join("styles.css").is_file());
    }

    #[test]
    fn failed_stylesheet_keeps_inline_styles() {
        let site = SiteFixture::new();
        let page = site.write(
            "index.html",
            r#"<html><head>
            <link rel="stylesheet" href="css/missing.css">
            <link rel="stylesheet" href="css/ok.css">
            <style>p{margin:0}</style>
            </head><body><p>text</p></body></html>"#,
        );
        site.write("css/ok.css", "h1{color:red}");
        let out = tempfile::tempdir().unwrap();

        let report = clone_site(page.as_str(), Some("partial"), &offline_options(out.path())).unwrap();
        let css = read(out.path().join("partial").join("styles.css"));

        assert!(css.contains("color:red"));
        assert!(css.contains("margin:0"));
        assert!(css.find("color:red") < css.find("margin:0"));
        assert_eq!(report.failed(), 1);
        assert!(report
            .outcomes_of(AssetKind::Stylesheet)
            .any(|o| o.is_failed() && o.origin.ends_with("css/missing.css")));
    }

    #[test]
    fn missing_image_keeps_original_reference() {
        let site = SiteFixture::new();
        let page = site.write(
            "index.html",
            r#"<html><body><img src="img/gone.png"><img src="data:image/gif;base64,R0lGOD"></body></html>"#,
        );
        let out = tempfile::tempdir().unwrap();

        let report = clone_site(page.as_str(), Some("gone"), &offline_options(out.path())).unwrap();
        let html = read(out.path().join("gone").join("index.html"));

        assert!(html.contains(r#"src="img/gone.png""#));
        assert!(html.contains(r#"src="data:image/gif;base64,R0lGOD""#));
        assert_eq!(report.failed(), 1);
    }
}

//  ███████╗ █████╗ ██╗██╗     ██╗███╗   ██╗ ██████╗
//  ██╔════╝██╔══██╗██║██║     ██║████╗  ██║██╔════╝
//  █████╗  ███████║██║██║     ██║██╔██╗ ██║██║  ███╗
//  ██╔══╝  ██╔══██║██║██║     ██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║██║███████╗██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚═╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod failing {
    use webclone::core::{clone_website, create_static_bundle, CloneError, CloneJob};
    use webclone::network::Session;

    use crate::common::{offline_options, FailingRenderer, SiteFixture};

    #[test]
    fn unreachable_page_writes_nothing() {
        let site = SiteFixture::new();
        let out = tempfile::tempdir().unwrap();
        let missing = site.url("nowhere/index.html");

        let message = clone_website(missing.as_str(), Some("nothing"), &offline_options(out.path()));

        assert!(message.starts_with("Error cloning website: "));
        let folder = out.path().join("nothing");
        assert!(!folder.join("index.html").exists());
        assert!(!folder.join("styles.css").exists());
    }

    #[test]
    fn render_failure_is_reported() {
        let out = tempfile::tempdir().unwrap();
        let options = offline_options(out.path());
        let session = Session::new(&options).unwrap();
        let job = CloneJob::new("https://unreachable.invalid/", None).unwrap();

        let result = create_static_bundle(&job, &FailingRenderer, &session, &options);

        assert!(matches!(result, Err(CloneError::Render(_))));
        assert!(!out.path().join("cloned-unreachable-invalid").exists());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let out = tempfile::tempdir().unwrap();

        let message = clone_website("not a url", None, &offline_options(out.path()));

        assert!(message.starts_with("Error cloning website: invalid URL \"not a url\""));
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert!(matches!(
            CloneJob::new("ftp://example.com/", None),
            Err(CloneError::InvalidUrl { .. })
        ));
    }
}
