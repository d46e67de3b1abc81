//! End-to-end builds of small sites on disk.

use quire::{
    config::SiteConfig,
    logger::set_quiet,
    page::source::FsContentSource,
    site::{BuildError, FsSink, Site, XML_HEADER},
    template::FsTemplateSource,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

fn write(root: &Path, path: &str, text: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn site(config: &str) -> (TempDir, SiteConfig) {
    set_quiet(true);
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quire.toml", config);
    let mut config = SiteConfig::from_path(&dir.path().join("quire.toml")).unwrap();
    config.update_path_with_root(dir.path());
    (dir, config)
}

fn build(config: &SiteConfig) -> Result<PathBuf, BuildError> {
    let content = FsContentSource::new(
        &config.build.content,
        &config.base.language,
        &config.base.all_languages(),
    );
    let theme_layouts = config.theme_layouts();
    let layouts = FsTemplateSource::new(&config.build.layouts, theme_layouts.as_deref());
    let sink = FsSink::new(&config.build.output, config.build.clean).unwrap();
    Site::new(config, &content, &layouts).build(&sink)?;
    Ok(config.build.output.clone())
}

fn read(output: &Path, path: &str) -> String {
    fs::read_to_string(output.join(path)).unwrap()
}

#[test]
fn test_build_blog() {
    let (dir, config) = site(
        r#"
        [base]
        title = "Notes"
        url = "https://notes.example.org/"

        [base.params]
        Tagline = "short notes"

        [build]
        theme = "plain"

        [build.rss]
        enable = true
        "#,
    );
    let root = dir.path();

    write(root, "content/_index.md", "+++\ntitle = \"Welcome\"\n+++\nhello");
    write(
        root,
        "content/posts/first.md",
        "+++\ntitle = \"First\"\ndate = \"2024-03-01\"\ntags = [\"Rust\"]\n+++\nSee {{< ref \"second.md\" >}}.",
    );
    write(
        root,
        "content/posts/second.md",
        "{\"title\": \"Second\", \"date\": \"2024-02-01\", \"tags\": [\"rust\", \"web\"]}\n![map](/img/map.png)",
    );
    write(root, "content/posts/trip/index.md", "+++\ntitle = \"Trip\"\n+++\n");
    write(root, "content/posts/trip/photo.jpg", "jpeg");

    write(root, "layouts/_default/single.html", "<h1>{{ .Title }}</h1>{{ .Content }}<p>{{ .Site.Params.TAGLINE }}</p>");
    write(root, "themes/plain/layouts/_default/single.html", "theme single");
    write(
        root,
        "themes/plain/layouts/_default/list.html",
        "<h1>{{ .Title }}</h1>{{ range .Pages }}<a href=\"{{ .RelPermalink }}\">{{ .Title }}</a>{{ end }}",
    );
    write(root, "themes/plain/layouts/index.html", "{{ .Title }}|{{ .Content }}|{{ len .Pages }}");

    let output = build(&config).unwrap();

    let first = read(&output, "posts/first/index.html");
    assert!(first.starts_with("<h1>First</h1>"));
    assert!(first.contains("See https://notes.example.org/posts/second/."));
    assert!(first.contains("<p>short notes</p>"));

    let second = read(&output, "posts/second/index.html");
    assert!(second.contains("src=\"https://notes.example.org/img/map.png\""));

    assert_eq!(read(&output, "index.html"), "Welcome|<p>hello</p>\n|3");
    assert!(read(&output, "posts/index.html").starts_with("<h1>Posts</h1>"));
    assert!(read(&output, "tags/rust/index.html").contains("First"));

    let feed = read(&output, "posts/index.xml");
    assert!(feed.starts_with(XML_HEADER));
    assert!(feed.contains("<link>https://notes.example.org/posts/first/</link>"));

    assert_eq!(read(&output, "posts/trip/photo.jpg"), "jpeg");
}

#[test]
fn test_build_without_content() {
    let (dir, config) = site("[base]\ntitle = \"Empty\"\n");
    write(dir.path(), "layouts/_default/single.html", "x");

    let err = build(&config).unwrap_err();
    assert!(matches!(err, BuildError::NoContentFound { .. }));
    assert!(fs::read_dir(&config.build.output).unwrap().next().is_none());
}

#[test]
fn test_front_matter_error_is_positioned() {
    let (dir, config) = site("[base]\ntitle = \"Broken\"\n");
    write(dir.path(), "content/bad.md", "+++\ntitle = \n+++\n");

    let err = build(&config).unwrap_err();
    let BuildError::FrontMatter(err) = err else {
        panic!("expected a front matter error");
    };
    assert_eq!(err.position.filename, "bad.md");
    assert!(err.position.line >= 2);
}
