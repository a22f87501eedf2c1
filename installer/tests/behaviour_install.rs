//! Behaviour-driven tests for end-to-end installation.
//!
//! These scenarios run the install pipeline with the real zip extractor
//! against stubbed listing pages and a stubbed downloader, so no network is
//! involved. Tests use the rstest-bdd mutable world pattern.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use solr_installer::catalog::VersionTarget;
use solr_installer::config::InstallerConfig;
use solr_installer::download::{ArtefactDownloader, DownloadError, DownloadResult};
use solr_installer::error::InstallerError;
use solr_installer::extraction::ZipExtractor;
use solr_installer::listing::{FetchError, PageFetcher};
use solr_installer::pipeline::{InstallContext, InstallReport, install};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const ARCHIVE: &str = "http://archive.apache.org/dist/lucene/solr/";
const REDIRECTOR: &str = "https://www.apache.org/dyn/closer.lua/lucene/solr/";

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Serves canned listing pages; the redirector answers from a queue.
#[derive(Default)]
struct StubFetcher {
    suggestions: RefCell<VecDeque<String>>,
    pages: HashMap<String, String>,
}

impl PageFetcher for StubFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        if url == REDIRECTOR {
            let next = self.suggestions.borrow_mut().pop_front().ok_or_else(|| {
                FetchError::Http {
                    url: url.to_owned(),
                    reason: "no more suggestions".to_owned(),
                }
            })?;
            return Ok(redirector_page(&next));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_owned(),
            })
    }
}

/// Writes a prepared archive and records requested URLs.
#[derive(Default)]
struct StubDownloader {
    archive: Vec<u8>,
    requested: RefCell<Vec<String>>,
}

impl ArtefactDownloader for StubDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult, DownloadError> {
        self.requested.borrow_mut().push(url.to_owned());
        std::fs::write(dest, &self.archive).map_err(|source| DownloadError::CreateFile {
            path: dest.to_path_buf(),
            source,
        })?;
        Ok(DownloadResult {
            path: dest.to_path_buf(),
            bytes: self.archive.len() as u64,
        })
    }
}

fn anchors(entries: &str) -> String {
    entries
        .split(',')
        .map(|e| format!("<a href=\"{e}\">{e}</a>\n"))
        .collect()
}

fn archive_page(entries: &str) -> String {
    format!(
        "<html><body><h1>Index</h1><pre>Name</pre><hr><pre>{}</pre></body></html>",
        anchors(entries)
    )
}

fn mirror_page(entries: &str) -> String {
    format!(
        "<html><body><h1>Index</h1><pre>{}</pre></body></html>",
        anchors(entries)
    )
}

fn redirector_page(mirror: &str) -> String {
    format!(
        concat!(
            "<html><body><div>a</div><div>b</div>",
            "<div><p>x</p><p>y</p><p><a href=\"{m}\"><strong>{m}</strong></a></p></div>",
            "</body></html>"
        ),
        m = mirror
    )
}

fn zip_with_file(name: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(name, SimpleFileOptions::default().unix_permissions(0o755))
        .expect("start file");
    writer.write_all(b"payload").expect("write payload");
    writer.finish().expect("finish zip").into_inner()
}

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InstallWorld {
    fetcher: StubFetcher,
    downloader: StubDownloader,
    use_mirror: Option<bool>,
    sandbox: Option<TempDir>,
    destination: Option<PathBuf>,
    result: Option<Result<InstallReport, InstallerError>>,
}

#[fixture]
fn world() -> InstallWorld {
    InstallWorld::default()
}

impl InstallWorld {
    fn destination(&self) -> &Path {
        self.destination.as_deref().expect("install ran")
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("the archive lists \"{entries}\"")]
fn given_archive_lists(world: &mut InstallWorld, entries: String) {
    world
        .fetcher
        .pages
        .insert(ARCHIVE.to_owned(), archive_page(&entries));
}

#[given("the redirector suggests \"{first}\" then \"{second}\"")]
fn given_redirector_suggests(world: &mut InstallWorld, first: String, second: String) {
    world
        .fetcher
        .suggestions
        .borrow_mut()
        .extend([first, second]);
}

#[given("the mirror \"{url}\" lists \"{entries}\"")]
fn given_mirror_lists(world: &mut InstallWorld, url: String, entries: String) {
    world.fetcher.pages.insert(url, mirror_page(&entries));
}

#[given("a release archive containing \"{entry}\"")]
fn given_release_archive(world: &mut InstallWorld, entry: String) {
    world.downloader.archive = zip_with_file(&entry);
}

#[given("mirror mode is disabled")]
fn given_mirror_disabled(world: &mut InstallWorld) {
    world.use_mirror = Some(false);
}

#[when("\"{target}\" is installed")]
fn when_installed(world: &mut InstallWorld, target: String) {
    let sandbox = tempfile::tempdir().expect("temp dir");
    let mut config = InstallerConfig::defaults().expect("defaults");
    config.use_mirror = world.use_mirror.unwrap_or(true);
    config.download_dir = sandbox.path().join("downloads");
    config.destination = sandbox.path().join("root").join("solr-installation");

    let target: VersionTarget = target.parse().expect("infallible");
    let context = InstallContext {
        config: &config,
        fetcher: &world.fetcher,
        downloader: &world.downloader,
        extractor: &ZipExtractor,
        quiet: true,
    };
    world.result = Some(install(&context, &target, &mut std::io::sink()));
    world.destination = Some(config.destination.clone());
    world.sandbox = Some(sandbox);
}

#[then("the install succeeds with version \"{version}\"")]
fn then_install_succeeds(world: &mut InstallWorld, version: String) {
    let result = world.result.as_ref().expect("install ran");
    let report = result.as_ref().expect("install should succeed");
    assert_eq!(report.version.to_string(), version);
    assert!(report.download.path.is_file());
}

#[then("the download URL ends with \"{suffix}\"")]
fn then_download_url(world: &mut InstallWorld, suffix: String) {
    let requested = world.downloader.requested.borrow();
    let url = requested.last().expect("a download was requested");
    assert!(url.ends_with(&suffix), "{url} should end with {suffix}");
}

#[then("\"{entry}\" exists under the destination")]
fn then_entry_exists(world: &mut InstallWorld, entry: String) {
    let path = world.destination().join(&entry);
    assert!(path.is_file(), "{} should exist", path.display());
    let result = world.result.as_ref().expect("install ran");
    let report = result.as_ref().expect("install should succeed");
    assert!(report.extracted.contains(&path));
}

#[then("the install fails with \"{fragment}\"")]
fn then_install_fails(world: &mut InstallWorld, fragment: String) {
    let result = world.result.as_ref().expect("install ran");
    let err = result.as_ref().expect_err("install should fail");
    let message = err.to_string();
    assert!(
        message.contains(&fragment),
        "expected '{fragment}' in '{message}'"
    );
}

#[then("nothing was written outside the destination")]
fn then_nothing_outside(world: &mut InstallWorld) {
    let parent = world
        .destination()
        .parent()
        .expect("destination has a parent");
    assert!(!parent.join("escape.txt").exists());
}

#[then("no download was attempted")]
fn then_no_download(world: &mut InstallWorld) {
    assert!(world.downloader.requested.borrow().is_empty());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/install.feature",
    name = "Install the latest release from the archive"
)]
fn scenario_install_from_archive(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Skip mirrors that list no versions"
)]
fn scenario_skip_empty_mirrors(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Reject archives that escape the destination"
)]
fn scenario_reject_traversal(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Unknown versions fail before downloading"
)]
fn scenario_unknown_version(world: InstallWorld) {
    let _ = world;
}
