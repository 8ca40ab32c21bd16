//! Top-level archive run: walk courses, modules, and items, deciding per
//! item between a file download, a page render, or a skip.
//!
//! Strictly sequential: one item is fully processed, nested downloads
//! included, before the next begins, with a fixed politeness pause after
//! each top-level file download. The unit of failure isolation is a single
//! item — nothing here aborts the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::catalog::{self, Course, ModuleItem};
use crate::download::{self, DownloadStatus};
use crate::links::{FALLBACK_FILENAME, resolve_filename, sanitize_component};
use crate::page;
use crate::resolver::DIRECT_DOWNLOAD_MARKER;
use crate::session::{FetchError, Session};

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Files freshly downloaded.
    pub files_downloaded: usize,
    /// Pages rendered to Markdown.
    pub pages_rendered: usize,
    /// Items skipped (no content, already present, or unrecognized).
    pub items_skipped: usize,
    /// Items that failed (fetch or download errors).
    pub failures: usize,
}

/// Drives a full archive run for one LMS instance.
#[derive(Debug)]
pub struct Archiver {
    session: Session,
    root: PathBuf,
    delay: Duration,
}

impl Archiver {
    /// Creates an archiver writing under `root` with the given politeness
    /// pause between file downloads.
    pub fn new(session: Session, root: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            session,
            root: root.into(),
            delay,
        }
    }

    /// Fetches the dashboard and archives every visible course.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] only when the dashboard itself cannot be
    /// fetched; everything downstream is handled per item.
    pub async fn run(&self) -> Result<ArchiveStats, FetchError> {
        let dashboard_url = self.platform_url("courses");
        let dashboard = self.session.get_html(&dashboard_url).await?;
        let courses = catalog::parse_courses(&dashboard.body);
        info!(courses = courses.len(), "found courses");

        let mut stats = ArchiveStats::default();
        for course in &courses {
            self.process_course(course, &mut stats).await;
        }
        Ok(stats)
    }

    #[instrument(level = "info", skip(self, stats), fields(course = %course.name))]
    async fn process_course(&self, course: &Course, stats: &mut ArchiveStats) {
        let modules_url = self.platform_url(&format!("courses/{}/modules", course.id));
        let page = match self.session.get_html(&modules_url).await {
            Ok(page) => page,
            Err(error) => {
                warn!(%error, "failed to fetch modules page");
                stats.failures += 1;
                return;
            }
        };

        let modules = catalog::parse_modules(&page.body, self.session.base_url());
        info!(modules = modules.len(), "found modules");

        let course_dir = self.root.join(dir_name(&course.name));
        for module in &modules {
            let module_dir = course_dir.join(dir_name(&module.name));
            for item in &module.items {
                self.process_item(item, &module_dir, stats).await;
            }
        }
    }

    #[instrument(level = "debug", skip(self, stats), fields(item = %item.title))]
    async fn process_item(&self, item: &ModuleItem, module_dir: &Path, stats: &mut ArchiveStats) {
        let page = match self.session.get_html(&item.url).await {
            Ok(page) => page,
            Err(error) => {
                warn!(%error, "failed to fetch module item page");
                stats.failures += 1;
                return;
            }
        };

        // The landing fetch can resolve straight to the download endpoint.
        if page.final_url.as_str().contains(DIRECT_DOWNLOAD_MARKER) {
            let filename = resolve_filename(page.final_url.as_str(), &item.title);
            self.download_into(page.final_url.as_str(), &module_dir.join(filename), stats)
                .await;
            return;
        }

        if let Some((name, url)) = page::find_direct_file_link(&page.body, &page.final_url) {
            let filename = {
                let sanitized = sanitize_component(&name);
                if sanitized.is_empty() {
                    FALLBACK_FILENAME.to_string()
                } else {
                    sanitized
                }
            };
            self.download_into(&url, &module_dir.join(filename), stats)
                .await;
            return;
        }

        if page.final_url.path().contains("/pages/") {
            self.render_page(item, &page.body, module_dir, stats).await;
            return;
        }

        debug!(url = %page.final_url, "skipped (not a file or content page)");
        stats.items_skipped += 1;
    }

    async fn render_page(
        &self,
        item: &ModuleItem,
        page_html: &str,
        module_dir: &Path,
        stats: &mut ArchiveStats,
    ) {
        let Some(markdown) = page::render_page_markdown(&self.session, page_html, module_dir).await
        else {
            info!("page has no renderable content");
            stats.items_skipped += 1;
            return;
        };

        let save_path = module_dir.join(format!("{}.md", dir_name(&item.title)));
        let write_result = async {
            if let Some(parent) = save_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&save_path, markdown.as_bytes()).await
        }
        .await;

        match write_result {
            Ok(()) => {
                info!(path = %save_path.display(), "page saved as Markdown");
                stats.pages_rendered += 1;
            }
            Err(error) => {
                warn!(path = %save_path.display(), %error, "failed to write rendered page");
                stats.failures += 1;
            }
        }
    }

    async fn download_into(&self, url: &str, save_path: &Path, stats: &mut ArchiveStats) {
        match download::download_file(&self.session, url, save_path).await {
            Ok(DownloadStatus::AlreadyPresent) => {
                info!(path = %save_path.display(), "already downloaded");
                stats.items_skipped += 1;
            }
            Ok(DownloadStatus::Completed(_)) => {
                stats.files_downloaded += 1;
            }
            Err(error) => {
                warn!(path = %save_path.display(), %error, "download failed; skipping item");
                stats.failures += 1;
            }
        }
        // Fixed politeness pause; no adaptive backoff.
        tokio::time::sleep(self.delay).await;
    }

    fn platform_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.session.base_url().as_str().trim_end_matches('/'),
            path
        )
    }
}

/// Directory-safe form of a course/module/page title.
fn dir_name(title: &str) -> String {
    let sanitized = sanitize_component(title);
    if sanitized.is_empty() {
        "Untitled".to_string()
    } else {
        sanitized
    }
}
