//! File-backed storage for post pages, images, drafts and the blog index.
//!
//! ```text
//! <blog>/<name>.html        published pages
//! <images>/<name>           covers and uploads
//! <drafts>/<id>.json        drafts
//! <index>                   blog index page
//! ```
//!
//! Writes go through one lock so unique-name allocation and the index
//! read-modify-write never interleave between requests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::config::BlogConfig;
use crate::content::{ReduceOptions, extract_title};
use crate::debug;
use crate::post::Draft;
use crate::utils::date::DateTimeUtc;
use crate::utils::path::{checked_file_name, unique_file_name};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid file name `{0}`")]
    InvalidName(String),

    #[error("`{0}` not found")]
    NotFound(String),

    #[error("failed to access `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in `{}`", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

type Result<T, E = StoreError> = std::result::Result<T, E>;

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A published page, as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub filename: String,
    pub title: String,
    /// Last modification time.
    pub publish_date: DateTimeUtc,
    pub size: u64,
    pub url: String,
}

/// Creation and modification time of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostDates {
    /// Creation time where the platform records one, else `modified`.
    pub created: DateTimeUtc,
    pub modified: DateTimeUtc,
}

#[derive(Debug)]
pub struct Store {
    blog: PathBuf,
    images: PathBuf,
    drafts: PathBuf,
    index: PathBuf,
    titles: ReduceOptions,
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(config: &BlogConfig) -> Self {
        Self {
            blog: config.paths.blog.clone(),
            images: config.paths.images.clone(),
            drafts: config.paths.drafts.clone(),
            index: config.paths.index.clone(),
            titles: config.reduce.options(&config.site, None),
            write_lock: Mutex::new(()),
        }
    }

    // ========================================================================
    // posts
    // ========================================================================

    /// Write a new page under the first free variant of `filename`.
    pub fn save_post(&self, filename: &str, html: &str) -> Result<String> {
        let _guard = self.write_lock.lock();
        save_unique(&self.blog, checked(filename)?, html.as_bytes())
    }

    /// Overwrite an existing page.
    pub fn write_post(&self, filename: &str, html: &str) -> Result<()> {
        let path = self.post_path(filename)?;
        let _guard = self.write_lock.lock();
        if !path.is_file() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        fs::write(&path, html).map_err(io_err(&path))
    }

    pub fn read_post(&self, filename: &str) -> Result<String> {
        let path = self.post_path(filename)?;
        read_existing(&path, filename)
    }

    pub fn post_exists(&self, filename: &str) -> bool {
        self.post_path(filename).is_ok_and(|path| path.is_file())
    }

    pub fn post_dates(&self, filename: &str) -> Result<PostDates> {
        let path = self.post_path(filename)?;
        let meta = fs::metadata(&path).map_err(|err| not_found_or(err, filename, &path))?;
        let modified = meta
            .modified()
            .map_or_else(|_| DateTimeUtc::now(), DateTimeUtc::from_system_time);
        let created = meta
            .created()
            .map_or(modified, DateTimeUtc::from_system_time);
        Ok(PostDates { created, modified })
    }

    /// All `.html` pages, most recently modified first.
    pub fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let mut posts = Vec::new();
        for path in list_dir(&self.blog, "html")? {
            let Some(filename) = file_name(&path) else { continue };
            let meta = fs::metadata(&path).map_err(io_err(&path))?;
            let content = fs::read_to_string(&path).map_err(io_err(&path))?;
            let stem = filename.trim_end_matches(".html");

            let options = ReduceOptions {
                fallback_title: Some(stem.to_string()),
                ..self.titles.clone()
            };
            let title = extract_title(&content, &options).unwrap_or_else(|| stem.to_string());

            posts.push(PostSummary {
                url: format!("/blog/{filename}"),
                title,
                publish_date: meta
                    .modified()
                    .map_or_else(|_| DateTimeUtc::now(), DateTimeUtc::from_system_time),
                size: meta.len(),
                filename,
            });
        }

        posts.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
        Ok(posts)
    }

    fn post_path(&self, filename: &str) -> Result<PathBuf> {
        Ok(self.blog.join(checked(filename)?))
    }

    // ========================================================================
    // images
    // ========================================================================

    /// Write an image under the first free variant of `filename`.
    pub fn save_image(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let _guard = self.write_lock.lock();
        save_unique(&self.images, checked(filename)?, bytes)
    }

    // ========================================================================
    // drafts
    // ========================================================================

    /// Write `<id>.json`, replacing any previous version.
    pub fn save_draft(&self, draft: &Draft) -> Result<String> {
        let filename = format!("{}.json", checked(&draft.id)?);
        let path = self.drafts.join(&filename);
        let json = serde_json::to_string_pretty(draft).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let _guard = self.write_lock.lock();
        fs::create_dir_all(&self.drafts).map_err(io_err(&self.drafts))?;
        fs::write(&path, json).map_err(io_err(&path))?;
        Ok(filename)
    }

    /// `None` when no draft has this id.
    pub fn load_draft(&self, id: &str) -> Result<Option<Draft>> {
        let path = self.drafts.join(format!("{}.json", checked(id)?));
        if !path.is_file() {
            return Ok(None);
        }
        read_draft(&path).map(Some)
    }

    /// `false` when no draft has this id.
    pub fn delete_draft(&self, id: &str) -> Result<bool> {
        let path = self.drafts.join(format!("{}.json", checked(id)?));
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(&path)(err)),
        }
    }

    /// Every readable draft, most recently modified first.
    pub fn list_drafts(&self) -> Result<Vec<Draft>> {
        let mut drafts: Vec<Draft> = list_dir(&self.drafts, "json")?
            .iter()
            .filter_map(|path| {
                read_draft(path)
                    .inspect_err(|err| debug!("store"; "skipping draft: {err}"))
                    .ok()
            })
            .collect();
        drafts.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(drafts)
    }

    // ========================================================================
    // index page
    // ========================================================================

    pub fn read_index(&self) -> Result<String> {
        read_existing(&self.index, &self.index.display().to_string())
    }

    /// Read, transform and write the index page under the write lock.
    pub fn update_index<E>(&self, edit: impl FnOnce(&str) -> Result<String, E>) -> Result<(), E>
    where
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock();
        let html = self.read_index()?;
        let updated = edit(&html)?;
        fs::write(&self.index, updated).map_err(io_err(&self.index))?;
        Ok(())
    }
}

fn checked(name: &str) -> Result<&str> {
    checked_file_name(name).ok_or_else(|| StoreError::InvalidName(name.to_string()))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn not_found_or(err: io::Error, name: &str, path: &Path) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(name.to_string())
    } else {
        io_err(path)(err)
    }
}

fn read_existing(path: &Path, name: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|err| not_found_or(err, name, path))
}

fn read_draft(path: &Path) -> Result<Draft> {
    let content = fs::read_to_string(path).map_err(io_err(path))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn save_unique(dir: &Path, filename: &str, bytes: &[u8]) -> Result<String> {
    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let unique = unique_file_name(dir, filename);
    let path = dir.join(&unique);
    fs::write(&path, bytes).map_err(io_err(&path))?;
    Ok(unique)
}

/// Files in `dir` with extension `ext`; a missing directory is empty.
fn list_dir(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(dir)(err)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use std::time::{Duration, SystemTime};

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&test_config_at(dir.path()));
        (dir, store)
    }

    fn set_mtime(path: &Path, secs_ago: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[test]
    fn test_save_post_unique_names() {
        let (dir, store) = store();
        assert_eq!(store.save_post("a.html", "1").unwrap(), "a.html");
        assert_eq!(store.save_post("a.html", "2").unwrap(), "a-1.html");
        assert_eq!(fs::read_to_string(dir.path().join("blog/a-1.html")).unwrap(), "2");
        assert!(store.post_exists("a.html"));
        assert!(!store.post_exists("b.html"));
    }

    #[test]
    fn test_rejects_bad_names() {
        let (_dir, store) = store();
        assert!(matches!(store.save_post("../x.html", ""), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.read_post(""), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.load_draft("a/b"), Err(StoreError::InvalidName(_))));
        assert!(!store.post_exists("../blog.html"));
    }

    #[test]
    fn test_write_and_read_post() {
        let (_dir, store) = store();
        assert!(matches!(store.write_post("a.html", "x"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.read_post("a.html"), Err(StoreError::NotFound(_))));

        store.save_post("a.html", "old").unwrap();
        store.write_post("a.html", "new").unwrap();
        assert_eq!(store.read_post("a.html").unwrap(), "new");

        let dates = store.post_dates("a.html").unwrap();
        assert_eq!(dates.modified.year, DateTimeUtc::now().year);
        assert!(matches!(store.post_dates("zz.html"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_write_post_checks_under_lock() {
        let (dir, store) = store();
        let guard = store.write_lock.lock();
        std::thread::scope(|s| {
            let writer = s.spawn(|| store.write_post("late.html", "new"));
            std::thread::sleep(Duration::from_millis(50));
            fs::create_dir_all(dir.path().join("blog")).unwrap();
            fs::write(dir.path().join("blog/late.html"), "old").unwrap();
            drop(guard);
            writer.join().unwrap().unwrap();
        });
        assert_eq!(store.read_post("late.html").unwrap(), "new");
    }

    #[test]
    fn test_list_posts() {
        let (dir, store) = store();
        assert!(store.list_posts().unwrap().is_empty());

        store
            .save_post("old.html", "<div class=\"blog-main-content\"><h2>Old one</h2></div>")
            .unwrap();
        store
            .save_post("new.html", "<html><head><title>Newer | Kobe Zhang</title></head><body></body></html>")
            .unwrap();
        store.save_post("bare.html", "<p>x</p>").unwrap();
        store.save_image("skip.png", b"png").unwrap();
        fs::write(dir.path().join("blog/notes.txt"), "x").unwrap();

        set_mtime(&dir.path().join("blog/old.html"), 3600);
        set_mtime(&dir.path().join("blog/bare.html"), 60);

        let posts = store.list_posts().unwrap();
        let names: Vec<_> = posts.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, ["new.html", "bare.html", "old.html"]);
        assert_eq!(posts[0].title, "Newer");
        assert_eq!(posts[1].title, "bare");
        assert_eq!(posts[2].title, "Old one");
        assert_eq!(posts[2].url, "/blog/old.html");
        assert_eq!(posts[1].size, 8);
    }

    #[test]
    fn test_draft_round_trip() {
        let (_dir, store) = store();
        let draft = Draft::new(Some("draft-1".into()), Some("T".into()), Some("body".into()), true);
        assert_eq!(store.save_draft(&draft).unwrap(), "draft-1.json");

        let loaded = store.load_draft("draft-1").unwrap().unwrap();
        assert_eq!(loaded, draft);
        assert!(store.load_draft("draft-2").unwrap().is_none());

        assert!(store.delete_draft("draft-1").unwrap());
        assert!(!store.delete_draft("draft-1").unwrap());
        assert!(store.load_draft("draft-1").unwrap().is_none());
    }

    #[test]
    fn test_list_drafts_newest_first() {
        let (dir, store) = store();
        assert!(store.list_drafts().unwrap().is_empty());

        let mut older = Draft::new(Some("a".into()), Some("older".into()), None, true);
        older.last_modified = DateTimeUtc::from_ymd(2024, 1, 1);
        let mut newer = Draft::new(Some("b".into()), Some("newer".into()), None, true);
        newer.last_modified = DateTimeUtc::from_ymd(2025, 1, 1);
        store.save_draft(&older).unwrap();
        store.save_draft(&newer).unwrap();
        fs::write(dir.path().join("drafts/broken.json"), "{").unwrap();

        let ids: Vec<_> = store.list_drafts().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_index_update() {
        let (dir, store) = store();
        assert!(matches!(store.read_index(), Err(StoreError::NotFound(_))));

        fs::write(dir.path().join("blog.html"), "<p>one</p>").unwrap();
        store
            .update_index(|html| Ok::<_, StoreError>(html.replace("one", "two")))
            .unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("blog.html")).unwrap(), "<p>two</p>");
        assert_eq!(store.read_index().unwrap(), "<p>two</p>");
    }
}
