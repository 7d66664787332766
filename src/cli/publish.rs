//! `publish` and `cover`: the publishing pipeline from the command line.

use anyhow::{Context, Result};

use super::args::PublishArgs;
use super::common::{input_stem, read_input};
use crate::config::BlogConfig;
use crate::embed::post::PostTemplate;
use crate::log;
use crate::post::cover;
use crate::post::publish::{PublishRequest, Publisher};
use crate::store::Store;

/// Publish a Markdown file, or re-render an existing post with `--update`.
pub fn publish(args: &PublishArgs, config: &BlogConfig) -> Result<()> {
    let source = read_input(Some(&args.file))?;
    let (title, content) = match &args.title {
        Some(title) => (title.clone(), source),
        None => match split_title(&source) {
            Some((title, body)) => (title.to_string(), body.to_string()),
            None => {
                let stem = input_stem(Some(&args.file)).unwrap_or_default();
                (stem, source)
            }
        },
    };

    let template = PostTemplate::load(config.paths.template.as_deref())?;
    let store = Store::new(config);
    let publisher = Publisher::new(config, &template, &store);
    let request = PublishRequest {
        title,
        content,
        tags: args.tags.clone(),
        cover_template: args.cover_template.clone(),
    };

    let post = match &args.update {
        Some(filename) => publisher.update(filename, request),
        None => publisher.publish(request),
    }
    .context("failed to publish post")?;

    let page = config.root_relative(config.paths.blog.join(&post.filename));
    log!("publish"; "\"{}\" -> {}", post.title, page.display());
    Ok(())
}

/// Write a cover SVG into the images directory.
pub fn cover(title: &str, template: Option<&str>, config: &BlogConfig) -> Result<()> {
    let store = Store::new(config);
    let cover = cover::save(&store, config, title, template).context("failed to write cover")?;
    let path = config.root_relative(config.paths.images.join(&cover.filename));
    log!("cover"; "{} ({})", path.display(), cover.template);
    Ok(())
}

/// A leading `# Title` line and the text after it.
fn split_title(source: &str) -> Option<(&str, &str)> {
    let start = source.len() - source.trim_start().len();
    let rest = &source[start..];
    let (line, body) = rest.split_once('\n').unwrap_or((rest, ""));
    let title = line.strip_prefix("# ")?.trim().trim_end_matches('#').trim_end();
    (!title.is_empty()).then_some((title, body.trim_start_matches(['\r', '\n'])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::post::index;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_split_title() {
        assert_eq!(split_title("\n# Hello #\n\nbody"), Some(("Hello", "body")));
        assert_eq!(split_title("# Only"), Some(("Only", "")));
        assert_eq!(split_title("## Not a title\n"), None);
        assert_eq!(split_title("text\n# Later"), None);
        assert_eq!(split_title("# \nbody"), None);
    }

    fn args(file: PathBuf) -> PublishArgs {
        PublishArgs {
            file,
            title: None,
            tags: Vec::new(),
            cover_template: None,
            update: None,
        }
    }

    #[test]
    fn test_publish_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config_at(dir.path());
        fs::write(
            dir.path().join("blog.html"),
            r#"<nav class="navbar"></nav><div class="blog-posts-grid"></div><footer></footer>"#,
        )
        .unwrap();
        let file = dir.path().join("draft.md");
        fs::write(&file, "# My Post\n\n## Part\n\ntext").unwrap();

        publish(&args(file.clone()), &config).unwrap();
        let page = fs::read_to_string(dir.path().join("blog/my-post.html")).unwrap();
        assert!(page.contains("<h2>My Post</h2>"));
        assert!(!page.contains("<h1"));
        assert_eq!(index::entries(&fs::read_to_string(dir.path().join("blog.html")).unwrap()).len(), 1);

        fs::write(&file, "more text").unwrap();
        let update = PublishArgs {
            update: Some("my-post".into()),
            ..args(file)
        };
        publish(&update, &config).unwrap();
        let page = fs::read_to_string(dir.path().join("blog/my-post.html")).unwrap();
        assert!(page.contains("<h2>draft</h2>"));
        assert!(page.contains("more text"));
    }

    #[test]
    fn test_cover_command() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config_at(dir.path());
        cover("教程", None, &config).unwrap();
        let files: Vec<_> = fs::read_dir(dir.path().join("blog-img")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
