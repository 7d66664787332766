//! JSON API handlers.
//!
//! Handlers take the parsed route and raw body and return a status code with
//! a JSON value, so they run without a socket in tests. Successful replies
//! carry `success: true` and a `message`; failures carry `success: false` and
//! an `error`, plus `details` for validation failures or `message` for
//! internal errors.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::AppState;
use super::router::Route;
use crate::content::{render_markdown_with, synthesize_toc_with};
use crate::log;
use crate::post::cover::{self, CoverTemplate};
use crate::post::index;
use crate::post::publish::{PublishError, PublishRequest};
use crate::post::{Draft, PostError};
use crate::utils::date::DateTimeUtc;

/// A handler failure and the reply it becomes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("数据验证失败")]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("请求体过大")]
    PayloadTooLarge,

    #[error("{error}: {message}")]
    Internal { error: &'static str, message: String },
}

impl ApiError {
    pub const fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge => 413,
            Self::Internal { .. } => 500,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::Validation(details) => json!({
                "success": false,
                "error": self.to_string(),
                "details": details,
            }),
            Self::Internal { error, message } => json!({
                "success": false,
                "error": error,
                "message": message,
            }),
            _ => json!({ "success": false, "error": self.to_string() }),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        Self::Validation(err.errors)
    }
}

/// Wrap any failure as a 500 labelled with what was being attempted.
trait Internal<T> {
    fn internal(self, error: &'static str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> Internal<T> for Result<T, E> {
    fn internal(self, error: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| {
            log!("error"; "{}: {:#}", error, err);
            ApiError::Internal {
                error,
                message: err.to_string(),
            }
        })
    }
}

/// Handle one API route.
pub fn handle(state: &AppState, route: &Route, body: &[u8]) -> Result<Value, ApiError> {
    match route {
        Route::Health => Ok(health(state)),
        Route::ListPosts => list_posts(state),
        Route::CreatePost => create_post(state, parse(body)?),
        Route::GetPost(name) => get_post(state, name),
        Route::EditPost(name) => edit_post(state, name),
        Route::UpdatePost(name) => update_post(state, name, parse(body)?),
        Route::ListDrafts => list_drafts(state),
        Route::SaveDraft => save_draft(state, parse(body)?),
        Route::GetDraft(id) => get_draft(state, id),
        Route::UpdateDraft(id) => update_draft(state, id, parse(body)?),
        Route::DeleteDraft(id) => delete_draft(state, id),
        Route::GenerateCover => generate_cover(state, parse(body)?),
        Route::CoverTemplates => Ok(cover_templates()),
        Route::Preview => preview(state, parse(body)?),
        Route::BlogIndex => blog_index(state),
        Route::Root | Route::Static | Route::Preflight => Err(ApiError::NotFound("页面未找到")),
    }
}

/// An empty body reads as `{}`.
fn parse<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) { b"{}".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest("请求体不是有效的 JSON"))
}

fn health(state: &AppState) -> Value {
    json!({
        "status": "ok",
        "timestamp": DateTimeUtc::now(),
        "service": state.config.site.service,
    })
}

// ============================================================================
// posts
// ============================================================================

fn list_posts(state: &AppState) -> Result<Value, ApiError> {
    let posts = state.store.list_posts().internal("获取博文列表失败")?;
    Ok(json!({
        "success": true,
        "count": posts.len(),
        "posts": posts,
        "message": "博文列表获取成功",
    }))
}

fn get_post(state: &AppState, name: &str) -> Result<Value, ApiError> {
    let post = match state.publisher().load(name) {
        Err(PublishError::NotFound(_)) => return Err(ApiError::NotFound("博文未找到")),
        other => other.internal("获取博文失败")?,
    };
    Ok(json!({
        "success": true,
        "post": {
            "filename": post.filename,
            "title": post.title,
            "content": post.html,
            "markdownContent": post.markdown,
            "publishDate": post.publish_date,
            "size": post.size,
            "url": format!("/blog/{}", post.filename),
        },
        "message": "博文获取成功",
    }))
}

fn edit_post(state: &AppState, name: &str) -> Result<Value, ApiError> {
    let post = match state.publisher().load(name) {
        Err(PublishError::NotFound(_)) => return Err(ApiError::NotFound("博文未找到")),
        other => other.internal("获取文章编辑数据失败")?,
    };
    Ok(json!({
        "success": true,
        "post": {
            "filename": post.filename,
            "title": post.title,
            "markdownContent": post.markdown,
            "publishDate": post.publish_date,
            "isEditing": true,
        },
        "message": "文章编辑数据获取成功",
    }))
}

fn require_title_and_content(request: &PublishRequest) -> Result<(), ApiError> {
    if request.title.is_empty() || request.content.is_empty() {
        return Err(ApiError::BadRequest("标题和内容不能为空"));
    }
    Ok(())
}

fn create_post(state: &AppState, request: PublishRequest) -> Result<Value, ApiError> {
    require_title_and_content(&request)?;
    let post = match state.publisher().publish(request) {
        Err(PublishError::Invalid(err)) => return Err(err.into()),
        other => other.internal("创建博文失败")?,
    };
    Ok(json!({ "success": true, "post": post, "message": "博文发布成功" }))
}

fn update_post(state: &AppState, name: &str, request: PublishRequest) -> Result<Value, ApiError> {
    require_title_and_content(&request)?;
    let post = match state.publisher().update(name, request) {
        Err(PublishError::Invalid(err)) => return Err(err.into()),
        Err(PublishError::NotFound(_)) => return Err(ApiError::NotFound("要更新的博文未找到")),
        other => other.internal("更新博文失败")?,
    };
    Ok(json!({ "success": true, "post": post, "message": "博文更新成功" }))
}

/// Cards on `blog.html`, plus anything that would stop it being updated.
fn blog_index(state: &AppState) -> Result<Value, ApiError> {
    let html = state.store.read_index().internal("获取博客索引失败")?;
    let entries = index::entries(&html);
    Ok(json!({
        "success": true,
        "count": entries.len(),
        "entries": entries,
        "issues": index::validate(&html),
        "message": "博客索引获取成功",
    }))
}

// ============================================================================
// drafts
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftRequest {
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    #[serde(default = "default_true")]
    auto_save: bool,
}

const fn default_true() -> bool {
    true
}

fn list_drafts(state: &AppState) -> Result<Value, ApiError> {
    let drafts = state.store.list_drafts().internal("获取草稿列表失败")?;
    Ok(json!({ "success": true, "drafts": drafts, "message": "草稿列表获取成功" }))
}

fn get_draft(state: &AppState, id: &str) -> Result<Value, ApiError> {
    let draft = state
        .store
        .load_draft(id)
        .internal("获取草稿失败")?
        .ok_or(ApiError::NotFound("草稿未找到"))?;
    Ok(json!({ "success": true, "draft": draft, "message": "草稿获取成功" }))
}

/// Create a draft, or update it when `id` names a stored one.
fn save_draft(state: &AppState, request: DraftRequest) -> Result<Value, ApiError> {
    let existing = match &request.id {
        Some(id) => state.store.load_draft(id).internal("保存草稿失败")?,
        None => None,
    };
    let draft = match existing {
        Some(mut draft) => {
            draft.update(request.title.as_deref(), request.content.as_deref());
            draft
        }
        None => Draft::new(request.id, request.title, request.content, request.auto_save),
    };
    store_draft(state, draft, "草稿保存成功", "保存草稿失败")
}

fn update_draft(state: &AppState, id: &str, request: DraftRequest) -> Result<Value, ApiError> {
    let mut draft = state
        .store
        .load_draft(id)
        .internal("更新草稿失败")?
        .ok_or(ApiError::NotFound("草稿未找到"))?;
    draft.update(request.title.as_deref(), request.content.as_deref());
    store_draft(state, draft, "草稿更新成功", "更新草稿失败")
}

fn store_draft(state: &AppState, draft: Draft, message: &str, error: &'static str) -> Result<Value, ApiError> {
    if draft.is_empty() {
        return Err(ApiError::BadRequest("草稿标题和内容不能都为空"));
    }
    draft.validate(&state.config.post)?;
    state.store.save_draft(&draft).internal(error)?;
    Ok(json!({ "success": true, "draft": draft, "message": message }))
}

fn delete_draft(state: &AppState, id: &str) -> Result<Value, ApiError> {
    if !state.store.delete_draft(id).internal("删除草稿失败")? {
        return Err(ApiError::NotFound("草稿未找到"));
    }
    Ok(json!({ "success": true, "message": "草稿删除成功" }))
}

// ============================================================================
// covers and preview
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoverRequest {
    #[serde(default)]
    title: String,
    template: Option<String>,
}

fn generate_cover(state: &AppState, request: CoverRequest) -> Result<Value, ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("标题不能为空"));
    }
    let cover = cover::save(&state.store, &state.config, &request.title, request.template.as_deref())
        .internal("生成封面失败")?;

    let mut value = serde_json::to_value(&cover).internal("生成封面失败")?;
    value["url"] = json!(state.config.site.cover_url(&cover.filename));
    Ok(json!({ "success": true, "cover": value, "message": "封面生成成功" }))
}

fn cover_templates() -> Value {
    let templates: Vec<Value> = CoverTemplate::ALL
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "description": t.description,
                "preview": t.background(),
                "textColor": t.text_color,
            })
        })
        .collect();
    json!({ "success": true, "templates": templates, "message": "模板列表获取成功" })
}

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    #[serde(default)]
    content: String,
}

/// Render the editor buffer exactly as publishing would.
fn preview(state: &AppState, request: PreviewRequest) -> Result<Value, ApiError> {
    let rendered = render_markdown_with(&request.content, &state.config.markdown);
    let toc = synthesize_toc_with(&rendered.headings, &state.config.toc.options());
    Ok(json!({
        "success": true,
        "html": rendered.html,
        "headings": rendered.headings,
        "toc": toc.markup,
        "message": "预览生成成功",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use std::fs;

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("blog.html"),
            r#"<nav class="navbar"></nav><div class="blog-posts-grid"></div><footer></footer>"#,
        )
        .unwrap();
        let state = AppState::new(test_config_at(dir.path())).unwrap();
        (dir, state)
    }

    fn call(state: &AppState, route: Route, body: Value) -> Result<Value, ApiError> {
        handle(state, &route, body.to_string().as_bytes())
    }

    #[test]
    fn test_health() {
        let (_dir, state) = state();
        let reply = handle(&state, &Route::Health, b"").unwrap();
        assert_eq!(reply["status"], "ok");
        assert_eq!(reply["service"], "blog-writing-service");
    }

    #[test]
    fn test_create_and_read_post() {
        let (_dir, state) = state();
        let err = call(&state, Route::CreatePost, json!({ "title": "T" })).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.body()["error"], "标题和内容不能为空");

        let reply = call(&state, Route::CreatePost, json!({ "title": "Hello", "content": "## Alpha\n\n## B\n\nbody" })).unwrap();
        assert_eq!(reply["post"]["filename"], "hello.html");
        assert_eq!(reply["post"]["tableOfContents"][0]["anchor"], "alpha");
        assert_eq!(reply["post"]["tableOfContents"][1]["anchor"], "heading-1");

        let list = handle(&state, &Route::ListPosts, b"").unwrap();
        assert_eq!(list["count"], 1);
        assert_eq!(list["posts"][0]["url"], "/blog/hello.html");

        let detail = handle(&state, &Route::GetPost("hello".into()), b"").unwrap();
        assert_eq!(detail["post"]["title"], "Hello");
        assert!(detail["post"]["markdownContent"].as_str().unwrap().contains("## Alpha"));

        let edit = handle(&state, &Route::EditPost("hello.html".into()), b"").unwrap();
        assert_eq!(edit["post"]["isEditing"], true);
        assert!(edit["post"].get("content").is_none());
    }

    #[test]
    fn test_blog_index() {
        let (dir, state) = state();
        call(&state, Route::CreatePost, json!({ "title": "Hello", "content": "body" })).unwrap();
        let reply = handle(&state, &Route::BlogIndex, b"").unwrap();
        assert_eq!(reply["count"], 1);
        assert_eq!(reply["entries"][0]["filename"], "hello.html");
        assert_eq!(reply["entries"][0]["title"], "Hello");
        assert_eq!(reply["entries"][0]["url"], "blog/hello.html");
        assert!(reply["issues"].as_array().unwrap().is_empty());

        fs::write(dir.path().join("blog.html"), "<html><body></body></html>").unwrap();
        let reply = handle(&state, &Route::BlogIndex, b"").unwrap();
        assert_eq!(reply["count"], 0);
        assert_eq!(reply["issues"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_validation_details() {
        let (_dir, state) = state();
        let long = "x".repeat(101);
        let err = call(&state, Route::CreatePost, json!({ "title": long, "content": "c" })).unwrap_err();
        assert_eq!(err.status(), 400);
        let body = err.body();
        assert_eq!(body["error"], "数据验证失败");
        assert_eq!(body["details"][0], "标题长度不能超过100个字符");
    }

    #[test]
    fn test_post_not_found() {
        let (_dir, state) = state();
        let err = handle(&state, &Route::GetPost("nope".into()), b"").unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.body()["error"], "博文未找到");

        let err = call(&state, Route::UpdatePost("nope".into()), json!({ "title": "T", "content": "c" })).unwrap_err();
        assert_eq!(err.body()["error"], "要更新的博文未找到");
    }

    #[test]
    fn test_bad_names_are_internal_errors() {
        let (_dir, state) = state();
        let err = handle(&state, &Route::GetPost("..".into()), b"").unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_drafts() {
        let (_dir, state) = state();
        let created = call(&state, Route::SaveDraft, json!({ "title": "Draft", "content": "one" })).unwrap();
        let id = created["draft"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["draft"]["autoSave"], true);

        let updated = call(&state, Route::SaveDraft, json!({ "id": id, "content": "two" })).unwrap();
        assert_eq!(updated["draft"]["title"], "Draft");
        assert_eq!(updated["draft"]["content"], "two");

        let put = call(&state, Route::UpdateDraft(id.clone()), json!({ "title": "Renamed" })).unwrap();
        assert_eq!(put["draft"]["title"], "Renamed");
        assert_eq!(put["message"], "草稿更新成功");

        let err = call(&state, Route::SaveDraft, json!({ "title": "  ", "content": "" })).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.body()["error"], "草稿标题和内容不能都为空");

        let fresh = call(&state, Route::SaveDraft, json!({ "id": "draft-custom", "title": "C" })).unwrap();
        assert_eq!(fresh["draft"]["id"], "draft-custom");

        let list = handle(&state, &Route::ListDrafts, b"").unwrap();
        assert_eq!(list["drafts"].as_array().unwrap().len(), 2);

        let one = handle(&state, &Route::GetDraft(id.clone()), b"").unwrap();
        assert_eq!(one["draft"]["title"], "Renamed");

        handle(&state, &Route::DeleteDraft(id.clone()), b"").unwrap();
        let err = handle(&state, &Route::DeleteDraft(id.clone()), b"").unwrap_err();
        assert_eq!(err.body()["error"], "草稿未找到");
        let err = call(&state, Route::UpdateDraft(id), json!({})).unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_covers() {
        let (dir, state) = state();
        let err = call(&state, Route::GenerateCover, json!({ "title": " " })).unwrap_err();
        assert_eq!(err.body()["error"], "标题不能为空");

        let reply = call(&state, Route::GenerateCover, json!({ "title": "Hi", "template": "tech" })).unwrap();
        let filename = reply["cover"]["svgFilename"].as_str().unwrap();
        assert_eq!(reply["cover"]["template"], "tech");
        assert_eq!(reply["cover"]["url"], format!("../blog-img/{filename}"));
        assert!(dir.path().join("blog-img").join(filename).is_file());

        let templates = handle(&state, &Route::CoverTemplates, b"").unwrap();
        assert_eq!(templates["templates"].as_array().unwrap().len(), 4);
        assert_eq!(templates["templates"][0]["id"], "default");
    }

    #[test]
    fn test_preview() {
        let (_dir, state) = state();
        let reply = call(&state, Route::Preview, json!({ "content": "## Intro\n\n### Sub" })).unwrap();
        assert!(reply["html"].as_str().unwrap().contains(r#"id="intro""#));
        assert_eq!(reply["headings"].as_array().unwrap().len(), 2);
        assert!(reply["toc"].as_str().unwrap().contains("collapsible"));

        let empty = handle(&state, &Route::Preview, b"").unwrap();
        assert_eq!(empty["toc"], "");
    }

    #[test]
    fn test_invalid_json() {
        let (_dir, state) = state();
        let err = handle(&state, &Route::Preview, b"{nope").unwrap_err();
        assert_eq!(err.status(), 400);
    }
}
