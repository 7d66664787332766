//! Request routing.

use percent_encoding::percent_decode_str;
use tiny_http::Method;

/// Everything the server answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    ListPosts,
    CreatePost,
    GetPost(String),
    EditPost(String),
    UpdatePost(String),
    ListDrafts,
    SaveDraft,
    GetDraft(String),
    UpdateDraft(String),
    DeleteDraft(String),
    GenerateCover,
    CoverTemplates,
    Preview,
    /// Cards listed on the blog index page.
    BlogIndex,
    /// `GET /`: send the browser to the editor.
    Root,
    /// Any other `GET`/`HEAD` outside `/api/`.
    Static,
    /// CORS preflight.
    Preflight,
}

impl Route {
    /// Match a method and request URL. `None` means 404.
    pub fn parse(method: &Method, url: &str) -> Option<Self> {
        let path = url_path(url);
        if *method == Method::Options {
            return Some(Self::Preflight);
        }

        let Some(api) = path.strip_prefix("/api/") else {
            return match method {
                Method::Get if path == "/" => Some(Self::Root),
                Method::Get | Method::Head => Some(Self::Static),
                _ => None,
            };
        };

        let segments: Vec<String> = api
            .trim_end_matches('/')
            .split('/')
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let route = match (method, segments.as_slice()) {
            (Method::Get, ["health"]) => Self::Health,
            (Method::Get, ["posts"]) => Self::ListPosts,
            (Method::Post, ["posts"]) => Self::CreatePost,
            (Method::Get, ["posts", name]) => Self::GetPost(name.to_string()),
            (Method::Get, ["posts", name, "edit"]) => Self::EditPost(name.to_string()),
            (Method::Put, ["posts", name]) => Self::UpdatePost(name.to_string()),
            (Method::Get, ["drafts"]) => Self::ListDrafts,
            (Method::Post, ["drafts"]) => Self::SaveDraft,
            (Method::Get, ["drafts", id]) => Self::GetDraft(id.to_string()),
            (Method::Put, ["drafts", id]) => Self::UpdateDraft(id.to_string()),
            (Method::Delete, ["drafts", id]) => Self::DeleteDraft(id.to_string()),
            (Method::Post, ["generate-cover"]) => Self::GenerateCover,
            (Method::Get, ["cover-templates"]) => Self::CoverTemplates,
            (Method::Post, ["preview"]) => Self::Preview,
            (Method::Get, ["index"]) => Self::BlogIndex,
            _ => return None,
        };

        // `/api/posts//edit`
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(route)
    }

    /// Whether the handler reads a JSON body.
    pub const fn has_body(&self) -> bool {
        matches!(
            self,
            Self::CreatePost
                | Self::UpdatePost(_)
                | Self::SaveDraft
                | Self::UpdateDraft(_)
                | Self::GenerateCover
                | Self::Preview
        )
    }
}

/// URL without query string or fragment.
pub fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(method: Method, url: &str) -> Option<Route> {
        Route::parse(&method, url)
    }

    #[test]
    fn test_api_routes() {
        assert_eq!(parse(Method::Get, "/api/health"), Some(Route::Health));
        assert_eq!(parse(Method::Get, "/api/posts?x=1"), Some(Route::ListPosts));
        assert_eq!(parse(Method::Post, "/api/posts"), Some(Route::CreatePost));
        assert_eq!(parse(Method::Get, "/api/posts/a.html"), Some(Route::GetPost("a.html".into())));
        assert_eq!(parse(Method::Get, "/api/posts/a/edit"), Some(Route::EditPost("a".into())));
        assert_eq!(parse(Method::Put, "/api/posts/a"), Some(Route::UpdatePost("a".into())));
        assert_eq!(parse(Method::Delete, "/api/drafts/d-1"), Some(Route::DeleteDraft("d-1".into())));
        assert_eq!(parse(Method::Post, "/api/preview"), Some(Route::Preview));
        assert_eq!(parse(Method::Get, "/api/cover-templates/"), Some(Route::CoverTemplates));
        assert_eq!(parse(Method::Get, "/api/index"), Some(Route::BlogIndex));
        assert_eq!(parse(Method::Post, "/api/index"), None);
    }

    #[test]
    fn test_percent_decoded_names() {
        assert_eq!(
            parse(Method::Get, "/api/posts/%E4%B8%AD%E6%96%87.html"),
            Some(Route::GetPost("中文.html".into()))
        );
    }

    #[test]
    fn test_unknown_routes() {
        assert_eq!(parse(Method::Get, "/api/nope"), None);
        assert_eq!(parse(Method::Delete, "/api/posts/a"), None);
        assert_eq!(parse(Method::Get, "/api/posts//edit"), None);
        assert_eq!(parse(Method::Post, "/index.html"), None);
    }

    #[test]
    fn test_site_routes() {
        assert_eq!(parse(Method::Get, "/"), Some(Route::Root));
        assert_eq!(parse(Method::Get, "/blog/a.html"), Some(Route::Static));
        assert_eq!(parse(Method::Head, "/style.css"), Some(Route::Static));
        assert_eq!(parse(Method::Options, "/api/posts"), Some(Route::Preflight));
        assert!(Route::Preview.has_body());
        assert!(!Route::Health.has_body());
    }
}
