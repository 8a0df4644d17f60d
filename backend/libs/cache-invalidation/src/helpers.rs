//! Path encoding for stale views

use crate::{InvalidationError, Result, StaleView};
use uuid::Uuid;

/// Render a view as the path the presentation layer serves it under
///
/// # Example
///
/// ```
/// use cache_invalidation::{view_path, StaleView};
///
/// assert_eq!(view_path(&StaleView::Home), "/");
/// assert_eq!(view_path(&StaleView::Profile("ada".into())), "/profile/ada");
/// ```
pub fn view_path(view: &StaleView) -> String {
    match view {
        StaleView::Home => "/".to_string(),
        StaleView::Profile(handle) => format!("/profile/{}", handle),
        StaleView::UserPosts(user_id) => format!("/users/{}/posts", user_id),
        StaleView::Post(post_id) => format!("/posts/{}", post_id),
        StaleView::Notifications(user_id) => format!("/notifications/{}", user_id),
    }
}

/// Parse a path produced by [`view_path`]
///
/// # Example
///
/// ```
/// use cache_invalidation::{parse_view_path, StaleView};
///
/// assert_eq!(parse_view_path("/").unwrap(), StaleView::Home);
/// assert!(parse_view_path("/unknown/1").is_err());
/// ```
pub fn parse_view_path(path: &str) -> Result<StaleView> {
    if path == "/" {
        return Ok(StaleView::Home);
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["profile", handle] if !handle.is_empty() => Ok(StaleView::Profile(handle.to_string())),
        ["users", id, "posts"] => Ok(StaleView::UserPosts(parse_id(path, id)?)),
        ["posts", id] => Ok(StaleView::Post(parse_id(path, id)?)),
        ["notifications", id] => Ok(StaleView::Notifications(parse_id(path, id)?)),
        _ => Err(InvalidationError::InvalidView(path.to_string())),
    }
}

fn parse_id(path: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| InvalidationError::InvalidView(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_each_kind() {
        let id = Uuid::new_v4();
        let views = [
            StaleView::Home,
            StaleView::Profile("grace_h".into()),
            StaleView::UserPosts(id),
            StaleView::Post(id),
            StaleView::Notifications(id),
        ];
        for view in views {
            assert_eq!(parse_view_path(&view_path(&view)).unwrap(), view);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_view_path("").is_err());
        assert!(parse_view_path("/profile/").is_err());
        assert!(parse_view_path("/posts/not-a-uuid").is_err());
        assert!(parse_view_path("/profile/a/b").is_err());
    }
}
