//! Cursor pagination.
//!
//! A cursor is the key of the last item a caller has seen. A page holds up
//! to `limit` items that follow the cursor, and `next_cursor` is set only
//! when more items remain.

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Transform the items, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Slice an already-ordered listing into a page.
///
/// `key` extracts the cursor key of an item. A cursor that matches no item
/// is an error rather than an empty page.
pub fn paginate<T, I, K>(items: I, limit: usize, cursor: Option<&str>, key: K) -> TypeResult<Page<T>>
where
    I: IntoIterator<Item = T>,
    K: Fn(&T) -> String,
{
    let mut iter = items.into_iter();
    if let Some(cursor) = cursor {
        if !iter.by_ref().any(|item| key(&item) == cursor) {
            return Err(TypeError::InvalidCursor(cursor.to_string()));
        }
    }

    let page: Vec<T> = iter.by_ref().take(limit).collect();
    let has_more = iter.next().is_some();
    let next_cursor = if has_more {
        page.last().map(&key)
    } else {
        None
    };
    Ok(Page {
        items: page,
        next_cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{i:02}")).collect()
    }

    #[test]
    fn first_page_sets_cursor_when_more_remain() {
        let page = paginate(keys(5), 2, None, |k| k.clone()).unwrap();
        assert_eq!(page.items, vec!["k00", "k01"]);
        assert_eq!(page.next_cursor.as_deref(), Some("k01"));
    }

    #[test]
    fn resumes_after_cursor() {
        let page = paginate(keys(5), 2, Some("k01"), |k| k.clone()).unwrap();
        assert_eq!(page.items, vec!["k02", "k03"]);
        assert_eq!(page.next_cursor.as_deref(), Some("k03"));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let page = paginate(keys(4), 2, Some("k01"), |k| k.clone()).unwrap();
        assert_eq!(page.items, vec!["k02", "k03"]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn unknown_cursor_is_rejected() {
        let err = paginate(keys(3), 2, Some("nope"), |k| k.clone()).unwrap_err();
        assert_eq!(err, TypeError::InvalidCursor("nope".into()));
    }

    #[test]
    fn empty_listing() {
        let page = paginate(Vec::<String>::new(), 20, None, |k| k.clone()).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }
}
