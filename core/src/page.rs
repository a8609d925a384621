//! The page envelope and client-side pagination helpers.
//!
//! # Design
//! `Page<T>` mirrors the envelope a paginated Spring backend returns. Fields
//! the client does not know about are kept in `extra` and written back out
//! unchanged, so mapping a page never drops data.
//!
//! `number` is always the zero-based page index, which is what the backend
//! sends. `page_of` accepts either a one-based or a zero-based page argument
//! but stores the zero-based index either way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub last: bool,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
    pub first: bool,
    pub number_of_elements: usize,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<T> Page<T> {
    /// The empty page: no content, zero pages, both first and last.
    pub const fn empty() -> Self {
        Self {
            content: Vec::new(),
            last: true,
            total_elements: 0,
            total_pages: 0,
            size: 0,
            number: 0,
            first: true,
            number_of_elements: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Replace the content with `f` applied to every element, in order.
    pub fn map<R>(self, f: impl FnMut(T) -> R) -> Page<R> {
        let Page {
            content,
            last,
            total_elements,
            total_pages,
            size,
            number,
            first,
            number_of_elements,
            extra,
        } = self;
        Page {
            content: content.into_iter().map(f).collect(),
            last,
            total_elements,
            total_pages,
            size,
            number,
            first,
            number_of_elements,
            extra,
        }
    }

    /// Like `map`, stopping at the first error.
    pub fn try_map<R, E>(self, f: impl FnMut(T) -> Result<R, E>) -> Result<Page<R>, E> {
        let Page {
            content,
            last,
            total_elements,
            total_pages,
            size,
            number,
            first,
            number_of_elements,
            extra,
        } = self;
        Ok(Page {
            content: content.into_iter().map(f).collect::<Result<_, _>>()?,
            last,
            total_elements,
            total_pages,
            size,
            number,
            first,
            number_of_elements,
            extra,
        })
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn empty_page<T>() -> Page<T> {
    Page::empty()
}

/// Slice `content` into the page-shaped view a backend would have returned.
///
/// `size` and `number_of_elements` both carry the length of the slice, so a
/// short final page reports its true count. A `size` of zero yields an
/// empty slice on a single page, as does page `0` when `one_based` is set.
pub fn page_of<T: Clone>(content: &[T], page: usize, size: usize, one_based: bool) -> Page<T> {
    let index = if one_based { page.checked_sub(1) } else { Some(page) };

    let total_pages = if size == 0 {
        1
    } else {
        content.len().div_ceil(size).max(1)
    };

    let slice: Vec<T> = match index {
        Some(index) if size > 0 => content
            .iter()
            .skip(index.saturating_mul(size))
            .take(size)
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    let (first, last) = if one_based {
        (page == 1, page == total_pages)
    } else {
        (page == 0, page == total_pages - 1)
    };

    Page {
        last,
        total_elements: content.len(),
        total_pages,
        size: slice.len(),
        number: index.unwrap_or(0),
        first,
        number_of_elements: slice.len(),
        content: slice,
        extra: BTreeMap::new(),
    }
}

/// A function producing a new page with `f` applied to each element of the
/// input page's content. The input page is left untouched.
pub fn map_page<T, R, F>(f: F) -> impl Fn(&Page<T>) -> Page<R>
where
    F: Fn(&T) -> R,
{
    move |page: &Page<T>| Page {
        content: page.content.iter().map(&f).collect(),
        last: page.last,
        total_elements: page.total_elements,
        total_pages: page.total_pages,
        size: page.size,
        number: page.number,
        first: page.first,
        number_of_elements: page.number_of_elements,
        extra: page.extra.clone(),
    }
}
