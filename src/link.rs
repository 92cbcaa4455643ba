// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Pagination cursor extraction from hosting API `Link` headers.
//!
//! GitHub paginates branch listings through a `Link` header of the form
//!
//! ```text
//! <https://api.github.com/repositories/42/branches?per_page=100&page=2>; rel="next",
//! <https://api.github.com/repositories/42/branches?per_page=100&page=5>; rel="last"
//! ```
//!
//! The parser splits the header into relations, reads each relation's URL
//! and `rel` attribute independently and accepts any ordering or additional
//! relations. A cursor is only produced when both a `next` and a `last`
//! relation are present and well formed. Every other shape yields `None`,
//! which callers interpret as "the listing fits on the current page". This
//! fallback silently truncates listings whose header format drifts from the
//! expected one.

use url::Url;

/// Path segment that precedes the page query on branch listings.
const BRANCHES_SEGMENT: &str = "branches";
/// Query parameter carrying the page index.
const PAGE_PARAMETER: &str = "page";

/// Pagination state derived from the first page of a branch listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct PageCursor
{
    /// Numeric repository id used by the hosting API for follow-up pages.
    pub collection_id: u64,
    /// Index of the next page to request.
    pub next_page:     u32,
    /// Index of the last page of the listing.
    pub last_page:     u32,
}

impl PageCursor
{
    /// Returns `true` while the cursor still points at a page to request.
    ///
    /// # Examples
    ///
    /// ```
    /// use github_stats::PageCursor;
    ///
    /// let cursor = PageCursor {
    ///     collection_id: 7, next_page: 4, last_page: 3,
    /// };
    /// assert!(!cursor.has_more());
    /// ```
    pub fn has_more(&self,) -> bool
    {
        self.next_page != 0 && self.next_page <= self.last_page
    }

    /// Returns the page to request next and moves the cursor past it.
    ///
    /// Returns `None` once the listing is exhausted.
    pub fn advance(&mut self,) -> Option<u32,>
    {
        if !self.has_more() {
            return None;
        }
        let page = self.next_page;
        self.next_page = self.next_page.saturating_add(1,);
        Some(page,)
    }
}

/// A single `<url>; rel="..."` entry of a `Link` header.
#[derive(Debug,)]
struct LinkRelation<'header,>
{
    target: &'header str,
    rels:   Vec<&'header str,>,
}

/// Extracts a [`PageCursor`] from a raw `Link` header value.
///
/// Returns `None` when the header lacks a `next` or `last` relation, when a
/// relation URL cannot be parsed, when either URL misses a numeric `page`
/// parameter, or when the `next` URL does not name a numeric collection in
/// front of its `branches` segment.
///
/// # Examples
///
/// ```
/// use github_stats::parse_link_header;
///
/// let header = "<https://api.github.com/repositories/9/branches?page=2>; rel=\"next\", \
///               <https://api.github.com/repositories/9/branches?page=3>; rel=\"last\"";
/// let cursor = parse_link_header(header,).expect("cursor",);
/// assert_eq!((cursor.collection_id, cursor.next_page, cursor.last_page), (9, 2, 3));
///
/// assert!(parse_link_header("<https://api.github.com/x?page=1>; rel=\"first\"",).is_none());
/// ```
pub fn parse_link_header(header: &str,) -> Option<PageCursor,>
{
    let relations: Vec<LinkRelation<'_,>,> =
        header.split(',',).filter_map(parse_relation,).collect();

    let next = find_relation(&relations, "next",)?;
    let last = find_relation(&relations, "last",)?;

    let next_url = Url::parse(next,).ok()?;
    let last_url = Url::parse(last,).ok()?;

    Some(PageCursor {
        collection_id: collection_id(&next_url,)?,
        next_page:     page_index(&next_url,)?,
        last_page:     page_index(&last_url,)?,
    },)
}

fn parse_relation(raw: &str,) -> Option<LinkRelation<'_,>,>
{
    let raw = raw.trim();
    let rest = raw.strip_prefix('<',)?;
    let (target, params,) = rest.split_once('>',)?;

    let mut rels = Vec::new();
    for param in params.split(';',) {
        let Some((name, value,),) = param.split_once('=',) else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("rel",) {
            continue;
        }
        let value = value.trim().trim_matches('"',);
        rels.extend(value.split_whitespace(),);
    }

    if rels.is_empty() {
        return None;
    }

    Some(LinkRelation {
        target: target.trim(),
        rels,
    },)
}

fn find_relation<'header,>(
    relations: &[LinkRelation<'header,>],
    rel: &str,
) -> Option<&'header str,>
{
    relations
        .iter()
        .find(|relation| relation.rels.iter().any(|candidate| candidate.eq_ignore_ascii_case(rel,),),)
        .map(|relation| relation.target,)
}

fn collection_id(url: &Url,) -> Option<u64,>
{
    let segments: Vec<&str,> = url.path_segments()?.collect();
    let position = segments.iter().position(|segment| *segment == BRANCHES_SEGMENT,)?;
    let id = segments.get(position.checked_sub(1,)?,)?;
    id.parse::<u64,>().ok()
}

fn page_index(url: &Url,) -> Option<u32,>
{
    url.query_pairs()
        .find(|(name, _,)| name == PAGE_PARAMETER,)
        .and_then(|(_, value,)| value.parse::<u32,>().ok(),)
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::{PageCursor, parse_link_header};

    fn relation(id: u64, page: u32, rel: &str,) -> String
    {
        format!("<https://api.github.com/repositories/{id}/branches?per_page=100&page={page}>; rel=\"{rel}\"")
    }

    #[test]
    fn extracts_cursor_from_next_and_last_relations()
    {
        let header = format!("{}, {}", relation(1296269, 2, "next"), relation(1296269, 5, "last"));

        let cursor = parse_link_header(&header,).expect("expected cursor",);
        assert_eq!(
            cursor,
            PageCursor {
                collection_id: 1296269, next_page: 2, last_page: 5,
            }
        );
    }

    #[test]
    fn tolerates_reordered_and_additional_relations()
    {
        let header = format!(
            "{}, {}, {}, {}",
            relation(77, 9, "last"),
            relation(77, 1, "first"),
            relation(77, 3, "next"),
            relation(77, 2, "prev"),
        );

        let cursor = parse_link_header(&header,).expect("expected cursor",);
        assert_eq!(cursor.collection_id, 77);
        assert_eq!(cursor.next_page, 3);
        assert_eq!(cursor.last_page, 9);
    }

    #[test]
    fn missing_last_relation_degrades_to_single_page()
    {
        let header = relation(5, 2, "next",);
        assert!(parse_link_header(&header).is_none());
    }

    #[test]
    fn missing_next_relation_degrades_to_single_page()
    {
        let header = format!("{}, {}", relation(5, 1, "prev"), relation(5, 2, "last"));
        assert!(parse_link_header(&header).is_none());
    }

    #[test]
    fn empty_and_garbage_headers_yield_no_cursor()
    {
        assert!(parse_link_header("").is_none());
        assert!(parse_link_header("not a link header").is_none());
        assert!(parse_link_header("<>; rel=\"next\", <>; rel=\"last\"").is_none());
    }

    #[test]
    fn non_numeric_page_yields_no_cursor()
    {
        let header = "<https://api.github.com/repositories/5/branches?page=two>; rel=\"next\", \
                      <https://api.github.com/repositories/5/branches?page=3>; rel=\"last\"";
        assert!(parse_link_header(header).is_none());
    }

    #[test]
    fn owner_repo_style_urls_yield_no_cursor()
    {
        let header = "<https://api.github.com/repos/octo/cat/branches?page=2>; rel=\"next\", \
                      <https://api.github.com/repos/octo/cat/branches?page=3>; rel=\"last\"";
        assert!(parse_link_header(header).is_none());
    }

    #[test]
    fn accepts_unquoted_and_multi_valued_rel_attributes()
    {
        let header = "<https://api.github.com/repositories/3/branches?page=2>; rel=next, \
                      <https://api.github.com/repositories/3/branches?page=4>; title=\"end\"; rel=\"last other\"";

        let cursor = parse_link_header(header,).expect("expected cursor",);
        assert_eq!((cursor.next_page, cursor.last_page), (2, 4));
    }

    #[test]
    fn cursor_advances_until_last_page()
    {
        let mut cursor = PageCursor {
            collection_id: 1, next_page: 2, last_page: 3,
        };

        assert_eq!(cursor.advance(), Some(2));
        assert_eq!(cursor.advance(), Some(3));
        assert_eq!(cursor.advance(), None);
        assert!(!cursor.has_more());
    }

    #[test]
    fn zero_next_page_is_exhausted()
    {
        let mut cursor = PageCursor {
            collection_id: 1, next_page: 0, last_page: 3,
        };
        assert!(!cursor.has_more());
        assert_eq!(cursor.advance(), None);
    }

    proptest! {
        #[test]
        fn relation_order_does_not_change_cursor(
            id in 1u64..10_000_000,
            next in 2u32..50,
            extra in 0u32..50,
            with_first in any::<bool>(),
            rotation in 0usize..4,
        ) {
            let last = next + extra;
            let mut relations = vec![relation(id, next, "next"), relation(id, last, "last")];
            if with_first {
                relations.push(relation(id, 1, "first"));
                relations.push(relation(id, next - 1, "prev"));
            }
            let shift = rotation % relations.len();
            relations.rotate_left(shift);

            let cursor = parse_link_header(&relations.join(", "));
            prop_assert_eq!(cursor, Some(PageCursor { collection_id: id, next_page: next, last_page: last }));
        }
    }
}
