//! Opaque cursor and pagination envelope primitives.
//!
//! List and search endpoints accept a [`PageRequest`] (client-supplied limit
//! plus an opaque continuation cursor), resolve it against server-side
//! [`ListLimits`] into a concrete [`PageWindow`], and return a [`Page`]
//! envelope carrying the items, the backing-query total, and the cursor for
//! the next window. Cursors are opaque to clients: a base64 token wrapping a
//! JSON offset payload, so the encoding can evolve without breaking callers.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned when pagination inputs cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// The cursor token is not valid base64.
    #[error("cursor token is not valid base64")]
    CursorEncoding,
    /// The cursor token decoded but does not carry a recognised payload.
    #[error("cursor token payload is malformed")]
    CursorMalformed,
    /// The configured limits are unusable (zero or inverted).
    #[error("page size limits are invalid: default {default}, max {max}")]
    InvalidLimits {
        /// Configured default page size.
        default: u32,
        /// Configured maximum page size.
        max: u32,
    },
}

/// Server-side clamps applied to client-supplied page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    default_page_size: u32,
    max_page_size: u32,
}

impl ListLimits {
    /// Build limits, rejecting zero or inverted values.
    ///
    /// # Examples
    /// ```
    /// use pagination::ListLimits;
    ///
    /// let limits = ListLimits::try_new(20, 100).expect("valid limits");
    /// assert_eq!(limits.default_page_size(), 20);
    /// assert!(ListLimits::try_new(0, 100).is_err());
    /// assert!(ListLimits::try_new(50, 10).is_err());
    /// ```
    pub const fn try_new(default_page_size: u32, max_page_size: u32) -> Result<Self, PaginationError> {
        if default_page_size == 0 || max_page_size == 0 || default_page_size > max_page_size {
            return Err(PaginationError::InvalidLimits {
                default: default_page_size,
                max: max_page_size,
            });
        }
        Ok(Self {
            default_page_size,
            max_page_size,
        })
    }

    /// Page size applied when the client supplies none.
    #[must_use]
    pub const fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Largest page size a client may request.
    #[must_use]
    pub const fn max_page_size(&self) -> u32 {
        self.max_page_size
    }
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    o: u64,
}

/// Continuation point into an ordered result set.
///
/// The wire form is an opaque token; only this crate interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    offset: u64,
}

impl Cursor {
    /// Cursor pointing at the given absolute offset.
    #[must_use]
    pub const fn at(offset: u64) -> Self {
        Self { offset }
    }

    /// Absolute offset this cursor points at.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Encode into the opaque wire token.
    #[must_use]
    pub fn encode(&self) -> String {
        let payload = CursorPayload { o: self.offset };
        // CursorPayload is a closed struct of primitives; serialisation cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode an opaque wire token back into a cursor.
    ///
    /// # Examples
    /// ```
    /// use pagination::Cursor;
    ///
    /// let token = Cursor::at(40).encode();
    /// assert_eq!(Cursor::decode(&token).expect("valid token").offset(), 40);
    /// assert!(Cursor::decode("not-a-cursor!").is_err());
    /// ```
    pub fn decode(token: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| PaginationError::CursorEncoding)?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|_| PaginationError::CursorMalformed)?;
        Ok(Self { offset: payload.o })
    }
}

/// Client-supplied pagination inputs, prior to clamping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Requested page size; clamped against [`ListLimits`].
    pub limit: Option<u32>,
    /// Opaque continuation token from a previous [`Page`].
    pub cursor: Option<String>,
}

impl PageRequest {
    /// First page with the server default size.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            limit: None,
            cursor: None,
        }
    }

    /// Resolve into a concrete window, clamping the limit and decoding the
    /// cursor.
    ///
    /// # Examples
    /// ```
    /// use pagination::{ListLimits, PageRequest};
    ///
    /// let limits = ListLimits::default();
    /// let window = PageRequest { limit: Some(500), cursor: None }
    ///     .resolve(&limits)
    ///     .expect("resolves");
    /// assert_eq!(window.limit, limits.max_page_size());
    /// assert_eq!(window.offset, 0);
    /// ```
    pub fn resolve(&self, limits: &ListLimits) -> Result<PageWindow, PaginationError> {
        let limit = self
            .limit
            .unwrap_or(limits.default_page_size())
            .clamp(1, limits.max_page_size());
        let offset = match self.cursor.as_deref() {
            Some(token) => Cursor::decode(token)?.offset(),
            None => 0,
        };
        Ok(PageWindow { offset, limit })
    }
}

/// Concrete slice of an ordered result set after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Absolute offset of the first item.
    pub offset: u64,
    /// Number of items the backing query should return.
    pub limit: u32,
}

impl PageWindow {
    /// Cursor for the window following this one, if the backing result set
    /// extends past it.
    #[must_use]
    pub fn next_cursor(&self, total: u64) -> Option<String> {
        let end = self.offset.saturating_add(u64::from(self.limit));
        (end < total).then(|| Cursor::at(end).encode())
    }
}

/// Uniform envelope returned by list and search endpoints.
///
/// `total` reflects the backing query; per-item authorisation filtering may
/// leave `items` shorter than the window requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items visible to the caller within the requested window.
    pub items: Vec<T>,
    /// Number of records the backing query matched.
    pub total: u64,
    /// Opaque token for the next window, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Assemble a page envelope for a resolved window.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            next_cursor: window.next_cursor(total),
        }
    }

    /// Page representing an empty result set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            next_cursor: None,
        }
    }
}
