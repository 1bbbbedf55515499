//! Search classification and explorer view selection.
//!
//! A view is selected by exactly one of `tx`, `address` or `block`, checked in
//! that order, and falls back to the latest transactions list.
//!
//! ## Query formats
//!
//! - `?tx=<version>` - transaction detail
//! - `?address=<0x...>` - account detail
//! - `?block=<height>` - block detail
//! - empty - latest transactions
//!
//! Free-text search maps onto the same routes through
//! [`classify_search_input`].

/// Default split between block heights and transaction versions.
///
/// Movement mainnet passed one million versions long before one million
/// blocks, so small numbers are far more likely to be heights. Purely a
/// heuristic, which is why it is configurable.
pub const DEFAULT_VERSION_THRESHOLD: u64 = 1_000_000;

/// What a search string looks like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchKind {
    Address(String),
    Version(u64),
    Block(u64),
    Invalid,
}

/// `0x` followed by exactly 64 hex digits.
pub fn is_valid_address(input: &str) -> bool {
    input
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Non-empty string of ASCII digits.
pub fn is_numeric(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}

/// Classify a search box entry.
///
/// Numbers above `version_threshold` are treated as transaction versions,
/// the rest as block heights. Digit strings too large for a u64 cannot be
/// block heights and classify as `Version(u64::MAX)`.
pub fn classify_search_input(raw: &str, version_threshold: u64) -> SearchKind {
    let trimmed = raw.trim();
    if is_valid_address(trimmed) {
        return SearchKind::Address(trimmed.to_string());
    }
    if is_numeric(trimmed) {
        return match trimmed.parse::<u64>() {
            Ok(n) if n > version_threshold => SearchKind::Version(n),
            Ok(n) => SearchKind::Block(n),
            Err(_) => SearchKind::Version(u64::MAX),
        };
    }
    SearchKind::Invalid
}

/// Explorer view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Latest transactions (default)
    Latest,
    Transaction { version: u64 },
    Account { address: String },
    Block { height: u64 },
}

impl Route {
    /// Route for a search entry; `None` when the input is not searchable.
    pub fn from_search(raw: &str, version_threshold: u64) -> Option<Route> {
        match classify_search_input(raw, version_threshold) {
            SearchKind::Address(address) => Some(Route::Account { address }),
            SearchKind::Version(version) => Some(Route::Transaction { version }),
            SearchKind::Block(height) => Some(Route::Block { height }),
            SearchKind::Invalid => None,
        }
    }

    /// Parse `tx=..&address=..&block=..` (leading `?` optional).
    ///
    /// Precedence is tx, then address, then block. A present but unusable
    /// value (non-numeric `tx`, empty `address`) is skipped like an absent
    /// one, and zero is treated as absent for `tx` and `block`.
    pub fn from_query(query: &str) -> Route {
        let query = query.trim().trim_start_matches('?');
        let query = strip_fragment(query);

        let mut tx = None;
        let mut address = None;
        let mut block = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            match key {
                "tx" if tx.is_none() => tx = leading_number(&value).filter(|v| *v != 0),
                "address" if address.is_none() => {
                    address = Some(value.trim().to_string()).filter(|a| !a.is_empty())
                }
                "block" if block.is_none() => block = leading_number(&value).filter(|h| *h != 0),
                _ => {}
            }
        }

        if let Some(version) = tx {
            Route::Transaction { version }
        } else if let Some(address) = address {
            Route::Account { address }
        } else if let Some(height) = block {
            Route::Block { height }
        } else {
            Route::Latest
        }
    }

    /// Query string that selects this view.
    pub fn to_query(&self) -> String {
        match self {
            Route::Latest => String::new(),
            Route::Transaction { version } => format!("?tx={version}"),
            Route::Account { address } => format!("?address={}", urlencoding::encode(address)),
            Route::Block { height } => format!("?block={height}"),
        }
    }
}

#[inline]
fn strip_fragment(s: &str) -> &str {
    match s.find('#') {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Parse leading digits like `parseInt("123abc", 10)` does.
fn leading_number(s: &str) -> Option<u64> {
    let s = s.trim();
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    s[..end].parse().ok()
}
