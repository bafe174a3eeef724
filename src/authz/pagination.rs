use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Derived pagination parameters for one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
    pub total_pages: u64,
}

impl PageRequest {
    /// Never fails: missing, non-numeric and non-positive inputs fall back to
    /// page 1 and `default_limit`.
    pub fn compute(raw_page: Option<&str>, raw_limit: Option<&str>, total: u64, default_limit: u64) -> Self {
        let default_limit = default_limit.max(1);
        let page = parse_positive(raw_page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(raw_limit).unwrap_or(default_limit);
        Self {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
            total_pages: total.div_ceil(limit),
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }
}

/// Leading-integer parse: optional whitespace and sign, then digits.
/// `"12abc"` is 12, `"abc"` is nothing. Only values above zero are returned.
pub fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let s = raw?.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 || negative {
        return None;
    }
    let value = digits[..end].parse::<u64>().unwrap_or(u64::MAX);
    (value > 0).then_some(value)
}

/// Caps a raw page size before it reaches the paginator. Unparsable input is
/// passed through so the paginator can apply its default.
pub fn cap_raw_limit(raw_limit: Option<&str>, max_limit: u64) -> Option<String> {
    let raw = raw_limit?;
    match parse_positive(Some(raw)) {
        Some(limit) if limit > max_limit => {
            tracing::warn!("Requested page size {} exceeds maximum {}, capping", limit, max_limit);
            Some(max_limit.to_string())
        }
        _ => Some(raw.to_string()),
    }
}
