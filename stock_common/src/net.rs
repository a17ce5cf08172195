//! Transport defaults for the quote source.

/// Base URL of the Sina quote endpoint; symbols go in the `list` query parameter.
pub const DEFAULT_QUOTE_ENDPOINT: &str = "http://hq.sinajs.cn/";
/// Query parameter carrying the requested symbol(s).
pub const LIST_PARAM: &str = "list";
/// Request timeout used by the CLI when none is given.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
/// The endpoint rejects requests without a finance.sina.com.cn referer.
pub const DEFAULT_REFERER: &str = "https://finance.sina.com.cn/";

/// Upper bound on concurrent requests issued by one batch fetch.
pub const DEFAULT_MAX_PARALLEL: usize = 8;
