/// Queries with this many whitespace-separated tokens or fewer are expanded before search.
pub const SHORT_QUERY_MAX_TOKENS: usize = 3;

/// Trims the query. Returns `None` when nothing is left.
pub fn normalize(query: &str) -> Option<&str> {
	let trimmed = query.trim();

	if trimmed.is_empty() { None } else { Some(trimmed) }
}

pub fn token_count(query: &str) -> usize {
	query.split_whitespace().count()
}

pub fn is_short(query: &str) -> bool {
	token_count(query) <= SHORT_QUERY_MAX_TOKENS
}
