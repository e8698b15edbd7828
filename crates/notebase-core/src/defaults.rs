//! Default values and validation limits.

/// Maximum note content length, in Unicode code points.
pub const NOTE_CONTENT_MAX_CHARS: usize = 10_000;

/// Version counter value for a freshly created note.
pub const INITIAL_NOTE_VERSION: i32 = 1;

/// TTL for a cached single note, in seconds (1 hour).
pub const NOTE_CACHE_TTL_SECS: u64 = 3600;

/// TTL for a cached per-user note list, in seconds (1 hour).
pub const NOTE_LIST_CACHE_TTL_SECS: u64 = 3600;

/// TTL for cached search results, in seconds (30 minutes).
pub const SEARCH_CACHE_TTL_SECS: u64 = 1800;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        assert_eq!(NOTE_CONTENT_MAX_CHARS, 10_000);
        assert_eq!(INITIAL_NOTE_VERSION, 1);
    }

    #[test]
    fn test_search_ttl_shorter_than_note_ttl() {
        assert!(SEARCH_CACHE_TTL_SECS < NOTE_CACHE_TTL_SECS);
    }
}
