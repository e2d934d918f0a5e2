/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// MESSAGES
// =============================================================================

/// Returned when an uploaded file has a type outside the media allow-list
pub const INVALID_FILE_TYPE_MESSAGE: &str =
    "Invalid file type. Only images and videos are allowed.";

/// Returned when a report is submitted without its image evidence
pub const IMAGE_REQUIRED_MESSAGE: &str = "Image is required";

/// Returned when a report references a business that does not exist
pub const BUSINESS_NOT_FOUND_MESSAGE: &str = "Business not found";

/// Returned when a business id path segment is not an integer
pub const INVALID_BUSINESS_ID_MESSAGE: &str = "Invalid business id";

// =============================================================================
// MEDIA LIMITS
// =============================================================================

/// Largest accepted report image
pub const IMAGE_MAX_BYTES: u64 = 5_000_000;

/// Largest accepted report video
pub const VIDEO_MAX_BYTES: u64 = 50_000_000;
