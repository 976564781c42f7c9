// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Forum administrator - manages the category structure and settings
pub const ROLE_ADMINISTRATOR: &str = "administrator";

/// Role applied to anonymous callers
pub const ROLE_GUEST: &str = "guest";

// =============================================================================
// PERMISSIONS
// =============================================================================

/// Permission granting read access to a category's discussions
pub const PERMISSION_DISCUSSIONS_VIEW: &str = "discussions.view";

/// `permissions.junction_table` value for category-scoped permissions
pub const JUNCTION_CATEGORY: &str = "category";

// =============================================================================
// SETTINGS KEYS
// =============================================================================

/// Whether the forum exposes more than one category
pub const SETTING_CATEGORIES_USE: &str = "categories.use";
