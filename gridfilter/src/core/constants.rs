// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, identifiers and log targets)
pub const APP_NAME_LOWER: &str = "gridfilter";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "gridfilter.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "GRIDFILTER_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "GRIDFILTER_LOG";

/// Environment variable for the database backend (sqlite or postgres)
pub const ENV_BACKEND: &str = "GRIDFILTER_BACKEND";

/// Environment variable for the database connection URL
pub const ENV_DATABASE_URL: &str = "GRIDFILTER_DATABASE_URL";

// =============================================================================
// Database Defaults
// =============================================================================

/// Default connection URL
pub const DEFAULT_DATABASE_URL: &str = "sqlite://gridfilter.db";

/// Default pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Descriptor Limits
// =============================================================================

/// Maximum size of descriptor JSON in bytes (64KB)
pub const DEFAULT_MAX_DESCRIPTOR_BYTES: usize = 64 * 1024;

/// Maximum number of columns in a descriptor
pub const DEFAULT_MAX_COLUMNS: usize = 100;

/// Maximum number of filter and interval entries in a descriptor
pub const DEFAULT_MAX_ENTRIES: usize = 200;

// =============================================================================
// Template Defaults
// =============================================================================

/// Page lengths offered when a template declares none
pub const DEFAULT_LENGTH_MENU: [u32; 5] = [10, 15, 20, 25, 30];
