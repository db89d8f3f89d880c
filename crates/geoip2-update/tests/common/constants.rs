//! Shared constants for test infrastructure

// Credentials
pub const ACCOUNT_ID: &str = "123456";
pub const LICENSE_KEY: &str = "test-license-key";

// Version tokens
pub const DATE_2024_01_08: &str = "2024-01-08";
pub const DATE_2024_01_15: &str = "2024-01-15";
pub const DATE_2024_01_22: &str = "2024-01-22";

// Compact form used in download URLs
pub const DOWNLOAD_DATE_2024_01_15: &str = "20240115";

// Payloads
pub const MMDB_CONTENT: &[u8] = b"fake mmdb payload";
pub const LICENSE_CONTENT: &[u8] = b"GeoLite2 End User License Agreement";
pub const NOT_AN_ARCHIVE: &[u8] = b"this is not gzip data";
