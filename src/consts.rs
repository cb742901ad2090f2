//! Fixed constants from the legacy GeoIP binary format. Stable; test
//! fixtures and address-index arithmetic depend on these exact values.

pub const COUNTRY_BEGIN: u32 = 16_776_960;
pub const STATE_BEGIN_REV0: u32 = 16_700_000;
pub const STATE_BEGIN_REV1: u32 = 16_000_000;

pub const US_OFFSET: u32 = 1;
pub const CANADA_OFFSET: u32 = 677;
pub const WORLD_OFFSET: u32 = 1353;
pub const FIPS_RANGE: u32 = 360;

pub const STRUCTURE_INFO_MAX_SIZE: usize = 20;
#[allow(dead_code)]
pub const DATABASE_INFO_MAX_SIZE: usize = 100;
pub const FULL_RECORD_LENGTH: usize = 60;
pub const MAX_ORG_RECORD_LENGTH: usize = 300;

/// Legacy rebasing threshold: a header edition byte `>= REBASE_THRESHOLD`
/// is stored as `edition + 105` and must have 105 subtracted back out.
pub const REBASE_THRESHOLD: u8 = 106;
pub const REBASE_OFFSET: u8 = 105;

/// Three consecutive `0xFF` bytes mark the start of the trailing metadata
/// block, read from the tail of the database file.
pub const SENTINEL: [u8; 3] = [0xFF, 0xFF, 0xFF];
