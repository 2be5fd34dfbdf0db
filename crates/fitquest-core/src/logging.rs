//! Structured logging schema and field name constants for fitquest.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, fallback applied (e.g. geocoding miss) |
//! | INFO  | Lifecycle events, mission transitions, import completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-row iteration (import rows, nearby candidates) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "geocode", "import"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "missions", "profiles", "kakao", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "generate", "complete", "lookup", "backfill"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID.
pub const USER_ID: &str = "user_id";

/// Mission UUID.
pub const MISSION_ID: &str = "mission_id";

/// User mission UUID.
pub const USER_MISSION_ID: &str = "user_mission_id";

/// Place UUID.
pub const PLACE_ID: &str = "place_id";

/// Record kind being imported or geocoded ("places", "bike_racks", ...).
pub const RECORD_KIND: &str = "record_kind";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Distance in kilometres.
pub const DISTANCE_KM: &str = "distance_km";

/// Points credited.
pub const POINTS: &str = "points";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
