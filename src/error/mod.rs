/**
 * Engine Error Types
 *
 * This module defines the error taxonomy shared by every engine operation,
 * plus the mapping from errors to HTTP-equivalent status classes consumed by
 * whatever transport layer sits on top of the engines.
 *
 * # Error Categories
 *
 * - `Unauthorized` - acting identity does not match the resource owner/admin
 * - `NotFound` - a referenced user/channel/sub-channel/institution is absent
 * - `AlreadyAdmin` - promotion target already holds the role (no-op signal)
 * - `InvalidTarget` - both or neither of channel/sub-channel specified
 * - `ExternalService` - the push Topic Bridge refused an operation
 * - `Validation` - malformed input caught before any mutation
 * - `Database` / `Token` - infrastructure failures
 *
 * An expired or already-consumed invitation is NOT an error: lookups that
 * miss produce `PromotionOutcome::LinkExpired` so callers branch on
 * structure, not on a sentinel string.
 */

mod conversion;
mod types;

pub use conversion::StatusClass;
pub use types::EngineError;

/// Result alias used across the engines and stores
pub type EngineResult<T> = Result<T, EngineError>;
