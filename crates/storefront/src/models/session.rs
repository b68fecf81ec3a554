//! Session-related types.
//!
//! The session carries who the visitor is (as reported by the
//! authentication hook) and, while they are anonymous, their local lists
//! under each list kind's storage key.

/// Session keys.
pub mod keys {
    /// Key for the visitor's [`ListOwner`](cartsync_core::ListOwner).
    pub const CURRENT_OWNER: &str = "current_owner";
}
