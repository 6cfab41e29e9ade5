//! Conversation domain.
//!
//! - [`entities::Turn`]: one immutable utterance with an optional error marker
//! - [`entities::ConversationContext`]: append-only turn history for one id

pub mod entities;
