use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
};
use tracing::{info, warn};

use crate::relay::{Inbound, RelayError};
use crate::store::MessageStore;

pub const ADMIN_ACK: &str = "Response sent to user";

/// Accept the admin's reply and clear the user's pending message.
///
/// A reply for a user with nothing pending (never sent, or already answered)
/// still succeeds; the miss only shows up in the log.
pub async fn handle_response(
    State(store): State<Arc<MessageStore>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<&'static str, RelayError> {
    let Inbound { user_id, text } = Inbound::parse(&body?, "response")?;

    info!("Response received from admin for {}: {}", user_id, text);

    match store.take_and_clear(&user_id).await {
        Some(message) => info!(
            "Response delivered to {} (answering: {}): {}",
            user_id, message, text
        ),
        None => warn!("No pending message found for user_id: {}", user_id),
    }

    Ok(ADMIN_ACK)
}
