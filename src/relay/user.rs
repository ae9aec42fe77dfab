use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
};
use tracing::info;

use crate::relay::{Inbound, RelayError};
use crate::store::MessageStore;

pub const USER_ACK: &str = "Message sent to admin";

/// Accept a user's message and leave it pending for the admin.
/// An unread earlier message from the same user is replaced.
pub async fn handle_message(
    State(store): State<Arc<MessageStore>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<&'static str, RelayError> {
    let Inbound { user_id, text } = Inbound::parse(&body?, "message")?;

    info!("Message received from user {}: {}", user_id, text);
    store.put(user_id, text).await;

    Ok(USER_ACK)
}
