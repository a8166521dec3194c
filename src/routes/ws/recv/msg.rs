use axum::extract::ws::{self, Message::Text};

#[derive(Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Bind this socket to the user behind a bearer token.
    Authenticate { token: String },
}

impl core::fmt::Debug for ClientMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Don't print the token
            ClientMsg::Authenticate { .. } => f.write_str("Authenticate"),
        }
    }
}

impl ClientMsg {
    /// Build a [`ClientMsg`] from a [`ws::Message`].
    /// The message must be the [`Text`](ws::Message::Text) variant.
    pub fn build(msg: ws::Message) -> Result<ClientMsg, BuildError> {
        let Text(msg) = msg else {
            return Err(BuildError::MsgType);
        };

        match serde_json::from_str(&msg) {
            Ok(msg) => Ok(msg),
            Err(err) => Err(BuildError::Serde(err)),
        }
    }
}

#[derive(Debug)]
pub enum BuildError {
    MsgType,
    Serde(serde_json::error::Error),
}
