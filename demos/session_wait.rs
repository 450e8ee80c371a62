//! Issue message ids, wait for a follow-up update, and feed it in the way a
//! transport receive loop would.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use chat_rpc_core::{Result, Session, SessionConfig, Update};

#[derive(Debug, Serialize, Deserialize)]
struct PhotoUploaded {
    file_id: u64,
    caption: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let config = SessionConfig::default().with_listener_timeout(Duration::from_secs(2));
    let session = Session::new(config)?;

    for _ in 0..3 {
        let id = session.next_message_id();
        tracing::info!(%id, seconds = id.seconds(), offset = id.offset(), "outbound request");
    }

    let pending = session.listen_filtered("photo", |update| !update.payload.is_empty());

    // Stand-in for the transport's receive loop.
    let dispatcher = session.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let event = PhotoUploaded {
            file_id: 42,
            caption: "sunset".into(),
        };
        match Update::json("photo", &event) {
            Ok(update) => {
                let resolved = dispatcher.dispatch(update);
                tracing::info!(resolved, "dispatched photo update");
            }
            Err(err) => tracing::error!("failed to encode update: {err}"),
        }
    });

    let update = pending.wait().await?;
    let photo: PhotoUploaded = update.decode()?;
    tracing::info!(?photo, "received");

    // Nobody is listening any more; this is a no-op.
    let late = session.dispatch(Update::json("photo", &photo)?);
    tracing::info!(late, pending = session.pending_count(), "done");

    Ok(())
}
