//! Request interception that drops images, fonts and media.

use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

/// Whether requests of this type are aborted before being sent.
pub(super) fn is_blocked(resource_type: &ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::Image | ResourceType::Font | ResourceType::Media
    )
}

/// Enable the Fetch domain on `page` and answer every paused request.
///
/// Returns the task driving the interception; abort it when the session ends.
pub(super) async fn block_heavy_resources(
    page: &Page,
) -> Result<JoinHandle<()>, chromiumoxide::error::CdpError> {
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    let intercept_page = page.clone();

    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let request_id = event.request_id.clone();
            let outcome = if is_blocked(&event.resource_type) {
                intercept_page
                    .execute(FailRequestParams::new(
                        request_id,
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
            } else {
                intercept_page
                    .execute(ContinueRequestParams::new(request_id))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = outcome {
                // The page may have navigated away from the paused request
                debug!("Intercepted request {} not resumed: {}", event.request.url, e);
            }
        }
    });

    // Patterns default to every request at the Request stage
    if let Err(e) = page.execute(EnableParams::default()).await {
        task.abort();
        return Err(e);
    }

    Ok(task)
}
