//! Compliance checklist toggling
//!
//! The one place the dashboard flips state before the server confirms it.
//! When the save fails the local flip stays in place and the outcome says so
//! with `durable: false`; the next poll restores the server's value.

use std::future::Future;

use chrono::Utc;
use shared::{ComplianceCheck, ToggleCheckRequest};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::cache::SharedCache;
use crate::error::{ClientError, ClientResult};
use crate::notice::ActionNotice;

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    /// The check as the screen should now show it
    pub check: ComplianceCheck,
    /// Whether the server stored the change
    pub durable: bool,
    pub notice: Option<ActionNotice>,
}

/// Flip a check and save it through the API
pub async fn toggle_check(
    api: &ApiClient,
    cache: &SharedCache<ComplianceCheck>,
    id: Uuid,
) -> ClientResult<ToggleOutcome> {
    toggle_with(cache, id, |request| async move {
        api.toggle_compliance_check(id, &request).await
    })
    .await
}

/// Flip a check locally, then persist it with `save`
pub async fn toggle_with<F, Fut>(
    cache: &SharedCache<ComplianceCheck>,
    id: Uuid,
    save: F,
) -> ClientResult<ToggleOutcome>
where
    F: FnOnce(ToggleCheckRequest) -> Fut,
    Fut: Future<Output = ClientResult<ComplianceCheck>>,
{
    let (flipped, request) = {
        let mut guard = cache.lock().await;
        let check = guard
            .get_mut(&id)
            .ok_or_else(|| ClientError::NotFound("Compliance check".to_string()))?;
        check.set_completed(!check.completed, Utc::now());
        let request = ToggleCheckRequest {
            completed: check.completed,
            expected_version: Some(check.version),
        };
        let flipped = check.clone();
        guard.begin_write(id);
        (flipped, request)
    };

    match save(request).await {
        Ok(saved) => {
            cache.lock().await.confirm_write(saved.clone());
            Ok(ToggleOutcome {
                check: saved,
                durable: true,
                notice: None,
            })
        }
        Err(err) => {
            cache.lock().await.abort_write(&id);
            tracing::warn!(check = %id, error = %err, "Compliance check not saved");
            Ok(ToggleOutcome {
                check: flipped,
                durable: false,
                notice: Some(ActionNotice::not_saved("save compliance check")),
            })
        }
    }
}
