//! Administrative review of registration requests

use std::sync::Arc;

use crate::database::RegistrationStore;
use crate::models::{RegistrationRequest, RequestStatus};
use crate::utils::errors::{RegistrationDeskError, Result};
use crate::utils::logging::log_review_action;

#[derive(Clone)]
pub struct ReviewService {
    registrations: Arc<dyn RegistrationStore>,
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService").finish_non_exhaustive()
    }
}

impl ReviewService {
    pub fn new(registrations: Arc<dyn RegistrationStore>) -> Self {
        Self { registrations }
    }

    /// Newest first, optionally filtered by status
    pub async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<RegistrationRequest>> {
        self.registrations.list_requests(status).await
    }

    pub async fn get(&self, request_id: i64) -> Result<RegistrationRequest> {
        self.registrations
            .find_request(request_id)
            .await?
            .ok_or(RegistrationDeskError::RegistrationRequestNotFound { request_id })
    }

    /// Approve a pending request and add the user to the role's membership set
    pub async fn approve(&self, request_id: i64, reviewer: Option<i64>) -> Result<RegistrationRequest> {
        let request = self.registrations.approve_request(request_id, reviewer).await.inspect_err(|e| {
            log_review_action(request_id, "approve_refused", reviewer, Some(&e.to_string()));
        })?;

        log_review_action(request_id, "approved", reviewer, Some(request.role.as_str()));
        Ok(request)
    }

    /// Reject a pending or approved request; an approved one loses its membership
    pub async fn reject(
        &self,
        request_id: i64,
        reviewer: Option<i64>,
        reason: Option<String>,
    ) -> Result<RegistrationRequest> {
        let request = self
            .registrations
            .reject_request(request_id, reviewer, reason)
            .await
            .inspect_err(|e| {
                log_review_action(request_id, "reject_refused", reviewer, Some(&e.to_string()));
            })?;

        log_review_action(request_id, "rejected", reviewer, request.rejection_reason.as_deref());
        Ok(request)
    }
}
