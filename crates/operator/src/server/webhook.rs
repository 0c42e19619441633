//! Validating admission webhook for WebPinger resources.
//!
//! Only the interval is checked. Creates and updates with an interval
//! outside `[1m, 24h)` are rejected; every other operation is allowed.

use axum::Json;
use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
    ResourceExt,
};
use tracing::{debug, error, info};

use crate::{crd::WebPinger, Error};

pub async fn validate_webpinger(
    Json(body): Json<AdmissionReview<WebPinger>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<WebPinger> = match body.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    Json(review_webpinger(&request).into_review())
}

/// Decide a single admission request.
pub fn review_webpinger(request: &AdmissionRequest<WebPinger>) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    if !matches!(request.operation, Operation::Create | Operation::Update) {
        return response;
    }
    let Some(pinger) = &request.object else {
        return response;
    };

    match pinger.spec.validate() {
        Ok(()) => {
            debug!(uid = %request.uid, pinger = %pinger.name_any(), "Admitted WebPinger");
            response
        }
        Err(e) => {
            info!(
                uid = %request.uid,
                pinger = %pinger.name_any(),
                interval = %pinger.spec.interval,
                error = %e,
                "Rejected WebPinger"
            );
            let reason = match e {
                Error::Validation(message) => message,
                other => other.to_string(),
            };
            response.deny(reason)
        }
    }
}
