use crate::error::ErrorKind;
use crate::transfer::interface::{TransportError, TransportResponse};
use crate::transfer::outcome::{Failure, Prediction, TransferOutcome};
use serde::Deserialize;

/// Statuses that signal temporary unavailability and are worth retrying.
pub const TRANSIENT_STATUSES: [u16; 5] = [408, 429, 502, 503, 504];

pub fn is_transient_status(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

#[derive(Debug, Deserialize)]
struct SuccessPayload {
    data: Option<PredictionData>,
}

#[derive(Debug, Deserialize)]
struct PredictionData {
    predicted_class: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    all_predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

pub fn classify_transport_error(error: &TransportError) -> Failure {
    match error {
        TransportError::InvalidRequest(_) => Failure::new(ErrorKind::Network, error.to_string(), false),
        _ => Failure::new(ErrorKind::Network, error.to_string(), true),
    }
}

pub fn classify_response(response: &TransportResponse) -> TransferOutcome {
    if !response.is_success() {
        return TransferOutcome::Failure(remote_rejection(response));
    }

    match parse_success(&response.body) {
        Ok(outcome) => outcome,
        Err(reason) => TransferOutcome::Failure(Failure::new(
            ErrorKind::MalformedResponse,
            reason,
            false,
        )),
    }
}

fn remote_rejection(response: &TransportResponse) -> Failure {
    let message = serde_json::from_slice::<ErrorPayload>(&response.body)
        .ok()
        .and_then(|payload| payload.error)
        .filter(|error| !error.is_empty())
        .unwrap_or_else(|| format!("endpoint responded with status {}", response.status));

    Failure::new(
        ErrorKind::RemoteRejected,
        message,
        is_transient_status(response.status),
    )
}

fn parse_success(body: &[u8]) -> Result<TransferOutcome, String> {
    let payload: SuccessPayload =
        serde_json::from_slice(body).map_err(|e| format!("response is not valid JSON: {}", e))?;

    let data = payload
        .data
        .ok_or_else(|| "response is missing 'data'".to_string())?;

    let predicted_class = data
        .predicted_class
        .ok_or_else(|| "response is missing 'data.predicted_class'".to_string())?;

    let confidence = data
        .confidence
        .ok_or_else(|| "response is missing 'data.confidence'".to_string())?;

    check_confidence(confidence)?;
    for prediction in &data.all_predictions {
        check_confidence(prediction.confidence)?;
    }

    Ok(TransferOutcome::Success {
        predicted_class,
        confidence,
        all_predictions: data.all_predictions,
    })
}

fn check_confidence(confidence: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(format!("confidence {} is outside [0, 1]", confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: serde_json::Value) -> TransportResponse {
        TransportResponse::new(status, body.to_string())
    }

    #[test]
    fn test_success_payload() {
        let outcome = classify_response(&response(
            200,
            json!({
                "success": true,
                "data": {
                    "predicted_class": "cat",
                    "confidence": 0.97,
                    "all_predictions": [
                        {"class": "cat", "confidence": 0.97},
                        {"class": "dog", "confidence": 0.03}
                    ]
                }
            }),
        ));

        assert_eq!(
            outcome,
            TransferOutcome::Success {
                predicted_class: "cat".to_string(),
                confidence: 0.97,
                all_predictions: vec![
                    Prediction {
                        class: "cat".to_string(),
                        confidence: 0.97
                    },
                    Prediction {
                        class: "dog".to_string(),
                        confidence: 0.03
                    },
                ],
            }
        );
    }

    #[test]
    fn test_success_without_all_predictions() {
        let outcome = classify_response(&response(
            200,
            json!({"data": {"predicted_class": "Dog", "confidence": 0.9}}),
        ));

        match outcome {
            TransferOutcome::Success {
                all_predictions, ..
            } => assert!(all_predictions.is_empty()),
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_success_payloads() {
        let bodies = [
            json!({"message": "Prediction successful"}),
            json!({"data": {"confidence": 0.5}}),
            json!({"data": {"predicted_class": "cat"}}),
            json!({"data": {"predicted_class": "cat", "confidence": 1.5}}),
            json!({"data": {"predicted_class": "cat", "confidence": 0.5,
                "all_predictions": [{"class": "cat", "confidence": -0.1}]}}),
        ];

        for body in bodies {
            let outcome = classify_response(&response(200, body.clone()));
            let failure = outcome.failure().cloned().unwrap();
            assert_eq!(failure.kind, ErrorKind::MalformedResponse, "{}", body);
            assert!(!failure.retryable);
        }

        let outcome = classify_response(&TransportResponse::new(200, "<html>"));
        assert_eq!(outcome.failure().unwrap().kind, ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_rejection_uses_error_message() {
        let outcome = classify_response(&response(
            400,
            json!({"success": false, "error": "Invalid model specified: vgg"}),
        ));

        assert_eq!(
            outcome,
            TransferOutcome::Failure(Failure::new(
                ErrorKind::RemoteRejected,
                "Invalid model specified: vgg",
                false
            ))
        );
    }

    #[test]
    fn test_rejection_without_payload() {
        let outcome = classify_response(&TransportResponse::new(500, "Internal Server Error"));

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::RemoteRejected);
        assert_eq!(failure.message, "endpoint responded with status 500");
        assert!(!failure.retryable);
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        for status in [408, 429, 502, 503, 504] {
            let outcome = classify_response(&response(status, json!({"error": "busy"})));
            assert!(outcome.failure().unwrap().retryable, "{}", status);
        }

        for status in [400, 401, 404, 413, 500] {
            let outcome = classify_response(&response(status, json!({"error": "no"})));
            assert!(!outcome.failure().unwrap().retryable, "{}", status);
        }
    }

    #[test]
    fn test_transport_errors_are_network_failures() {
        let failure = classify_transport_error(&TransportError::Timeout);
        assert_eq!(failure.kind, ErrorKind::Network);
        assert!(failure.retryable);

        let failure = classify_transport_error(&TransportError::InvalidRequest("bad url".into()));
        assert_eq!(failure.kind, ErrorKind::Network);
        assert!(!failure.retryable);
    }
}
