use crate::device_display::interface::DeviceDisplay;
use crate::result_channel::core::State;
use crate::transfer::outcome::TransferOutcome;
use std::error::Error;

fn percent(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

pub fn lines(state: &State) -> Vec<String> {
    match state {
        State::Idle => vec!["Ready".to_string()],
        State::Pending { request } => vec![format!(
            "Uploading {} ({})...",
            request.buffer.file_name(),
            request.model
        )],
        State::Settled { outcome, .. } => match outcome {
            TransferOutcome::Success {
                predicted_class,
                confidence,
                all_predictions,
            } => {
                let mut lines = vec![
                    format!("Class: {}", predicted_class),
                    format!("Confidence: {}", percent(*confidence)),
                ];
                if !all_predictions.is_empty() {
                    lines.push("All Predictions:".to_string());
                    lines.extend(
                        all_predictions
                            .iter()
                            .map(|p| format!("{}: {}", p.class, percent(p.confidence))),
                    );
                }
                lines
            }
            TransferOutcome::Failure(failure) => vec![format!("Error: {}", failure.message)],
        },
    }
}

pub fn render(state: &State, display: &mut dyn DeviceDisplay) -> Result<(), Box<dyn Error + Send + Sync>> {
    display.clear()?;
    for (i, line) in lines(state).iter().enumerate() {
        display.write_line(i, line)?;
    }
    display.present()?;
    Ok(())
}
