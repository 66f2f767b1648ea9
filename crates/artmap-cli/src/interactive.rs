use anyhow::Result;
use console::Term;
use dialoguer::Confirm;

/// Ask before a layer and its artifacts are removed.
///
/// Without a terminal there is nobody to ask, so the answer is no.
pub fn confirm_layer_delete(layer: &str, artifact_count: usize) -> Result<bool> {
    if !Term::stderr().is_term() {
        return Ok(false);
    }

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Delete layer '{}' and its {} artifact(s)?",
            layer, artifact_count
        ))
        .default(false)
        .interact()?;

    Ok(confirmed)
}
