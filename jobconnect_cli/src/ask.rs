use eyre::eyre;
use jobconnect_chat::{ChatHandle, SendOutcome};
use std::io::Write;

/// Sends one prompt and writes the reply (plus sources) to `out`.
pub async fn ask(handle: &impl ChatHandle, prompt: &str, out: &mut impl Write) -> eyre::Result<()> {
    let pending = handle.send_message(prompt)?;
    match pending.outcome().await {
        SendOutcome::Replied(message) => {
            writeln!(out, "{}", message.content)?;
            if !message.sources.is_empty() {
                writeln!(out)?;
                writeln!(out, "Sources:")?;
                for source in &message.sources {
                    writeln!(out, "- {source}")?;
                }
            }
            Ok(())
        }
        SendOutcome::Failed(failure) => Err(eyre!(failure)),
        SendOutcome::Discarded | SendOutcome::Cancelled => Err(eyre!("No reply received")),
    }
}
