use crate::core::markup::RenderPipeline;
use crate::core::message::TranscriptRole;
use crate::core::transcript::{DisplayContent, EntryBody, EntryId, Transcript};

/// Appends one finished message. Only assistant content is interpreted as
/// markup; every other role is shown as plain text so user-supplied text can
/// never be rendered as formatting.
pub fn render_message(
    transcript: &mut Transcript,
    pipeline: &RenderPipeline,
    role: TranscriptRole,
    content: &str,
) -> EntryId {
    let display = if role.is_assistant() {
        DisplayContent::Rich(pipeline.render_rich(content))
    } else {
        DisplayContent::Plain(content.to_string())
    };

    let id = transcript.push(role, EntryBody::Message(display));
    transcript.scroll_to_end();
    id
}
