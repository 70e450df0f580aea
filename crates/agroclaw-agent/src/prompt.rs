//! Prompt assembly.
//!
//! Pure string building, no I/O: history condensation, context block
//! formatting, and the final augmented prompt. The persona itself is
//! bound as a system instruction, not concatenated here.

use agroclaw_core::types::{ChatTurn, ScoredDocument};

/// Prior turns included in the prompt, newest last.
const HISTORY_WINDOW: usize = 5;

/// Flatten the last few turns into a `User:`/`Assistant:` transcript.
pub fn history_block(history: &[ChatTurn]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.user, turn.assistant))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap each retrieved document in explicit delimiters so the model can
/// tell database content apart from the user's words.
pub fn context_block(docs: &[ScoredDocument]) -> String {
    docs.iter()
        .map(|doc| {
            format!(
                "--- BEGIN CONTEXT FROM DATABASE ({}) ---\n{}\n--- END CONTEXT ---",
                doc.document.kind.as_str(),
                doc.document.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full prompt from message, history, and retrieved context.
pub fn assemble(message: &str, history: &[ChatTurn], docs: &[ScoredDocument]) -> String {
    if docs.is_empty() {
        if history.is_empty() {
            return message.to_string();
        }
        return format!(
            "{}\n\nUser: {}\nAssistant:",
            history_block(history),
            message
        );
    }

    let augmented = format!(
        "Kullanıcı Sorusu: {}\n\n\
         İlgili Dokümanlar (Context):\n{}\n\n\
         Yönerge: Yukarıdaki dokümanları temel alarak cevapla. Ancak kullanıcı konsepti \
         anlamaya yönelik genel sorular sorarsa (örn: 'nasıl çalışır?') ve dokümanlar \
         yetersizse, genel tarım bilginle konuyu detaylandır. 'Veri tabanımıza göre' \
         ifadesini gereksiz yere tekrarlama.",
        message,
        context_block(docs)
    );

    if history.is_empty() {
        augmented
    } else {
        format!("{}\n\n{}\nAssistant:", history_block(history), augmented)
    }
}
