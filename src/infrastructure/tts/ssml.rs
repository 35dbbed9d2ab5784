//! Minimal SSML documents carrying prosody modifiers.

/// Prosody attributes for one document. Unset fields are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Prosody {
    pub rate_modifier: Option<i32>,
    pub pitch_hz: Option<f64>,
    /// Relative gain in dB
    pub volume_db: Option<f64>,
}

/// Wrap `text` in a `<speak>` document, with a `<prosody>` element when any
/// prosody attribute is set.
pub fn prosody_document(text: &str, locale: &str, prosody: Prosody) -> String {
    let mut attrs = String::new();
    if let Some(rate) = prosody.rate_modifier {
        attrs.push_str(&format!(" rate=\"{rate:+}%\""));
    }
    if let Some(pitch) = prosody.pitch_hz {
        attrs.push_str(&format!(" pitch=\"{pitch:.2}Hz\""));
    }
    if let Some(volume) = prosody.volume_db {
        attrs.push_str(&format!(" volume=\"{volume:+.1}dB\""));
    }

    let body = escape(text);
    let body = if attrs.is_empty() {
        body
    } else {
        format!("<prosody{attrs}>{body}</prosody>")
    };

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"{}\">{body}</speak>",
        locale.replace('_', "-")
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
