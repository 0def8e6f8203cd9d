//! RFC 5322 message formatting.

use chrono::Utc;

use crate::record::EmailRecord;

/// Wrap width for base64 attachment content.
const BASE64_LINE_WIDTH: usize = 76;

/// Render a record into a complete message, headers and body.
///
/// Produces a plain-text message, or a `multipart/mixed` MIME message
/// when attachments are present. Lines are CRLF-terminated and the body
/// is dot-stuffed, so the result can be written to the wire as-is
/// (followed by the end-of-data marker).
pub(crate) fn format_message(email: &EmailRecord, message_id: &str) -> String {
    let mut out = String::new();

    push_header(&mut out, "From", &email.from);
    push_header(&mut out, "To", &email.to.join(", "));
    if !email.cc.is_empty() {
        push_header(&mut out, "Cc", &email.cc.join(", "));
    }
    push_header(&mut out, "Subject", &email.subject);
    push_header(&mut out, "Date", &Utc::now().to_rfc2822());
    push_header(&mut out, "Message-ID", message_id);
    push_header(&mut out, "MIME-Version", "1.0");

    if email.attachments.is_empty() {
        push_header(&mut out, "Content-Type", "text/plain; charset=utf-8");
        out.push_str("\r\n");
        out.push_str(&normalize_newlines(&email.body));
    } else {
        // Derive the boundary from the message id so it is unique per
        // message without another source of randomness
        let boundary = format!(
            "=_halyard_{}",
            message_id.trim_matches(['<', '>']).replace('@', "_")
        );
        push_header(
            &mut out,
            "Content-Type",
            &format!("multipart/mixed; boundary=\"{boundary}\""),
        );
        out.push_str("\r\n");

        out.push_str(&format!("--{boundary}\r\n"));
        out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        out.push_str(&normalize_newlines(&email.body));
        out.push_str("\r\n");

        for attachment in &email.attachments {
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str(&format!(
                "Content-Type: {}; name=\"{}\"\r\n",
                attachment.content_type, attachment.filename
            ));
            out.push_str("Content-Transfer-Encoding: base64\r\n");
            out.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
                attachment.filename
            ));
            for chunk in attachment.content.as_bytes().chunks(BASE64_LINE_WIDTH) {
                out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
                out.push_str("\r\n");
            }
        }
        out.push_str(&format!("--{boundary}--\r\n"));
    }

    dot_stuff(&out)
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

/// Convert bare LF line endings to CRLF.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Double any leading dot so message lines cannot terminate DATA early
/// (RFC 5321 section 4.5.2).
fn dot_stuff(data: &str) -> String {
    let stuffed = data.replace("\r\n.", "\r\n..");
    if let Some(rest) = stuffed.strip_prefix('.') {
        format!("..{rest}")
    } else {
        stuffed
    }
}

#[cfg(test)]
mod tests {
    use crate::record::Attachment;

    use super::*;

    #[test]
    fn plain_message_has_the_expected_headers() {
        let email = EmailRecord::new(
            "ops@example.org",
            "staff@example.org",
            "maintenance window",
            "Saturday 06:00-08:00",
        )
        .and_cc("noc@example.org");

        let message = format_message(&email, "<01ARZ3NDEK@halyard.local>");

        assert!(message.starts_with("From: ops@example.org\r\n"));
        assert!(message.contains("To: staff@example.org\r\n"));
        assert!(message.contains("Cc: noc@example.org\r\n"));
        assert!(message.contains("Subject: maintenance window\r\n"));
        assert!(message.contains("Message-ID: <01ARZ3NDEK@halyard.local>\r\n"));
        assert!(message.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(message.ends_with("Saturday 06:00-08:00"));
    }

    #[test]
    fn attachments_produce_a_multipart_message() {
        let email = EmailRecord::new("a@x.org", "b@x.org", "roster", "attached")
            .with_attachment(Attachment::from_bytes("roster.csv", "text/csv", b"a,b\n1,2\n"));

        let message = format_message(&email, "<id@halyard.local>");

        assert!(message.contains("Content-Type: multipart/mixed; boundary="));
        assert!(message.contains("Content-Type: text/csv; name=\"roster.csv\"\r\n"));
        assert!(message.contains("Content-Transfer-Encoding: base64\r\n"));
        assert!(
            message.contains("Content-Disposition: attachment; filename=\"roster.csv\"\r\n")
        );
        // Terminal boundary present
        assert!(message.contains("--\r\n"));
    }

    #[test]
    fn body_lines_get_crlf_endings() {
        let email = EmailRecord::new("a@x.org", "b@x.org", "s", "line one\nline two");
        let message = format_message(&email, "<id@halyard.local>");
        assert!(message.contains("line one\r\nline two"));
    }

    #[test]
    fn leading_dots_are_stuffed() {
        let email = EmailRecord::new("a@x.org", "b@x.org", "s", ".hidden\n..more");
        let message = format_message(&email, "<id@halyard.local>");
        assert!(message.contains("\r\n..hidden\r\n...more"));
    }
}
