//! Helpers for sanitizing identifiers before they leave the process.
//!
//! Job tags go to Textract, which only accepts `[A-Za-z0-9_.\-:]{1,64}`.
//! Object keys go into span fields, where only the file name is kept.

/// Textract's upper bound for `JobTag`.
pub const MAX_JOB_TAG_LEN: usize = 64;

const UNTAGGED: &str = "untagged";

/// Derives a Textract-safe job tag from a job id.
///
/// Truncates to [`MAX_JOB_TAG_LEN`] characters, strips trailing file
/// extensions, and replaces every character outside `[A-Za-z0-9_.\-:]` with
/// `-`. Applying it twice yields the same tag.
pub fn sanitize_job_tag(job_id: &str) -> String {
    let truncated: String = job_id.chars().take(MAX_JOB_TAG_LEN).collect();

    let mut stem = truncated.as_str();
    while let Some(shorter) = strip_extension(stem) {
        stem = shorter;
    }

    let tag: String = stem
        .chars()
        .map(|c| if is_tag_char(c) { c } else { '-' })
        .collect();

    if tag.is_empty() {
        UNTAGGED.to_string()
    } else {
        tag
    }
}

/// Whether `job_id` is already its own job tag.
///
/// Completion messages carry only the tag, so a job id that sanitizing would
/// rewrite can never be matched back to its record.
pub fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.is_empty() && sanitize_job_tag(job_id) == job_id
}

/// Returns `name` without a trailing `.ext` (1-5 ASCII alphanumerics), or
/// `None` when there is nothing to strip. Never returns an empty stem.
fn strip_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > 5
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(stem)
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ':')
}

/// Builds a per-job `ClientRequestToken` from the configured prefix.
///
/// The token must match `[A-Za-z0-9_\-]{1,64}`, so other characters become
/// `-` and the result is truncated.
pub fn client_request_token(prefix: &str, job_tag: &str) -> String {
    format!("{}-{}", prefix, job_tag)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_JOB_TAG_LEN)
        .collect()
}

/// Returns only the last path segment of an object key.
///
/// Safe for span fields: reveals the file name without the job prefix.
pub fn redact_key(key: &str) -> &str {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => "<unknown>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "job-42",
        "report.pdf",
        "archive.tar.gz",
        "my tax return (2024).pdf",
        "jürgen/scan.png",
        ".pdf",
        "...",
        "a.b c",
        "v1.2",
        "",
        "   ",
        "ns:job_01.final-draft",
        "x.toolongext",
        "ümlaut.ü",
    ];

    fn is_valid_tag(tag: &str) -> bool {
        !tag.is_empty() && tag.len() <= MAX_JOB_TAG_LEN && tag.chars().all(is_tag_char)
    }

    #[test]
    fn test_plain_job_id_is_unchanged() {
        assert_eq!(sanitize_job_tag("job-42"), "job-42");
        assert_eq!(sanitize_job_tag("ns:job_01"), "ns:job_01");
    }

    #[test]
    fn test_extension_is_stripped() {
        assert_eq!(sanitize_job_tag("report.pdf"), "report");
        assert_eq!(sanitize_job_tag("archive.tar.gz"), "archive");
        assert_eq!(sanitize_job_tag("x.toolongext"), "x.toolongext");
    }

    #[test]
    fn test_disallowed_characters_become_dashes() {
        assert_eq!(sanitize_job_tag("my tax return (2024).pdf"), "my-tax-return--2024-");
        assert_eq!(sanitize_job_tag("jürgen/scan"), "j-rgen-scan");
    }

    #[test]
    fn test_empty_input_gets_placeholder() {
        assert_eq!(sanitize_job_tag(""), "untagged");
    }

    #[test]
    fn test_long_input_is_truncated() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_job_tag(&long).len(), MAX_JOB_TAG_LEN);
    }

    #[test]
    fn test_output_only_contains_allowed_characters() {
        for sample in SAMPLES {
            let tag = sanitize_job_tag(sample);
            assert!(is_valid_tag(&tag), "{:?} -> {:?}", sample, tag);
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut inputs: Vec<String> = SAMPLES.iter().map(|s| s.to_string()).collect();
        inputs.push(format!("{}.{}", "b".repeat(60), "pdfxyz"));
        inputs.push(format!("{}.pdf", "c".repeat(62)));

        for input in &inputs {
            let once = sanitize_job_tag(input);
            assert_eq!(sanitize_job_tag(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_valid_job_ids_are_their_own_tag() {
        for id in ["job-42", "ns:job_01", "invoice.2024-q1", "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d"] {
            assert!(is_valid_job_id(id), "{:?}", id);
        }
        for id in ["", "invoice.2024", "report.pdf", "tax return", "a/b", "untagged.txt"] {
            assert!(!is_valid_job_id(id), "{:?}", id);
        }
        assert!(!is_valid_job_id(&"x".repeat(MAX_JOB_TAG_LEN + 1)));
    }

    #[test]
    fn test_client_request_token() {
        assert_eq!(client_request_token("deploy-7", "job-42"), "deploy-7-job-42");
        assert_eq!(client_request_token("v1.2", "ns:job"), "v1-2-ns-job");

        let token = client_request_token(&"p".repeat(40), &"t".repeat(40));
        assert_eq!(token.len(), MAX_JOB_TAG_LEN);
    }

    #[test]
    fn test_redact_key_returns_filename() {
        assert_eq!(redact_key("input/job-42/report.pdf"), "report.pdf");
        assert_eq!(redact_key("report.pdf"), "report.pdf");
        assert_eq!(redact_key("input/job-42/"), "<unknown>");
    }
}
