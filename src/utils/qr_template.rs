//! Print-template filename adjustment and tracking-link formatting.

/// Ensures a template filename ends with `_qr_track.pdf` (idempotent).
///
/// The original extension is discarded; a template that already carries the
/// `_qr_track` stem only gets the `.pdf` extension re-attached.
pub fn template_with_qr_suffix(template: &str) -> Option<String> {
    let trimmed = template.trim();
    if trimmed.is_empty() {
        return None;
    }
    let stem = trimmed
        .rsplit_once('.')
        .map_or(trimmed, |(stem, _ext)| stem);
    if stem.ends_with("_qr_track") {
        Some(format!("{stem}.pdf"))
    } else {
        Some(format!("{stem}_qr_track.pdf"))
    }
}

/// Returns the public tracking URL for a link document id.
pub fn build_tracking_link(base_url: &str, link_id: &str) -> String {
    format!("{}/?id={}", base_url.trim_end_matches('/'), link_id)
}
