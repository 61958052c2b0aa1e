//! PDF magic-number checks.
//!
//! Binary payloads get corrupted silently by compression, wrong framing or
//! partial reads; this is the last gate before bytes go to the client.

/// `%PDF-`
pub const PDF_SIGNATURE: [u8; 5] = [0x25, 0x50, 0x44, 0x46, 0x2D];

/// Buffers below this size are treated as truncated even when the header
/// survived.
pub const MIN_PDF_BYTES: usize = 1000;

/// True iff `buffer` begins with `%PDF-`.
pub fn has_pdf_signature(buffer: &[u8]) -> bool {
    buffer.starts_with(&PDF_SIGNATURE)
}

/// True iff `buffer` begins with `%PDF-` and is at least [`MIN_PDF_BYTES`] long.
pub fn is_valid_pdf(buffer: &[u8]) -> bool {
    buffer.len() >= MIN_PDF_BYTES && has_pdf_signature(buffer)
}

/// Leading bytes as space-separated lowercase hex, for diagnostics.
pub fn signature_hex(buffer: &[u8]) -> String {
    buffer
        .iter()
        .take(PDF_SIGNATURE.len())
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
