/// Failure signatures that should not permanently reject a feed at
/// registration time. Covers abuse-prevention HTTP codes in both reqwest's
/// legacy and current phrasings, network-level trouble, and the XML
/// malformations the lenient parser sometimes reports on truncated bodies.
const TRANSIENT_SIGNATURES: &[&str] = &[
    // Anti-bot / rate limiting status codes
    "403",
    "forbidden",
    "429",
    "too many requests",
    "503",
    "service unavailable",
    // Network-level failures
    "dns error",
    "failed to lookup address",
    "connection refused",
    "connection reset",
    "connection closed",
    "timed out",
    "operation timed out",
    "error decoding response body",
    // Malformed or truncated XML
    "syntax error",
    "unexpected end of",
    "unexpected eof",
    "no root element",
    "invalid xml",
];

/// True when an error message matches the transient-failure allow-list.
pub fn is_transient_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|sig| lower.contains(sig))
}
