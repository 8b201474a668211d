//! Database username normalization.
//!
//! Redshift folds identifiers to lowercase while `GetClusterCredentials` is
//! case-sensitive, and temporary users come back prefixed with `IAM:` or
//! `IAMA:`. Feeding a session-scoped or differently cased name back into the
//! issuing API would mint a new database role every time, so every name goes
//! through [`normalize_username`] first.

const TEMPORARY_PREFIXES: &[&str] = &["iama:", "iam:"];

/// Strip temporary-user prefixes and reduce an identity ARN to its stable
/// principal name.
///
/// - `IAM:alice` / `IAMA:alice` → `alice`
/// - `arn:aws:iam::123:user/team/alice` → `alice`
/// - `arn:aws:sts::123:assumed-role/deployer/session-42` → `deployer`
/// - `arn:aws:iam::123:role/deployer` → `deployer`
///
/// Prefix matching ignores case; the returned name keeps its case.
pub fn permanent_username(raw: &str) -> String {
    let mut name = raw.trim();

    loop {
        let lower = name.to_ascii_lowercase();
        match TEMPORARY_PREFIXES.iter().find(|p| lower.starts_with(*p)) {
            Some(prefix) => name = &name[prefix.len()..],
            None => break,
        }
    }

    if name.to_ascii_lowercase().starts_with("arn:") {
        if let Some(principal) = principal_from_arn(name) {
            return principal.to_string();
        }
    }
    name.to_string()
}

/// The stable principal name inside an IAM or STS ARN, if it has one.
fn principal_from_arn(arn: &str) -> Option<&str> {
    // arn:partition:service:region:account:resource
    let resource = arn.splitn(6, ':').nth(5)?;
    let mut parts = resource.split('/');
    let kind = parts.next()?.to_ascii_lowercase();
    let rest: Vec<&str> = parts.filter(|p| !p.is_empty()).collect();
    match kind.as_str() {
        // assumed-role/<role>/<session>: the session is per-login noise.
        "assumed-role" | "federated-user" => rest.first().copied(),
        // user/<path...>/<name>, role/<path...>/<name>
        "user" | "role" => rest.last().copied(),
        _ => None,
    }
}

/// Lowercase the permanent form of `raw`.
///
/// Idempotent, and two inputs differing only in case normalize to the same
/// value.
pub fn normalize_username(raw: &str) -> String {
    let mut current = permanent_username(&raw.to_lowercase()).to_lowercase();
    // Stripping can expose another prefix (`IAM:IAM:x`); iterate to a fixed point.
    loop {
        let next = permanent_username(&current).to_lowercase();
        if next == current {
            return current;
        }
        current = next;
    }
}
