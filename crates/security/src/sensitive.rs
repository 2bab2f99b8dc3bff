/// Conservative denylist used to prevent accidental secret leakage in
/// agent-facing read tools.
///
/// The check is best-effort and filename-based; it does not attempt to
/// classify arbitrary file contents.
pub fn is_sensitive_name(name: &str) -> bool {
    let lower = name.to_lowercase();

    match lower.as_str() {
        ".env" | ".envrc" | ".netrc" | ".npmrc" | ".pypirc" | "id_rsa" | "id_ed25519"
        | "id_ecdsa" | "id_dsa" => return true,
        _ => {}
    }

    if lower.starts_with(".env.") {
        // Allow only explicit, safe templates.
        match lower.as_str() {
            ".env.example" | ".env.sample" | ".env.template" => {}
            _ => return true,
        }
    }

    let ext = lower.rsplit('.').next().unwrap_or("");
    if lower.contains('.') && matches!(ext, "pem" | "key" | "p12" | "pfx") {
        return true;
    }

    false
}

/// Components that mark a whole subtree as off limits.
///
/// `.git` covers version-control internals (config may carry credentials);
/// `.cargo` is only blocked in combination with a `credentials` file, which
/// [`component_pair_is_sensitive`] handles.
pub(crate) fn component_is_sensitive(component: &str) -> bool {
    component.eq_ignore_ascii_case(".git")
}

/// Registry credential files live at `.cargo/credentials[.toml]`.
pub(crate) fn component_pair_is_sensitive(parent: &str, name: &str) -> bool {
    parent.eq_ignore_ascii_case(".cargo")
        && matches!(
            name.to_lowercase().as_str(),
            "credentials" | "credentials.toml"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_names() {
        assert!(is_sensitive_name(".env"));
        assert!(is_sensitive_name(".netrc"));
        assert!(is_sensitive_name("id_rsa"));
        assert!(is_sensitive_name("ID_RSA"));
        assert!(!is_sensitive_name("main.rs"));
        assert!(!is_sensitive_name("environment.md"));
    }

    #[test]
    fn test_env_variants() {
        assert!(is_sensitive_name(".env.local"));
        assert!(is_sensitive_name(".env.production"));
        assert!(!is_sensitive_name(".env.example"));
        assert!(!is_sensitive_name(".env.sample"));
    }

    #[test]
    fn test_key_extensions() {
        assert!(is_sensitive_name("server.pem"));
        assert!(is_sensitive_name("private.key"));
        assert!(is_sensitive_name("bundle.p12"));
        assert!(!is_sensitive_name("keyboard.rs"));
        assert!(!is_sensitive_name("monkey"));
    }

    #[test]
    fn test_vcs_internals() {
        assert!(component_is_sensitive(".git"));
        assert!(!component_is_sensitive("src"));
        assert!(component_pair_is_sensitive(".cargo", "credentials"));
        assert!(component_pair_is_sensitive(".cargo", "credentials.toml"));
        assert!(!component_pair_is_sensitive("src", "credentials"));
    }
}
