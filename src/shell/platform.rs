//! Host platform queries.

/// Check if running as root/admin.
///
/// On Windows `net session` only succeeds from an elevated token, which
/// is the same check an administrator would do by hand.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        use std::process::{Command, Stdio};

        Command::new("net")
            .arg("session")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

/// Read an environment variable, treating empty values as unset.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Expand `%NAME%` references using `env_fn`.
///
/// `%%` yields a literal `%`, and a lone `%` with no closing partner is
/// kept as-is. Returns the name of the first variable that `env_fn` cannot
/// resolve.
pub fn expand_env_vars<F>(input: &str, env_fn: F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let name = &after[..end];
        if name.is_empty() {
            out.push('%');
        } else {
            match env_fn(name) {
                Some(value) => out.push_str(&value),
                None => return Err(name.to_string()),
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
