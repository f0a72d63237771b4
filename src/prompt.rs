use std::env;
use std::path::Path;

/// Render the prompt: `<user@host:path> ` with the shell home collapsed to
/// `~`.
pub fn render(home: &Path) -> String {
    let user = env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .unwrap_or_else(|_| "user".to_string());
    let host = hostname().unwrap_or_else(|| "system".to_string());
    let cwd = env::current_dir().unwrap_or_else(|_| "?".into());

    let path = if cwd == home {
        "~".to_string()
    } else if let Ok(rest) = cwd.strip_prefix(home) {
        format!("~/{}", rest.display())
    } else {
        cwd.display().to_string()
    };

    format!("<{user}@{host}:{path}> ")
}

fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf outlives the call and the length matches.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_collapses_to_tilde() {
        let home = env::current_dir().unwrap();
        let prompt = render(&home);
        assert!(prompt.starts_with('<'));
        assert!(prompt.ends_with(":~> "), "prompt was: {prompt}");
    }

    #[test]
    fn unrelated_directory_is_shown_in_full() {
        let prompt = render(Path::new("/nonexistent-home-anchor"));
        let cwd = env::current_dir().unwrap();
        assert!(prompt.contains(&cwd.display().to_string()));
    }
}
