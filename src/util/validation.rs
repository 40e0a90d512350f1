use std::fmt::Display;

pub fn verbose_result_ok<T, E: Display>(context: impl FnOnce() -> String, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("{}\nError: {}", context(), e);
            None
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detects_whitespace_only() {
        assert!(is_blank(""));
        assert!(is_blank("  \t"));
        assert!(!is_blank(" Ada "));
    }

    #[test]
    fn verbose_result_ok_drops_errors() {
        let ok: Result<u32, String> = Ok(3);
        let err: Result<u32, String> = Err(String::from("bad"));
        assert_eq!(verbose_result_ok(|| String::from("ok"), ok), Some(3));
        assert_eq!(verbose_result_ok(|| String::from("err"), err), None);
    }
}
