use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use tracing::warn;
use uuid::Uuid;

pub const RATER_KEY: &str = "raterId";
pub const ADMIN_KEY: &str = "isAdmin";

const MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// The two per-browser flags, kept as cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPrefs {
    pub rater_id: String,
    pub is_admin: bool,
    /// The rater id was generated for this request and still has to be stored.
    pub fresh: bool,
}

impl LocalPrefs {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let is_admin = read_cookie(headers, ADMIN_KEY).as_deref() == Some("true");
        match read_cookie(headers, RATER_KEY).filter(|id| is_valid_rater_id(id)) {
            Some(rater_id) => Self {
                rater_id,
                is_admin,
                fresh: false,
            },
            None => Self {
                rater_id: Uuid::new_v4().to_string(),
                is_admin,
                fresh: true,
            },
        }
    }

    /// `Set-Cookie` headers for everything that changed during the request.
    pub fn write(&self, admin_now: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.fresh {
            append_cookie(&mut headers, RATER_KEY, &self.rater_id);
        }
        if admin_now != self.is_admin {
            append_cookie(&mut headers, ADMIN_KEY, if admin_now { "true" } else { "false" });
        }
        headers
    }
}

fn read_cookie(headers: &HeaderMap, key: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value.trim().to_string())
}

fn is_valid_rater_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn append_cookie(headers: &mut HeaderMap, key: &str, value: &str) {
    let cookie = format!("{key}={value}; Path=/; Max-Age={MAX_AGE_SECS}; SameSite=Lax");
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => warn!("skipping unencodable cookie {key}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reads_both_flags() {
        let prefs = LocalPrefs::from_headers(&with_cookie("theme=dark; raterId=abc-123; isAdmin=true"));
        assert_eq!(prefs.rater_id, "abc-123");
        assert!(prefs.is_admin);
        assert!(!prefs.fresh);
        assert!(prefs.write(true).is_empty());
    }

    #[test]
    fn missing_rater_id_is_generated_and_written_once() {
        let prefs = LocalPrefs::from_headers(&HeaderMap::new());
        assert!(prefs.fresh);
        assert!(!prefs.is_admin);

        let headers = prefs.write(false);
        let cookies: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].to_str().unwrap().starts_with(&format!("raterId={}", prefs.rater_id)));
    }

    #[test]
    fn admin_change_is_written() {
        let prefs = LocalPrefs::from_headers(&with_cookie("raterId=r1"));
        let headers = prefs.write(true);
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("isAdmin=true"));
    }

    #[test]
    fn garbage_rater_id_is_replaced() {
        let prefs = LocalPrefs::from_headers(&with_cookie("raterId=<script>"));
        assert!(prefs.fresh);
        assert_ne!(prefs.rater_id, "<script>");
    }
}
