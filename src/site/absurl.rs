//! Rewrite root-relative `src`/`href` attributes against the base URL.

/// Prefix every ` src="/`, ` src='/`, ` href="/` and ` href='/` with
/// `base_url`, then collapse the `base//` produced by a base ending in `/`.
pub fn absolutize(html: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut out = html.to_owned();
    for attr in ["src", "href"] {
        for quote in ['"', '\''] {
            let from = format!(" {attr}={quote}/");
            let to = format!(" {attr}={quote}{base}/");
            out = out.replace(&from, &to);
        }
    }
    out.replace(&format!("{base}//"), &format!("{base}/"))
}
