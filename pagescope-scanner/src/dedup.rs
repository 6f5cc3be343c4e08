use std::collections::HashSet;

/// Distinct URLs in order of first appearance. Keyed by string equality, so
/// `https://a.com/x` and `https://a.com/x#top` are two targets.
pub fn unique_targets<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for url in urls {
        let url = url.as_ref();
        if seen.insert(url.to_string()) {
            targets.push(url.to_string());
        }
    }
    targets
}
