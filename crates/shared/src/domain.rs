use url::Url;

/// Two-part public suffixes that would otherwise be mistaken for a
/// registrable domain when keeping the last two labels.
const TWO_PART_SUFFIXES: &[&str] = &[
  "co.uk", "org.uk", "ac.uk", "gov.uk", "co.jp", "ne.jp", "or.jp", "com.au",
  "net.au", "org.au", "co.nz", "co.in", "com.br", "com.mx", "com.cn", "com.sg",
];

/// Base registrable domain of a URL (`https://news.a.example/mirror` →
/// `a.example`), used to stop corroboration inflation via many links from one
/// site. Leading `www.` is stripped and the host lowercased before reduction.
/// Unparsable input maps to `"unknown"` so it still groups.
#[must_use]
pub fn source_domain(raw_url: &str) -> String {
  let host = Url::parse(raw_url)
    .ok()
    .and_then(|u| u.host_str().map(str::to_owned));
  let Some(host) = host else {
    return "unknown".to_owned();
  };
  let host = host
    .strip_prefix("www.")
    .unwrap_or(&host)
    .to_ascii_lowercase();

  let labels: Vec<&str> = host.split('.').collect();
  if labels.len() <= 2 {
    return host;
  }
  let keep = if TWO_PART_SUFFIXES.contains(&labels[labels.len() - 2..].join(".").as_str()) {
    3
  } else {
    2
  };
  labels[labels.len() - keep..].join(".")
}

#[cfg(test)]
mod tests {
  use super::source_domain;

  #[test]
  fn strips_www_and_lowercases() {
    assert_eq!(source_domain("https://www.BBC.com/news/article"), "bbc.com");
  }

  #[test]
  fn subdomain_reduces_to_registrable_base() {
    assert_eq!(source_domain("https://news.a.example/mirror"), "a.example");
    assert_eq!(
      source_domain("https://news.a.example/mirror"),
      source_domain("https://a.example/story")
    );
  }

  #[test]
  fn two_part_suffixes_keep_the_site_label() {
    assert_eq!(source_domain("https://news.bbc.co.uk/story"), "bbc.co.uk");
  }

  #[test]
  fn garbage_maps_to_unknown() {
    assert_eq!(source_domain("not a url"), "unknown");
  }
}
