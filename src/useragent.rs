// File: useragent.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::UNKNOWN;

// Order matters: Chromium derivatives carry a `Chrome/` token, and Chrome in
// turn carries `Safari/`.
static BROWSER_PATTERNS: Lazy<Vec<(Regex, &str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"Edg(?:e|A|iOS)?/([\d.]+)").unwrap(), "Edge"),
        (Regex::new(r"(?:OPR|Opera)/([\d.]+)").unwrap(), "Opera"),
        (Regex::new(r"SamsungBrowser/([\d.]+)").unwrap(), "Samsung Browser"),
        (Regex::new(r"(?:Firefox|FxiOS)/([\d.]+)").unwrap(), "Firefox"),
        (Regex::new(r"HeadlessChrome/([\d.]+)").unwrap(), "Chrome Headless"),
        (Regex::new(r"(?:Chrome|CriOS)/([\d.]+)").unwrap(), "Chrome"),
        (Regex::new(r"Version/([\d.]+).*Mobile.*Safari/").unwrap(), "Mobile Safari"),
        (Regex::new(r"Version/([\d.]+).*Safari/").unwrap(), "Safari"),
        (Regex::new(r"MSIE ([\d.]+)").unwrap(), "IE"),
        (Regex::new(r"Trident/.*rv:([\d.]+)").unwrap(), "IE"),
    ]
});

static OS_PATTERNS: Lazy<Vec<(Regex, &str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"Windows NT ([\d.]+)").unwrap(), "Windows"),
        (Regex::new(r"(?:iPhone|iPad|iPod).*? OS ([\d_]+)").unwrap(), "iOS"),
        (Regex::new(r"Mac OS X ([\d_.]+)").unwrap(), "Mac OS"),
        (Regex::new(r"Android ([\d.]+)").unwrap(), "Android"),
        (Regex::new(r"CrOS \S+ ([\d.]+)").unwrap(), "Chrome OS"),
        (Regex::new(r"Linux()").unwrap(), "Linux"),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub browser_name: String,
    pub browser_version: String,
    pub os_name: String,
    pub os_version: String,
}

impl Default for UserAgentInfo {
    fn default() -> Self {
        Self {
            browser_name: UNKNOWN.to_string(),
            browser_version: UNKNOWN.to_string(),
            os_name: UNKNOWN.to_string(),
            os_version: UNKNOWN.to_string(),
        }
    }
}

pub fn parse(user_agent: &str) -> UserAgentInfo {
    let mut info = UserAgentInfo::default();

    if let Some((name, version)) = first_match(&BROWSER_PATTERNS, user_agent) {
        info.browser_name = name.to_string();
        info.browser_version = version_or_unknown(version);
    }

    if let Some((name, version)) = first_match(&OS_PATTERNS, user_agent) {
        info.os_name = name.to_string();
        info.os_version = match name {
            "Windows" => windows_release(&version).to_string(),
            _ => version_or_unknown(version.replace('_', ".")),
        };
    }

    info
}

fn first_match(patterns: &[(Regex, &'static str)], user_agent: &str) -> Option<(&'static str, String)> {
    patterns.iter().find_map(|(regex, name)| {
        regex.captures(user_agent).map(|caps| {
            let version = caps.get(1).map_or("", |m| m.as_str()).to_string();
            (*name, version)
        })
    })
}

fn version_or_unknown(version: String) -> String {
    if version.is_empty() {
        UNKNOWN.to_string()
    } else {
        version
    }
}

fn windows_release(nt_version: &str) -> &str {
    match nt_version {
        "10.0" => "10",
        "6.3" => "8.1",
        "6.2" => "8",
        "6.1" => "7",
        "6.0" => "Vista",
        "5.1" | "5.2" => "XP",
        _ => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_on_windows() {
        let info = parse("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.130 Safari/537.36");
        assert_eq!(info.browser_name, "Chrome");
        assert_eq!(info.browser_version, "120.0.6099.130");
        assert_eq!(info.os_name, "Windows");
        assert_eq!(info.os_version, "10");
    }

    #[test]
    fn test_edge_wins_over_chrome() {
        let info = parse("Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.2151.97");
        assert_eq!(info.browser_name, "Edge");
        assert_eq!(info.browser_version, "119.0.2151.97");
        assert_eq!(info.os_version, "7");
    }

    #[test]
    fn test_safari_on_iphone() {
        let info = parse("Mozilla/5.0 (iPhone; CPU iPhone OS 17_1_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1.2 Mobile/15E148 Safari/604.1");
        assert_eq!(info.browser_name, "Mobile Safari");
        assert_eq!(info.browser_version, "17.1.2");
        assert_eq!(info.os_name, "iOS");
        assert_eq!(info.os_version, "17.1.2");
    }

    #[test]
    fn test_firefox_on_mac() {
        let info = parse("Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0");
        assert_eq!(info.browser_name, "Firefox");
        assert_eq!(info.browser_version, "121.0");
        assert_eq!(info.os_name, "Mac OS");
        assert_eq!(info.os_version, "10.15");
    }

    #[test]
    fn test_android_before_linux() {
        let info = parse("Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36");
        assert_eq!(info.os_name, "Android");
        assert_eq!(info.os_version, "14");
        assert_eq!(info.browser_name, "Chrome");
    }

    #[test]
    fn test_plain_linux_has_unknown_version() {
        let info = parse("Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0");
        assert_eq!(info.os_name, "Linux");
        assert_eq!(info.os_version, UNKNOWN);
    }

    #[test]
    fn test_unrecognized_agent() {
        assert_eq!(parse("curl/8.4.0"), UserAgentInfo::default());
        assert_eq!(parse(""), UserAgentInfo::default());
    }
}
