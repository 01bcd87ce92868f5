//! 릴리스 버전 태그 (major.minor.build) 비교 유틸리티

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 업데이트 채널
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Stable,
    Beta,
}

impl Channel {
    pub fn is_beta(self) -> bool {
        matches!(self, Channel::Beta)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Stable => f.write_str("stable"),
            Channel::Beta => f.write_str("beta"),
        }
    }
}

/// 버전 태그: 한 번 만들어지면 변경되지 않음
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
    pub beta: bool,
}

impl VersionTag {
    pub fn new(major: u64, minor: u64, build: u64) -> Self {
        Self { major, minor, build, beta: false }
    }

    /// 베타 표시를 붙인 사본
    pub fn into_beta(mut self) -> Self {
        self.beta = true;
        self
    }

    /// "v2.4.1", "2.4.1.0", "2.4", "2.4.1-beta.2" 형식을 파싱
    ///
    /// 네 번째 구성요소(revision)는 무시합니다.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let (version_part, suffix) = match s.find('-') {
            Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
            None => (s, None),
        };

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.len() < 2 || parts.len() > 4 {
            return None;
        }

        let major = parts[0].parse().ok()?;
        let minor = parts[1].parse().ok()?;
        let build = match parts.get(2) {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if let Some(rev) = parts.get(3) {
            rev.parse::<u64>().ok()?;
        }

        let beta = match suffix {
            None => false,
            Some(tag) if tag.is_empty() => return None,
            Some(_) => true,
        };

        Some(Self { major, minor, build, beta })
    }

    pub fn is_newer_than(&self, other: &VersionTag) -> bool {
        self > other
    }
}

/// 핸드오프 인자로 그대로 쓰이는 `major.minor.build` 형식
impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.build)
            .cmp(&(other.major, other.minor, other.build))
            // 같은 번호면 정식 릴리스가 베타보다 높음
            .then_with(|| other.beta.cmp(&self.beta))
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
