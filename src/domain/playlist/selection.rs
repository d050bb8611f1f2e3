//! 选曲器
//!
//! 从候选曲目（按相关度降序）中挑选一组曲目，使总时长落在
//! 目标档位的容差区间内。

use serde::{Deserialize, Serialize};

/// 默认时长容差（目标值的 ±10%）
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// 选曲配置
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// 目标总时长（秒）
    pub target_secs: u32,
    /// 容差（目标值的比例）
    pub tolerance: f64,
    /// 只选纯音乐
    pub instrumental_only: bool,
}

impl SelectionConfig {
    pub fn new(target_secs: u32) -> Self {
        Self {
            target_secs,
            tolerance: DEFAULT_TOLERANCE,
            instrumental_only: false,
        }
    }

    pub fn with_instrumental_only(mut self, instrumental_only: bool) -> Self {
        self.instrumental_only = instrumental_only;
        self
    }

    /// 容差区间 [下界, 上界]（秒）
    pub fn bounds(&self) -> (u32, u32) {
        let target = self.target_secs as f64;
        let lo = (target * (1.0 - self.tolerance)).round() as u32;
        let hi = (target * (1.0 + self.tolerance)).round() as u32;
        (lo, hi)
    }
}

/// 候选曲目
///
/// 由曲库搜索产出，顺序即相关度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCandidate {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// 时长（秒）
    pub duration_secs: u32,
    /// 是否纯音乐（未知为 None）
    pub is_instrumental: Option<bool>,
    /// 情绪标签
    pub mood_tags: Vec<String>,
    /// AI 选曲理由
    pub rationale: Option<String>,
}

/// 按目标时长选曲
///
/// 选曲策略:
/// 1. instrumental_only 时剔除非纯音乐候选（含未标注者）
/// 2. 按 (title, artist) 去重（忽略大小写）
/// 3. 按相关度顺序贪心填充，跳过会超出上界的曲目
/// 4. 总时长达到目标即停；最终落在 [下界, 上界] 内
///
/// 候选不足以达到下界时返回 None（调用方据此报错）。
pub fn select_tracks(
    candidates: Vec<TrackCandidate>,
    config: &SelectionConfig,
) -> Option<Vec<TrackCandidate>> {
    let (lo, hi) = config.bounds();

    let mut seen = std::collections::HashSet::new();
    let mut selected = Vec::new();
    let mut total: u32 = 0;

    for candidate in candidates {
        if total >= config.target_secs {
            break;
        }

        if config.instrumental_only && candidate.is_instrumental != Some(true) {
            continue;
        }

        // 曲库搜索可能命中同一曲目的多个发行版本
        let key = (
            candidate.title.to_lowercase(),
            candidate.artist.to_lowercase(),
        );
        if !seen.insert(key) {
            continue;
        }

        if candidate.duration_secs == 0 {
            continue;
        }

        if total + candidate.duration_secs > hi {
            continue;
        }

        total += candidate.duration_secs;
        selected.push(candidate);
    }

    if total < lo {
        return None;
    }

    Some(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, duration_secs: u32, instrumental: Option<bool>) -> TrackCandidate {
        TrackCandidate {
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: None,
            duration_secs,
            is_instrumental: instrumental,
            mood_tags: vec![],
            rationale: None,
        }
    }

    #[test]
    fn test_bounds() {
        let config = SelectionConfig::new(1800);
        assert_eq!(config.bounds(), (1620, 1980));
    }

    #[test]
    fn test_fills_to_target_within_bounds() {
        // 目标 600s ±10% → [540, 660]
        let config = SelectionConfig::new(600);
        let candidates = vec![
            candidate("a", 200, None),
            candidate("b", 200, None),
            candidate("c", 200, None),
            candidate("d", 200, None),
        ];

        let selected = select_tracks(candidates, &config).unwrap();
        let total: u32 = selected.iter().map(|t| t.duration_secs).sum();
        assert_eq!(selected.len(), 3);
        assert!((540..=660).contains(&total));
    }

    #[test]
    fn test_skips_track_exceeding_upper_bound() {
        let config = SelectionConfig::new(600);
        let candidates = vec![
            candidate("a", 400, None),
            candidate("too-long", 400, None), // 400+400 > 660，跳过
            candidate("b", 200, None),
        ];

        let selected = select_tracks(candidates, &config).unwrap();
        let titles: Vec<&str> = selected.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_insufficient_candidates_returns_none() {
        let config = SelectionConfig::new(3600);
        let candidates = vec![candidate("only", 300, None)];
        assert!(select_tracks(candidates, &config).is_none());
    }

    #[test]
    fn test_instrumental_only_excludes_unknown() {
        let config = SelectionConfig::new(600).with_instrumental_only(true);
        let candidates = vec![
            candidate("vocal", 300, Some(false)),
            candidate("unknown", 300, None),
            candidate("inst-1", 300, Some(true)),
            candidate("inst-2", 300, Some(true)),
        ];

        let selected = select_tracks(candidates, &config).unwrap();
        assert!(selected.iter().all(|t| t.is_instrumental == Some(true)));
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_dedup_same_title_artist() {
        let config = SelectionConfig::new(600);
        let candidates = vec![
            candidate("Nuvole Bianche", 320, None),
            candidate("nuvole bianche", 340, None), // 同曲不同版本
            candidate("Una Mattina", 300, None),
        ];

        let selected = select_tracks(candidates, &config).unwrap();
        let titles: Vec<&str> = selected.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Nuvole Bianche", "Una Mattina"]);
    }

    #[test]
    fn test_zero_duration_candidates_skipped() {
        let config = SelectionConfig::new(600);
        let candidates = vec![
            candidate("broken", 0, None),
            candidate("a", 300, None),
            candidate("b", 300, None),
        ];

        let selected = select_tracks(candidates, &config).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|t| t.duration_secs > 0));
    }

    #[test]
    fn test_preserves_relevance_order() {
        let config = SelectionConfig::new(900);
        let candidates = vec![
            candidate("first", 300, None),
            candidate("second", 300, None),
            candidate("third", 300, None),
        ];

        let selected = select_tracks(candidates, &config).unwrap();
        let titles: Vec<&str> = selected.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
