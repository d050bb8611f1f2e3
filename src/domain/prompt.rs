//! 提示词构造器
//!
//! 为分析与选曲两步构造确定性的提示词。生成歌单时使用的提示词
//! 会原样记录在 Playlist 上，必须可复现。

use crate::domain::analysis::BookAnalysis;
use crate::domain::user::UserPreferences;

/// 提示词长度限制
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// 简介截断长度（字符数）
    pub max_description_chars: usize,
    /// 全文截断长度（字符数）
    pub max_full_text_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_description_chars: 2000,
            max_full_text_chars: 20000,
        }
    }
}

/// 构造书籍分析提示词
///
/// 字段顺序固定：书名、作者、类型、简介、（可选）全文节选。
pub fn build_analysis_prompt(
    title: &str,
    authors: &[String],
    genres: &[String],
    description: Option<&str>,
    full_text: Option<&str>,
    config: &PromptConfig,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Analyze the following book and describe its mood, themes, setting, pace, \
         emotional intensity, suitable listening time of day, overall vibe, and what \
         kind of music would fit it.\n\n",
    );

    prompt.push_str(&format!("Title: {}\n", title));
    if !authors.is_empty() {
        prompt.push_str(&format!("Authors: {}\n", authors.join(", ")));
    }
    if !genres.is_empty() {
        prompt.push_str(&format!("Genres: {}\n", genres.join(", ")));
    }
    if let Some(description) = description {
        prompt.push_str(&format!(
            "Description: {}\n",
            truncate_chars(description, config.max_description_chars)
        ));
    }
    if let Some(full_text) = full_text {
        prompt.push_str(&format!(
            "\nExcerpt:\n{}\n",
            truncate_chars(full_text, config.max_full_text_chars)
        ));
    }

    prompt
}

/// 构造选曲提示词
///
/// 由分析结果与用户偏好派生，作为生成记录存档。
pub fn build_playlist_prompt(analysis: &BookAnalysis, preferences: &UserPreferences) -> String {
    let mut prompt = String::new();

    prompt.push_str("Curate a playlist matching this book profile.\n\n");

    if !analysis.mood().is_empty() {
        let moods: Vec<String> = analysis
            .mood()
            .iter()
            .map(|m| format!("{} ({:.2})", m.name, m.intensity))
            .collect();
        prompt.push_str(&format!("Mood: {}\n", moods.join(", ")));
    }
    if !analysis.themes().is_empty() {
        prompt.push_str(&format!("Themes: {}\n", analysis.themes().join(", ")));
    }

    let setting = analysis.setting();
    let mut setting_parts = Vec::new();
    if let Some(era) = &setting.era {
        setting_parts.push(format!("era: {}", era));
    }
    if let Some(location) = &setting.location {
        setting_parts.push(format!("location: {}", location));
    }
    if let Some(atmosphere) = &setting.atmosphere {
        setting_parts.push(format!("atmosphere: {}", atmosphere));
    }
    if !setting_parts.is_empty() {
        prompt.push_str(&format!("Setting: {}\n", setting_parts.join(", ")));
    }

    prompt.push_str(&format!("Pace: {}\n", analysis.pace().as_str()));
    prompt.push_str(&format!("Intensity: {}\n", analysis.intensity().as_str()));

    if !analysis.vibe().is_empty() {
        prompt.push_str(&format!("Vibe: {}\n", analysis.vibe()));
    }
    if !analysis.music_description().is_empty() {
        prompt.push_str(&format!("Music: {}\n", analysis.music_description()));
    }

    prompt.push_str(&format!(
        "Target length: {} minutes\n",
        preferences.playlist_length.target_secs() / 60
    ));
    if preferences.instrumental_only {
        prompt.push_str("Constraint: instrumental tracks only\n");
    }

    prompt
}

/// 由分析结果派生曲库搜索词
///
/// 顺序即优先级：音乐描述 > 主导情绪+节奏 > 氛围。
/// 结果去重且至多 4 条。
pub fn build_search_queries(analysis: &BookAnalysis) -> Vec<String> {
    let mut queries = Vec::new();

    if !analysis.music_description().is_empty() {
        queries.push(analysis.music_description().to_string());
    }

    if let Some(mood) = analysis.dominant_mood() {
        queries.push(format!("{} {} music", mood.name, analysis.pace().as_str()));
    }

    if let Some(atmosphere) = &analysis.setting().atmosphere {
        queries.push(format!("{} soundtrack", atmosphere));
    }

    if let Some(theme) = analysis.themes().first() {
        queries.push(format!("{} instrumental", theme));
    }

    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.to_lowercase()));
    queries.truncate(4);
    queries
}

/// 按字符数截断（不截断在多字节字符中间）
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{}…", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{
        AnalysisSource, BookAnalysis, IntensityLevel, Mood, Pace, Setting, TimeOfDay,
    };
    use crate::domain::user::{PlaylistLength, UserPreferences};
    use uuid::Uuid;

    fn sample_analysis() -> BookAnalysis {
        BookAnalysis::new(
            Uuid::new_v4(),
            vec![Mood::new("melancholic", 0.8).unwrap()],
            vec!["loss".to_string()],
            Setting {
                era: Some("victorian".to_string()),
                location: None,
                atmosphere: Some("gothic".to_string()),
            },
            Pace::Slow,
            IntensityLevel::Intense,
            vec![TimeOfDay::Night],
            "风雨交加的荒原".to_string(),
            "dark romantic strings".to_string(),
            AnalysisSource::FullContent,
            0.9,
            "claude-3-opus".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_analysis_prompt_contains_metadata() {
        let prompt = build_analysis_prompt(
            "Wuthering Heights",
            &["Emily Brontë".to_string()],
            &["Gothic".to_string(), "Romance".to_string()],
            Some("A tale of passion on the moors."),
            None,
            &PromptConfig::default(),
        );

        assert!(prompt.contains("Title: Wuthering Heights"));
        assert!(prompt.contains("Authors: Emily Brontë"));
        assert!(prompt.contains("Genres: Gothic, Romance"));
        assert!(prompt.contains("A tale of passion"));
        assert!(!prompt.contains("Excerpt:"));
    }

    #[test]
    fn test_analysis_prompt_truncates_description() {
        let long = "x".repeat(5000);
        let prompt = build_analysis_prompt(
            "T",
            &[],
            &[],
            Some(&long),
            None,
            &PromptConfig::default(),
        );
        assert!(prompt.contains('…'));
        assert!(prompt.chars().count() < 5000);
    }

    #[test]
    fn test_analysis_prompt_deterministic() {
        let config = PromptConfig::default();
        let a = build_analysis_prompt("T", &[], &[], Some("d"), None, &config);
        let b = build_analysis_prompt("T", &[], &[], Some("d"), None, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_playlist_prompt_records_constraints() {
        let analysis = sample_analysis();
        let preferences = UserPreferences {
            default_music_service: None,
            auto_generate_playlists: true,
            instrumental_only: true,
            playlist_length: PlaylistLength::Short,
        };

        let prompt = build_playlist_prompt(&analysis, &preferences);

        assert!(prompt.contains("melancholic (0.80)"));
        assert!(prompt.contains("era: victorian"));
        assert!(prompt.contains("atmosphere: gothic"));
        assert!(prompt.contains("Pace: slow"));
        assert!(prompt.contains("Target length: 30 minutes"));
        assert!(prompt.contains("instrumental tracks only"));
    }

    #[test]
    fn test_playlist_prompt_omits_instrumental_when_unset() {
        let analysis = sample_analysis();
        let preferences = UserPreferences::default();
        let prompt = build_playlist_prompt(&analysis, &preferences);
        assert!(!prompt.contains("instrumental tracks only"));
        assert!(prompt.contains("Target length: 60 minutes"));
    }

    #[test]
    fn test_search_queries_ordered_and_deduped() {
        let analysis = sample_analysis();
        let queries = build_search_queries(&analysis);

        assert_eq!(
            queries,
            vec![
                "dark romantic strings".to_string(),
                "melancholic slow music".to_string(),
                "gothic soundtrack".to_string(),
                "loss instrumental".to_string(),
            ]
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "春眠不觉晓处处闻啼鸟";
        let truncated = truncate_chars(s, 4);
        assert_eq!(truncated, "春眠不觉…");
    }
}
