//! Analysis Context - Entities
//!
//! BookAnalysis 与一个 UserBook 一一对应，记录 AI 提取的
//! 氛围向量、主题、场景、节奏与置信度。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AnalysisError;

/// 仅凭元数据分析时的置信度上限
///
/// 没有全文输入的分析可信度天然受限，超过上限的置信度会被压到该值。
pub const METADATA_ONLY_CONFIDENCE_CEILING: f64 = 0.7;

/// 分析唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(Uuid);

impl AnalysisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 情绪及其强度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub name: String,
    /// 强度，0..=1
    pub intensity: f64,
}

impl Mood {
    pub fn new(name: impl Into<String>, intensity: f64) -> Result<Self, AnalysisError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AnalysisError::InvalidMood("情绪名不能为空".to_string()));
        }
        if !(0.0..=1.0).contains(&intensity) {
            return Err(AnalysisError::IntensityOutOfRange(intensity));
        }
        Ok(Self { name, intensity })
    }
}

/// 场景设定（全部可选）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// 时代，如 "contemporary" / "victorian" / "future"
    pub era: Option<String>,
    /// 地点，如 "urban" / "rural" / "fantasy-world"
    pub location: Option<String>,
    /// 氛围，如 "cozy" / "dystopian" / "magical"
    pub atmosphere: Option<String>,
}

/// 叙事节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pace {
    Slow,
    Moderate,
    Fast,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Slow => "slow",
            Pace::Moderate => "moderate",
            Pace::Fast => "fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "slow" => Some(Pace::Slow),
            "moderate" => Some(Pace::Moderate),
            "fast" => Some(Pace::Fast),
            _ => None,
        }
    }
}

/// 情感强度档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityLevel {
    Light,
    Moderate,
    Intense,
}

impl IntensityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityLevel::Light => "light",
            IntensityLevel::Moderate => "moderate",
            IntensityLevel::Intense => "intense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(IntensityLevel::Light),
            "moderate" => Some(IntensityLevel::Moderate),
            "intense" => Some(IntensityLevel::Intense),
            _ => None,
        }
    }
}

/// 适合聆听的时段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(TimeOfDay::Morning),
            "afternoon" => Some(TimeOfDay::Afternoon),
            "evening" => Some(TimeOfDay::Evening),
            "night" => Some(TimeOfDay::Night),
            _ => None,
        }
    }
}

/// 分析输入来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisSource {
    /// 仅凭书名/简介/类型等元数据
    MetadataOnly,
    /// 有全文输入
    FullContent,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::MetadataOnly => "metadata-only",
            AnalysisSource::FullContent => "full-content",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "metadata-only" => Some(AnalysisSource::MetadataOnly),
            "full-content" => Some(AnalysisSource::FullContent),
            _ => None,
        }
    }
}

/// BookAnalysis 实体
///
/// 不变量:
/// - 每个 UserBook 至多一条分析
/// - mood 强度与 confidence 均在 0..=1
/// - metadata-only 的 confidence 不超过上限
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAnalysis {
    id: AnalysisId,
    user_book_id: Uuid,
    analyzed_at: DateTime<Utc>,
    mood: Vec<Mood>,
    themes: Vec<String>,
    setting: Setting,
    pace: Pace,
    intensity: IntensityLevel,
    time_of_day: Vec<TimeOfDay>,
    /// 书的氛围一句话描述
    vibe: String,
    /// 适配音乐的描述
    music_description: String,
    analysis_source: AnalysisSource,
    confidence: f64,
    model_used: String,
}

impl BookAnalysis {
    /// 创建分析结果，校验边界并按来源压置信度
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_book_id: Uuid,
        mood: Vec<Mood>,
        themes: Vec<String>,
        setting: Setting,
        pace: Pace,
        intensity: IntensityLevel,
        time_of_day: Vec<TimeOfDay>,
        vibe: String,
        music_description: String,
        analysis_source: AnalysisSource,
        confidence: f64,
        model_used: String,
    ) -> Result<Self, AnalysisError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AnalysisError::ConfidenceOutOfRange(confidence));
        }
        for m in &mood {
            if !(0.0..=1.0).contains(&m.intensity) {
                return Err(AnalysisError::IntensityOutOfRange(m.intensity));
            }
        }
        if model_used.trim().is_empty() {
            return Err(AnalysisError::MissingModel);
        }

        let confidence = match analysis_source {
            AnalysisSource::MetadataOnly => confidence.min(METADATA_ONLY_CONFIDENCE_CEILING),
            AnalysisSource::FullContent => confidence,
        };

        Ok(Self {
            id: AnalysisId::new(),
            user_book_id,
            analyzed_at: Utc::now(),
            mood,
            themes,
            setting,
            pace,
            intensity,
            time_of_day,
            vibe,
            music_description,
            analysis_source,
            confidence,
            model_used,
        })
    }

    /// 从持久化数据重建实体（写入时已校验，不再校验）
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: AnalysisId,
        user_book_id: Uuid,
        analyzed_at: DateTime<Utc>,
        mood: Vec<Mood>,
        themes: Vec<String>,
        setting: Setting,
        pace: Pace,
        intensity: IntensityLevel,
        time_of_day: Vec<TimeOfDay>,
        vibe: String,
        music_description: String,
        analysis_source: AnalysisSource,
        confidence: f64,
        model_used: String,
    ) -> Self {
        Self {
            id,
            user_book_id,
            analyzed_at,
            mood,
            themes,
            setting,
            pace,
            intensity,
            time_of_day,
            vibe,
            music_description,
            analysis_source,
            confidence,
            model_used,
        }
    }

    /// 主导情绪（强度最高者）
    pub fn dominant_mood(&self) -> Option<&Mood> {
        self.mood
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
    }

    // Getters
    pub fn id(&self) -> &AnalysisId {
        &self.id
    }

    pub fn user_book_id(&self) -> &Uuid {
        &self.user_book_id
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    pub fn mood(&self) -> &[Mood] {
        &self.mood
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    pub fn pace(&self) -> Pace {
        self.pace
    }

    pub fn intensity(&self) -> IntensityLevel {
        self.intensity
    }

    pub fn time_of_day(&self) -> &[TimeOfDay] {
        &self.time_of_day
    }

    pub fn vibe(&self) -> &str {
        &self.vibe
    }

    pub fn music_description(&self) -> &str {
        &self.music_description
    }

    pub fn analysis_source(&self) -> AnalysisSource {
        self.analysis_source
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn model_used(&self) -> &str {
        &self.model_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis(source: AnalysisSource, confidence: f64) -> BookAnalysis {
        BookAnalysis::new(
            Uuid::new_v4(),
            vec![
                Mood::new("melancholic", 0.8).unwrap(),
                Mood::new("hopeful", 0.4).unwrap(),
            ],
            vec!["loss".to_string(), "memory".to_string()],
            Setting {
                era: Some("contemporary".to_string()),
                location: Some("urban".to_string()),
                atmosphere: None,
            },
            Pace::Slow,
            IntensityLevel::Moderate,
            vec![TimeOfDay::Evening, TimeOfDay::Night],
            "寂静而怅然的都市夜晚".to_string(),
            "slow ambient piano with soft strings".to_string(),
            source,
            confidence,
            "claude-3-opus".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_mood_intensity_bounds() {
        assert!(Mood::new("tense", 1.0).is_ok());
        assert!(Mood::new("tense", -0.1).is_err());
        assert!(Mood::new("tense", 1.1).is_err());
        assert!(Mood::new("  ", 0.5).is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let result = BookAnalysis::new(
            Uuid::new_v4(),
            vec![],
            vec![],
            Setting::default(),
            Pace::Fast,
            IntensityLevel::Light,
            vec![],
            String::new(),
            String::new(),
            AnalysisSource::FullContent,
            1.5,
            "claude-3-opus".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_only_confidence_capped() {
        let analysis = sample_analysis(AnalysisSource::MetadataOnly, 0.95);
        assert_eq!(analysis.confidence(), METADATA_ONLY_CONFIDENCE_CEILING);

        let full = sample_analysis(AnalysisSource::FullContent, 0.95);
        assert_eq!(full.confidence(), 0.95);
    }

    #[test]
    fn test_dominant_mood() {
        let analysis = sample_analysis(AnalysisSource::FullContent, 0.9);
        assert_eq!(analysis.dominant_mood().unwrap().name, "melancholic");
    }

    #[test]
    fn test_missing_model_rejected() {
        let result = BookAnalysis::new(
            Uuid::new_v4(),
            vec![],
            vec![],
            Setting::default(),
            Pace::Moderate,
            IntensityLevel::Light,
            vec![],
            String::new(),
            String::new(),
            AnalysisSource::FullContent,
            0.5,
            "  ".to_string(),
        );
        assert!(result.is_err());
    }
}
