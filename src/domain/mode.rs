// ==========================================
// 外勤排班系统 - 生成模式
// ==========================================
// 用途: 同一月份按不同权重方案各求解一次，生成互相竞争的排班案
// 顺序固定: balanced → preference → affinity
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Balanced,
    Preference,
    Affinity,
}

impl GenerationMode {
    /// 全部模式（固定输出顺序）
    pub const ALL: [GenerationMode; 3] = [
        GenerationMode::Balanced,
        GenerationMode::Preference,
        GenerationMode::Affinity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Balanced => "balanced",
            GenerationMode::Preference => "preference",
            GenerationMode::Affinity => "affinity",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            GenerationMode::Balanced => "均衡方案",
            GenerationMode::Preference => "希望优先",
            GenerationMode::Affinity => "优先度优先",
        }
    }
}

impl Default for GenerationMode {
    fn default() -> Self {
        GenerationMode::Balanced
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(GenerationMode::Balanced),
            "preference" | "preference_first" | "preference-first" => Ok(GenerationMode::Preference),
            "affinity" | "affinity_first" | "affinity-first" => Ok(GenerationMode::Affinity),
            other => Err(format!("未知生成模式: {}", other)),
        }
    }
}
