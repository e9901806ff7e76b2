use crate::config::config_manager::config_keys;
use crate::domain::mode::GenerationMode;
use crate::engine::objective::ObjectiveWeights;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 模式权重覆写（持久化对象）
///
/// 存储位置：config_kv（scope_id='global'，key='mode_weights/{mode}'）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeWeightProfile {
    /// 覆写对象模式
    pub mode: GenerationMode,

    /// 说明（可选）
    #[serde(default)]
    pub description: Option<String>,

    /// 各项权重，未填写的项沿用固定权重表
    #[serde(default)]
    pub parameters: ModeWeightParameters,
}

/// 权重参数
///
/// 符号以固定权重表为准: 惩罚项（variance / avoid / count_variance）为正，
/// 奖励项（preference / nomination / priority）为负。目标函数只使用绝对值，
/// 写反符号的值按绝对值生效并记录警告
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModeWeightParameters {
    #[serde(default)]
    pub variance: Option<f64>,
    #[serde(default)]
    pub preference: Option<f64>,
    #[serde(default)]
    pub nomination: Option<f64>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub avoid: Option<f64>,
    #[serde(default)]
    pub count_variance: Option<f64>,
}

impl ModeWeightProfile {
    pub fn config_key(mode: GenerationMode) -> String {
        format!("{}{}", config_keys::MODE_WEIGHTS_PREFIX, mode.as_str())
    }

    /// 叠加到该模式的固定权重表上
    pub fn resolve(&self) -> ObjectiveWeights {
        let base = ObjectiveWeights::for_mode(self.mode);
        let p = &self.parameters;
        let overlay = |term: &str, value: Option<f64>, table: f64| match value {
            Some(v) => self.signed_like_table(term, v, table),
            None => table,
        };
        ObjectiveWeights {
            variance: overlay("variance", p.variance, base.variance),
            preference: overlay("preference", p.preference, base.preference),
            nomination: overlay("nomination", p.nomination, base.nomination),
            priority: overlay("priority", p.priority, base.priority),
            avoid: overlay("avoid", p.avoid, base.avoid),
            count_variance: overlay("count_variance", p.count_variance, base.count_variance),
        }
    }

    fn signed_like_table(&self, term: &str, value: f64, table: f64) -> f64 {
        if value == 0.0 || table == 0.0 || value.signum() == table.signum() {
            return value;
        }
        warn!(
            mode = self.mode.as_str(),
            term,
            value,
            "权重符号与固定权重表相反，按绝对值处理"
        );
        value.abs() * table.signum()
    }
}
