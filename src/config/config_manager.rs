// ==========================================
// 外勤排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 存储值格式错误时回退默认值并告警，不中断生成
// ==========================================

use crate::config::mode_profile::ModeWeightProfile;
use crate::config::planner_config_trait::{ConfigResult, PlannerConfigReader};
use crate::db::{configure_sqlite_connection, ensure_config_schema, open_sqlite_connection};
use crate::domain::mode::GenerationMode;
use crate::engine::objective::ObjectiveWeights;
use async_trait::async_trait;
use chrono::Weekday;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（config_kv 表不存在时自动创建）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并确认表结构（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
            ensure_config_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 删除 global scope 的配置值
    pub fn remove_global_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 读取模式权重覆写（config_kv: mode_weights/{mode}）
    pub fn get_mode_weight_profile(&self, mode: GenerationMode) -> ConfigResult<Option<ModeWeightProfile>> {
        let raw = match self.get_config_value(&ModeWeightProfile::config_key(mode))? {
            Some(v) => v,
            None => return Ok(None),
        };
        let profile: ModeWeightProfile = serde_json::from_str(&raw)?;
        Ok(Some(profile))
    }

    /// 保存模式权重覆写
    pub fn save_mode_weight_profile(&self, profile: &ModeWeightProfile) -> ConfigResult<()> {
        let raw = serde_json::to_string(profile)?;
        self.set_global_config_value(&ModeWeightProfile::config_key(profile.mode), &raw)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 与生成结果一并保存，便于追溯当次生成所用参数
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖现有同名 global 配置，快照中没有的键保持不变
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }
        tx.commit()?;

        Ok(count)
    }
}

// ==========================================
// PlannerConfigReader Trait 实现
// ==========================================
#[async_trait]
impl PlannerConfigReader for ConfigManager {
    // ===== 求解参数 =====

    async fn get_solver_time_limit_secs(&self) -> ConfigResult<f64> {
        let value = self.get_config_or_default(config_keys::SOLVER_TIME_LIMIT_SECS, "30")?;
        match value.trim().parse::<f64>() {
            Ok(v) if v > 0.0 && v.is_finite() => Ok(v),
            _ => {
                warn!(config_key = config_keys::SOLVER_TIME_LIMIT_SECS, raw_value = %value, "求解时限配置非法，使用默认值");
                Ok(defaults::SOLVER_TIME_LIMIT_SECS)
            }
        }
    }

    async fn get_mip_rel_gap(&self) -> ConfigResult<f64> {
        let value = self.get_config_or_default(config_keys::MIP_REL_GAP, "1e-6")?;
        match value.trim().parse::<f64>() {
            Ok(v) if (0.0..1.0).contains(&v) => Ok(v),
            _ => {
                warn!(config_key = config_keys::MIP_REL_GAP, raw_value = %value, "相对间隙配置非法，使用默认值");
                Ok(defaults::MIP_REL_GAP)
            }
        }
    }

    // ===== 生成模式 =====

    async fn get_enabled_modes(&self) -> ConfigResult<Vec<GenerationMode>> {
        let value = self.get_config_or_default(config_keys::ENABLED_MODES, "balanced,preference,affinity")?;

        let mut modes: Vec<GenerationMode> = Vec::new();
        for token in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match token.parse::<GenerationMode>() {
                Ok(mode) if !modes.contains(&mode) => modes.push(mode),
                Ok(_) => {}
                Err(e) => warn!(config_key = config_keys::ENABLED_MODES, error = %e, "忽略未知模式"),
            }
        }

        if modes.is_empty() {
            Ok(GenerationMode::ALL.to_vec())
        } else {
            Ok(modes)
        }
    }

    async fn get_mode_weights(&self, mode: GenerationMode) -> ConfigResult<ObjectiveWeights> {
        match self.get_mode_weight_profile(mode) {
            Ok(Some(profile)) if profile.mode == mode => Ok(profile.resolve()),
            Ok(Some(profile)) => {
                warn!(mode = %mode, stored_mode = %profile.mode, "权重覆写的模式不一致，使用固定权重表");
                Ok(ObjectiveWeights::for_mode(mode))
            }
            Ok(None) => Ok(ObjectiveWeights::for_mode(mode)),
            Err(e) => {
                warn!(mode = %mode, error = %e, "权重覆写格式错误，使用固定权重表");
                Ok(ObjectiveWeights::for_mode(mode))
            }
        }
    }

    // ===== 日历 =====

    async fn get_duty_weekday(&self) -> ConfigResult<Weekday> {
        let value = self.get_config_or_default(config_keys::DUTY_WEEKDAY, "sat")?;
        Ok(value.trim().parse::<Weekday>().unwrap_or_else(|_| {
            warn!(config_key = config_keys::DUTY_WEEKDAY, raw_value = %value, "出勤星期配置非法，使用周六");
            Weekday::Sat
        }))
    }

    // ===== 执行方式 =====

    async fn get_parallel_modes(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::PARALLEL_MODES, "true")?;
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Ok(true),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 求解
    pub const SOLVER_TIME_LIMIT_SECS: &str = "solver_time_limit_secs";
    pub const MIP_REL_GAP: &str = "mip_rel_gap";

    // 模式
    pub const ENABLED_MODES: &str = "enabled_modes";
    pub const MODE_WEIGHTS_PREFIX: &str = "mode_weights/";

    // 日历
    pub const DUTY_WEEKDAY: &str = "duty_weekday";

    // 执行
    pub const PARALLEL_MODES: &str = "parallel_modes";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const SOLVER_TIME_LIMIT_SECS: f64 = 30.0;
    pub const MIP_REL_GAP: f64 = 1e-6;
}
