//! Translation capability for console text.
//!
//! Components never read a global language setting. They receive a
//! [`Translate`] implementation chosen once per session and thread it through.

/// Resolves a message key to display text, substituting `{name}` placeholders.
pub trait Translate {
    fn t(&self, key: &str, vars: &[(&str, &str)]) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str, &[(&str, &str)]) -> String,
{
    fn t(&self, key: &str, vars: &[(&str, &str)]) -> String {
        self(key, vars)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
    Ja,
}

impl Locale {
    /// Maps a language tag (`zh-CN`, `ja_JP`, `EN`) to a supported locale.
    /// Anything unrecognized falls back to English.
    pub fn normalize(raw: &str) -> Self {
        let value = raw.trim().to_lowercase();
        if value.starts_with("zh") {
            Self::Zh
        } else if value.starts_with("ja") {
            Self::Ja
        } else {
            Self::En
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Ja => "ja",
        }
    }

    fn dictionary(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::En => EN,
            Self::Zh => ZH,
            Self::Ja => JA,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Static dictionary lookup: requested locale, then English, then the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        find(self.locale.dictionary(), key).or_else(|| find(EN, key))
    }
}

impl Translate for Catalog {
    fn t(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let mut text = self.lookup(key).unwrap_or(key).to_string();
        for (name, value) in vars {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

fn find(dict: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    dict.iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

const EN: &[(&str, &str)] = &[
    ("audit_title", "Audit"),
    ("audit_file", "Audit File"),
    ("audit_latest", "Latest"),
    ("audit_newer", "Newer"),
    ("audit_older", "Older"),
    ("audit_path", "Path"),
    ("audit_size", "Size"),
    ("audit_range", "Range"),
    ("audit_empty", "No audit records in this window"),
    ("audit_no_file", "Audit log file not found"),
    ("audit_time", "Time"),
    ("audit_decision", "Decision"),
    ("audit_risk", "Risk"),
    ("audit_action", "Action"),
    ("audit_tool", "Tool"),
    ("audit_run", "Run"),
    ("audit_group_count", "Items"),
    ("audit_step", "Step"),
    ("audit_actor", "Actor"),
    ("audit_approval", "Approval"),
    ("audit_reasons", "Reasons"),
    ("audit_summary", "Summary"),
    ("audit_raw", "Raw"),
    ("audit_decision_allow", "Allow"),
    ("audit_decision_redact", "Allow+Redact"),
    ("audit_decision_require_approval", "Require Approval"),
    ("audit_decision_deny", "Deny"),
    ("audit_risk_low", "Low"),
    ("audit_risk_medium", "Medium"),
    ("audit_risk_high", "High"),
    ("audit_risk_critical", "Critical"),
    ("audit_current", "current"),
    ("audit_modified", "Modified"),
    ("audit_has_older", "More history is available ({hint})"),
    ("msg_load_failed", "Load failed"),
    ("audit_retry_hint", "try again shortly"),
];

const ZH: &[(&str, &str)] = &[
    ("audit_title", "审计"),
    ("audit_file", "审计文件"),
    ("audit_latest", "最新"),
    ("audit_newer", "较新"),
    ("audit_older", "较旧"),
    ("audit_path", "路径"),
    ("audit_size", "大小"),
    ("audit_range", "范围"),
    ("audit_empty", "当前窗口内无审计记录"),
    ("audit_no_file", "未找到审计日志文件"),
    ("audit_time", "时间"),
    ("audit_decision", "决策"),
    ("audit_risk", "风险"),
    ("audit_action", "动作"),
    ("audit_tool", "工具"),
    ("audit_run", "Run"),
    ("audit_group_count", "条目"),
    ("audit_step", "步骤"),
    ("audit_actor", "操作者"),
    ("audit_approval", "审批"),
    ("audit_reasons", "原因"),
    ("audit_summary", "摘要"),
    ("audit_raw", "原始"),
    ("audit_decision_allow", "允许"),
    ("audit_decision_redact", "允许并脱敏"),
    ("audit_decision_require_approval", "需要审批"),
    ("audit_decision_deny", "拒绝"),
    ("audit_risk_low", "低"),
    ("audit_risk_medium", "中"),
    ("audit_risk_high", "高"),
    ("audit_risk_critical", "严重"),
    ("msg_load_failed", "加载失败"),
    ("audit_retry_hint", "请稍后重试"),
];

const JA: &[(&str, &str)] = &[
    ("audit_title", "監査"),
    ("audit_file", "監査ファイル"),
    ("audit_latest", "最新"),
    ("audit_newer", "新しい側"),
    ("audit_older", "古い側"),
    ("audit_path", "パス"),
    ("audit_size", "サイズ"),
    ("audit_range", "範囲"),
    ("audit_empty", "このウィンドウには監査記録がありません"),
    ("audit_no_file", "監査ログファイルが見つかりません"),
    ("audit_time", "時刻"),
    ("audit_decision", "判定"),
    ("audit_risk", "リスク"),
    ("audit_action", "アクション"),
    ("audit_tool", "ツール"),
    ("audit_run", "Run"),
    ("audit_group_count", "件数"),
    ("audit_step", "ステップ"),
    ("audit_actor", "実行者"),
    ("audit_approval", "承認"),
    ("audit_reasons", "理由"),
    ("audit_summary", "要約"),
    ("audit_raw", "Raw"),
    ("audit_decision_allow", "許可"),
    ("audit_decision_redact", "許可+マスク"),
    ("audit_decision_require_approval", "承認が必要"),
    ("audit_decision_deny", "拒否"),
    ("audit_risk_low", "低"),
    ("audit_risk_medium", "中"),
    ("audit_risk_high", "高"),
    ("audit_risk_critical", "重大"),
    ("msg_load_failed", "読み込みに失敗しました"),
    ("audit_retry_hint", "しばらくしてから再試行してください"),
];
